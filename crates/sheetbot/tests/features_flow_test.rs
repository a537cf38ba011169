//! Multi-turn feature flows: the word game and friend requests.

mod common;

use common::{ann, bob, last_text, Harness};
use pretty_assertions::assert_eq;
use sheetcore::ChatUser;

#[tokio::test]
async fn test_game_guess_loop_until_solved() {
    let h = Harness::new();
    let user = ann();

    let replies = h.send(&user, "/game start").await;
    assert!(last_text(&replies).starts_with("I picked a 5\\-letter word"));
    assert_eq!(h.state(&user).as_deref(), Some("game guess"));

    let replies = h.send(&user, "stone").await;
    assert!(last_text(&replies).ends_with("5 guesses left:"));
    assert!(last_text(&replies).contains("`STONE`"));
    assert_eq!(h.state(&user).as_deref(), Some("game guess"));

    // bad word is rolled back, the game keeps waiting
    let replies = h.send(&user, "ab").await;
    assert_eq!(last_text(&replies), "A guess must be a 5\\-letter word\\. Try again:");
    assert_eq!(h.state(&user).as_deref(), Some("game guess"));

    let replies = h.send(&user, "CRANE").await;
    assert!(last_text(&replies).contains("Solved in 2\\!"));
    assert_eq!(h.state(&user), None);
}

#[tokio::test]
async fn test_game_lost_after_six_guesses() {
    let h = Harness::new();
    let user = ann();

    h.send(&user, "/game start").await;
    for _ in 0..5 {
        h.send(&user, "stone").await;
    }
    let replies = h.send(&user, "stone").await;
    assert!(last_text(&replies).contains("Out of guesses\\. The word was `CRANE`"));
    assert_eq!(h.state(&user), None);

    let replies = h.send(&user, "/game guess crane").await;
    assert_eq!(last_text(&replies), "No game running\\.");
}

#[tokio::test]
async fn test_game_quit_reveals_word() {
    let h = Harness::new();
    let user = ann();

    h.send(&user, "/game start").await;
    let replies = h.send(&user, "/game quit").await;
    assert_eq!(last_text(&replies), "Game over\\. The word was `CRANE`");
    assert_eq!(h.state(&user), None);
}

#[tokio::test]
async fn test_friend_request_and_accept() {
    let h = Harness::new();
    let (ann, bob) = (ann(), bob());
    h.send(&ann, "/start").await;
    h.send(&bob, "/start").await;

    let replies = h.send(&ann, "/friends add 2").await;
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].0, 2);
    assert_eq!(replies[0].1.text, "*Ann* wants to be your friend");
    assert_eq!(replies[0].1.buttons().next().unwrap().payload, "/friends accept 1");
    assert_eq!(replies[1], (1, sheetcore::Reply::text("Friend request sent to *Bob*")));

    let replies = h.send(&bob, "/friends list").await;
    assert!(last_text(&replies).contains("*Waiting for you*\n• Ann `1`"));

    let replies = h.press(&bob, "/friends accept 1").await;
    assert_eq!(replies[0].0, 1);
    assert_eq!(last_text(&replies), "You and *Ann* are now friends");

    let replies = h.send(&ann, "/friends list").await;
    assert_eq!(last_text(&replies), "*Friends*\n• Bob `2`");
}

#[tokio::test]
async fn test_mirrored_requests_become_friends() {
    let h = Harness::new();
    let (ann, bob) = (ann(), bob());
    h.send(&ann, "/start").await;
    h.send(&bob, "/start").await;

    h.send(&ann, "/friends add 2").await;
    let replies = h.send(&bob, "/friends add 1").await;
    assert_eq!(last_text(&replies), "You and *Ann* are now friends");

    let replies = h.send(&bob, "/friends remove 1").await;
    assert_eq!(last_text(&replies), "Removed `1`");
    let replies = h.send(&ann, "/friends list").await;
    assert!(last_text(&replies).starts_with("*Friends*\nNo friends yet"));
}

#[tokio::test]
async fn test_friend_add_rejections_keep_prompt() {
    let h = Harness::new();
    let user = ann();
    h.send(&user, "/start").await;

    let replies = h.send(&user, "/friends add").await;
    assert_eq!(last_text(&replies), "Send the user id of the person to add:");

    let replies = h.send(&user, "1").await;
    assert!(last_text(&replies).starts_with("You cannot add yourself"));
    assert_eq!(h.state(&user).as_deref(), Some("friends add"));

    let replies = h.send(&user, "99").await;
    assert!(last_text(&replies).starts_with("I don't know user `99`"));
    assert_eq!(h.state(&user).as_deref(), Some("friends add"));

    let replies = h.send(&user, "bob").await;
    assert_eq!(last_text(&replies), "`bob` is not a user id");
    assert_eq!(h.state(&user).as_deref(), Some("friends add"));
}

#[tokio::test]
async fn test_accept_without_request() {
    let h = Harness::new();
    let user = ann();
    h.send(&user, "/start").await;

    let replies = h.send(&user, "/friends accept 2").await;
    assert!(last_text(&replies).starts_with("There is no request from `2`"));
    assert_eq!(h.state(&user).as_deref(), Some("friends accept"));
}

#[tokio::test]
async fn test_profile_rename() {
    let h = Harness::new();
    let user = ChatUser::new(5, "Cat");

    let replies = h.send(&user, "/profile name").await;
    assert_eq!(last_text(&replies), "What should I call you? Send one word:");
    let replies = h.send(&user, "/profile name Kitty").await;
    assert_eq!(last_text(&replies), "Done, you are now *Kitty*");

    let replies = h.send(&user, "/profile show").await;
    assert!(last_text(&replies).starts_with("*Kitty*"));
}
