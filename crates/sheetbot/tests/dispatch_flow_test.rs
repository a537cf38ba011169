//! Continuation, rollback and unknown-command behaviour through the full bot.

mod common;

use std::sync::Arc;

use common::{ann, bob, last_text, FakeBuses, Harness};
use pretty_assertions::assert_eq;
use sheetbot::{build_tree, BotApp, FeatureDeps, InboundUpdate};
use sheetcore::testing::{RecordingSender, UnavailableBackend};
use sheetcore::SheetBackend;

#[tokio::test]
async fn test_bare_reply_continues_prompted_command() {
    let h = Harness::new();
    let user = ann();

    let replies = h.send(&user, "/bus bus_stop").await;
    assert_eq!(last_text(&replies), "Which bus stop? Send its 5\\-digit code:");
    assert_eq!(h.state(&user).as_deref(), Some("bus bus_stop"));

    let replies = h.send(&user, "83139").await;
    assert!(last_text(&replies).starts_with("*Bus stop* `83139`"));
    assert!(last_text(&replies).contains("`15`"));
    assert_eq!(*h.buses.requested.lock().unwrap(), vec!["83139".to_string()]);
    assert_eq!(h.state(&user).as_deref(), Some("bus bus_stop 83139"));
}

#[tokio::test]
async fn test_rejected_argument_rolls_back() {
    let h = Harness::new();
    let user = ann();

    let replies = h.send(&user, "/bus bus_stop abc").await;
    assert!(last_text(&replies).starts_with("`abc` is not a bus stop code"));
    assert_eq!(h.state(&user).as_deref(), Some("bus bus_stop"));
    assert!(h.buses.requested.lock().unwrap().is_empty());

    // retry answers the same prompt
    h.send(&user, "83139").await;
    assert_eq!(*h.buses.requested.lock().unwrap(), vec!["83139".to_string()]);
}

#[tokio::test]
async fn test_unknown_branch_word() {
    let h = Harness::new();
    let user = ann();

    let replies = h.send(&user, "/bus flibbertigibbet").await;
    assert_eq!(replies.len(), 1);
    let reply = &replies[0].1;
    assert!(reply.text.starts_with("Unknown command: `flibbertigibbet`\n\n*Bus arrivals*"));
    assert!(reply.text.contains("`/bus saved`"));
    let payloads: Vec<&str> = reply.buttons().map(|b| b.payload.as_str()).collect();
    assert_eq!(payloads, vec!["/bus bus_stop", "/bus saved"]);
    assert_eq!(h.state(&user).as_deref(), Some("bus"));

    // the branch is still pending, so a bare word picks a sub-command
    let replies = h.send(&user, "saved").await;
    assert_eq!(last_text(&replies), "No saved stops yet\\. Save one with /bus save");
}

#[tokio::test]
async fn test_branch_without_word_lists_children() {
    let h = Harness::new();
    let replies = h.send(&ann(), "/game").await;
    assert!(last_text(&replies).starts_with("*Guess the five\\-letter word*"));
    assert!(last_text(&replies).contains("`/game start`"));
}

#[tokio::test]
async fn test_unknown_root_word_clears_continuation() {
    let h = Harness::new();
    let user = ann();

    let replies = h.send(&user, "/Flibber").await;
    assert!(last_text(&replies).starts_with("Unknown command: `flibber`\n\n*Available commands*"));
    assert_eq!(h.state(&user), None);
}

#[tokio::test]
async fn test_lone_slash_lists_roots() {
    let h = Harness::new();
    let replies = h.send(&ann(), "/").await;
    assert!(last_text(&replies).starts_with("*Available commands*"));
}

#[tokio::test]
async fn test_bare_text_without_state_is_a_command() {
    let h = Harness::new();
    let user = ann();

    let replies = h.send(&user, "Help").await;
    assert!(last_text(&replies).starts_with("*Commands*"));
    assert!(last_text(&replies).contains("`/friends accept`"));
}

#[tokio::test]
async fn test_cancel_drops_continuation() {
    let h = Harness::new();
    let user = ann();

    h.send(&user, "/bus bus_stop").await;
    let replies = h.send(&user, "/cancel").await;
    assert_eq!(last_text(&replies), "Cancelled\\.");
    assert_eq!(h.state(&user), None);

    let replies = h.send(&user, "83139").await;
    assert!(last_text(&replies).starts_with("Unknown command: `83139`"));
    assert!(h.buses.requested.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_slash_command_replaces_continuation() {
    let h = Harness::new();
    let user = ann();

    h.send(&user, "/bus bus_stop").await;
    h.send(&user, "/profile show").await;
    assert_eq!(h.state(&user).as_deref(), Some("profile show"));
}

#[tokio::test]
async fn test_continuations_are_per_user() {
    let h = Harness::new();
    h.send(&ann(), "/bus bus_stop").await;
    h.send(&bob(), "/bus save").await;

    h.send(&ann(), "83139").await;
    assert_eq!(*h.buses.requested.lock().unwrap(), vec!["83139".to_string()]);
    assert_eq!(h.state(&bob()).as_deref(), Some("bus save"));
}

#[tokio::test]
async fn test_button_payload_dispatches_like_text() {
    let h = Harness::new();
    let user = ann();

    h.send(&user, "/bus save 83139").await;
    let replies = h.press(&user, "/bus saved").await;
    let payloads: Vec<&str> = replies[0].1.buttons().map(|b| b.payload.as_str()).collect();
    assert_eq!(payloads, vec!["/bus bus_stop 83139"]);
}

#[tokio::test]
async fn test_update_without_sender_is_dropped() {
    let h = Harness::new();
    let update = InboundUpdate::Message {
        chat_id: 7,
        text: "/help".to_string(),
        from: None,
    };
    h.app.handle_update(update).await.unwrap();
    assert!(h.sender.replies().is_empty());
}

#[tokio::test]
async fn test_first_contact_registers_profile() {
    let h = Harness::new();
    let user = ann();

    let replies = h.send(&user, "/start").await;
    assert!(last_text(&replies).starts_with("Hi *Ann*\\! Your user id is `1`\\."));
    assert!(last_text(&replies).contains("*Available commands*"));

    let replies = h.send(&user, "/profile show").await;
    assert!(last_text(&replies).starts_with("*Ann*\nUser id: `1`\nUsername: @ann\\_k"));
}

#[tokio::test]
async fn test_storage_outage_reaches_boundary_without_reply() {
    let backend: Arc<dyn SheetBackend> = Arc::new(UnavailableBackend);
    let deps = FeatureDeps::new(backend.clone(), Arc::new(FakeBuses::default()));
    let tree = Arc::new(build_tree(deps).unwrap());
    let sender = Arc::new(RecordingSender::new());
    let app = BotApp::new(tree, backend, sender.clone());
    let update = || InboundUpdate::Message {
        chat_id: 1,
        text: "/bus bus_stop 83139".to_string(),
        from: Some(ann()),
    };

    let err = app.handle_update(update()).await.unwrap_err();
    assert!(err.is_storage());

    // the boundary logs and swallows it
    app.process(update()).await;
    assert!(sender.replies().is_empty());
}

#[tokio::test]
async fn test_storage_outage_in_router_is_not_answered() {
    let backend: Arc<dyn SheetBackend> = Arc::new(UnavailableBackend);
    let deps = FeatureDeps::new(backend.clone(), Arc::new(FakeBuses::default()));
    let router = sheetcore::CommandRouter::new(
        Arc::new(build_tree(deps).unwrap()),
        sheetcore::CommandStateStore::new(backend),
    );
    let sender = RecordingSender::new();

    let err = router.dispatch("/help", &ann(), 1, &sender).await.unwrap_err();
    assert!(matches!(err, sheetcore::AppError::StorageUnavailable(_)));
    assert!(sender.replies().is_empty());
}
