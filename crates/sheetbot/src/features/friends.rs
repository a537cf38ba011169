//! Friend requests and friend lists
//!
//! Each direction of a relationship is its own row keyed by `"{from}:{to}"`,
//! so both "who did I add" and "who added me" are single-column lookups.

use std::sync::Arc;

use async_trait::async_trait;
use sheetcore::params::{get_arg, user_id, Parameter};
use sheetcore::utils::{code, escape_markdown_v2};
use sheetcore::{
    AppResult, Button, Cell, Command, CommandHandler, DispatchContext, Feature, Reply, Row, RowStore, SheetBackend,
};

use super::profile::UserDirectory;
use crate::config::sheets;

const KEY_COLUMN: usize = 1;
const USER_COLUMN: usize = 2;
const FRIEND_COLUMN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendStatus {
    Pending,
    Accepted,
}

impl FriendStatus {
    fn as_str(self) -> &'static str {
        match self {
            FriendStatus::Pending => "pending",
            FriendStatus::Accepted => "accepted",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    Sent,
    AlreadyRequested,
    AlreadyFriends,
    /// The other side had already asked; both are friends now.
    Accepted,
}

fn pair_key(from: i64, to: i64) -> String {
    format!("{}:{}", from, to)
}

fn status_of(row: &Row) -> Option<FriendStatus> {
    match row.get(3).and_then(Cell::as_text) {
        Some("pending") => Some(FriendStatus::Pending),
        Some("accepted") => Some(FriendStatus::Accepted),
        _ => None,
    }
}

#[derive(Clone)]
pub struct FriendStore {
    table: RowStore,
}

impl FriendStore {
    pub fn new(backend: Arc<dyn SheetBackend>) -> Self {
        Self {
            table: RowStore::new(backend, sheets::FRIENDS, sheets::FRIENDS_HEADERS),
        }
    }

    pub fn status(&self, from: i64, to: i64) -> AppResult<Option<FriendStatus>> {
        let row = self.table.read_row(KEY_COLUMN, &pair_key(from, to))?;
        Ok(row.as_ref().and_then(status_of))
    }

    fn write(&self, from: i64, to: i64, status: FriendStatus) -> AppResult<()> {
        let key = pair_key(from, to);
        self.table.update_row(
            KEY_COLUMN,
            &key,
            vec![
                Cell::from(key.as_str()),
                Cell::Int(from),
                Cell::Int(to),
                Cell::from(status.as_str()),
            ],
        )?;
        Ok(())
    }

    pub fn request(&self, from: i64, to: i64) -> AppResult<RequestOutcome> {
        match self.status(from, to)? {
            Some(FriendStatus::Accepted) => return Ok(RequestOutcome::AlreadyFriends),
            Some(FriendStatus::Pending) => return Ok(RequestOutcome::AlreadyRequested),
            None => {}
        }
        if self.status(to, from)? == Some(FriendStatus::Pending) {
            self.write(to, from, FriendStatus::Accepted)?;
            self.write(from, to, FriendStatus::Accepted)?;
            return Ok(RequestOutcome::Accepted);
        }
        self.write(from, to, FriendStatus::Pending)?;
        Ok(RequestOutcome::Sent)
    }

    /// `user` accepts a pending request from `requester`.
    pub fn accept(&self, user: i64, requester: i64) -> AppResult<bool> {
        if self.status(requester, user)? != Some(FriendStatus::Pending) {
            return Ok(false);
        }
        self.write(requester, user, FriendStatus::Accepted)?;
        self.write(user, requester, FriendStatus::Accepted)?;
        Ok(true)
    }

    /// Drops both directions. Returns whether anything existed.
    pub fn remove(&self, user: i64, other: i64) -> AppResult<bool> {
        let forward = self.table.delete_row(KEY_COLUMN, &pair_key(user, other))?;
        let backward = self.table.delete_row(KEY_COLUMN, &pair_key(other, user))?;
        Ok(forward || backward)
    }

    fn ids(&self, column: usize, user: i64, other_column: usize, status: FriendStatus) -> AppResult<Vec<i64>> {
        Ok(self
            .table
            .read_rows(column, &user.to_string())?
            .iter()
            .filter(|row| status_of(row) == Some(status))
            .filter_map(|row| row.get(other_column - 1).and_then(Cell::as_i64))
            .collect())
    }

    pub fn friends(&self, user: i64) -> AppResult<Vec<i64>> {
        self.ids(USER_COLUMN, user, FRIEND_COLUMN, FriendStatus::Accepted)
    }

    /// Users waiting for `user` to accept them.
    pub fn incoming(&self, user: i64) -> AppResult<Vec<i64>> {
        self.ids(FRIEND_COLUMN, user, USER_COLUMN, FriendStatus::Pending)
    }
}

fn friend_parameter(help: &str) -> Parameter<i64> {
    Parameter::new("user_id", help.to_string(), user_id)
}

pub struct AddFriend {
    friends: FriendStore,
    users: UserDirectory,
}

#[async_trait]
impl CommandHandler for AddFriend {
    async fn handle(&self, command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let param = friend_parameter("Send the user id of the person to add:");
        let Some(target) = get_arg(command, ctx, &param).await? else {
            return Ok(());
        };

        if target == ctx.user.id {
            ctx.states.rollback(ctx.user.id)?;
            return ctx.say("You cannot add yourself\\. Send another user id:").await;
        }
        if self.users.get(target)?.is_none() {
            ctx.states.rollback(ctx.user.id)?;
            return ctx
                .say(format!(
                    "I don't know user {}\\. They need to /start me first\\. Send another user id:",
                    code(&target.to_string())
                ))
                .await;
        }

        let me = escape_markdown_v2(&self.users.name_of(ctx.user.id)?);
        let them = escape_markdown_v2(&self.users.name_of(target)?);
        match self.friends.request(ctx.user.id, target)? {
            RequestOutcome::Sent => {
                let notice = Reply::text(format!("*{}* wants to be your friend", me)).with_buttons(vec![Button::new(
                    "✅ Accept",
                    format!("/friends accept {}", ctx.user.id),
                )]);
                if let Err(e) = ctx.sender.send(target, notice).await {
                    log::warn!("Could not notify user {} about a friend request: {}", target, e);
                }
                ctx.say(format!("Friend request sent to *{}*", them)).await
            }
            RequestOutcome::Accepted => {
                let notice = Reply::text(format!("You and *{}* are now friends", me));
                if let Err(e) = ctx.sender.send(target, notice).await {
                    log::warn!("Could not notify user {} about a new friend: {}", target, e);
                }
                ctx.say(format!("You and *{}* are now friends", them)).await
            }
            RequestOutcome::AlreadyRequested => ctx.say(format!("You already asked *{}*", them)).await,
            RequestOutcome::AlreadyFriends => ctx.say(format!("You and *{}* are already friends", them)).await,
        }
    }
}

pub struct AcceptFriend {
    friends: FriendStore,
    users: UserDirectory,
}

#[async_trait]
impl CommandHandler for AcceptFriend {
    async fn handle(&self, command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let param = friend_parameter("Send the user id whose request you accept:");
        let Some(requester) = get_arg(command, ctx, &param).await? else {
            return Ok(());
        };

        if !self.friends.accept(ctx.user.id, requester)? {
            ctx.states.rollback(ctx.user.id)?;
            return ctx
                .say(format!(
                    "There is no request from {}\\. Send another user id:",
                    code(&requester.to_string())
                ))
                .await;
        }

        let me = escape_markdown_v2(&self.users.name_of(ctx.user.id)?);
        let them = escape_markdown_v2(&self.users.name_of(requester)?);
        if let Err(e) = ctx
            .sender
            .send(requester, Reply::text(format!("*{}* accepted your friend request", me)))
            .await
        {
            log::warn!("Could not notify user {} about an accepted request: {}", requester, e);
        }
        ctx.say(format!("You and *{}* are now friends", them)).await
    }
}

pub struct RemoveFriend {
    friends: FriendStore,
}

#[async_trait]
impl CommandHandler for RemoveFriend {
    async fn handle(&self, command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let param = friend_parameter("Send the user id to remove:");
        let Some(other) = get_arg(command, ctx, &param).await? else {
            return Ok(());
        };
        if self.friends.remove(ctx.user.id, other)? {
            ctx.say(format!("Removed {}", code(&other.to_string()))).await
        } else {
            ctx.say(format!("{} is not on your list", code(&other.to_string())))
                .await
        }
    }
}

pub struct ListFriends {
    friends: FriendStore,
    users: UserDirectory,
}

#[async_trait]
impl CommandHandler for ListFriends {
    async fn handle(&self, _command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let friends = self.friends.friends(ctx.user.id)?;
        let incoming = self.friends.incoming(ctx.user.id)?;

        let mut text = String::from("*Friends*");
        if friends.is_empty() {
            text.push_str("\nNo friends yet\\. Add one with /friends add");
        }
        for id in &friends {
            text.push_str(&format!(
                "\n• {} {}",
                escape_markdown_v2(&self.users.name_of(*id)?),
                code(&id.to_string())
            ));
        }

        let mut buttons = Vec::new();
        if !incoming.is_empty() {
            text.push_str("\n\n*Waiting for you*");
            for id in &incoming {
                let name = self.users.name_of(*id)?;
                text.push_str(&format!("\n• {} {}", escape_markdown_v2(&name), code(&id.to_string())));
                buttons.push(Button::new(format!("✅ Accept {}", name), format!("/friends accept {}", id)));
            }
        }
        ctx.reply(Reply::text(text).with_buttons(buttons)).await
    }
}

pub fn feature(friends: FriendStore, users: UserDirectory) -> Feature {
    Feature::branch(
        "friends",
        "Friends",
        vec![
            Feature::leaf(
                "list",
                "Your friends and pending requests",
                "/friends list",
                Arc::new(ListFriends {
                    friends: friends.clone(),
                    users: users.clone(),
                }),
            )
            .with_button("👥 My friends", "/friends list"),
            Feature::leaf(
                "add",
                "Send a friend request",
                "/friends add <user id>",
                Arc::new(AddFriend {
                    friends: friends.clone(),
                    users: users.clone(),
                }),
            )
            .with_button("➕ Add friend", "/friends add"),
            Feature::leaf(
                "accept",
                "Accept a friend request",
                "/friends accept <user id>",
                Arc::new(AcceptFriend {
                    friends: friends.clone(),
                    users,
                }),
            ),
            Feature::leaf(
                "remove",
                "Remove a friend",
                "/friends remove <user id>",
                Arc::new(RemoveFriend { friends }),
            ),
        ],
    )
    .with_button("👥 Friends", "/friends")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetcore::MemoryBackend;

    fn store() -> FriendStore {
        FriendStore::new(Arc::new(MemoryBackend::new()))
    }

    #[test]
    fn test_request_then_accept() {
        let friends = store();
        assert_eq!(friends.request(1, 2).unwrap(), RequestOutcome::Sent);
        assert_eq!(friends.request(1, 2).unwrap(), RequestOutcome::AlreadyRequested);
        assert_eq!(friends.incoming(2).unwrap(), vec![1]);
        assert!(friends.friends(1).unwrap().is_empty());

        assert!(friends.accept(2, 1).unwrap());
        assert_eq!(friends.friends(1).unwrap(), vec![2]);
        assert_eq!(friends.friends(2).unwrap(), vec![1]);
        assert!(friends.incoming(2).unwrap().is_empty());
        assert_eq!(friends.request(2, 1).unwrap(), RequestOutcome::AlreadyFriends);
    }

    #[test]
    fn test_mirrored_request_auto_accepts() {
        let friends = store();
        friends.request(1, 2).unwrap();
        assert_eq!(friends.request(2, 1).unwrap(), RequestOutcome::Accepted);
        assert_eq!(friends.status(1, 2).unwrap(), Some(FriendStatus::Accepted));
        assert_eq!(friends.status(2, 1).unwrap(), Some(FriendStatus::Accepted));
    }

    #[test]
    fn test_accept_without_request() {
        let friends = store();
        assert!(!friends.accept(2, 1).unwrap());
        assert_eq!(friends.status(1, 2).unwrap(), None);
    }

    #[test]
    fn test_remove_both_directions() {
        let friends = store();
        friends.request(1, 2).unwrap();
        friends.accept(2, 1).unwrap();
        assert!(friends.remove(2, 1).unwrap());
        assert!(friends.friends(1).unwrap().is_empty());
        assert!(!friends.remove(2, 1).unwrap());
    }

    #[test]
    fn test_user_id_prefix_does_not_collide() {
        let friends = store();
        friends.request(1, 2).unwrap();
        friends.request(11, 2).unwrap();
        assert_eq!(friends.incoming(2).unwrap(), vec![1, 11]);
        assert!(friends.incoming(1).unwrap().is_empty());
    }
}
