//! State-aware parsing and the top-level router

use std::sync::Arc;

use crate::chat::{ChatSender, ChatUser, Reply};
use crate::command::Command;
use crate::error::AppResult;
use crate::feature::{describe_features, describe_unknown, handle_command, DispatchContext, FeatureTree};
use crate::state::CommandStateStore;

const ROOT_HEADING: &str = "Available commands";

/// Merges a fresh message with the user's stored continuation.
///
/// A slash command replaces the continuation. A bare message appends its
/// first token to the stored continuation and is re-parsed as a slash
/// command. A bare message with nothing stored is treated as a fresh
/// command. The result is always persisted.
pub fn parse_command_with_state(
    mut command: Command,
    user_id: i64,
    states: &CommandStateStore,
) -> AppResult<Command> {
    if command.has_slash() {
        states.set(user_id, &command.to_string())?;
        return Ok(command);
    }

    let rebuilt = match states.get(user_id)? {
        Some(stored) => match command.next_arg() {
            Some(new_arg) => Command::parse(&format!("/{} {}", stored, new_arg)),
            None => Command::parse(&format!("/{}", stored)),
        },
        None => Command::parse(&format!("/{}", command)),
    };

    states.set(user_id, &rebuilt.to_string())?;
    Ok(rebuilt)
}

/// Routes commands to the root feature named by their first word.
pub struct CommandRouter {
    tree: Arc<FeatureTree>,
    states: CommandStateStore,
}

impl CommandRouter {
    pub fn new(tree: Arc<FeatureTree>, states: CommandStateStore) -> Self {
        Self { tree, states }
    }

    pub fn tree(&self) -> &FeatureTree {
        &self.tree
    }

    pub fn states(&self) -> &CommandStateStore {
        &self.states
    }

    /// Listing of every top-level feature.
    pub fn root_listing(&self) -> Reply {
        describe_features(ROOT_HEADING, "", self.tree.roots())
    }

    /// Handles one inbound text (or button payload) from `user`.
    pub async fn dispatch(&self, text: &str, user: &ChatUser, chat_id: i64, sender: &dyn ChatSender) -> AppResult<()> {
        let mut command = parse_command_with_state(Command::parse(text), user.id, &self.states)?;
        log::info!("Dispatching '/{}' for user {} in chat {}", command, user.id, chat_id);

        let ctx = DispatchContext {
            sender,
            states: &self.states,
            user,
            chat_id,
        };

        let Some(word) = command.next_arg() else {
            return ctx.reply(self.root_listing()).await;
        };

        match self.tree.find_root(&word) {
            Some(root) => handle_command(root, &mut command, &ctx, "").await,
            None => {
                log::info!("Unknown top-level command '{}' from user {}", word, user.id);
                self.states.rollback(user.id)?;
                ctx.reply(describe_unknown(&word, ROOT_HEADING, "", self.tree.roots()))
                    .await
            }
        }
    }
}
