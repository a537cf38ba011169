//! Per-update entry point shared by the webhook and polling transports

use std::sync::Arc;

use sheetcore::{AppResult, ChatSender, CommandRouter, CommandStateStore, FeatureTree, SheetBackend};

use crate::features::profile::UserDirectory;
use crate::update::InboundUpdate;

/// Dependencies for handling updates, cloned into every transport task.
#[derive(Clone)]
pub struct BotApp {
    router: Arc<CommandRouter>,
    users: UserDirectory,
    sender: Arc<dyn ChatSender>,
}

impl BotApp {
    pub fn new(tree: Arc<FeatureTree>, backend: Arc<dyn SheetBackend>, sender: Arc<dyn ChatSender>) -> Self {
        Self {
            router: Arc::new(CommandRouter::new(tree, CommandStateStore::new(backend.clone()))),
            users: UserDirectory::new(backend),
            sender,
        }
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    /// Handles one update. Updates without an attributable user are dropped.
    pub async fn handle_update(&self, update: InboundUpdate) -> AppResult<()> {
        let Some(user) = update.user() else {
            log::warn!("Dropping update in chat {} without a sender", update.chat_id());
            return Ok(());
        };

        self.users.ensure(user)?;

        self.router
            .dispatch(update.text(), user, update.chat_id(), self.sender.as_ref())
            .await
    }

    /// Like [`handle_update`](Self::handle_update), but logs failures
    /// instead of returning them. Transports call this.
    pub async fn process(&self, update: InboundUpdate) {
        let chat_id = update.chat_id();
        if let Err(e) = self.handle_update(update).await {
            if e.is_storage() {
                log::error!("Storage failure while handling update in chat {}: {}", chat_id, e);
            } else {
                log::error!("Failed to handle update in chat {}: {}", chat_id, e);
            }
        }
    }
}
