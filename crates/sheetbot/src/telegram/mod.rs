//! Telegram transport: outbound sender, polling schema and webhook server

pub mod schema;
pub mod sender;
pub mod webhook;

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::User;

use sheetcore::ChatUser;

use crate::config;

pub use schema::schema;
pub use sender::TelegramSender;
pub use webhook::{create_webhook_router, run_webhook_server, WebhookState};

/// Creates a Bot with the configured token and request timeout.
pub fn create_bot() -> anyhow::Result<Bot> {
    if config::BOT_TOKEN.is_empty() {
        anyhow::bail!("BOT_TOKEN (or TELOXIDE_TOKEN) is not set");
    }
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(config::BOT_TOKEN.as_str(), client))
}

pub(crate) fn chat_user(user: &User) -> ChatUser {
    let mut chat_user = ChatUser::new(user.id.0 as i64, user.first_name.clone());
    chat_user.username = user.username.clone();
    chat_user
}
