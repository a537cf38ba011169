//! Outbound reply seam
//!
//! The dispatcher only knows how to build a `Reply`; the transport (Telegram
//! in production, `testing::RecordingSender` in tests) delivers it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Inline keyboard button: a label and the command text sent back on press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// A MarkdownV2-formatted message with an optional inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub keyboard: Vec<Vec<Button>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    /// One button per keyboard row.
    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.keyboard = buttons.into_iter().map(|b| vec![b]).collect();
        self
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.keyboard.iter().flatten()
    }
}

/// The person a command is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
}

impl ChatUser {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            username: None,
            first_name: first_name.into(),
        }
    }

    /// `@username` when known, otherwise the first name.
    pub fn handle(&self) -> String {
        match &self.username {
            Some(username) => format!("@{}", username),
            None => self.first_name.clone(),
        }
    }
}

/// Delivers replies to a chat.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, chat_id: i64, reply: Reply) -> AppResult<()>;
}
