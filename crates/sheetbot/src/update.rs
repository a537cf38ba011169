//! Inbound Telegram updates, reduced to what the router needs
//!
//! The webhook receives raw JSON. Only text messages and callback queries
//! carry commands; everything else is dropped by the caller.

use serde_json::Value;
use sheetcore::ChatUser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundUpdate {
    Message {
        chat_id: i64,
        text: String,
        from: Option<ChatUser>,
    },
    /// Inline button press; `data` is the button payload.
    Callback {
        data: String,
        from: ChatUser,
        chat_id: i64,
    },
}

impl InboundUpdate {
    pub fn from_json(update: &Value) -> Option<Self> {
        if let Some(message) = update.get("message") {
            let text = message.get("text")?.as_str()?.to_string();
            let chat_id = message.get("chat")?.get("id")?.as_i64()?;
            let from = message.get("from").and_then(user_from_json);
            return Some(Self::Message { chat_id, text, from });
        }

        if let Some(query) = update.get("callback_query") {
            let data = query.get("data")?.as_str()?.to_string();
            let from = user_from_json(query.get("from")?)?;
            let chat_id = query
                .get("message")
                .and_then(|m| m.get("chat"))
                .and_then(|c| c.get("id"))
                .and_then(Value::as_i64)
                .unwrap_or(from.id);
            return Some(Self::Callback { data, from, chat_id });
        }

        None
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            Self::Message { chat_id, .. } | Self::Callback { chat_id, .. } => *chat_id,
        }
    }

    pub fn user(&self) -> Option<&ChatUser> {
        match self {
            Self::Message { from, .. } => from.as_ref(),
            Self::Callback { from, .. } => Some(from),
        }
    }

    /// Command text: the message body or the button payload.
    pub fn text(&self) -> &str {
        match self {
            Self::Message { text, .. } => text,
            Self::Callback { data, .. } => data,
        }
    }
}

fn user_from_json(user: &Value) -> Option<ChatUser> {
    let id = user.get("id")?.as_i64()?;
    let first_name = user.get("first_name").and_then(Value::as_str).unwrap_or_default();
    let mut chat_user = ChatUser::new(id, first_name);
    chat_user.username = user.get("username").and_then(Value::as_str).map(str::to_string);
    Some(chat_user)
}
