//! Long-polling dispatcher schema
//!
//! Messages and button presses are turned into `InboundUpdate`s and fed to
//! the same `BotApp` the webhook uses.

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Message};

use super::chat_user;
use crate::app::BotApp;
use crate::update::InboundUpdate;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn schema(app: BotApp) -> UpdateHandler<HandlerError> {
    let app_messages = app.clone();
    let app_callbacks = app;

    dptree::entry()
        .branch(message_handler(app_messages))
        .branch(callback_handler(app_callbacks))
}

fn message_handler(app: BotApp) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |msg: Message| {
            let app = app.clone();
            async move {
                let update = InboundUpdate::Message {
                    chat_id: msg.chat.id.0,
                    text: msg.text().unwrap_or_default().to_string(),
                    from: msg.from.as_ref().map(chat_user),
                };
                app.process(update).await;
                Ok(())
            }
        })
}

fn callback_handler(app: BotApp) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let app = app.clone();
        async move {
            // stop the button spinner
            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                log::warn!("Failed to answer callback query: {}", e);
            }

            let Some(data) = q.data.clone() else {
                log::warn!("Callback query from {} without data", q.from.id.0);
                return Ok(());
            };
            let from = chat_user(&q.from);
            let chat_id = q.message.as_ref().map(|m| m.chat().id.0).unwrap_or(from.id);
            app.process(InboundUpdate::Callback { data, from, chat_id }).await;
            Ok(())
        }
    })
}
