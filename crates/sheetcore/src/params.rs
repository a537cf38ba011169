//! Typed parameter resolution for leaf handlers

use crate::command::Command;
use crate::error::AppResult;
use crate::feature::DispatchContext;

/// Pure conversion of one token into a typed value, or a user-facing
/// (MarkdownV2) error message.
pub type Processor<T> = fn(&str) -> Result<T, String>;

/// Describes one positional argument a leaf expects.
pub struct Parameter<T> {
    pub name: &'static str,
    /// Prompt sent when the argument is missing (MarkdownV2).
    pub help_message: String,
    pub processor: Processor<T>,
}

impl<T> Parameter<T> {
    pub fn new(name: &'static str, help_message: impl Into<String>, processor: Processor<T>) -> Self {
        Self {
            name,
            help_message: help_message.into(),
            processor,
        }
    }
}

/// Pulls the next argument and runs it through `parameter.processor`.
///
/// Missing argument: the help prompt is sent and stored state is left alone,
/// so the user's next bare reply is appended to it. Rejected argument: the
/// error is sent and the rejected token is rolled back from the stored
/// continuation, so the same prompt can be answered again. Both return
/// `Ok(None)`.
pub async fn get_arg<T: Send>(
    command: &mut Command,
    ctx: &DispatchContext<'_>,
    parameter: &Parameter<T>,
) -> AppResult<Option<T>> {
    let Some(raw) = command.next_arg() else {
        log::debug!("Prompting user {} for '{}'", ctx.user.id, parameter.name);
        ctx.say(parameter.help_message.clone()).await?;
        return Ok(None);
    };

    let processed = (parameter.processor)(&raw);
    match processed {
        Ok(value) => Ok(Some(value)),
        Err(message) => {
            log::info!(
                "Rejected '{}' for parameter '{}' from user {}",
                raw,
                parameter.name,
                ctx.user.id
            );
            ctx.states.rollback(ctx.user.id)?;
            ctx.say(message).await?;
            Ok(None)
        }
    }
}

/// Processor accepting any token unchanged.
pub fn any_text(raw: &str) -> Result<String, String> {
    Ok(raw.to_string())
}

/// Processor for a numeric Telegram user id.
pub fn user_id(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| format!("{} is not a user id", crate::utils::code(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatUser;
    use crate::state::CommandStateStore;
    use crate::storage::MemoryBackend;
    use crate::testing::{FailingSender, RecordingSender};
    use std::sync::Arc;

    fn digits(raw: &str) -> Result<u32, String> {
        raw.parse().map_err(|_| "digits only".to_string())
    }

    struct Fixture {
        sender: RecordingSender,
        states: CommandStateStore,
        user: ChatUser,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                sender: RecordingSender::new(),
                states: CommandStateStore::new(Arc::new(MemoryBackend::new())),
                user: ChatUser::new(3, "Bo"),
            }
        }

        fn ctx(&self) -> DispatchContext<'_> {
            DispatchContext {
                sender: &self.sender,
                states: &self.states,
                user: &self.user,
                chat_id: 3,
            }
        }
    }

    #[tokio::test]
    async fn test_valid_argument_is_converted() {
        let fx = Fixture::new();
        let param = Parameter::new("n", "send a number", digits);
        let mut command = Command::parse("/x 42");
        command.next_arg();

        let value = get_arg(&mut command, &fx.ctx(), &param).await.unwrap();
        assert_eq!(value, Some(42));
        assert!(fx.sender.replies().is_empty());
    }

    #[tokio::test]
    async fn test_missing_argument_prompts_and_keeps_state() {
        let fx = Fixture::new();
        fx.states.set(3, "x").unwrap();
        let param = Parameter::new("n", "send a number", digits);
        let mut command = Command::parse("/x");
        command.next_arg();

        let value = get_arg(&mut command, &fx.ctx(), &param).await.unwrap();
        assert_eq!(value, None);
        assert_eq!(fx.sender.last_text().as_deref(), Some("send a number"));
        assert_eq!(fx.states.get(3).unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_invalid_argument_reports_and_rolls_back() {
        let fx = Fixture::new();
        fx.states.set(3, "x abc").unwrap();
        let param = Parameter::new("n", "send a number", digits);
        let mut command = Command::parse("/x abc");
        command.next_arg();

        let value = get_arg(&mut command, &fx.ctx(), &param).await.unwrap();
        assert_eq!(value, None);
        assert_eq!(fx.sender.last_text().as_deref(), Some("digits only"));
        assert_eq!(fx.states.get(3).unwrap().as_deref(), Some("x"));
        // local command is untouched
        assert_eq!(command.to_string(), "x abc");
    }

    #[tokio::test]
    async fn test_rollback_survives_failed_send() {
        let fx = Fixture::new();
        fx.states.set(3, "x abc").unwrap();
        let ctx = DispatchContext {
            sender: &FailingSender,
            states: &fx.states,
            user: &fx.user,
            chat_id: 3,
        };
        let param = Parameter::new("n", "send a number", digits);
        let mut command = Command::parse("/x abc");
        command.next_arg();

        assert!(get_arg(&mut command, &ctx, &param).await.is_err());
        assert_eq!(fx.states.get(3).unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_user_id_processor() {
        assert_eq!(user_id("12345"), Ok(12345));
        assert!(user_id("-5").is_err());
        assert!(user_id("bob").is_err());
        assert!(any_text("Hello").is_ok());
    }
}
