//! sheetcore - command parsing, feature-tree dispatch and sheet-backed storage
//!
//! This crate holds everything the bot needs that does not talk to Telegram:
//!
//! # Module Structure
//!
//! - `command`: tokenizer and the `Command` argument cursor
//! - `storage`: row store over spreadsheet-like sheets (SQLite and in-memory backends)
//! - `state`: per-user continuation state built on the row store
//! - `feature`: the feature tree and recursive dispatch
//! - `params`: typed parameter resolution for leaf handlers
//! - `router`: state-aware parsing and the top-level router
//! - `chat`: the outbound reply seam implemented by the transport
//! - `config`, `error`, `logging`, `utils`: ambient plumbing
//! - `testing`: test doubles shared with integration tests

pub mod chat;
pub mod command;
pub mod config;
pub mod error;
pub mod feature;
pub mod logging;
pub mod params;
pub mod router;
pub mod state;
pub mod storage;
pub mod testing;
pub mod utils;

// Re-exports for convenience
pub use chat::{Button, ChatSender, ChatUser, Reply};
pub use command::{tokenise, Command};
pub use error::{AppError, AppResult};
pub use feature::{handle_command, CommandHandler, DispatchContext, Feature, FeatureKind, FeatureTree};
pub use params::{get_arg, Parameter};
pub use router::{parse_command_with_state, CommandRouter};
pub use state::CommandStateStore;
pub use storage::{Cell, MemoryBackend, Row, RowStore, SheetBackend, SqliteBackend};
