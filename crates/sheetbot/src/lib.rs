//! sheetbot - the Telegram side of the bot
//!
//! # Module Structure
//!
//! - `features`: bus, game, friends, profile and start/help/cancel leaves,
//!   plus the tree builder
//! - `update`: raw Telegram JSON reduced to what the router needs
//! - `app`: per-update entry point shared by both transports
//! - `telegram`: Bot API sender, polling schema and webhook server
//! - `cli`, `config`: command line and environment settings

pub mod app;
pub mod cli;
pub mod config;
pub mod features;
pub mod telegram;
pub mod update;

pub use app::BotApp;
pub use features::{build_tree, FeatureDeps};
pub use update::InboundUpdate;
