use once_cell::sync::Lazy;
use std::env;

/// Core configuration, read once from the environment.
///
/// Binaries should call `dotenvy::dotenv()` before touching any of these so a
/// local `.env` file is honoured.

/// SQLite file holding every sheet
/// Read from DATABASE_PATH environment variable
/// Default: sheets.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "sheets.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: sheetbot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "sheetbot.log".to_string()));

/// Log level (error, warn, info, debug, trace)
/// Read from LOG_LEVEL environment variable
/// Default: info
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Sheet names and headers
pub mod sheets {
    /// Per-user continuation state
    pub const COMMAND_STATE: &str = "command_state";
    pub const COMMAND_STATE_HEADERS: &[&str] = &["user_id", "last_command"];
}

/// Storage configuration
pub mod storage {
    /// Maximum number of pooled SQLite connections
    pub const MAX_POOL_SIZE: u32 = 4;
}
