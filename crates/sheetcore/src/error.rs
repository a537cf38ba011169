use thiserror::Error;

/// Centralized error type for the bot.
///
/// Only fatal conditions live here. Recoverable user mistakes (unknown
/// commands, rejected parameters, missing users) are answered in place by
/// the dispatcher and never become an `AppError`.
#[derive(Error, Debug)]
pub enum AppError {
    /// A sheet could not be opened or created
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Cell (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Outbound chat transport errors
    #[error("Send error: {0}")]
    Send(String),

    /// External service errors (bus arrivals API, etc.)
    #[error("External service error: {0}")]
    External(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Whether the error means the persistence layer is gone.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            AppError::StorageUnavailable(_) | AppError::Database(_) | AppError::DatabasePool(_)
        )
    }
}
