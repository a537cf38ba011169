//! Per-user continuation state
//!
//! One row per user: `[user_id, last_command]`. The stored command has no
//! leading slash. An empty string or `STOPPED` means "no continuation".

use std::sync::Arc;

use crate::command::Command;
use crate::config::sheets;
use crate::error::AppResult;
use crate::storage::{Cell, RowStore, SheetBackend};

const USER_COLUMN: usize = 1;
const STOPPED: &str = "STOPPED";

#[derive(Clone)]
pub struct CommandStateStore {
    table: RowStore,
}

impl CommandStateStore {
    pub fn new(backend: Arc<dyn SheetBackend>) -> Self {
        Self {
            table: RowStore::new(backend, sheets::COMMAND_STATE, sheets::COMMAND_STATE_HEADERS),
        }
    }

    /// The stored continuation, if there is a usable one.
    ///
    /// Empty, `STOPPED` or non-text values are treated as no continuation.
    pub fn get(&self, user_id: i64) -> AppResult<Option<String>> {
        let row = self.table.read_row(USER_COLUMN, &user_id.to_string())?;
        let stored = row
            .and_then(|row| row.get(1).and_then(Cell::as_text).map(str::to_string))
            .filter(|s| !s.trim().is_empty() && !s.trim().eq_ignore_ascii_case(STOPPED));
        Ok(stored)
    }

    pub fn set(&self, user_id: i64, command: &str) -> AppResult<()> {
        log::debug!("Continuation for {} -> '{}'", user_id, command);
        self.table.update_row(
            USER_COLUMN,
            &user_id.to_string(),
            vec![Cell::Int(user_id), Cell::from(command)],
        )?;
        Ok(())
    }

    pub fn clear(&self, user_id: i64) -> AppResult<()> {
        self.set(user_id, "")
    }

    /// Drops the last token of the stored continuation and returns what is
    /// left. Users without a stored continuation are left untouched.
    pub fn rollback(&self, user_id: i64) -> AppResult<Option<String>> {
        let Some(stored) = self.get(user_id)? else {
            return Ok(None);
        };
        let mut command = Command::parse(&stored);
        command.pop_arg();
        let truncated = command.to_string();
        self.set(user_id, &truncated)?;
        Ok(Some(truncated))
    }
}
