//! Test doubles shared by unit and integration tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::chat::{ChatSender, Reply};
use crate::command::Command;
use crate::error::{AppError, AppResult};
use crate::feature::{CommandHandler, DispatchContext};
use crate::storage::{Row, RowId, SheetBackend};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Captures every reply instead of sending it.
#[derive(Default)]
pub struct RecordingSender {
    replies: Mutex<Vec<(i64, Reply)>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(chat_id, reply)` pairs in send order.
    pub fn replies(&self) -> Vec<(i64, Reply)> {
        lock(&self.replies).clone()
    }

    /// Text of the most recent reply.
    pub fn last_text(&self) -> Option<String> {
        lock(&self.replies).last().map(|(_, reply)| reply.text.clone())
    }

    /// Returns and forgets everything recorded so far.
    pub fn take(&self) -> Vec<(i64, Reply)> {
        std::mem::take(&mut *lock(&self.replies))
    }
}

#[async_trait]
impl ChatSender for RecordingSender {
    async fn send(&self, chat_id: i64, reply: Reply) -> AppResult<()> {
        lock(&self.replies).push((chat_id, reply));
        Ok(())
    }
}

/// Leaf handler that records the arguments left for it.
#[derive(Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingHandler {
    pub fn calls(&self) -> Vec<Vec<String>> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl CommandHandler for RecordingHandler {
    async fn handle(&self, command: &mut Command, _ctx: &DispatchContext<'_>) -> AppResult<()> {
        let remaining = std::iter::from_fn(|| command.next_arg()).collect();
        lock(&self.calls).push(remaining);
        Ok(())
    }
}

/// Sender whose every delivery fails, as when the chat API is unreachable.
#[derive(Default)]
pub struct FailingSender;

#[async_trait]
impl ChatSender for FailingSender {
    async fn send(&self, _chat_id: i64, _reply: Reply) -> AppResult<()> {
        Err(AppError::Send("network down".to_string()))
    }
}

/// Backend that cannot open any sheet.
#[derive(Default)]
pub struct UnavailableBackend;

impl SheetBackend for UnavailableBackend {
    fn ensure_sheet(&self, sheet: &str, _headers: &[String]) -> AppResult<()> {
        Err(AppError::StorageUnavailable(format!("cannot open '{}'", sheet)))
    }

    fn headers(&self, _sheet: &str) -> AppResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn rows(&self, _sheet: &str) -> AppResult<Vec<(RowId, Row)>> {
        Ok(Vec::new())
    }

    fn append(&self, _sheet: &str, _row: &Row) -> AppResult<RowId> {
        Ok(0)
    }

    fn replace(&self, _sheet: &str, _id: RowId, _row: &Row) -> AppResult<()> {
        Ok(())
    }

    fn remove(&self, _sheet: &str, _id: RowId) -> AppResult<()> {
        Ok(())
    }
}
