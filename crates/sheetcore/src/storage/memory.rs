use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{AppError, AppResult};
use crate::storage::backend::{RowId, SheetBackend};
use crate::storage::cell::Row;

#[derive(Default)]
struct Sheet {
    headers: Vec<String>,
    rows: Vec<(RowId, Row)>,
    next_id: RowId,
}

/// In-process sheets. Used by tests and `run --memory`.
#[derive(Default)]
pub struct MemoryBackend {
    sheets: Mutex<HashMap<String, Sheet>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, HashMap<String, Sheet>>> {
        self.sheets
            .lock()
            .map_err(|_| AppError::StorageUnavailable("memory backend lock poisoned".to_string()))
    }

    fn with_sheet<T>(&self, sheet: &str, f: impl FnOnce(&mut Sheet) -> AppResult<T>) -> AppResult<T> {
        let mut sheets = self.lock()?;
        let entry = sheets
            .get_mut(sheet)
            .ok_or_else(|| AppError::StorageUnavailable(format!("sheet '{}' does not exist", sheet)))?;
        f(entry)
    }
}

impl SheetBackend for MemoryBackend {
    fn ensure_sheet(&self, sheet: &str, headers: &[String]) -> AppResult<()> {
        let mut sheets = self.lock()?;
        sheets.entry(sheet.to_string()).or_insert_with(|| {
            log::debug!("Creating in-memory sheet '{}'", sheet);
            Sheet {
                headers: headers.to_vec(),
                ..Sheet::default()
            }
        });
        Ok(())
    }

    fn headers(&self, sheet: &str) -> AppResult<Vec<String>> {
        self.with_sheet(sheet, |s| Ok(s.headers.clone()))
    }

    fn rows(&self, sheet: &str) -> AppResult<Vec<(RowId, Row)>> {
        self.with_sheet(sheet, |s| Ok(s.rows.clone()))
    }

    fn append(&self, sheet: &str, row: &Row) -> AppResult<RowId> {
        self.with_sheet(sheet, |s| {
            s.next_id += 1;
            s.rows.push((s.next_id, row.clone()));
            Ok(s.next_id)
        })
    }

    fn replace(&self, sheet: &str, id: RowId, row: &Row) -> AppResult<()> {
        self.with_sheet(sheet, |s| {
            if let Some((_, existing)) = s.rows.iter_mut().find(|(row_id, _)| *row_id == id) {
                *existing = row.clone();
            }
            Ok(())
        })
    }

    fn remove(&self, sheet: &str, id: RowId) -> AppResult<()> {
        self.with_sheet(sheet, |s| {
            s.rows.retain(|(row_id, _)| *row_id != id);
            Ok(())
        })
    }
}
