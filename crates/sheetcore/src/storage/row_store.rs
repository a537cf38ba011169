use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::storage::backend::{RowId, SheetBackend};
use crate::storage::cell::{Cell, Row};

/// Keyed row access to one named sheet.
///
/// Lookups take a 1-based column index and compare cells by their string
/// form, so `Cell::Int(123)` is found by `"123"`. The first match in storage
/// order wins. Nothing here is atomic: a read followed by a write can race
/// with another writer and the last write wins.
#[derive(Clone)]
pub struct RowStore {
    backend: Arc<dyn SheetBackend>,
    sheet: String,
    headers: Vec<String>,
}

impl RowStore {
    /// Handle to `sheet`. The sheet itself is created lazily on first use,
    /// with `headers` as its header row.
    pub fn new(backend: Arc<dyn SheetBackend>, sheet: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            backend,
            sheet: sheet.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Header row as stored, which may predate the headers passed to `new`.
    pub fn headers(&self) -> AppResult<Vec<String>> {
        self.open()?;
        self.backend.headers(&self.sheet)
    }

    fn open(&self) -> AppResult<()> {
        self.backend.ensure_sheet(&self.sheet, &self.headers).map_err(|e| match e {
            AppError::StorageUnavailable(_) => e,
            other => AppError::StorageUnavailable(format!("cannot open sheet '{}': {}", self.sheet, other)),
        })
    }

    fn matching(&self, lookup_column: usize, lookup_value: &str) -> AppResult<impl Iterator<Item = (RowId, Row)>> {
        if lookup_column == 0 {
            return Err(AppError::Validation("lookup column is 1-based".to_string()));
        }
        self.open()?;
        let lookup_value = lookup_value.to_string();
        let rows = self.backend.rows(&self.sheet)?;
        Ok(rows.into_iter().filter(move |(_, row)| {
            row.get(lookup_column - 1)
                .unwrap_or(&Cell::Empty)
                .matches(&lookup_value)
        }))
    }

    /// Appends `values` as a new row and hands them back.
    pub fn create_row(&self, values: Row) -> AppResult<Row> {
        self.open()?;
        self.backend.append(&self.sheet, &values)?;
        Ok(values)
    }

    pub fn read_row(&self, lookup_column: usize, lookup_value: &str) -> AppResult<Option<Row>> {
        Ok(self.matching(lookup_column, lookup_value)?.next().map(|(_, row)| row))
    }

    /// Every matching row, in storage order.
    pub fn read_rows(&self, lookup_column: usize, lookup_value: &str) -> AppResult<Vec<Row>> {
        Ok(self.matching(lookup_column, lookup_value)?.map(|(_, row)| row).collect())
    }

    /// Overwrites the first matching row, or creates one if nothing matches.
    /// The new row may be wider or narrower than the old one.
    pub fn update_row(&self, lookup_column: usize, lookup_value: &str, new_values: Row) -> AppResult<Row> {
        match self.matching(lookup_column, lookup_value)?.next() {
            Some((id, _)) => {
                self.backend.replace(&self.sheet, id, &new_values)?;
                Ok(new_values)
            }
            None => self.create_row(new_values),
        }
    }

    /// Removes the first matching row. Returns whether one was found.
    pub fn delete_row(&self, lookup_column: usize, lookup_value: &str) -> AppResult<bool> {
        match self.matching(lookup_column, lookup_value)?.next() {
            Some((id, _)) => {
                self.backend.remove(&self.sheet, id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
