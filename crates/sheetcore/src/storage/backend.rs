use crate::error::AppResult;
use crate::storage::cell::Row;

/// Stable identifier of a row inside one sheet.
pub type RowId = i64;

/// Raw grid access for a collection of named sheets.
///
/// Implementations do no matching of their own; `RowStore` scans the rows
/// they return. `rows` must return rows in storage order and `replace` must
/// keep a row's position.
pub trait SheetBackend: Send + Sync {
    /// Opens the sheet, creating it with `headers` if it does not exist yet.
    /// Headers of an existing sheet are never rewritten.
    fn ensure_sheet(&self, sheet: &str, headers: &[String]) -> AppResult<()>;

    fn headers(&self, sheet: &str) -> AppResult<Vec<String>>;

    fn rows(&self, sheet: &str) -> AppResult<Vec<(RowId, Row)>>;

    fn append(&self, sheet: &str, row: &Row) -> AppResult<RowId>;

    fn replace(&self, sheet: &str, id: RowId, row: &Row) -> AppResult<()>;

    fn remove(&self, sheet: &str, id: RowId) -> AppResult<()>;
}
