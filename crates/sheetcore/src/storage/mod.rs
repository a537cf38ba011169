//! Spreadsheet-style row storage
//!
//! Sheets are named tables of loosely typed rows. A `SheetBackend` provides
//! the raw grid; `RowStore` layers the keyed lookup operations on top so the
//! matching rules are identical for every backend.

pub mod backend;
pub mod cell;
pub mod memory;
pub mod row_store;
pub mod sqlite;

// Re-exports for convenience
pub use backend::{RowId, SheetBackend};
pub use cell::{Cell, Row};
pub use memory::MemoryBackend;
pub use row_store::RowStore;
pub use sqlite::SqliteBackend;
