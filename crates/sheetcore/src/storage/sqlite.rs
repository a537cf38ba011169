//! SQLite-backed sheets
//!
//! Every sheet lives in the same two tables: `sheets` keeps the header row,
//! `sheet_rows` keeps one JSON-encoded row per record. Row order is the
//! autoincrement id, so in-place updates keep their position.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

use crate::config;
use crate::error::{AppError, AppResult};
use crate::storage::backend::{RowId, SheetBackend};
use crate::storage::cell::Row;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS sheets (
        name TEXT PRIMARY KEY,
        headers TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS sheet_rows (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sheet TEXT NOT NULL REFERENCES sheets(name),
        cells TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_sheet_rows_sheet ON sheet_rows(sheet, id);
";

/// Sheets stored in a SQLite database behind an r2d2 pool.
#[derive(Clone)]
pub struct SqliteBackend {
    pool: DbPool,
}

impl SqliteBackend {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub fn open(database_path: &str) -> AppResult<Self> {
        let manager = SqliteConnectionManager::file(database_path);
        let pool = Pool::builder().max_size(config::storage::MAX_POOL_SIZE).build(manager)?;
        Self::from_pool(pool)
    }

    /// Private in-memory database. A single connection so every call sees
    /// the same data.
    pub fn open_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        Self::from_pool(pool)
    }

    pub fn from_pool(pool: DbPool) -> AppResult<Self> {
        let conn = pool.get()?;
        conn.execute_batch(SCHEMA)?;
        log::info!("SQLite sheet storage ready");
        Ok(Self { pool })
    }

    fn conn(&self) -> AppResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

impl SheetBackend for SqliteBackend {
    fn ensure_sheet(&self, sheet: &str, headers: &[String]) -> AppResult<()> {
        let conn = self.conn()?;
        let created = conn.execute(
            "INSERT OR IGNORE INTO sheets (name, headers) VALUES (?1, ?2)",
            params![sheet, serde_json::to_string(headers)?],
        )?;
        if created > 0 {
            log::info!("Created sheet '{}'", sheet);
        }
        Ok(())
    }

    fn headers(&self, sheet: &str) -> AppResult<Vec<String>> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row("SELECT headers FROM sheets WHERE name = ?1", params![sheet], |row| row.get(0))
            .optional()?;
        let raw = raw.ok_or_else(|| AppError::StorageUnavailable(format!("sheet '{}' does not exist", sheet)))?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn rows(&self, sheet: &str) -> AppResult<Vec<(RowId, Row)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, cells FROM sheet_rows WHERE sheet = ?1 ORDER BY id")?;
        let raw = stmt.query_map(params![sheet], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

        let mut rows = Vec::new();
        for entry in raw {
            let (id, cells) = entry?;
            let cells = serde_json::from_str::<Row>(&cells).map_err(|e| {
                log::error!("Undecodable row {} in sheet '{}': {}", id, sheet, e);
                e
            })?;
            rows.push((id, cells));
        }
        Ok(rows)
    }

    fn append(&self, sheet: &str, row: &Row) -> AppResult<RowId> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sheet_rows (sheet, cells) VALUES (?1, ?2)",
            params![sheet, serde_json::to_string(row)?],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn replace(&self, sheet: &str, id: RowId, row: &Row) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE sheet_rows SET cells = ?1 WHERE id = ?2 AND sheet = ?3",
            params![serde_json::to_string(row)?, id, sheet],
        )?;
        Ok(())
    }

    fn remove(&self, sheet: &str, id: RowId) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM sheet_rows WHERE id = ?1 AND sheet = ?2", params![id, sheet])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::cell::Cell;

    #[test]
    fn test_ensure_sheet_keeps_first_headers() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.ensure_sheet("users", &["user_id".to_string()]).unwrap();
        backend
            .ensure_sheet("users", &["other".to_string(), "headers".to_string()])
            .unwrap();
        assert_eq!(backend.headers("users").unwrap(), vec!["user_id".to_string()]);
    }

    #[test]
    fn test_replace_keeps_storage_order() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.ensure_sheet("s", &[]).unwrap();
        let first = backend.append("s", &vec![Cell::Int(1)]).unwrap();
        backend.append("s", &vec![Cell::Int(2)]).unwrap();
        backend.replace("s", first, &vec![Cell::Int(10), Cell::from("x")]).unwrap();

        let rows: Vec<Row> = backend.rows("s").unwrap().into_iter().map(|(_, r)| r).collect();
        assert_eq!(rows, vec![vec![Cell::Int(10), Cell::from("x")], vec![Cell::Int(2)]]);
    }

    #[test]
    fn test_sheets_are_isolated() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.ensure_sheet("a", &[]).unwrap();
        backend.ensure_sheet("b", &[]).unwrap();
        backend.append("a", &vec![Cell::Int(1)]).unwrap();
        assert!(backend.rows("b").unwrap().is_empty());
    }

    #[test]
    fn test_undecodable_row_is_an_error() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.ensure_sheet("s", &[]).unwrap();
        backend.append("s", &vec![Cell::Int(1)]).unwrap();
        backend
            .conn()
            .unwrap()
            .execute("INSERT INTO sheet_rows (sheet, cells) VALUES ('s', 'not json')", [])
            .unwrap();
        assert!(matches!(backend.rows("s"), Err(AppError::Json(_))));
    }

    #[test]
    fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheets.sqlite");
        let path = path.to_str().unwrap();

        {
            let backend = SqliteBackend::open(path).unwrap();
            backend.ensure_sheet("s", &[]).unwrap();
            backend.append("s", &vec![Cell::from("kept")]).unwrap();
        }

        let backend = SqliteBackend::open(path).unwrap();
        let rows = backend.rows("s").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, vec![Cell::from("kept")]);
    }
}
