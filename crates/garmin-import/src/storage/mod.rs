//! Storage layer for imported Garmin data
//!
//! A single SQLite file holds every destination relation:
//!
//! ```text
//! ~/.local/share/garmin/
//! └── garmin.db
//!     ├── users
//!     ├── daily_health_metrics
//!     ├── sleep_sessions
//!     ├── body_composition
//!     └── activities
//! ```
//!
//! The importer is the only writer. All writes go through [`upsert`], so the
//! same bundle can be imported any number of times.

mod upsert;

pub use upsert::{upsert, upsert_statement, MergeRule, UpsertRow};

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Params, Row};

use crate::db::schema;
use crate::error::{ImportError, Result};

/// How long SQLite waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection to the destination store
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the database and bring its schema up to date
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            crate::config::ensure_dir(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| ImportError::Database(format!("Failed to open {}: {}", path.display(), e)))?;

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ImportError::Database(format!("Failed to open in-memory database: {}", e)))?;

        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        schema::migrate(&conn)?;
        Ok(Self { conn, path })
    }

    /// Release the connection, surfacing any error SQLite reports on close
    pub fn close(self) -> Result<()> {
        let label = self.label();
        self.conn.close().map_err(|(_, e)| {
            ImportError::Database(format!("Failed to close {}: {}", label, e))
        })?;
        tracing::debug!(database = %label, "database connection closed");
        Ok(())
    }

    /// Human-readable location for logs
    pub fn label(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string())
    }

    /// Execute a parameterized statement, returning the affected row count
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Run a query expected to return exactly one row
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        Ok(self.conn.query_row(sql, params, f)?)
    }

    /// Insert or update one normalized row
    pub fn upsert<R: UpsertRow>(&self, row: &R) -> Result<()> {
        upsert(&self.conn, row)
    }

    /// Count rows in a table
    pub fn count(&self, table: &str) -> Result<i64> {
        self.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
    }
}
