//! DuckDB connection
//!
//! One connection per engine, guarded by a mutex. DuckDB calls block, so every
//! access runs on the blocking thread pool.

use crate::error::{Error, Result, ResultExt};
use duckdb::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const MIGRATIONS: &str = r"
CREATE TABLE IF NOT EXISTS execution_log (
    execution_id VARCHAR NOT NULL,
    record_id    VARCHAR NOT NULL,
    record_type  VARCHAR NOT NULL,
    page_number  BIGINT,
    status       VARCHAR NOT NULL,
    updated_at   VARCHAR NOT NULL,
    payload      VARCHAR NOT NULL,
    PRIMARY KEY (execution_id, record_id)
);

CREATE TABLE IF NOT EXISTS items (
    table_name   VARCHAR NOT NULL,
    item_id      VARCHAR NOT NULL,
    execution_id VARCHAR NOT NULL,
    page_number  BIGINT NOT NULL,
    position     BIGINT NOT NULL,
    source_id    VARCHAR,
    persisted_at VARCHAR NOT NULL,
    payload      VARCHAR NOT NULL,
    PRIMARY KEY (table_name, item_id)
);
";

/// Shared DuckDB handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory '{}'", parent.display()))?;
        }

        let conn = Connection::open(path).map_err(|e| {
            Error::store(format!("Failed to open DuckDB at '{}': {e}", path.display()))
        })?;
        info!(path = %path.display(), "Opened DuckDB store");
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("Failed to create DuckDB connection: {e}")))?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(MIGRATIONS)
            .map_err(|e| Error::store(format!("Failed to run migrations: {e}")))?;
        debug!("DuckDB schema ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Database file, `None` for in-memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run a closure against the connection on the blocking pool
    pub(crate) async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| Error::store("DuckDB connection lock poisoned"))?;
            f(&guard)
        })
        .await
        .map_err(|e| Error::store(format!("DuckDB task failed: {e}")))?
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
