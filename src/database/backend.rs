//! Storage backend selection

use super::engine::Database;
use super::sink::DuckDbItemSink;
use super::store::DuckDbExecutionStore;
use crate::config::StoreSettings;
use crate::error::Result;
use crate::persist::{ItemSink, MemoryItemSink};
use crate::tracker::ExecutionTracker;
use std::sync::Arc;

/// Execution log and item sink sharing one storage location
#[derive(Clone)]
pub struct Backend {
    pub tracker: ExecutionTracker,
    pub sink: Arc<dyn ItemSink>,
}

impl Backend {
    /// Open the configured store: DuckDB when a path is set, memory otherwise
    pub fn open(settings: &StoreSettings) -> Result<Self> {
        match settings.path {
            Some(ref path) => Ok(Self::duckdb(Database::open(path)?)),
            None => Ok(Self::in_memory()),
        }
    }

    /// Backend over an open DuckDB database
    pub fn duckdb(db: Database) -> Self {
        Self {
            tracker: ExecutionTracker::new(Arc::new(DuckDbExecutionStore::new(db.clone()))),
            sink: Arc::new(DuckDbItemSink::new(db)),
        }
    }

    /// Volatile backend for tests and one-off runs
    pub fn in_memory() -> Self {
        Self {
            tracker: ExecutionTracker::in_memory(),
            sink: Arc::new(MemoryItemSink::new()),
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
