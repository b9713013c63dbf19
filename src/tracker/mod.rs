//! Execution tracking module
//!
//! Durable audit trail for executions: one parent record per submission plus
//! one append-only record per fetched page. Callers poll it for progress.
//!
//! # Overview
//!
//! The tracker module provides:
//! - `ExecutionTracker` - status transitions, page appends, completion checks
//! - `ExecutionStore` - storage seam (in-memory here, DuckDB in `database`)
//! - `Execution` / `PageRecord` - the log entries

mod manager;
mod store;
mod types;

pub use manager::{active_window, ExecutionTracker};
pub use store::{ExecutionStore, MemoryStore};
pub use types::{
    ActiveExecution, Execution, ExecutionMeta, ExecutionStatus, PageRecord, PageStatus,
};
