//! Durable storage via DuckDB
//!
//! This module provides the DuckDB-backed execution log and item store.
//! Both share one [`Database`] handle, so a single file holds everything an
//! engine has recorded.

mod backend;
mod engine;
mod sink;
mod store;

pub use backend::Backend;
pub use engine::Database;
pub use sink::DuckDbItemSink;
pub use store::DuckDbExecutionStore;

#[cfg(test)]
mod tests;
