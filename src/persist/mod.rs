//! Item persistence
//!
//! Optional stage of the fetch loop: each page's items are wrapped with
//! provenance metadata and written to an [`ItemSink`] in bounded batches.
//! Per-item failures are counted, never raised.

mod persister;
mod sink;
mod types;

pub use persister::ItemPersister;
pub use sink::{ItemSink, MemoryItemSink};
pub use types::{PersistReport, PersistedItem, Provenance};
