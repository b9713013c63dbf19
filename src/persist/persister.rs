//! Item persister
//!
//! Writes one page of items in fixed-size batches. Items inside a batch are
//! written concurrently; batches run one after another and are all awaited
//! before `persist` returns.

use super::sink::ItemSink;
use super::types::{PersistReport, PersistedItem, Provenance};
use crate::config::PersistenceSettings;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Batched writer in front of an [`ItemSink`]
#[derive(Clone)]
pub struct ItemPersister {
    sink: Arc<dyn ItemSink>,
    batch_size: usize,
    concurrency: usize,
}

impl ItemPersister {
    /// Create a persister with default batch settings
    pub fn new(sink: Arc<dyn ItemSink>) -> Self {
        Self::with_settings(sink, &PersistenceSettings::default())
    }

    /// Create a persister from persistence settings
    pub fn with_settings(sink: Arc<dyn ItemSink>, settings: &PersistenceSettings) -> Self {
        Self {
            sink,
            batch_size: settings.batch_size.max(1),
            concurrency: settings.concurrency.max(1),
        }
    }

    /// Items per batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Persist one page of items
    ///
    /// Never fails as a whole: a failed item is counted in the report and
    /// the remaining items are still written.
    pub async fn persist(
        &self,
        table: &str,
        items: &[Value],
        provenance: &Provenance,
    ) -> PersistReport {
        let mut report = PersistReport::default();

        for (batch_index, batch) in items.chunks(self.batch_size).enumerate() {
            let offset = batch_index * self.batch_size;
            let wrapped: Vec<PersistedItem> = batch
                .iter()
                .enumerate()
                .map(|(i, item)| PersistedItem::wrap(item.clone(), provenance, offset + i))
                .collect();

            let results: Vec<(String, crate::Result<()>)> = stream::iter(wrapped)
                .map(|item| {
                    let sink = Arc::clone(&self.sink);
                    async move {
                        let result = sink.put(table, &item).await;
                        (item.item_id, result)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            for (item_id, result) in results {
                report.attempted += 1;
                match result {
                    Ok(()) => report.persisted += 1,
                    Err(e) => {
                        warn!(
                            execution_id = %provenance.execution_id,
                            page = provenance.page_number,
                            table = %table,
                            item_id = %item_id,
                            error = %e,
                            "Failed to persist item"
                        );
                        report.failed += 1;
                        report.errors.push(format!("{item_id}: {e}"));
                    }
                }
            }
        }

        debug!(
            execution_id = %provenance.execution_id,
            page = provenance.page_number,
            persisted = report.persisted,
            failed = report.failed,
            "Page persisted"
        );
        report
    }
}

impl std::fmt::Debug for ItemPersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemPersister")
            .field("batch_size", &self.batch_size)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}
