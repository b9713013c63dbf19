//! Item sinks

use super::types::PersistedItem;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Durable destination for persisted items
///
/// Writes are idempotent by `(table, item_id)`.
#[async_trait]
pub trait ItemSink: Send + Sync {
    /// Write one item into a table
    async fn put(&self, table: &str, item: &PersistedItem) -> Result<()>;
}

/// In-memory item sink
#[derive(Debug, Clone, Default)]
pub struct MemoryItemSink {
    tables: Arc<RwLock<HashMap<String, HashMap<String, PersistedItem>>>>,
}

impl MemoryItemSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Items of one table ordered by page and position
    pub async fn items(&self, table: &str) -> Vec<PersistedItem> {
        let tables = self.tables.read().await;
        let mut items: Vec<PersistedItem> = tables
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default();
        items.sort_by_key(|i| (i.page_number, i.position));
        items
    }

    /// Number of items in one table
    pub async fn count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl ItemSink for MemoryItemSink {
    async fn put(&self, table: &str, item: &PersistedItem) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .entry(table.to_string())
            .or_default()
            .insert(item.item_id.clone(), item.clone());
        Ok(())
    }
}
