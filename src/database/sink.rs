//! DuckDB item sink

use super::engine::Database;
use crate::error::{Error, Result};
use crate::persist::{ItemSink, PersistedItem};
use async_trait::async_trait;
use duckdb::params;
use serde_json::Value;

/// [`ItemSink`] writing into the `items` table
///
/// Rows are keyed by `(table_name, item_id)`; a rewrite of the same item
/// replaces the previous row.
#[derive(Debug, Clone)]
pub struct DuckDbItemSink {
    db: Database,
}

impl DuckDbItemSink {
    /// Create a sink over an open database
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Number of items stored under a table name
    pub async fn count(&self, table: &str) -> Result<usize> {
        let table = table.to_string();
        self.db
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM items WHERE table_name = ?",
                    params![table],
                    |row| row.get(0),
                )?;
                Ok(usize::try_from(count).unwrap_or_default())
            })
            .await
    }

    /// Payloads stored under a table name ordered by page and position
    pub async fn payloads(&self, table: &str) -> Result<Vec<Value>> {
        let table = table.to_string();
        let raw = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT payload FROM items WHERE table_name = ?
                     ORDER BY page_number, position",
                )?;
                let rows = stmt
                    .query_map(params![table], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        raw.iter()
            .map(|p| serde_json::from_str(p).map_err(Error::from))
            .collect()
    }
}

#[async_trait]
impl ItemSink for DuckDbItemSink {
    async fn put(&self, table: &str, item: &PersistedItem) -> Result<()> {
        let table = table.to_string();
        let item_id = item.item_id.clone();
        let execution_id = item.execution_id.clone();
        let page_number = i64::from(item.page_number);
        let position = i64::try_from(item.position).unwrap_or(i64::MAX);
        let source_id = item.source_id.clone();
        let persisted_at = item.persisted_at.to_rfc3339();
        let payload = serde_json::to_string(&item.payload)?;

        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO items
                        (table_name, item_id, execution_id, page_number, position, source_id, persisted_at, payload)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        table,
                        item_id,
                        execution_id,
                        page_number,
                        position,
                        source_id,
                        persisted_at,
                        payload
                    ],
                )
                .map_err(|e| Error::persistence(&table, &item_id, e.to_string()))?;
                Ok(())
            })
            .await
    }
}
