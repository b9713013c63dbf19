//! Persistence types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a batch of items came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Originating execution
    pub execution_id: String,
    /// 1-based page the items were read from
    pub page_number: u32,
}

impl Provenance {
    /// Create provenance for one page
    pub fn new(execution_id: impl Into<String>, page_number: u32) -> Self {
        Self {
            execution_id: execution_id.into(),
            page_number,
        }
    }
}

/// One item as written to the item store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedItem {
    /// Stable identifier; writes with the same id overwrite each other
    pub item_id: String,
    pub execution_id: String,
    pub page_number: u32,
    /// 0-based position within the page
    pub position: usize,
    /// The item's own `id`, if it had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub persisted_at: DateTime<Utc>,
    /// Item as returned by the target API
    pub payload: Value,
}

impl PersistedItem {
    /// Wrap an item with provenance metadata
    ///
    /// The item's own `id` (string or number) becomes the item id. Items
    /// without one get `{execution}_{page}_{position}`.
    pub fn wrap(payload: Value, provenance: &Provenance, position: usize) -> Self {
        let source_id = source_id(&payload);
        let item_id = source_id.clone().unwrap_or_else(|| {
            format!(
                "{}_{}_{}",
                provenance.execution_id, provenance.page_number, position
            )
        });

        Self {
            item_id,
            execution_id: provenance.execution_id.clone(),
            page_number: provenance.page_number,
            position,
            source_id,
            persisted_at: Utc::now(),
            payload,
        }
    }
}

fn source_id(payload: &Value) -> Option<String> {
    match payload.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Counters for one or more persistence calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistReport {
    pub attempted: usize,
    pub persisted: usize,
    pub failed: usize,
    /// One message per failed item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl PersistReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: PersistReport) {
        self.attempted += other.attempted;
        self.persisted += other.persisted;
        self.failed += other.failed;
        self.errors.extend(other.errors);
    }

    /// Check if every attempted item was written
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
