//! Execution log storage
//!
//! The tracker talks to storage through [`ExecutionStore`] so the fetch loop
//! does not care whether the log lives in memory or in DuckDB.

use super::types::{Execution, PageRecord};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Durable execution log
///
/// Keyed by execution id. Page records are append-only.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Insert a new parent record
    async fn insert_execution(&self, execution: &Execution) -> Result<()>;

    /// Overwrite an existing parent record
    async fn update_execution(&self, execution: &Execution) -> Result<()>;

    /// Fetch a parent record
    async fn get_execution(&self, execution_id: &str) -> Result<Option<Execution>>;

    /// List every parent record
    async fn list_executions(&self) -> Result<Vec<Execution>>;

    /// Append a page record; a duplicate page number is rejected
    async fn append_page(&self, page: &PageRecord) -> Result<()>;

    /// Page records of one execution ordered by page number
    async fn list_pages(&self, execution_id: &str) -> Result<Vec<PageRecord>>;
}

#[derive(Debug)]
struct ExecutionLog {
    execution: Execution,
    pages: Vec<PageRecord>,
}

/// In-memory execution log
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    logs: Arc<RwLock<HashMap<String, ExecutionLog>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of executions held
    pub async fn len(&self) -> usize {
        self.logs.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.logs.read().await.is_empty()
    }
}

#[async_trait]
impl ExecutionStore for MemoryStore {
    async fn insert_execution(&self, execution: &Execution) -> Result<()> {
        let mut logs = self.logs.write().await;
        if logs.contains_key(&execution.execution_id) {
            return Err(Error::log_write(format!(
                "execution '{}' already exists",
                execution.execution_id
            )));
        }
        logs.insert(
            execution.execution_id.clone(),
            ExecutionLog {
                execution: execution.clone(),
                pages: Vec::new(),
            },
        );
        Ok(())
    }

    async fn update_execution(&self, execution: &Execution) -> Result<()> {
        let mut logs = self.logs.write().await;
        let log = logs
            .get_mut(&execution.execution_id)
            .ok_or_else(|| Error::not_found(&execution.execution_id))?;
        log.execution = execution.clone();
        Ok(())
    }

    async fn get_execution(&self, execution_id: &str) -> Result<Option<Execution>> {
        let logs = self.logs.read().await;
        Ok(logs.get(execution_id).map(|log| log.execution.clone()))
    }

    async fn list_executions(&self) -> Result<Vec<Execution>> {
        let logs = self.logs.read().await;
        let mut executions: Vec<Execution> =
            logs.values().map(|log| log.execution.clone()).collect();
        executions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(executions)
    }

    async fn append_page(&self, page: &PageRecord) -> Result<()> {
        let mut logs = self.logs.write().await;
        let log = logs
            .get_mut(&page.execution_id)
            .ok_or_else(|| Error::not_found(&page.execution_id))?;

        if log.pages.iter().any(|p| p.page_number == page.page_number) {
            return Err(Error::log_write(format!(
                "page {} already recorded for '{}'",
                page.page_number, page.execution_id
            )));
        }

        log.pages.push(page.clone());
        log.pages.sort_by_key(|p| p.page_number);
        Ok(())
    }

    async fn list_pages(&self, execution_id: &str) -> Result<Vec<PageRecord>> {
        let logs = self.logs.read().await;
        Ok(logs
            .get(execution_id)
            .map(|log| log.pages.clone())
            .unwrap_or_default())
    }
}
