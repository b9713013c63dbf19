//! Execution tracker
//!
//! Owns status transitions and page appends on top of an [`ExecutionStore`].

use super::store::{ExecutionStore, MemoryStore};
use super::types::{ActiveExecution, Execution, ExecutionMeta, ExecutionStatus, PageRecord};
use crate::error::{Error, Result};
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Convert a window in hours into a duration for [`ExecutionTracker::list_active`]
///
/// Rejects non-positive windows and windows reaching before the representable
/// time range.
pub fn active_window(hours: i64) -> Result<Duration> {
    if hours <= 0 {
        return Err(Error::validation(format!(
            "Active window must be a positive number of hours, got {hours}"
        )));
    }

    Duration::try_hours(hours)
        .filter(|window| Utc::now().checked_sub_signed(*window).is_some())
        .ok_or_else(|| Error::validation(format!("Active window of {hours}h is out of range")))
}

/// Audit and state component for executions
#[derive(Clone)]
pub struct ExecutionTracker {
    store: Arc<dyn ExecutionStore>,
}

impl ExecutionTracker {
    /// Create a tracker over the given store
    pub fn new(store: Arc<dyn ExecutionStore>) -> Self {
        Self { store }
    }

    /// Create a tracker backed by an in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn ExecutionStore> {
        &self.store
    }

    /// Create the parent record in `Initialized` and return its id
    pub async fn start(&self, meta: ExecutionMeta) -> Result<String> {
        let execution_id = Uuid::new_v4().to_string();
        let execution = Execution::new(&execution_id, meta);
        self.store.insert_execution(&execution).await?;
        debug!(execution_id = %execution_id, "Execution initialized");
        Ok(execution_id)
    }

    /// Fetch the parent record
    pub async fn get(&self, execution_id: &str) -> Result<Option<Execution>> {
        self.store.get_execution(execution_id).await
    }

    /// `Initialized -> InProgress`
    pub async fn mark_in_progress(&self, execution_id: &str) -> Result<Execution> {
        self.transition(execution_id, ExecutionStatus::InProgress, None)
            .await
    }

    /// `InProgress -> Completed`
    pub async fn mark_completed(
        &self,
        execution_id: &str,
        detail: Option<Value>,
    ) -> Result<Execution> {
        self.transition(execution_id, ExecutionStatus::Completed, detail)
            .await
    }

    /// `Initialized | InProgress -> Error`
    pub async fn mark_error(&self, execution_id: &str, detail: Option<Value>) -> Result<Execution> {
        self.transition(execution_id, ExecutionStatus::Error, detail)
            .await
    }

    async fn transition(
        &self,
        execution_id: &str,
        next: ExecutionStatus,
        detail: Option<Value>,
    ) -> Result<Execution> {
        let mut execution = self
            .store
            .get_execution(execution_id)
            .await?
            .ok_or_else(|| Error::not_found(execution_id))?;

        if !execution.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                execution_id: execution_id.to_string(),
                from: execution.status.to_string(),
                to: next.to_string(),
            });
        }

        execution.status = next;
        execution.updated_at = Utc::now();
        if detail.is_some() {
            execution.detail = detail;
        }

        self.store.update_execution(&execution).await?;
        debug!(execution_id = %execution_id, status = %next, "Execution status changed");
        Ok(execution)
    }

    /// Append a page record
    pub async fn append_page(&self, page: &PageRecord) -> Result<()> {
        self.store.append_page(page).await
    }

    /// Page records ordered by page number
    pub async fn list_pages(&self, execution_id: &str) -> Result<Vec<PageRecord>> {
        let mut pages = self.store.list_pages(execution_id).await?;
        pages.sort_by_key(|p| p.page_number);
        Ok(pages)
    }

    /// True once the execution is terminal and its last page is recorded
    ///
    /// Pages are only written after their outcome is known, so every stored
    /// page already carries a terminal page status.
    pub async fn is_fully_complete(&self, execution_id: &str) -> Result<bool> {
        let Some(execution) = self.store.get_execution(execution_id).await? else {
            return Ok(false);
        };
        if !execution.status.is_terminal() {
            return Ok(false);
        }

        let pages = self.store.list_pages(execution_id).await?;
        Ok(pages.iter().any(|p| p.is_last))
    }

    /// Page records for a poller
    ///
    /// `None` when the execution is unknown or already fully complete, so a
    /// simple poller can stop on a not-found answer.
    pub async fn poll(&self, execution_id: &str) -> Result<Option<Vec<PageRecord>>> {
        if self.store.get_execution(execution_id).await?.is_none()
            || self.is_fully_complete(execution_id).await?
        {
            return Ok(None);
        }
        self.list_pages(execution_id).await.map(Some)
    }

    /// Non-terminal executions with log activity inside `window`
    pub async fn list_active(&self, window: Duration) -> Result<Vec<ActiveExecution>> {
        let cutoff = Utc::now()
            .checked_sub_signed(window)
            .ok_or_else(|| Error::validation("Active window is out of range"))?;
        let mut active = Vec::new();

        for execution in self.store.list_executions().await? {
            if execution.status.is_terminal() {
                continue;
            }

            let pages = self.store.list_pages(&execution.execution_id).await?;
            let last_activity = pages
                .iter()
                .map(|p| p.timestamp)
                .chain(std::iter::once(execution.updated_at))
                .max()
                .unwrap_or(execution.updated_at);

            if last_activity >= cutoff {
                active.push(ActiveExecution {
                    pages_fetched: pages.len(),
                    last_activity,
                    execution,
                });
            }
        }

        active.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(active)
    }
}

impl std::fmt::Debug for ExecutionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionTracker").finish_non_exhaustive()
    }
}
