//! Execution log types
//!
//! The log holds one parent [`Execution`] record per submission and one
//! append-only [`PageRecord`] per fetched page.

use crate::pagination::PaginationType;
use crate::types::Method;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lifecycle of an execution
///
/// Ordered: a status never moves back to an earlier variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionStatus {
    /// Record created, fetch loop not yet entered
    Initialized,
    /// Fetch loop running
    InProgress,
    /// Terminated normally
    Completed,
    /// Terminated by a failure
    Error,
}

impl ExecutionStatus {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Parse a wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initialized" => Some(Self::Initialized),
            "inProgress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Check if no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Check whether `next` is a legal transition from this status
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initialized, Self::InProgress)
                | (Self::Initialized, Self::Error)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Error)
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission metadata used to open an execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMeta {
    /// HTTP method
    pub method: Method,
    /// Initial request URL
    pub target_url: String,
    /// Iteration bound
    pub max_iterations: u32,
    /// Whether items are persisted
    pub persist: bool,
    /// Sink table when persisting
    pub table_name: Option<String>,
}

/// Parent record of one execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub execution_id: String,
    pub method: Method,
    pub target_url: String,
    pub max_iterations: u32,
    pub persist: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub status: ExecutionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Final status detail (totals, persistence counters, error)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl Execution {
    /// Create a fresh `Initialized` record
    pub fn new(execution_id: impl Into<String>, meta: ExecutionMeta) -> Self {
        let now = Utc::now();
        Self {
            execution_id: execution_id.into(),
            method: meta.method,
            target_url: meta.target_url,
            max_iterations: meta.max_iterations,
            persist: meta.persist,
            table_name: meta.table_name,
            status: ExecutionStatus::Initialized,
            created_at: now,
            updated_at: now,
            detail: None,
        }
    }
}

/// Outcome of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageStatus {
    /// Page fetched and aggregated
    Success,
    /// Page ended the execution with a failure
    Error,
}

/// Append-only audit entry for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub execution_id: String,
    /// 1-based, contiguous per execution
    pub page_number: u32,
    pub items_in_page: usize,
    /// Cumulative item count including this page
    pub total_items_processed: usize,
    pub request_url: String,
    /// Absent when the target never answered
    #[serde(default)]
    pub response_status: Option<u16>,
    pub pagination_type: PaginationType,
    pub status: PageStatus,
    pub timestamp: DateTime<Utc>,
    pub is_last: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl PageRecord {
    /// Record for a successfully fetched page
    pub fn success(
        execution_id: impl Into<String>,
        page_number: u32,
        request_url: impl Into<String>,
        response_status: u16,
        pagination_type: PaginationType,
        items_in_page: usize,
        total_items_processed: usize,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            page_number,
            items_in_page,
            total_items_processed,
            request_url: request_url.into(),
            response_status: Some(response_status),
            pagination_type,
            status: PageStatus::Success,
            timestamp: Utc::now(),
            is_last: false,
            error: None,
        }
    }

    /// Record for a page that terminated the execution with a failure
    pub fn failure(
        execution_id: impl Into<String>,
        page_number: u32,
        request_url: impl Into<String>,
        response_status: Option<u16>,
        pagination_type: PaginationType,
        total_items_processed: usize,
        error: Value,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            page_number,
            items_in_page: 0,
            total_items_processed,
            request_url: request_url.into(),
            response_status,
            pagination_type,
            status: PageStatus::Error,
            timestamp: Utc::now(),
            is_last: true,
            error: Some(error),
        }
    }

    /// Mark this record as the final one
    #[must_use]
    pub fn last(mut self) -> Self {
        self.is_last = true;
        self
    }
}

/// Execution listed by the active-executions view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveExecution {
    #[serde(flatten)]
    pub execution: Execution,
    pub pages_fetched: usize,
    pub last_activity: DateTime<Utc>,
}
