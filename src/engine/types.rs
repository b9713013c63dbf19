//! Engine types
//!
//! Submission, acknowledgement and per-execution state for the runner.

use crate::error::{Error, Result};
use crate::pagination::{with_query_param, PaginationType};
use crate::persist::PersistReport;
use crate::tracker::{ExecutionMeta, ExecutionStatus};
use crate::types::{JsonObject, Method, OptionStringExt, StringMap};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use url::Url;

// ============================================================================
// Submission
// ============================================================================

/// Paginated execution request as submitted by a caller
///
/// Every field is optional at the wire level so missing fields surface as
/// validation errors instead of deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: StringMap,
    #[serde(default)]
    pub body: Option<Value>,
    /// Merged into the initial URL only
    #[serde(default)]
    pub query_params: JsonObject,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub persist: bool,
    #[serde(default)]
    pub sink_table: Option<String>,
}

impl ExecutionRequest {
    /// Create a request for a method and URL
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Parse a raw JSON submission
    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::validation(format!("Malformed execution request: {e}")))
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Set the request body
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the iteration bound
    #[must_use]
    pub fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Persist aggregated items into `table`
    #[must_use]
    pub fn persist_to(mut self, table: impl Into<String>) -> Self {
        self.persist = true;
        self.sink_table = Some(table.into());
        self
    }

    /// Validate the request and resolve it into an execution plan
    pub fn into_plan(self, default_max_iterations: u32) -> Result<ExecutionPlan> {
        let method: Method = self
            .method
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("method"))?
            .parse()
            .map_err(Error::validation)?;

        let raw_url = self
            .url
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("url"))?;
        let mut url = Url::parse(raw_url.trim())
            .map_err(|e| Error::validation(format!("Invalid url '{raw_url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation(format!(
                "Unsupported url scheme '{}'",
                url.scheme()
            )));
        }

        for (key, value) in &self.query_params {
            let value = query_value(key, value)?;
            url = with_query_param(&url, key, &value);
        }

        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::validation(format!("Invalid header name '{name}'")))?;
            HeaderValue::from_str(value)
                .map_err(|_| Error::validation(format!("Invalid value for header '{name}'")))?;
        }

        let max_iterations = match self.max_iterations {
            Some(0) => return Err(Error::validation("maxIterations must be positive")),
            Some(n) => n,
            None => default_max_iterations,
        };

        let sink_table = match (self.persist, self.sink_table.none_if_empty()) {
            (true, None) => return Err(Error::missing_field("sinkTable")),
            (true, Some(table)) => Some(table),
            (false, _) => None,
        };

        Ok(ExecutionPlan {
            method,
            url,
            headers: self.headers,
            body: self.body,
            max_iterations,
            sink_table,
        })
    }
}

fn query_value(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::validation(format!(
            "Query parameter '{key}' must be a string, number or boolean"
        ))),
    }
}

/// Validated, owned copy of a submission handed to the background task
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub method: Method,
    /// Initial URL with submission query parameters applied
    pub url: Url,
    pub headers: StringMap,
    pub body: Option<Value>,
    pub max_iterations: u32,
    /// Set when items are persisted
    pub sink_table: Option<String>,
}

impl ExecutionPlan {
    /// Metadata for the parent log record
    pub fn meta(&self) -> ExecutionMeta {
        ExecutionMeta {
            method: self.method,
            target_url: self.url.to_string(),
            max_iterations: self.max_iterations,
            persist: self.sink_table.is_some(),
            table_name: self.sink_table.clone(),
        }
    }
}

/// Synchronous answer to a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgement {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub method: Method,
    pub url: String,
    pub max_iterations: u32,
    pub timestamp: DateTime<Utc>,
}

impl Acknowledgement {
    /// Acknowledge a freshly initialized execution
    pub fn new(execution_id: impl Into<String>, plan: &ExecutionPlan) -> Self {
        Self {
            execution_id: execution_id.into(),
            status: ExecutionStatus::Initialized,
            method: plan.method,
            url: plan.url.to_string(),
            max_iterations: plan.max_iterations,
            timestamp: Utc::now(),
        }
    }
}

/// Accepted execution with its background task
#[derive(Debug)]
pub struct SubmittedExecution {
    pub acknowledgement: Acknowledgement,
    pub handle: JoinHandle<ExecutionOutcome>,
}

// ============================================================================
// Per-Execution State
// ============================================================================

/// Loop state owned by one execution
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub execution_id: String,
    /// URL of the next page to fetch
    pub current_url: Url,
    /// Pages recorded so far
    pub pages: u32,
    /// Fixed after the first page
    pub pagination_type: Option<PaginationType>,
    pub items: Vec<Value>,
    pub persistence: Option<PersistReport>,
}

impl ExecutionContext {
    /// Start state for an execution
    pub fn new(execution_id: impl Into<String>, plan: &ExecutionPlan) -> Self {
        Self {
            execution_id: execution_id.into(),
            current_url: plan.url.clone(),
            pages: 0,
            pagination_type: None,
            items: Vec::new(),
            persistence: plan.sink_table.as_ref().map(|_| PersistReport::default()),
        }
    }

    /// Detected type, `none` before the first page
    pub fn pagination_type(&self) -> PaginationType {
        self.pagination_type.unwrap_or_default()
    }

    /// Items aggregated so far
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Final status detail stored on the parent record
    pub fn summary(&self, error: Option<&Value>) -> Value {
        let mut summary = json!({
            "totalPages": self.pages,
            "totalItems": self.total_items(),
            "paginationType": self.pagination_type(),
        });
        if let Some(ref report) = self.persistence {
            summary["persistence"] = json!(report);
        }
        if let Some(error) = error {
            summary["error"] = error.clone();
        }
        summary
    }
}

/// Result of a finished execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub pages: u32,
    pub total_items: usize,
    pub pagination_type: PaginationType,
    pub items: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence: Option<PersistReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl ExecutionOutcome {
    /// Build the outcome from the final loop state
    pub fn from_context(
        context: ExecutionContext,
        status: ExecutionStatus,
        error: Option<Value>,
    ) -> Self {
        Self {
            status,
            pages: context.pages,
            total_items: context.items.len(),
            pagination_type: context.pagination_type(),
            execution_id: context.execution_id,
            items: context.items,
            persistence: context.persistence,
            error,
        }
    }

    /// Check if the execution completed normally
    pub fn is_completed(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }
}
