//! Error types for pagewalk
//!
//! This module defines the error hierarchy for the engine.
//! Outcomes reported by the target API (auth failures, rate limits, 4xx/5xx)
//! are modelled as `FetchOutcome` variants by the fetcher; the variants here
//! describe them once they have to leave the fetch loop.

use thiserror::Error;

/// The main error type for pagewalk
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Submission Errors
    // ============================================================================
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Target API Errors
    // ============================================================================
    #[error("Authentication failed with HTTP {status}")]
    Auth { status: u16 },

    #[error("Rate limited after {attempts} consecutive attempts")]
    RateLimited { attempts: u32 },

    #[error("Target API returned HTTP {status}")]
    TargetApi { status: u16 },

    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Execution Log Errors
    // ============================================================================
    #[error("Execution '{execution_id}' not found")]
    ExecutionNotFound { execution_id: String },

    #[error("Invalid status transition for '{execution_id}': {from} -> {to}")]
    InvalidTransition {
        execution_id: String,
        from: String,
        to: String,
    },

    #[error("Failed to write execution log: {message}")]
    LogWrite { message: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("DuckDB error: {0}")]
    Duckdb(#[from] duckdb::Error),

    // ============================================================================
    // Persistence Errors
    // ============================================================================
    #[error("Failed to persist item '{item_id}' into '{table}': {message}")]
    Persistence {
        table: String,
        item_id: String,
        message: String,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Create a not-found error for an execution
    pub fn not_found(execution_id: impl Into<String>) -> Self {
        Self::ExecutionNotFound {
            execution_id: execution_id.into(),
        }
    }

    /// Create a log write error
    pub fn log_write(message: impl Into<String>) -> Self {
        Self::LogWrite {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(
        table: impl Into<String>,
        item_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Persistence {
            table: table.into(),
            item_id: item_id.into(),
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. } | Error::MissingField { .. } | Error::InvalidUrl(_)
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited { .. } => true,
            Error::TargetApi { status } => is_retryable_status(*status),
            Error::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is a transient server error
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 500 | 502 | 503 | 504)
}

/// Result type alias for pagewalk
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
