//! Engine configuration
//!
//! All settings are loaded from an optional YAML file. Every field has a
//! default so an empty document (or no file at all) yields a working engine.
//!
//! ```yaml
//! server:
//!   port: 5000
//! store:
//!   path: "./pagewalk.duckdb"
//! runner:
//!   default_max_iterations: 10
//!   rate_limit_backoff_ms: 5000
//! persistence:
//!   batch_size: 5
//! ```

use crate::error::{Error, Result};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Execution log / item store settings
    #[serde(default)]
    pub store: StoreSettings,

    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Fetch loop settings
    #[serde(default)]
    pub runner: RunnerSettings,

    /// Item persistence settings
    #[serde(default)]
    pub persistence: PersistenceSettings,

    /// Item extraction settings
    #[serde(default)]
    pub aggregation: AggregationSettings,

    /// Execution tracking settings
    #[serde(default)]
    pub tracking: TrackingSettings,
}

impl EngineConfig {
    /// Parse a config from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_yaml(&contents)
    }

    /// Load from a file if given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.runner.default_max_iterations == 0 {
            return Err(Error::config("runner.default_max_iterations must be positive"));
        }
        if self.persistence.batch_size == 0 {
            return Err(Error::config("persistence.batch_size must be positive"));
        }
        if self.persistence.concurrency == 0 {
            return Err(Error::config("persistence.concurrency must be positive"));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::config("http.timeout_secs must be positive"));
        }
        if self.http.rate_limit_rps == Some(0) {
            return Err(Error::config("http.rate_limit_rps must be positive when set"));
        }
        if let Err(e) = crate::tracker::active_window(self.tracking.active_window_hours) {
            return Err(Error::config(format!("tracking.active_window_hours: {e}")));
        }
        Ok(())
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

// ============================================================================
// Store
// ============================================================================

/// Execution log / item store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// DuckDB database file. When absent the engine keeps everything in memory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ============================================================================
// HTTP
// ============================================================================

/// Outbound HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-attempt request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent sent to target APIs
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional outbound request budget shared by all executions
    #[serde(default)]
    pub rate_limit_rps: Option<u32>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            rate_limit_rps: None,
        }
    }
}

impl HttpSettings {
    /// Timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("pagewalk/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Runner
// ============================================================================

/// Fetch loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSettings {
    /// Iteration bound used when a submission does not specify one
    #[serde(default = "default_max_iterations")]
    pub default_max_iterations: u32,

    /// Fixed wait before retrying a rate-limited page
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,

    /// Consecutive rate-limited answers tolerated before the execution errors
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,

    /// Retries for transient 5xx answers
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff strategy for transient 5xx answers
    #[serde(default)]
    pub backoff_type: BackoffType,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            default_max_iterations: default_max_iterations(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            max_retries: default_max_retries(),
            backoff_type: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_max_iterations() -> u32 {
    10
}

fn default_rate_limit_backoff_ms() -> u64 {
    5_000
}

fn default_max_rate_limit_retries() -> u32 {
    5
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

// ============================================================================
// Persistence
// ============================================================================

/// Item persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// Number of items per write batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent writes within one batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_batch_size() -> usize {
    5
}

fn default_concurrency() -> usize {
    5
}

// ============================================================================
// Aggregation
// ============================================================================

/// Item extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationSettings {
    /// Domain-specific collection fields tried after `data` and `items`
    #[serde(default = "default_collection_fields")]
    pub collection_fields: Vec<String>,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            collection_fields: default_collection_fields(),
        }
    }
}

fn default_collection_fields() -> Vec<String> {
    vec!["orders".to_string()]
}

// ============================================================================
// Tracking
// ============================================================================

/// Execution tracking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSettings {
    /// Window used by the active-executions listing
    #[serde(default = "default_active_window_hours")]
    pub active_window_hours: i64,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            active_window_hours: default_active_window_hours(),
        }
    }
}

fn default_active_window_hours() -> i64 {
    24
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.server.port, 5000);
        assert!(config.store.path.is_none());
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.runner.default_max_iterations, 10);
        assert_eq!(config.runner.max_rate_limit_retries, 5);
        assert_eq!(config.persistence.batch_size, 5);
        assert_eq!(config.aggregation.collection_fields, vec!["orders"]);
        assert_eq!(config.tracking.active_window_hours, 24);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = EngineConfig::from_yaml("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.runner.backoff_type, BackoffType::Exponential);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
server:
  port: 8080
store:
  path: "/tmp/pagewalk.duckdb"
runner:
  default_max_iterations: 25
  backoff_type: constant
aggregation:
  collection_fields: [orders, results]
"#;

        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.store.path,
            Some(PathBuf::from("/tmp/pagewalk.duckdb"))
        );
        assert_eq!(config.runner.default_max_iterations, 25);
        assert_eq!(config.runner.backoff_type, BackoffType::Constant);
        assert_eq!(config.runner.rate_limit_backoff_ms, 5_000);
        assert_eq!(config.aggregation.collection_fields, vec!["orders", "results"]);
    }

    #[test]
    fn test_validation_rejects_zero_batch() {
        let yaml = r#"
persistence:
  batch_size: 0
"#;
        let err = EngineConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_validation_rejects_zero_rate_limit() {
        let yaml = r#"
http:
  rate_limit_rps: 0
"#;
        assert!(EngineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_active_window() {
        for hours in ["0", "-3", "10000000000000"] {
            let yaml = format!("tracking:\n  active_window_hours: {hours}\n");
            let err = EngineConfig::from_yaml(&yaml).unwrap_err();
            assert!(err.to_string().contains("active_window_hours"));
        }
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagewalk.yaml");
        std::fs::write(&path, "tracking:\n  active_window_hours: 6\n").unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.tracking.active_window_hours, 6);

        let missing = EngineConfig::from_file(dir.path().join("missing.yaml"));
        assert!(missing.is_err());
    }
}
