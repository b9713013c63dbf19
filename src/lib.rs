// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # pagewalk
//!
//! A paginated request execution engine. Submit one HTTP request against an
//! arbitrary REST API; pagewalk detects how that API paginates, walks every
//! page in the background and keeps an append-only log of each page.
//!
//! ## Features
//!
//! - **Pagination detection**: Link header, bookmark, cursor, offset or none
//! - **Resilient fetching**: rate-limit backoff and transient 5xx retries
//! - **Heterogeneous bodies**: bare arrays, `data`, `items` or domain fields
//! - **Execution log**: per-page audit records, in memory or in DuckDB
//! - **Item persistence**: batched, idempotent writes with provenance
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagewalk::database::Backend;
//! use pagewalk::engine::{ExecutionRequest, ExecutionRunner};
//! use pagewalk::EngineConfig;
//!
//! #[tokio::main]
//! async fn main() -> pagewalk::Result<()> {
//!     let config = EngineConfig::default();
//!     let runner = ExecutionRunner::from_config(&config, Backend::in_memory())?;
//!
//!     let request = ExecutionRequest::new("GET", "https://api.example.com/orders")
//!         .max_iterations(5);
//!     let submitted = runner.submit(request).await?;
//!     println!("accepted {}", submitted.acknowledgement.execution_id);
//!
//!     let outcome = submitted.handle.await.expect("task panicked");
//!     println!("{} items over {} pages", outcome.total_items, outcome.pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   submit → acknowledgement        poll / status / list-active   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Fetch   │  Detect   │   Aggregate   │  Persist  │   Track     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Outcome  │ Link      │ Array         │ Batches   │ Executions  │
//! │ Retry    │ Bookmark  │ data / items  │ Provenance│ Page log    │
//! │ Rate Lim.│ Cursor    │ Domain fields │ DuckDB    │ DuckDB      │
//! │ Backoff  │ Offset    │ Whole body    │           │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Engine configuration
pub mod config;

/// Page fetcher and outbound rate limiting
pub mod http;

/// Pagination detection and next-page resolution
pub mod pagination;

/// Item extraction from response bodies
pub mod aggregate;

/// Execution log and status tracking
pub mod tracker;

/// Batched item persistence
pub mod persist;

/// DuckDB-backed storage
pub mod database;

/// Fetch loop orchestration
pub mod engine;

/// Command-line interface and HTTP server
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use engine::{Acknowledgement, ExecutionOutcome, ExecutionRequest, ExecutionRunner};
pub use tracker::{ExecutionStatus, ExecutionTracker, PageRecord};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
