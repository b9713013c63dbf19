//! CLI module
//!
//! Command-line interface for the execution engine.
//!
//! # Commands
//!
//! - `serve` - Start HTTP server mode
//! - `run` - Run one execution in the foreground
//! - `status` - Show an execution from the DuckDB store
//! - `list` - List active executions from the DuckDB store

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::Runner;
pub use server::{router, serve};
