//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated request execution engine
#[derive(Parser, Debug)]
#[command(name = "pagewalk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Engine configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// DuckDB store file (overrides `store.path`)
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server mode
    Serve {
        /// Port to listen on (overrides `server.port`)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one paginated execution in the foreground and print the result
    Run {
        /// Target URL
        #[arg(long)]
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Query parameter as `key=value` (repeatable)
        #[arg(short, long = "query")]
        query: Vec<String>,

        /// Inline JSON request body
        #[arg(short, long)]
        body: Option<String>,

        /// Maximum number of pages
        #[arg(short, long)]
        max_iterations: Option<u32>,

        /// Persist aggregated items into this table
        #[arg(long)]
        sink_table: Option<String>,
    },

    /// Show an execution and its page records
    Status {
        /// Execution identifier
        execution_id: String,
    },

    /// List active executions
    List {
        /// Only executions active within this many hours
        #[arg(short, long)]
        window_hours: Option<i64>,
    },
}
