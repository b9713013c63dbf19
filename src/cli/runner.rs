//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::EngineConfig;
use crate::database::Backend;
use crate::engine::{ExecutionRequest, ExecutionRunner};
use crate::error::{Error, Result};
use crate::tracker::{active_window, ExecutionTracker};
use serde_json::{json, Value};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Serve { port } => self.serve(config, *port).await,
            Commands::Run {
                url,
                method,
                headers,
                query,
                body,
                max_iterations,
                sink_table,
            } => {
                let mut request = ExecutionRequest::new(method, url);
                for header in headers {
                    let (name, value) = split_pair(header, ':', "header")?;
                    request = request.header(name, value);
                }
                for param in query {
                    let (key, value) = split_pair(param, '=', "query parameter")?;
                    request = request.query(key, value);
                }
                if let Some(body) = body {
                    request = request.body(serde_json::from_str(body)?);
                }
                if let Some(max) = max_iterations {
                    request = request.max_iterations(*max);
                }
                if let Some(table) = sink_table {
                    request = request.persist_to(table);
                }
                self.execute(config, request).await
            }
            Commands::Status { execution_id } => self.status(&config, execution_id).await,
            Commands::List { window_hours } => {
                let hours = window_hours.unwrap_or(config.tracking.active_window_hours);
                self.list(&config, hours).await
            }
        }
    }

    /// Load the engine config and apply command-line overrides
    fn load_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::load(self.cli.config.as_deref())?;
        if let Some(ref store) = self.cli.store {
            config.store.path = Some(store.clone());
        }
        Ok(config)
    }

    /// Tracker over the configured DuckDB store
    fn durable_tracker(&self, config: &EngineConfig) -> Result<ExecutionTracker> {
        if config.store.path.is_none() {
            return Err(Error::config(
                "No execution store configured (use --store or store.path)",
            ));
        }
        Ok(Backend::open(&config.store)?.tracker)
    }

    async fn serve(&self, mut config: EngineConfig, port: Option<u16>) -> Result<()> {
        if let Some(port) = port {
            config.server.port = port;
        }
        if config.store.path.is_none() {
            tracing::warn!("No store path configured, executions are kept in memory only");
        }

        let runner = ExecutionRunner::from_config(&config, Backend::open(&config.store)?)?;
        crate::cli::serve(&config.server, runner, config.tracking.active_window_hours).await
    }

    /// Run one execution in the foreground and print metadata plus data
    async fn execute(&self, config: EngineConfig, request: ExecutionRequest) -> Result<()> {
        let runner = ExecutionRunner::from_config(&config, Backend::open(&config.store)?)?;
        let outcome = runner.execute(request).await?;

        let output = json!({
            "metadata": {
                "executionId": outcome.execution_id,
                "status": outcome.status,
                "totalPages": outcome.pages,
                "totalItems": outcome.total_items,
                "paginationType": outcome.pagination_type,
                "persistence": outcome.persistence,
                "error": outcome.error,
            },
            "data": outcome.items,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);

        if outcome.is_completed() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "Execution {} ended with status {}",
                outcome.execution_id, outcome.status
            )))
        }
    }

    async fn status(&self, config: &EngineConfig, execution_id: &str) -> Result<()> {
        let tracker = self.durable_tracker(config)?;
        let execution = tracker
            .get(execution_id)
            .await?
            .ok_or_else(|| Error::not_found(execution_id))?;
        let pages = tracker.list_pages(execution_id).await?;

        print_json(&json!({
            "execution": execution,
            "pages": pages,
        }))
    }

    async fn list(&self, config: &EngineConfig, hours: i64) -> Result<()> {
        let tracker = self.durable_tracker(config)?;
        let active = tracker.list_active(active_window(hours)?).await?;

        if active.is_empty() {
            eprintln!("No active executions in the last {hours}h");
        }
        print_json(&json!(active))
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Split `key<sep>value`, trimming both sides
fn split_pair<'a>(raw: &'a str, sep: char, what: &str) -> Result<(&'a str, &'a str)> {
    raw.split_once(sep)
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| Error::validation(format!("Invalid {what} '{raw}', expected key{sep}value")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pair() {
        assert_eq!(
            split_pair("Authorization: Bearer a:b", ':', "header").unwrap(),
            ("Authorization", "Bearer a:b")
        );
        assert_eq!(split_pair("limit=50", '=', "query").unwrap(), ("limit", "50"));
        assert!(split_pair("novalue", '=', "query").is_err());
        assert!(split_pair("=x", '=', "query").is_err());
    }
}
