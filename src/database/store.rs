//! DuckDB execution log
//!
//! Single append-only table keyed by `(execution_id, record_id)`. The parent
//! row reuses the execution id as its record id; page rows use `page-NNNNNN`.

use super::engine::Database;
use crate::error::{Error, Result};
use crate::tracker::{Execution, ExecutionStore, PageRecord};
use async_trait::async_trait;
use duckdb::{params, Connection};

const RECORD_EXECUTION: &str = "execution";
const RECORD_PAGE: &str = "page";

/// [`ExecutionStore`] backed by DuckDB
#[derive(Debug, Clone)]
pub struct DuckDbExecutionStore {
    db: Database,
}

impl DuckDbExecutionStore {
    /// Create a store over an open database
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn page_record_id(page_number: u32) -> String {
    format!("page-{page_number:06}")
}

fn is_constraint_violation(e: &duckdb::Error) -> bool {
    let message = e.to_string().to_ascii_lowercase();
    message.contains("constraint") || message.contains("duplicate key")
}

fn read_payloads(conn: &Connection, sql: &str, key: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![key], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[async_trait]
impl ExecutionStore for DuckDbExecutionStore {
    async fn insert_execution(&self, execution: &Execution) -> Result<()> {
        let id = execution.execution_id.clone();
        let status = execution.status.to_string();
        let updated_at = execution.updated_at.to_rfc3339();
        let payload = serde_json::to_string(execution)?;

        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO execution_log
                        (execution_id, record_id, record_type, page_number, status, updated_at, payload)
                     VALUES (?, ?, ?, NULL, ?, ?, ?)",
                    params![id, id, RECORD_EXECUTION, status, updated_at, payload],
                )
                .map_err(|e| {
                    if is_constraint_violation(&e) {
                        Error::log_write(format!("execution '{id}' already exists"))
                    } else {
                        Error::Duckdb(e)
                    }
                })?;
                Ok(())
            })
            .await
    }

    async fn update_execution(&self, execution: &Execution) -> Result<()> {
        let id = execution.execution_id.clone();
        let status = execution.status.to_string();
        let updated_at = execution.updated_at.to_rfc3339();
        let payload = serde_json::to_string(execution)?;

        self.db
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE execution_log SET status = ?, updated_at = ?, payload = ?
                     WHERE execution_id = ? AND record_id = ?",
                    params![status, updated_at, payload, id, id],
                )?;
                if changed == 0 {
                    return Err(Error::not_found(id));
                }
                Ok(())
            })
            .await
    }

    async fn get_execution(&self, execution_id: &str) -> Result<Option<Execution>> {
        let id = execution_id.to_string();
        let payloads = self
            .db
            .call(move |conn| {
                read_payloads(
                    conn,
                    "SELECT payload FROM execution_log
                     WHERE execution_id = ? AND record_id = execution_id",
                    &id,
                )
            })
            .await?;

        payloads
            .first()
            .map(|p| serde_json::from_str(p).map_err(Error::from))
            .transpose()
    }

    async fn list_executions(&self) -> Result<Vec<Execution>> {
        let payloads = self
            .db
            .call(|conn| {
                read_payloads(
                    conn,
                    "SELECT payload FROM execution_log
                     WHERE record_type = ? ORDER BY updated_at",
                    RECORD_EXECUTION,
                )
            })
            .await?;

        let mut executions = payloads
            .iter()
            .map(|p| serde_json::from_str::<Execution>(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        executions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(executions)
    }

    async fn append_page(&self, page: &PageRecord) -> Result<()> {
        let id = page.execution_id.clone();
        let record_id = page_record_id(page.page_number);
        let page_number = i64::from(page.page_number);
        let status = if page.is_last { "last" } else { "recorded" };
        let updated_at = page.timestamp.to_rfc3339();
        let payload = serde_json::to_string(page)?;

        self.db
            .call(move |conn| {
                let parents: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM execution_log WHERE execution_id = ? AND record_id = ?",
                    params![id, id],
                    |row| row.get(0),
                )?;
                if parents == 0 {
                    return Err(Error::not_found(id));
                }

                conn.execute(
                    "INSERT INTO execution_log
                        (execution_id, record_id, record_type, page_number, status, updated_at, payload)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                    params![id, record_id, RECORD_PAGE, page_number, status, updated_at, payload],
                )
                .map_err(|e| {
                    if is_constraint_violation(&e) {
                        Error::log_write(format!("page {page_number} already recorded for '{id}'"))
                    } else {
                        Error::Duckdb(e)
                    }
                })?;
                Ok(())
            })
            .await
    }

    async fn list_pages(&self, execution_id: &str) -> Result<Vec<PageRecord>> {
        let id = execution_id.to_string();
        let payloads = self
            .db
            .call(move |conn| {
                read_payloads(
                    conn,
                    "SELECT payload FROM execution_log
                     WHERE execution_id = ? AND record_type = 'page'
                     ORDER BY page_number",
                    &id,
                )
            })
            .await?;

        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(Error::from))
            .collect()
    }
}
