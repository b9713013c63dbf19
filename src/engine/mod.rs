//! Execution engine module
//!
//! Runs the paginated fetch loop for submitted executions.
//!
//! # Overview
//!
//! The engine module provides:
//! - `ExecutionRunner` - validates submissions, spawns one task per execution
//!   and drives fetch, detect, aggregate, persist, record, resolve per page
//! - `ExecutionRequest` / `Acknowledgement` - the submit interface
//! - `ExecutionOutcome` - the result handed back by the background task
//!
//! Pages within one execution are strictly sequential. Tracker writes are
//! best-effort: a failed write is logged and the loop carries on.

mod types;

pub use types::{
    Acknowledgement, ExecutionContext, ExecutionOutcome, ExecutionPlan, ExecutionRequest,
    SubmittedExecution,
};

use crate::aggregate::ResultAggregator;
use crate::config::{EngineConfig, RunnerSettings};
use crate::database::Backend;
use crate::error::{Error, Result};
use crate::http::{FetchOutcome, PageFetcher};
use crate::pagination::{detect, resolve, NextPage};
use crate::persist::{ItemPersister, Provenance};
use crate::tracker::{ExecutionStatus, ExecutionTracker, PageRecord, PageStatus};
use crate::types::BackoffType;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Orchestrator for paginated executions
#[derive(Clone)]
pub struct ExecutionRunner {
    fetcher: Arc<PageFetcher>,
    tracker: ExecutionTracker,
    aggregator: ResultAggregator,
    persister: Option<ItemPersister>,
    settings: RunnerSettings,
}

impl ExecutionRunner {
    /// Create a runner with default settings and no persistence
    pub fn new(fetcher: PageFetcher, tracker: ExecutionTracker) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            tracker,
            aggregator: ResultAggregator::default(),
            persister: None,
            settings: RunnerSettings::default(),
        }
    }

    /// Build a runner from engine configuration and an opened backend
    pub fn from_config(config: &EngineConfig, backend: Backend) -> Result<Self> {
        let fetcher = PageFetcher::from_settings(&config.http)?;
        let persister = ItemPersister::with_settings(backend.sink, &config.persistence);

        Ok(Self::new(fetcher, backend.tracker)
            .with_settings(config.runner.clone())
            .with_aggregator(ResultAggregator::new(
                config.aggregation.collection_fields.iter().cloned(),
            ))
            .with_persister(persister))
    }

    /// Set loop settings
    #[must_use]
    pub fn with_settings(mut self, settings: RunnerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the item extractor
    #[must_use]
    pub fn with_aggregator(mut self, aggregator: ResultAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Enable item persistence
    #[must_use]
    pub fn with_persister(mut self, persister: ItemPersister) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Execution tracker
    pub fn tracker(&self) -> &ExecutionTracker {
        &self.tracker
    }

    /// Loop settings
    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Validate a request and open its execution record
    pub async fn prepare(&self, request: ExecutionRequest) -> Result<(String, ExecutionPlan)> {
        let plan = request.into_plan(self.settings.default_max_iterations)?;
        if plan.sink_table.is_some() && self.persister.is_none() {
            return Err(Error::validation("Persistence is not configured"));
        }

        let execution_id = self.tracker.start(plan.meta()).await?;
        info!(
            execution_id = %execution_id,
            method = %plan.method,
            url = %plan.url,
            max_iterations = plan.max_iterations,
            "Execution accepted"
        );
        Ok((execution_id, plan))
    }

    /// Accept a request and run it in the background
    ///
    /// Returns as soon as the execution record exists. Failures after this
    /// point only show up in the execution log.
    pub async fn submit(&self, request: ExecutionRequest) -> Result<SubmittedExecution> {
        let (execution_id, plan) = self.prepare(request).await?;
        let acknowledgement = Acknowledgement::new(&execution_id, &plan);

        let runner = self.clone();
        let handle = tokio::spawn(async move { runner.run(execution_id, plan).await });

        Ok(SubmittedExecution {
            acknowledgement,
            handle,
        })
    }

    /// Accept a request and run it to completion on the current task
    pub async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionOutcome> {
        let (execution_id, plan) = self.prepare(request).await?;
        Ok(self.run(execution_id, plan).await)
    }

    // ========================================================================
    // Fetch Loop
    // ========================================================================

    /// Drive one execution until it reaches a terminal status
    pub async fn run(&self, execution_id: String, plan: ExecutionPlan) -> ExecutionOutcome {
        let mut ctx = ExecutionContext::new(execution_id, &plan);

        if let Err(e) = self.tracker.mark_in_progress(&ctx.execution_id).await {
            warn!(execution_id = %ctx.execution_id, error = %e, "Failed to mark execution in progress");
        }

        loop {
            let page = ctx.pages + 1;
            let request_url = ctx.current_url.to_string();
            debug!(execution_id = %ctx.execution_id, page, url = %request_url, "Fetching page");

            let response = match self.fetch_page(&plan, &ctx, page).await {
                FetchOutcome::Ok(response) => response,
                failure => {
                    let detail = failure.error_detail().unwrap_or(Value::Null);
                    error!(
                        execution_id = %ctx.execution_id,
                        page,
                        status = ?failure.status(),
                        "Execution failed"
                    );
                    ctx.pages = page;
                    let record = PageRecord::failure(
                        &ctx.execution_id,
                        page,
                        request_url,
                        failure.status(),
                        ctx.pagination_type(),
                        ctx.total_items(),
                        detail.clone(),
                    );
                    return self.finish(ctx, ExecutionStatus::Error, record, Some(detail)).await;
                }
            };

            let pagination_type = *ctx
                .pagination_type
                .get_or_insert_with(|| detect(&response.headers, &response.body));
            if page == 1 {
                info!(
                    execution_id = %ctx.execution_id,
                    pagination_type = %pagination_type,
                    "Pagination type detected"
                );
            }

            let items = self.aggregator.extract_items(&response.body);
            let items_in_page = items.len();

            if let (Some(table), Some(persister)) = (plan.sink_table.as_deref(), &self.persister) {
                let provenance = Provenance::new(&ctx.execution_id, page);
                let report = persister.persist(table, &items, &provenance).await;
                if let Some(ref mut total) = ctx.persistence {
                    total.merge(report);
                }
            }

            ctx.items.extend(items);
            ctx.pages = page;

            let record = PageRecord::success(
                &ctx.execution_id,
                page,
                request_url,
                response.status,
                pagination_type,
                items_in_page,
                ctx.total_items(),
            );

            let next = match resolve(
                pagination_type,
                &response.headers,
                &response.body,
                &ctx.current_url,
            ) {
                Ok(next) => next,
                Err(e) => {
                    let detail = json!({
                        "error": "Failed to resolve next page",
                        "details": e.to_string(),
                    });
                    let mut record = record.last();
                    record.status = PageStatus::Error;
                    record.error = Some(detail.clone());
                    return self.finish(ctx, ExecutionStatus::Error, record, Some(detail)).await;
                }
            };

            match next {
                NextPage::Continue(url) if page < plan.max_iterations => {
                    self.record_page(&record).await;
                    ctx.current_url = url;
                }
                NextPage::Continue(_) => {
                    info!(execution_id = %ctx.execution_id, page, "Iteration bound reached");
                    return self
                        .finish(ctx, ExecutionStatus::Completed, record.last(), None)
                        .await;
                }
                NextPage::Done => {
                    return self
                        .finish(ctx, ExecutionStatus::Completed, record.last(), None)
                        .await;
                }
            }
        }
    }

    /// Fetch one page, retrying rate limits and transient server errors
    ///
    /// Retries stay on the same page and never produce page records.
    async fn fetch_page(&self, plan: &ExecutionPlan, ctx: &ExecutionContext, page: u32) -> FetchOutcome {
        let mut rate_limited = 0u32;
        let mut transient = 0u32;

        loop {
            let outcome = self
                .fetcher
                .fetch(plan.method, &ctx.current_url, &plan.headers, plan.body.as_ref())
                .await;

            match outcome {
                FetchOutcome::RateLimited {
                    status,
                    details,
                    retry_after_secs,
                } => {
                    rate_limited += 1;
                    if rate_limited > self.settings.max_rate_limit_retries {
                        warn!(
                            execution_id = %ctx.execution_id,
                            page,
                            attempts = rate_limited,
                            "Rate limit retries exhausted"
                        );
                        return FetchOutcome::RateLimited {
                            status,
                            details: json!({
                                "attempts": rate_limited,
                                "response": details,
                            }),
                            retry_after_secs,
                        };
                    }

                    warn!(
                        execution_id = %ctx.execution_id,
                        page,
                        status,
                        attempt = rate_limited,
                        retry_after = ?retry_after_secs,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(self.settings.rate_limit_backoff_ms))
                        .await;
                }
                outcome if outcome.is_transient() && transient < self.settings.max_retries => {
                    rate_limited = 0;
                    let delay = self.calculate_backoff(transient);
                    transient += 1;
                    warn!(
                        execution_id = %ctx.execution_id,
                        page,
                        status = ?outcome.status(),
                        attempt = transient,
                        delay_ms = delay.as_millis() as u64,
                        "Transient server error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }

    /// Calculate backoff duration for a retry attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = self.settings.initial_backoff_ms;
        let delay = match self.settings.backoff_type {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial.saturating_mul(u64::from(attempt) + 1),
            BackoffType::Exponential => initial.saturating_mul(2u64.saturating_pow(attempt)),
        };

        Duration::from_millis(delay.min(self.settings.max_backoff_ms))
    }

    async fn record_page(&self, record: &PageRecord) {
        if let Err(e) = self.tracker.append_page(record).await {
            warn!(
                execution_id = %record.execution_id,
                page = record.page_number,
                error = %e,
                "Failed to append page record"
            );
        }
    }

    /// Move to a terminal status, then append the final page record
    async fn finish(
        &self,
        ctx: ExecutionContext,
        status: ExecutionStatus,
        record: PageRecord,
        error: Option<Value>,
    ) -> ExecutionOutcome {
        let summary = ctx.summary(error.as_ref());
        let transition = match status {
            ExecutionStatus::Completed => {
                self.tracker
                    .mark_completed(&ctx.execution_id, Some(summary.clone()))
                    .await
            }
            _ => {
                self.tracker
                    .mark_error(&ctx.execution_id, Some(summary.clone()))
                    .await
            }
        };
        if let Err(e) = transition {
            warn!(execution_id = %ctx.execution_id, status = %status, error = %e, "Failed to record final status");

            // Initialized cannot reach Completed, so the log ends in Error instead
            if status == ExecutionStatus::Completed {
                if let Err(e) = self.tracker.mark_error(&ctx.execution_id, Some(summary)).await {
                    warn!(execution_id = %ctx.execution_id, error = %e, "Failed to record fallback error status");
                }
            }
        }

        self.record_page(&record).await;

        info!(
            execution_id = %ctx.execution_id,
            status = %status,
            pages = ctx.pages,
            items = ctx.total_items(),
            "Execution finished"
        );
        ExecutionOutcome::from_context(ctx, status, error)
    }
}

impl std::fmt::Debug for ExecutionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionRunner")
            .field("fetcher", &self.fetcher)
            .field("aggregator", &self.aggregator)
            .field("persister", &self.persister)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
