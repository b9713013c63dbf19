//! HTTP server mode for submitting and polling executions

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerSettings;
use crate::engine::{ExecutionRequest, ExecutionRunner};
use crate::error::{Error, Result};
use crate::tracker::active_window;

/// App state shared across handlers
#[derive(Clone)]
struct AppState {
    runner: ExecutionRunner,
    /// Default window for the active listing
    active_window_hours: i64,
}

/// Query string of the active listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    #[serde(default)]
    window_hours: Option<i64>,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Build the HTTP router
pub fn router(runner: ExecutionRunner, active_window_hours: i64) -> Router {
    let state = AppState {
        runner,
        active_window_hours,
    };

    // Build CORS layer - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/execute/paginated", post(submit_execution))
        .route("/executions", get(list_active))
        .route("/executions/:id", get(poll_execution))
        .route("/executions/:id/status", get(execution_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(settings: &ServerSettings, runner: ExecutionRunner, active_window_hours: i64) -> Result<()> {
    let app = router(runner, active_window_hours);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| Error::config(format!("Invalid listen address: {e}")))?;
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Map an engine error onto an HTTP answer
fn error_response(e: &Error) -> Response {
    let status = match e {
        Error::ExecutionNotFound { .. } => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::<()>::error(e.to_string()))).into_response()
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Accept a paginated execution and run it in the background
async fn submit_execution(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let request = match ExecutionRequest::from_json(body) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    match state.runner.submit(request).await {
        // The task keeps running after its handle is dropped
        Ok(submitted) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(submitted.acknowledgement)),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// List executions that are still running
async fn list_active(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let hours = query.window_hours.unwrap_or(state.active_window_hours);
    let window = match active_window(hours) {
        Ok(window) => window,
        Err(e) => return error_response(&e),
    };

    match state.runner.tracker().list_active(window).await {
        Ok(executions) => (
            StatusCode::OK,
            Json(ApiResponse::success(json!({
                "type": "EXECUTIONS",
                "windowHours": hours,
                "executions": executions
            }))),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Page records of a running execution
///
/// Answers 404 both for unknown executions and for finished ones.
async fn poll_execution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.runner.tracker().poll(&id).await {
        Ok(Some(pages)) => (
            StatusCode::OK,
            Json(ApiResponse::success(json!({
                "type": "PAGES",
                "executionId": id,
                "pages": pages
            }))),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(format!(
                "Execution '{id}' not found or already completed"
            ))),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Explicit status of an execution, terminal or not
async fn execution_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let tracker = state.runner.tracker();

    let execution = match tracker.get(&id).await {
        Ok(Some(execution)) => execution,
        Ok(None) => return error_response(&Error::not_found(&id)),
        Err(e) => return error_response(&e),
    };

    let pages = match tracker.list_pages(&id).await {
        Ok(pages) => pages,
        Err(e) => return error_response(&e),
    };
    let fully_complete = execution.status.is_terminal() && pages.iter().any(|p| p.is_last);

    (
        StatusCode::OK,
        Json(ApiResponse::success(json!({
            "type": "EXECUTION_STATUS",
            "execution": execution,
            "fullyComplete": fully_complete,
            "pages": pages
        }))),
    )
        .into_response()
}
