//! Page fetcher
//!
//! Issues exactly one outbound HTTP call per invocation and normalizes the
//! answer into a [`FetchOutcome`]. HTTP-level failures are outcome variants,
//! never `Err`; retry decisions belong to the caller.

use super::rate_limit::RateLimiter;
use crate::config::HttpSettings;
use crate::error::{Error, Result};
use crate::types::{Method, StringMap};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Markers that identify a rate-limit answer hidden behind a generic 4xx
const RATE_LIMIT_MARKERS: [&str; 4] = ["rate limit", "rate_limit", "ratelimit", "too many requests"];

/// Remediation hints attached to authentication failures
const AUTH_SUGGESTIONS: [&str; 4] = [
    "Check if the authentication token/key is correct and complete",
    "Verify the token has not expired",
    "Ensure the token has the necessary permissions",
    "Verify you are using the correct authentication method",
];

/// Successful page answer
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// HTTP status (2xx/3xx)
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed body. Non-JSON bodies become a JSON string, empty bodies `null`.
    pub body: Value,
}

/// Kind of transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Request timed out
    Timeout,
    /// Connection refused / DNS failure
    Connect,
    /// Anything else (invalid request, body read failure, ...)
    Other,
}

/// Normalized result of one page fetch
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx/3xx with a body
    Ok(PageResponse),
    /// HTTP 401/403
    AuthError { status: u16, details: Value },
    /// HTTP 429 or a 4xx carrying a rate-limit indicator
    RateLimited {
        status: u16,
        details: Value,
        retry_after_secs: Option<u64>,
    },
    /// Any other 4xx/5xx
    ClientOrServerError { status: u16, details: Value },
    /// No HTTP answer at all
    TransportFailure { kind: TransportKind, reason: String },
}

impl FetchOutcome {
    /// HTTP status if the target answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Ok(response) => Some(response.status),
            Self::AuthError { status, .. }
            | Self::RateLimited { status, .. }
            | Self::ClientOrServerError { status, .. } => Some(*status),
            Self::TransportFailure { .. } => None,
        }
    }

    /// Check if this is a success
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Check if this is a transient server error worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ClientOrServerError { status, .. } => crate::error::is_retryable_status(*status),
            _ => false,
        }
    }

    /// Structured detail recorded on the terminal page record
    pub fn error_detail(&self) -> Option<Value> {
        match self {
            Self::Ok(_) => None,
            Self::AuthError { status, details } => Some(json!({
                "error": "Authentication Failed",
                "status": status,
                "statusText": status_text(*status),
                "details": details,
                "suggestions": AUTH_SUGGESTIONS,
            })),
            Self::RateLimited {
                status, details, ..
            } => Some(json!({
                "error": "Rate Limited",
                "status": status,
                "statusText": status_text(*status),
                "details": details,
            })),
            Self::ClientOrServerError { status, details } => Some(json!({
                "error": "API Request Failed",
                "status": status,
                "statusText": status_text(*status),
                "details": details,
            })),
            Self::TransportFailure { kind, reason } => Some(json!({
                "error": match kind {
                    TransportKind::Timeout => "Request Timed Out",
                    TransportKind::Connect => "Connection Failed",
                    TransportKind::Other => "Failed to execute request",
                },
                "details": reason,
            })),
        }
    }

    /// Convert a failed outcome into an engine error
    pub fn into_error(self) -> Option<Error> {
        match self {
            Self::Ok(_) => None,
            Self::AuthError { status, .. } => Some(Error::Auth { status }),
            Self::RateLimited { .. } => Some(Error::RateLimited { attempts: 1 }),
            Self::ClientOrServerError { status, .. } => Some(Error::TargetApi { status }),
            Self::TransportFailure { reason, .. } => Some(Error::transport(reason)),
        }
    }
}

/// HTTP client issuing one request per page
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
    rate_limiter: Option<RateLimiter>,
}

impl PageFetcher {
    /// Create a fetcher with default settings
    pub fn new() -> Result<Self> {
        Self::from_settings(&HttpSettings::default())
    }

    /// Create a fetcher from HTTP settings
    pub fn from_settings(settings: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(&settings.user_agent)
            .build()?;

        Ok(Self {
            client,
            timeout: settings.timeout(),
            rate_limiter: settings.rate_limit_rps.map(RateLimiter::per_second),
        })
    }

    /// Check if outbound throttling is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Fetch one page
    ///
    /// The body is only sent for methods where it is meaningful.
    pub async fn fetch(
        &self,
        method: Method,
        url: &Url,
        headers: &StringMap,
        body: Option<&Value>,
    ) -> FetchOutcome {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self
            .client
            .request(method.into(), url.clone())
            .timeout(self.timeout);

        for (key, value) in headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if method.has_body() {
            if let Some(body) = body {
                req = req.json(body);
            }
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                let kind = transport_kind(&e);
                warn!(url = %url, error = %e, "Page request failed before a response");
                return FetchOutcome::TransportFailure {
                    kind,
                    reason: e.to_string(),
                };
            }
        };

        let status = response.status();
        let response_headers = response.headers().clone();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return FetchOutcome::TransportFailure {
                    kind: transport_kind(&e),
                    reason: format!("Failed to read response body: {e}"),
                };
            }
        };

        debug!(method = %method, url = %url, status = status.as_u16(), "Page response received");
        classify(status, response_headers, &text)
    }
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("timeout", &self.timeout)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Classify a raw HTTP answer
pub fn classify(status: StatusCode, headers: HeaderMap, text: &str) -> FetchOutcome {
    let body = parse_body(text);
    let code = status.as_u16();

    if !status.is_client_error() && !status.is_server_error() {
        return FetchOutcome::Ok(PageResponse {
            status: code,
            headers,
            body,
        });
    }

    if status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_client_error() && signals_rate_limit(&headers, text))
    {
        return FetchOutcome::RateLimited {
            status: code,
            details: body,
            retry_after_secs: retry_after(&headers),
        };
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return FetchOutcome::AuthError {
            status: code,
            details: body,
        };
    }

    FetchOutcome::ClientOrServerError {
        status: code,
        details: body,
    }
}

/// Parse a response body, tolerating non-JSON and empty payloads
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn signals_rate_limit(headers: &HeaderMap, text: &str) -> bool {
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    if exhausted {
        return true;
    }

    let lowered = text.to_ascii_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

fn transport_kind(error: &reqwest::Error) -> TransportKind {
    if error.is_timeout() {
        TransportKind::Timeout
    } else if error.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Other
    }
}

fn status_text(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}
