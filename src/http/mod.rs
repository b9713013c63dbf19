//! HTTP module
//!
//! The page fetcher issues one outbound call per logical page and folds the
//! answer into a tagged [`FetchOutcome`].
//!
//! # Features
//!
//! - **Outcome classification**: success, auth error, rate limit, API error, transport failure
//! - **Tolerant bodies**: JSON when possible, raw text otherwise
//! - **Rate Limiting**: optional token bucket shared across executions (governor)

mod client;
mod rate_limit;

pub use client::{classify, parse_body, FetchOutcome, PageFetcher, PageResponse, TransportKind};
pub use rate_limit::RateLimiter;
