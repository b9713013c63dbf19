//! Pagination type detection
//!
//! Ordered heuristics applied to the first page only. The first matching
//! check wins: link header, bookmark, cursor, total count, otherwise none.

use super::link::has_link_rel;
use super::types::PaginationType;
use reqwest::header::HeaderMap;
use serde_json::Value;

/// Body fields holding a bookmark token
pub(crate) const BOOKMARK_FIELD: &str = "bookmark";

/// Body fields holding a cursor token, in lookup order
pub(crate) const CURSOR_FIELDS: [&str; 2] = ["next_cursor", "cursor"];

/// Body fields holding a total count, in lookup order
pub(crate) const TOTAL_FIELDS: [&str; 2] = ["total_count", "total"];

/// Classify the pagination strategy of a first-page response
///
/// Never fails: a malformed or non-object body simply falls through the
/// body-based checks.
pub fn detect(headers: &HeaderMap, body: &Value) -> PaginationType {
    if has_link_rel(headers, "next") {
        return PaginationType::Link;
    }

    if token_field(body, BOOKMARK_FIELD).is_some() {
        return PaginationType::Bookmark;
    }

    if CURSOR_FIELDS
        .iter()
        .any(|field| token_field(body, field).is_some())
    {
        return PaginationType::Cursor;
    }

    if total_count(body).is_some() {
        return PaginationType::Offset;
    }

    PaginationType::None
}

/// Read a non-empty continuation token from a top-level body field
///
/// Strings must be non-blank; numbers are accepted and stringified.
pub(crate) fn token_field(body: &Value, field: &str) -> Option<String> {
    match body.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read the first numeric total-count field
pub(crate) fn total_count(body: &Value) -> Option<u64> {
    TOTAL_FIELDS.iter().find_map(|field| {
        let value = body.get(field)?;
        value
            .as_u64()
            .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
    })
}
