//! Next page resolution
//!
//! One resolver per [`PaginationType`]. Each is a pure function of the last
//! response and the URL that produced it.

use super::detector::{token_field, total_count, BOOKMARK_FIELD, CURSOR_FIELDS};
use super::link::find_link_rel;
use super::types::{NextPage, PaginationType};
use crate::error::Result;
use reqwest::header::HeaderMap;
use serde_json::Value;
use url::Url;

/// Query parameter carrying the bookmark token
pub const BOOKMARK_PARAM: &str = "bookmark";

/// Query parameter carrying the cursor token
pub const CURSOR_PARAM: &str = "cursor";

/// Offset query parameter
pub const OFFSET_PARAM: &str = "offset";

/// Limit query parameter
pub const LIMIT_PARAM: &str = "limit";

/// Page size assumed when the request carries no `limit`
pub const DEFAULT_LIMIT: u64 = 10;

/// Compute the next request URL or signal termination
///
/// Fails only when a `Link` target cannot be resolved into a URL.
pub fn resolve(
    pagination_type: PaginationType,
    headers: &HeaderMap,
    body: &Value,
    current: &Url,
) -> Result<NextPage> {
    match pagination_type {
        PaginationType::Link => resolve_link(headers, current),
        PaginationType::Bookmark => Ok(resolve_token(
            token_field(body, BOOKMARK_FIELD),
            BOOKMARK_PARAM,
            current,
        )),
        PaginationType::Cursor => Ok(resolve_token(
            CURSOR_FIELDS
                .iter()
                .find_map(|field| token_field(body, field)),
            CURSOR_PARAM,
            current,
        )),
        PaginationType::Offset => Ok(resolve_offset(body, current)),
        PaginationType::None => Ok(NextPage::Done),
    }
}

fn resolve_link(headers: &HeaderMap, current: &Url) -> Result<NextPage> {
    match find_link_rel(headers, "next") {
        // `join` keeps absolute targets as-is and resolves relative ones
        Some(target) => Ok(NextPage::Continue(current.join(&target)?)),
        None => Ok(NextPage::Done),
    }
}

fn resolve_token(token: Option<String>, param: &str, current: &Url) -> NextPage {
    match token {
        Some(token) => NextPage::Continue(with_query_param(current, param, &token)),
        None => NextPage::Done,
    }
}

fn resolve_offset(body: &Value, current: &Url) -> NextPage {
    let Some(total) = total_count(body) else {
        return NextPage::Done;
    };

    let offset = query_u64(current, OFFSET_PARAM).unwrap_or(0);
    let limit = query_u64(current, LIMIT_PARAM)
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LIMIT);

    if offset.saturating_add(limit) >= total {
        return NextPage::Done;
    }

    NextPage::Continue(with_query_param(
        current,
        OFFSET_PARAM,
        &(offset + limit).to_string(),
    ))
}

/// Read a numeric query parameter
pub fn query_u64(url: &Url, key: &str) -> Option<u64> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.trim().parse().ok())
}

/// Return a copy of `url` with `key` set to `value`, replacing any previous values
pub fn with_query_param(url: &Url, key: &str, value: &str) -> Url {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut next = url.clone();
    next.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(key, value);
    next
}
