//! Pagination module
//!
//! Supports: Link header, Bookmark, Cursor, Offset, None
//!
//! # Overview
//!
//! Target APIs are unknown up front, so the strategy is detected from the
//! first page ([`detect`]) and then held fixed. Each subsequent request is
//! derived by [`resolve`] from the previous response and request URL only.

mod detector;
mod link;
mod resolver;
mod types;

pub use detector::detect;
pub use link::{find_link_rel, has_link_rel, parse_link_header};
pub use resolver::{
    query_u64, resolve, with_query_param, BOOKMARK_PARAM, CURSOR_PARAM, DEFAULT_LIMIT,
    LIMIT_PARAM, OFFSET_PARAM,
};
pub use types::{NextPage, PaginationType};

#[cfg(test)]
mod tests;
