//! Pagination types
//!
//! Defines the detected pagination strategy and the resolver result.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Pagination strategy exposed by a target API
///
/// Detected once from the first page and fixed for the rest of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationType {
    /// `Link` response header with a `rel="next"` relation
    Link,
    /// `bookmark` token in the body
    Bookmark,
    /// `next_cursor` / `cursor` token in the body
    Cursor,
    /// `offset`/`limit` query parameters against a total count
    Offset,
    /// Single-page result
    #[default]
    None,
}

impl PaginationType {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Bookmark => "bookmark",
            Self::Cursor => "cursor",
            Self::Offset => "offset",
            Self::None => "none",
        }
    }
}

impl fmt::Display for PaginationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch this URL next
    Continue(Url),
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// Next URL, if any
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Continue(url) => Some(url),
            Self::Done => None,
        }
    }
}
