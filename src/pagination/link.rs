//! Link header parsing (RFC 8288)
//!
//! Format: `Link: <https://api.example.com/items?page=2>; rel="next", <...>; rel="prev"`

use reqwest::header::{HeaderMap, LINK};

/// Find the target of the first link with the given relation
///
/// Every `Link` header value is scanned; `rel` may hold several
/// space-separated relation types.
pub fn find_link_rel(headers: &HeaderMap, target_rel: &str) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| parse_link_header(value, target_rel))
}

/// Check whether any `Link` header carries the given relation
pub fn has_link_rel(headers: &HeaderMap, target_rel: &str) -> bool {
    find_link_rel(headers, target_rel).is_some()
}

/// Parse a single Link header value and extract the URL for the given rel
///
/// Targets are located by their `<...>` delimiters first, so commas inside a
/// URL (`fields=id,title`) do not split a link-value.
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    let mut rest = header;

    while let Some(open) = rest.find('<') {
        let after_open = &rest[open + 1..];
        let close = after_open.find('>')?;
        let url = after_open[..close].trim();
        let tail = &after_open[close + 1..];

        // Parameters run up to the next link-value
        let params_end = tail.find('<').unwrap_or(tail.len());
        if !url.is_empty() && has_rel(&tail[..params_end], target_rel) {
            return Some(url.to_string());
        }

        rest = &tail[params_end..];
    }

    None
}

/// Check a `; key=value` parameter list for the relation type
fn has_rel(params: &str, target_rel: &str) -> bool {
    params
        .split(';')
        .filter_map(|segment| segment.split_once('='))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case("rel"))
        .any(|(_, value)| {
            value
                .trim()
                .trim_end_matches(',')
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .split_whitespace()
                .any(|rel| rel.eq_ignore_ascii_case(target_rel))
        })
}
