//! Tests for pagination module

use super::*;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue, LINK};
use serde_json::{json, Value};
use test_case::test_case;
use url::Url;

fn link_headers(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(LINK, HeaderValue::from_static(value));
    headers
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

// ============================================================================
// Link Header Parsing Tests
// ============================================================================

#[test]
fn test_parse_link_header_next() {
    let header = r#"<https://api.example.com/items?page=1>; rel="prev", <https://api.example.com/items?page=3>; rel="next""#;
    assert_eq!(
        parse_link_header(header, "next"),
        Some("https://api.example.com/items?page=3".to_string())
    );
    assert_eq!(
        parse_link_header(header, "prev"),
        Some("https://api.example.com/items?page=1".to_string())
    );
    assert_eq!(parse_link_header(header, "last"), None);
}

#[test]
fn test_parse_link_header_unquoted_and_multi_rel() {
    assert_eq!(
        parse_link_header("<https://a/x?page=2>; rel=next", "next"),
        Some("https://a/x?page=2".to_string())
    );
    assert_eq!(
        parse_link_header(r#"<https://a/x?page=2>; rel="next last""#, "next"),
        Some("https://a/x?page=2".to_string())
    );
}

#[test]
fn test_parse_link_header_comma_inside_url() {
    let header = r#"<https://shop.example.com/products.json?limit=3&fields=id,title&page_info=abc>; rel="next", <https://shop.example.com/products.json?limit=3&fields=id,title&page_info=zzz>; rel="previous""#;
    assert_eq!(
        parse_link_header(header, "next"),
        Some("https://shop.example.com/products.json?limit=3&fields=id,title&page_info=abc".to_string())
    );
    assert_eq!(
        parse_link_header(header, "previous"),
        Some("https://shop.example.com/products.json?limit=3&fields=id,title&page_info=zzz".to_string())
    );
}

#[test]
fn test_parse_link_header_malformed() {
    assert_eq!(parse_link_header("garbage", "next"), None);
    assert_eq!(parse_link_header(r#"<>; rel="next""#, "next"), None);
    assert_eq!(parse_link_header("", "next"), None);
}

// ============================================================================
// Detector Tests
// ============================================================================

#[test]
fn test_detect_link_header_wins() {
    let headers = link_headers(r#"<https://api/x?page=2>; rel="next""#);
    let body = json!({"bookmark": "abc", "next_cursor": "c1", "total": 50});
    assert_eq!(detect(&headers, &body), PaginationType::Link);
}

#[test]
fn test_detect_bookmark_without_link() {
    assert_eq!(
        detect(&HeaderMap::new(), &json!({"bookmark": "abc"})),
        PaginationType::Bookmark
    );
}

#[test]
fn test_detect_link_header_without_next_falls_through() {
    let headers = link_headers(r#"<https://api/x?page=1>; rel="prev""#);
    assert_eq!(
        detect(&headers, &json!({"cursor": "c2"})),
        PaginationType::Cursor
    );
}

#[test_case(json!({"bookmark": "abc", "next_cursor": "c"}), PaginationType::Bookmark ; "bookmark before cursor")]
#[test_case(json!({"bookmark": "", "next_cursor": "c"}), PaginationType::Cursor ; "empty bookmark falls through")]
#[test_case(json!({"next_cursor": "c", "total": 10}), PaginationType::Cursor ; "cursor before offset")]
#[test_case(json!({"cursor": "c"}), PaginationType::Cursor ; "plain cursor field")]
#[test_case(json!({"next_cursor": null, "total_count": 10}), PaginationType::Offset ; "null cursor falls through")]
#[test_case(json!({"total": 25, "items": []}), PaginationType::Offset ; "total field")]
#[test_case(json!({"total_count": "25"}), PaginationType::None ; "non numeric total")]
#[test_case(json!({"items": [1, 2, 3]}), PaginationType::None ; "no signal")]
#[test_case(json!([1, 2, 3]), PaginationType::None ; "array body")]
#[test_case(json!("<html>oops</html>"), PaginationType::None ; "string body")]
#[test_case(Value::Null, PaginationType::None ; "empty body")]
fn test_detect_body_heuristics(body: Value, expected: PaginationType) {
    assert_eq!(detect(&HeaderMap::new(), &body), expected);
}

// ============================================================================
// Resolver Tests
// ============================================================================

#[test]
fn test_resolve_link_follows_next() {
    let headers = link_headers(r#"<https://api/x?page=2>; rel="next""#);
    let next = resolve(
        PaginationType::Link,
        &headers,
        &Value::Null,
        &url("https://api/x"),
    )
    .unwrap();
    assert_eq!(next, NextPage::Continue(url("https://api/x?page=2")));
}

#[test]
fn test_detect_and_resolve_link_with_comma_in_url() {
    let headers = link_headers(
        r#"<https://shop.example.com/products.json?limit=3&fields=id,title&page_info=abc>; rel="next""#,
    );
    let body = json!([1, 2, 3]);
    assert_eq!(detect(&headers, &body), PaginationType::Link);

    let next = resolve(
        PaginationType::Link,
        &headers,
        &body,
        &url("https://shop.example.com/products.json?limit=3&fields=id,title"),
    )
    .unwrap();
    assert_eq!(
        next,
        NextPage::Continue(url(
            "https://shop.example.com/products.json?limit=3&fields=id,title&page_info=abc"
        ))
    );
}

#[test]
fn test_resolve_link_relative_target() {
    let headers = link_headers(r#"</v1/items?page_info=xyz>; rel="next""#);
    let next = resolve(
        PaginationType::Link,
        &headers,
        &Value::Null,
        &url("https://shop.example.com/v1/items?limit=50"),
    )
    .unwrap();
    assert_eq!(
        next.url().map(Url::as_str),
        Some("https://shop.example.com/v1/items?page_info=xyz")
    );
}

#[test]
fn test_resolve_link_terminates_without_next() {
    let next = resolve(
        PaginationType::Link,
        &HeaderMap::new(),
        &Value::Null,
        &url("https://api/x?page=2"),
    )
    .unwrap();
    assert!(next.is_done());
}

#[test]
fn test_resolve_bookmark_sets_param() {
    let next = resolve(
        PaginationType::Bookmark,
        &HeaderMap::new(),
        &json!({"items": [], "bookmark": "bm-2"}),
        &url("https://api/pins?page_size=25&bookmark=bm-1"),
    )
    .unwrap();
    assert_eq!(
        next,
        NextPage::Continue(url("https://api/pins?page_size=25&bookmark=bm-2"))
    );
}

#[test]
fn test_resolve_bookmark_terminates_when_absent() {
    let next = resolve(
        PaginationType::Bookmark,
        &HeaderMap::new(),
        &json!({"items": [], "bookmark": null}),
        &url("https://api/pins?bookmark=bm-1"),
    )
    .unwrap();
    assert!(next.is_done());
}

#[test]
fn test_resolve_cursor_prefers_next_cursor() {
    let next = resolve(
        PaginationType::Cursor,
        &HeaderMap::new(),
        &json!({"next_cursor": "n2", "cursor": "c1"}),
        &url("https://api/events"),
    )
    .unwrap();
    assert_eq!(next, NextPage::Continue(url("https://api/events?cursor=n2")));
}

#[test]
fn test_resolve_cursor_terminates_when_empty() {
    let next = resolve(
        PaginationType::Cursor,
        &HeaderMap::new(),
        &json!({"next_cursor": ""}),
        &url("https://api/events?cursor=n2"),
    )
    .unwrap();
    assert!(next.is_done());
}

#[test_case(0, Some("offset=10") ; "first page advances")]
#[test_case(10, Some("offset=20") ; "second page advances")]
#[test_case(20, None ; "terminates when offset plus limit reaches total")]
fn test_resolve_offset_total_25_limit_10(offset: u64, expected: Option<&str>) {
    let current = url(&format!("https://api/orders?limit=10&offset={offset}"));
    let next = resolve(
        PaginationType::Offset,
        &HeaderMap::new(),
        &json!({"total": 25}),
        &current,
    )
    .unwrap();

    match expected {
        Some(param) => {
            let next_url = next.url().unwrap();
            assert!(next_url.as_str().contains(param), "{next_url}");
            assert_eq!(query_u64(next_url, LIMIT_PARAM), Some(10));
        }
        None => assert!(next.is_done()),
    }
}

#[test]
fn test_resolve_offset_defaults() {
    // No offset/limit params: offset 0, limit 10
    let next = resolve(
        PaginationType::Offset,
        &HeaderMap::new(),
        &json!({"total_count": 11}),
        &url("https://api/orders"),
    )
    .unwrap();
    assert_eq!(next, NextPage::Continue(url("https://api/orders?offset=10")));

    let next = resolve(
        PaginationType::Offset,
        &HeaderMap::new(),
        &json!({"total_count": 10}),
        &url("https://api/orders"),
    )
    .unwrap();
    assert!(next.is_done());
}

#[test]
fn test_resolve_offset_missing_total_terminates() {
    let next = resolve(
        PaginationType::Offset,
        &HeaderMap::new(),
        &json!({"items": []}),
        &url("https://api/orders?offset=0"),
    )
    .unwrap();
    assert!(next.is_done());
}

#[test]
fn test_resolve_none_always_terminates() {
    let headers = link_headers(r#"<https://api/x?page=2>; rel="next""#);
    let next = resolve(
        PaginationType::None,
        &headers,
        &json!({"next_cursor": "c"}),
        &url("https://api/x"),
    )
    .unwrap();
    assert!(next.is_done());
}

#[test]
fn test_with_query_param_replaces_duplicates() {
    let updated = with_query_param(&url("https://api/x?cursor=a&cursor=b&q=1"), "cursor", "c");
    assert_eq!(updated.as_str(), "https://api/x?q=1&cursor=c");
}

#[test]
fn test_pagination_type_serde() {
    assert_eq!(serde_json::to_string(&PaginationType::Bookmark).unwrap(), "\"bookmark\"");
    let parsed: PaginationType = serde_json::from_str("\"offset\"").unwrap();
    assert_eq!(parsed, PaginationType::Offset);
    assert_eq!(PaginationType::default().to_string(), "none");
}
