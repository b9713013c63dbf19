//! Tests for the aggregation module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

#[test_case(json!([1, 2, 3]), json!([1, 2, 3]) ; "top level array")]
#[test_case(json!({"data": [{"id": 1}], "items": [{"id": 2}]}), json!([{"id": 1}]) ; "data before items")]
#[test_case(json!({"data": {"id": 1}, "items": [{"id": 2}]}), json!([{"id": 2}]) ; "non array data falls through")]
#[test_case(json!({"items": [1, 2, 3]}), json!([1, 2, 3]) ; "items")]
#[test_case(json!({"orders": [{"id": "o1"}], "total": 1}), json!([{"id": "o1"}]) ; "domain field")]
#[test_case(json!({"items": [], "orders": [1]}), json!([]) ; "empty items still wins")]
#[test_case(json!({"id": 7, "name": "solo"}), json!([{"id": 7, "name": "solo"}]) ; "object without collection")]
#[test_case(json!("plain text"), json!(["plain text"]) ; "string body")]
#[test_case(Value::Null, json!([]) ; "empty body")]
fn test_extract_items_precedence(body: Value, expected: Value) {
    assert_eq!(Value::Array(extract_items(&body)), expected);
}

#[test]
fn test_custom_collection_fields() {
    let aggregator = ResultAggregator::new(["results", "orders"]);
    let body = json!({"results": [1], "orders": [2, 3]});
    assert_eq!(aggregator.extract_items(&body), vec![json!(1)]);
    assert_eq!(aggregator.collection_fields(), ["results", "orders"]);
}

#[test]
fn test_extract_is_pure() {
    let body = json!({"data": [{"id": 1}, {"id": 2}]});
    let snapshot = body.clone();

    let first = extract_items(&body);
    let second = extract_items(&body);

    assert_eq!(first, second);
    assert_eq!(body, snapshot);
}

#[test]
fn test_append_accumulates() {
    let aggregator = ResultAggregator::default();
    let mut aggregate = Vec::new();

    assert_eq!(aggregator.append(&json!({"items": [1, 2]}), &mut aggregate), 2);
    assert_eq!(aggregator.append(&json!([3]), &mut aggregate), 1);
    assert_eq!(aggregate, vec![json!(1), json!(2), json!(3)]);
}
