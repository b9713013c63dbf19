//! Tests for the DuckDB store

use super::*;
use crate::pagination::PaginationType;
use crate::persist::{ItemPersister, ItemSink, PersistedItem, Provenance};
use crate::tracker::{ExecutionMeta, ExecutionStatus, ExecutionTracker, PageRecord};
use crate::types::Method;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn meta() -> ExecutionMeta {
    ExecutionMeta {
        method: Method::POST,
        target_url: "https://api.example.com/search".to_string(),
        max_iterations: 3,
        persist: true,
        table_name: Some("results".to_string()),
    }
}

fn tracker(db: &Database) -> ExecutionTracker {
    ExecutionTracker::new(Arc::new(DuckDbExecutionStore::new(db.clone())))
}

#[tokio::test]
async fn test_execution_round_trip_in_memory() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.path().is_none());
    let tracker = tracker(&db);

    let id = tracker.start(meta()).await.unwrap();
    let execution = tracker.get(&id).await.unwrap().unwrap();
    assert_eq!(execution.method, Method::POST);
    assert_eq!(execution.table_name.as_deref(), Some("results"));
    assert_eq!(execution.status, ExecutionStatus::Initialized);

    tracker.mark_in_progress(&id).await.unwrap();
    let page = PageRecord::success(&id, 1, "https://api.example.com/search", 200, PaginationType::Cursor, 3, 3);
    tracker.append_page(&page).await.unwrap();
    tracker
        .mark_completed(&id, Some(json!({"totalItems": 3})))
        .await
        .unwrap();
    let last = PageRecord::success(
        &id,
        2,
        "https://api.example.com/search?cursor=c2",
        200,
        PaginationType::Cursor,
        0,
        3,
    )
    .last();
    tracker.append_page(&last).await.unwrap();

    let pages = tracker.list_pages(&id).await.unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0], page);
    assert!(pages[1].is_last);

    let execution = tracker.get(&id).await.unwrap().unwrap();
    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.detail, Some(json!({"totalItems": 3})));
    assert!(tracker.is_fully_complete(&id).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_page_is_rejected() {
    let db = Database::open_in_memory().unwrap();
    let tracker = tracker(&db);
    let id = tracker.start(meta()).await.unwrap();

    let page = PageRecord::success(&id, 1, "https://a", 200, PaginationType::None, 0, 0);
    tracker.append_page(&page).await.unwrap();
    let err = tracker.append_page(&page).await.unwrap_err();
    assert!(matches!(err, crate::Error::LogWrite { .. }));
}

#[tokio::test]
async fn test_unknown_execution() {
    let db = Database::open_in_memory().unwrap();
    let tracker = tracker(&db);

    assert!(tracker.get("nope").await.unwrap().is_none());
    assert!(tracker.list_pages("nope").await.unwrap().is_empty());
    let page = PageRecord::success("nope", 1, "https://a", 200, PaginationType::None, 0, 0);
    assert!(tracker.append_page(&page).await.is_err());
    assert!(tracker.mark_in_progress("nope").await.is_err());
}

#[tokio::test]
async fn test_log_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("pagewalk.duckdb");

    let id = {
        let db = Database::open(&path).unwrap();
        let tracker = tracker(&db);
        let id = tracker.start(meta()).await.unwrap();
        tracker.mark_in_progress(&id).await.unwrap();
        id
    };

    let db = Database::open(&path).unwrap();
    assert_eq!(db.path(), Some(path.as_path()));
    let tracker = tracker(&db);

    let active = tracker
        .list_active(chrono::Duration::hours(24))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].execution.execution_id, id);
    assert_eq!(active[0].execution.status, ExecutionStatus::InProgress);
}

#[tokio::test]
async fn test_item_sink_replaces_by_id() {
    let db = Database::open_in_memory().unwrap();
    let sink = DuckDbItemSink::new(db);
    let provenance = Provenance::new("exec-1", 1);

    let first = PersistedItem::wrap(json!({"id": "a", "v": 1}), &provenance, 0);
    let second = PersistedItem::wrap(json!({"id": "a", "v": 2}), &provenance, 0);
    sink.put("orders", &first).await.unwrap();
    sink.put("orders", &second).await.unwrap();
    sink.put("other", &first).await.unwrap();

    assert_eq!(sink.count("orders").await.unwrap(), 1);
    assert_eq!(sink.count("other").await.unwrap(), 1);
    assert_eq!(
        sink.payloads("orders").await.unwrap(),
        vec![json!({"id": "a", "v": 2})]
    );
}

#[tokio::test]
async fn test_persister_over_duckdb() {
    let db = Database::open_in_memory().unwrap();
    let sink = DuckDbItemSink::new(db);
    let persister = ItemPersister::new(Arc::new(sink.clone()));

    let items: Vec<_> = (0..7).map(|i| json!({"n": i})).collect();
    let report = persister
        .persist("numbers", &items, &Provenance::new("exec-2", 4))
        .await;

    assert_eq!(report.persisted, 7);
    assert_eq!(sink.payloads("numbers").await.unwrap(), items);
}
