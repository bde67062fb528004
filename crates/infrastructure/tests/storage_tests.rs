//! File storage integration tests
//!
//! Tests cover:
//! - Persistence across store instances
//! - Timestamp-ordered eviction
//! - Index-only filtering and pagination

use std::time::Duration;

use application::ports::{RecordingQuery, RecordingStore};
use chrono::{DateTime, TimeZone, Utc};
use domain::{RecordedRequest, RecordedResponse, Recording};
use infrastructure::{
    FileStorage,
    config::StorageFormat,
    persistence::INDEX_FILE,
};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn recording(method: &str, uri: &str, status: u16, secs: i64) -> Recording {
    Recording::new(
        RecordedRequest {
            method: method.to_string(),
            uri: uri.to_string(),
            body: b"request".to_vec(),
            ..Default::default()
        },
        RecordedResponse {
            status,
            body: vec![0xde, 0xad, 0xbe, 0xef],
            ..Default::default()
        },
        Duration::from_millis(7),
    )
    .with_timestamp(at(secs))
}

#[tokio::test]
async fn recording_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let original = recording("PUT", "/api/items/9?force=1", 202, 0);

    {
        let store = FileStorage::open(dir.path(), StorageFormat::Json, 100)
            .await
            .unwrap();
        store.save(&original).await.unwrap();
        store.close().await.unwrap();
    }

    let reopened = FileStorage::open(dir.path(), StorageFormat::Json, 100)
        .await
        .unwrap();
    let loaded = reopened.load(&original.id).await.unwrap();

    assert_eq!(loaded.method(), "PUT");
    assert_eq!(loaded.uri(), "/api/items/9?force=1");
    assert_eq!(loaded.status(), 202);
    assert_eq!(loaded.request.body, b"request");
    assert_eq!(loaded.response.body, vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(loaded, original);
}

#[tokio::test]
async fn eviction_removes_single_oldest() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path(), StorageFormat::Json, 3)
        .await
        .unwrap();

    // Saved out of timestamp order on purpose
    let recs = [
        recording("GET", "/b", 200, 20),
        recording("GET", "/a", 200, 10),
        recording("GET", "/d", 200, 40),
        recording("GET", "/c", 200, 30),
    ];
    for rec in &recs {
        store.save(rec).await.unwrap();
    }

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_recordings, 3);
    assert_eq!(stats.oldest_recording, Some(at(20)));
    assert!(store.load(&recs[1].id).await.unwrap_err().is_not_found());

    // Evicted file is gone from disk as well: three recordings plus the index
    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 4);

    let reopened = FileStorage::open(dir.path(), StorageFormat::Json, 3)
        .await
        .unwrap();
    assert_eq!(reopened.stats().await.unwrap().total_recordings, 3);
}

#[tokio::test]
async fn list_filters_sorts_and_paginates() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path(), StorageFormat::Json, 0)
        .await
        .unwrap();

    store.save(&recording("GET", "/api/users", 200, 1)).await.unwrap();
    store.save(&recording("POST", "/api/users", 201, 2)).await.unwrap();
    store.save(&recording("GET", "/api/orders", 500, 3)).await.unwrap();
    store.save(&recording("GET", "/health", 200, 4)).await.unwrap();

    let newest_first: Vec<String> = store
        .list(&RecordingQuery::new())
        .await
        .unwrap()
        .iter()
        .map(|r| r.uri().to_string())
        .collect();
    assert_eq!(newest_first, vec!["/health", "/api/orders", "/api/users", "/api/users"]);

    let gets = store
        .list(&RecordingQuery::new().with_method("get").with_endpoint("/api"))
        .await
        .unwrap();
    assert_eq!(gets.len(), 2);

    let failures = store
        .list(&RecordingQuery::new().with_status(500))
        .await
        .unwrap();
    assert_eq!(failures[0].uri(), "/api/orders");

    let window = store
        .list(&RecordingQuery::new().with_time_range(Some(at(2)), Some(at(3))))
        .await
        .unwrap();
    assert_eq!(window.len(), 2);

    let page = store
        .list(&RecordingQuery::new().with_page(1, Some(2)))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].uri(), "/api/orders");
}

#[tokio::test]
async fn index_document_maps_ids_to_entries() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::open(dir.path(), StorageFormat::Json, 0)
        .await
        .unwrap();
    let rec = recording("GET", "/indexed", 204, 0);
    store.save(&rec).await.unwrap();

    let raw = std::fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap();
    let index: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &index[rec.id.to_string()];
    assert_eq!(entry["method"], "GET");
    assert_eq!(entry["uri"], "/indexed");
    assert_eq!(entry["status"], 204);
    assert!(entry["filename"].as_str().unwrap().ends_with(".json"));
}
