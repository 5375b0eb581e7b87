//! Integration tests for writing pipeline output to disk.
//!
//! Tests cover:
//! - JSON-lines records produced end to end
//! - Appending across agent restarts

use agent::run_pipeline;
use serde_json::Value;
use shared::storage::JsonLinesSink;
use std::path::Path;
use std::sync::Arc;

use super::common::{connector, settings, shutdown_after, FakeConnector};

fn read_records(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_writes_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meeseeqls.log");
    let sink = Arc::new(JsonLinesSink::open(&path).await.unwrap());

    let stats = run_pipeline(
        vec![connector("orders", "ok://db", 1)],
        FakeConnector::new(),
        sink,
        &settings(),
        shutdown_after(3_500),
    )
    .await
    .unwrap();

    let records = read_records(&path);
    assert_eq!(stats.written, 3);
    assert_eq!(records.len(), 3);

    for record in &records {
        assert_eq!(record["fromSite"], "orders-source");
        assert_eq!(record["toSite"], "orders-destination");

        let start = record["queryStart"].as_i64().unwrap();
        let end = record["queryEnd"].as_i64().unwrap();
        let duration = record["duration"].as_i64().unwrap();
        assert!(end >= start);
        assert_eq!(duration, (end - start) * 1_000_000);
    }
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_appends_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meeseeqls.log");

    for _ in 0..2 {
        let sink = Arc::new(JsonLinesSink::open(&path).await.unwrap());
        run_pipeline(
            vec![connector("orders", "ok://db", 1)],
            FakeConnector::new(),
            sink,
            &settings(),
            shutdown_after(2_500),
        )
        .await
        .unwrap();
    }

    assert_eq!(read_records(&path).len(), 4);
}
