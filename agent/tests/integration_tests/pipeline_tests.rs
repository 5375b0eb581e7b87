//! Integration tests for the polling pipeline.
//!
//! Tests cover:
//! - Per-source result counts for mixed intervals
//! - Isolation of failing sources
//! - Partial startup and total startup failure
//! - Sink failures not halting aggregation
//! - Hung connections not holding back other sources
//! - Draining queries still in flight at shutdown

use agent::run_pipeline;
use shared::storage::InMemoryResultSink;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use super::common::{connector, count_by_source, settings, shutdown_after, FakeConnector, FlakySink};

#[tokio::test(start_paused = true)]
async fn test_two_sources_with_different_intervals() {
    let sink = Arc::new(InMemoryResultSink::new());
    let connectors = vec![connector("a", "ok://a", 1), connector("b", "ok://b", 2)];

    let stats = assert_ok!(
        run_pipeline(connectors, FakeConnector::new(), sink.clone(), &settings(), shutdown_after(5_500)).await
    );

    let results = sink.results().unwrap();
    let counts = count_by_source(&results);

    assert_eq!(stats.written, 7);
    assert_eq!(stats.failed, 0);
    assert_eq!(results.len(), 7);
    assert_eq!(counts.get("a-source"), Some(&5));
    assert_eq!(counts.get("b-source"), Some(&2));

    for result in &results {
        let name = result.source().trim_end_matches("-source");
        assert_eq!(result.destination(), format!("{name}-destination"));
        assert!(result.end() >= result.start());
        assert_eq!(result.duration(), result.end() - result.start());
    }
}

#[tokio::test(start_paused = true)]
async fn test_failing_source_does_not_block_healthy_source() {
    let sink = Arc::new(InMemoryResultSink::new());
    let connectors = vec![connector("broken", "fail://db", 1), connector("healthy", "ok://db", 1)];

    let stats = assert_ok!(
        run_pipeline(connectors, FakeConnector::new(), sink.clone(), &settings(), shutdown_after(5_500)).await
    );

    let counts = count_by_source(&sink.results().unwrap());

    assert_eq!(stats.written, 5);
    assert_eq!(counts.get("healthy-source"), Some(&5));
    assert_eq!(counts.get("broken-source"), None);
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_source_runs_without_results() {
    let sink = Arc::new(InMemoryResultSink::new());
    let connectors = vec![connector("broken", "fail://db", 1)];

    let stats = assert_ok!(
        run_pipeline(connectors, FakeConnector::new(), sink.clone(), &settings(), shutdown_after(30_500)).await
    );

    assert_eq!(stats.written, 0);
    assert!(sink.is_empty().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_partial_startup() {
    let sink = Arc::new(InMemoryResultSink::new());
    let fake = FakeConnector::new();
    let connectors = vec![connector("down", "refuse://db", 1), connector("up", "ok://db", 1)];

    let stats = assert_ok!(
        run_pipeline(connectors, fake.clone(), sink.clone(), &settings(), shutdown_after(3_500)).await
    );

    assert_eq!(fake.connects(), 2);
    assert_eq!(stats.written, 3);
    assert!(sink.results().unwrap().iter().all(|r| r.source() == "up-source"));
}

#[tokio::test(start_paused = true)]
async fn test_no_poller_started_is_an_error() {
    let sink = Arc::new(InMemoryResultSink::new());
    let connectors = vec![connector("x", "refuse://x", 1), connector("y", "refuse://y", 1)];

    let result = run_pipeline(connectors, FakeConnector::new(), sink.clone(), &settings(), shutdown_after(60_000)).await;

    assert_err!(result);
    assert!(sink.is_empty().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_results_never_exceed_ticks() {
    let sink = Arc::new(InMemoryResultSink::new());
    let connectors = vec![connector("slow", "ok://db", 3)];

    let stats = assert_ok!(
        run_pipeline(connectors, FakeConnector::new(), sink.clone(), &settings(), shutdown_after(10_000)).await
    );

    // Ticks at 3s, 6s and 9s.
    assert_eq!(stats.written, 3);
}

#[tokio::test(start_paused = true)]
async fn test_sink_failures_do_not_halt_aggregation() {
    let sink = Arc::new(FlakySink::default());
    let connectors = vec![connector("a", "ok://db", 1)];

    let stats = assert_ok!(
        run_pipeline(connectors, FakeConnector::new(), sink.clone(), &settings(), shutdown_after(5_500)).await
    );

    assert_eq!(stats.written, 3);
    assert_eq!(stats.failed, 2);
    assert_eq!(sink.accepted.len().unwrap(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_hung_connection_does_not_block_other_sources() {
    let sink = Arc::new(InMemoryResultSink::new());
    let connectors = vec![connector("stuck", "hang://db", 1), connector("up", "ok://db", 1)];

    let stats = assert_ok!(
        run_pipeline(connectors, FakeConnector::new(), sink.clone(), &settings(), shutdown_after(3_500)).await
    );

    assert_eq!(stats.written, 3);
    assert!(sink.results().unwrap().iter().all(|r| r.source() == "up-source"));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_query_in_flight() {
    let sink = Arc::new(InMemoryResultSink::new());
    let connectors = vec![connector("slow", "slow://db", 1)];

    // The tick at 1s is still running at shutdown and finishes at 2.5s,
    // inside the two second drain window.
    let stats = assert_ok!(
        run_pipeline(connectors, FakeConnector::new(), sink.clone(), &settings(), shutdown_after(1_200)).await
    );

    assert_eq!(stats.written, 1);
    assert_eq!(sink.results().unwrap()[0].source(), "slow-source");
}
