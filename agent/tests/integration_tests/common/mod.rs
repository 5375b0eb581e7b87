//! Common test utilities and helpers for integration tests.
//!
//! Fake connectors are steered by the scheme of the connection string:
//! - `ok://` connects and every query succeeds
//! - `fail://` connects but every query fails
//! - `slow://` connects and every query takes 1.5 seconds
//! - `refuse://` cannot connect at all
//! - `hang://` never finishes connecting

use agent::AgentSettings;
use shared::async_trait;
use shared::config::{ConnectorConfig, DatabaseConfig};
use shared::models::QueryResult;
use shared::query::{Connection, Connector, QueryError};
use shared::storage::{InMemoryResultSink, ResultSink, SinkError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Connector whose behaviour depends on the connection string scheme.
#[derive(Default)]
pub struct FakeConnector {
    connects: AtomicUsize,
}

impl FakeConnector {
    /// Creates a new fake connector.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of connection attempts so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, database: &DatabaseConfig) -> Result<Arc<dyn Connection>, QueryError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let address = database.connection_string.as_str();
        if address.starts_with("refuse://") {
            return Err(QueryError::Connect(format!("{address} refused the connection")));
        }
        if address.starts_with("hang://") {
            std::future::pending::<()>().await;
        }

        Ok(Arc::new(FakeConnection {
            fail: address.starts_with("fail://"),
            slow: address.starts_with("slow://"),
        }))
    }
}

struct FakeConnection {
    fail: bool,
    slow: bool,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn execute(&self, _query: &str) -> Result<(), QueryError> {
        if self.slow {
            tokio::time::sleep(Duration::from_millis(1_500)).await;
        }
        if self.fail {
            return Err(QueryError::Execute(r#"relation "orders" does not exist"#.to_string()));
        }
        Ok(())
    }
}

/// Sink that rejects every second write.
#[derive(Default)]
pub struct FlakySink {
    calls: AtomicUsize,
    /// Records that were accepted.
    pub accepted: InMemoryResultSink,
}

#[async_trait]
impl ResultSink for FlakySink {
    async fn write(&self, result: &QueryResult) -> Result<(), SinkError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
            return Err(SinkError::Write(std::io::Error::other("no space left on device")));
        }
        self.accepted.write(result).await
    }
}

/// Builds a connector polling `address` every `interval` seconds.
pub fn connector(name: &str, address: &str, interval: u64) -> ConnectorConfig {
    ConnectorConfig::new(name, "SELECT 1 FROM dual", DatabaseConfig::new(address))
        .with_labels(format!("{name}-source"), format!("{name}-destination"))
        .with_polling_interval(interval)
}

/// Settings with the default capacity and a short drain timeout.
pub fn settings() -> AgentSettings {
    AgentSettings {
        drain_timeout: Duration::from_secs(2),
        ..AgentSettings::default()
    }
}

/// Shutdown future resolving after `millis` of (paused) time.
pub fn shutdown_after(millis: u64) -> tokio::time::Sleep {
    tokio::time::sleep(Duration::from_millis(millis))
}

/// Counts results per source label.
pub fn count_by_source(results: &[QueryResult]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for result in results {
        *counts.entry(result.source().to_string()).or_insert(0) += 1;
    }
    counts
}
