//! Result sinks.
//!
//! This module provides the [`ResultSink`] trait for persisting query
//! results, a JSON-lines file implementation and an in-memory one, plus the
//! [`SinkWriter`] loop that feeds a sink from a result stream.

pub mod file_sink;
pub mod memory_sink;

pub use file_sink::JsonLinesSink;
pub use memory_sink::InMemoryResultSink;

use crate::models::QueryResult;
use crate::worker::ResultStream;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while persisting a result.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination could not be opened.
    #[error("Failed to open output {}: {source}", path.display())]
    Open {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The result could not be encoded.
    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    /// The encoded result could not be written.
    #[error("Failed to write result: {0}")]
    Write(#[from] std::io::Error),

    /// Failed to acquire lock on the sink.
    #[error("Failed to acquire lock on result sink")]
    LockError,
}

/// Durable, append-only destination for results.
///
/// Implementations must keep results in the order `write` is called and be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Appends one result as a self-delimited record.
    ///
    /// # Errors
    ///
    /// Returns an error if the result could not be persisted.
    async fn write(&self, result: &QueryResult) -> Result<(), SinkError>;
}

/// Counts of records handled by a [`SinkWriter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Records persisted.
    pub written: u64,
    /// Records the sink rejected.
    pub failed: u64,
}

/// Feeds results into a sink, logging and counting failed writes instead of
/// stopping on them.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use shared::models::QueryResult;
/// use shared::storage::{InMemoryResultSink, SinkWriter};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let sink = Arc::new(InMemoryResultSink::new());
/// let mut writer = SinkWriter::new(sink.clone());
///
/// let now = Utc::now();
/// writer.write(QueryResult::new(now, now, "a", "b")).await;
///
/// assert_eq!(writer.stats().written, 1);
/// assert_eq!(sink.len().unwrap(), 1);
/// # });
/// ```
pub struct SinkWriter {
    sink: Arc<dyn ResultSink>,
    stats: DrainStats,
}

impl SinkWriter {
    /// Creates a writer for `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        Self {
            sink,
            stats: DrainStats::default(),
        }
    }

    /// Writes one result, logging a failure rather than returning it.
    pub async fn write(&mut self, result: QueryResult) {
        match self.sink.write(&result).await {
            Ok(()) => {
                self.stats.written += 1;
                tracing::debug!(source = %result.source(), "Result written");
            }
            Err(e) => {
                self.stats.failed += 1;
                tracing::error!(error = %e, source = %result.source(), "Failed to write result");
            }
        }
    }

    /// Writes everything from `stream` until it closes.
    pub async fn drain(&mut self, stream: &mut ResultStream) {
        while let Some(result) = stream.recv().await {
            self.write(result).await;
        }
    }

    /// Returns the counts so far.
    #[must_use]
    pub fn stats(&self) -> DrainStats {
        self.stats
    }
}
