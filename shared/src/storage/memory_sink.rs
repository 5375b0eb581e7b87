//! In-memory result sink.

use super::{ResultSink, SinkError};
use crate::models::QueryResult;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Result sink that keeps everything in a `Vec` protected by a `RwLock`.
///
/// Suitable for tests and dry runs. Data is not persisted across restarts.
#[derive(Debug, Default, Clone)]
pub struct InMemoryResultSink {
    results: Arc<RwLock<Vec<QueryResult>>>,
}

impl InMemoryResultSink {
    /// Creates a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every result written so far, in write order.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn results(&self) -> Result<Vec<QueryResult>, SinkError> {
        let results = self.results.read().map_err(|_| SinkError::LockError)?;
        Ok(results.clone())
    }

    /// Returns the number of results written.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize, SinkError> {
        let results = self.results.read().map_err(|_| SinkError::LockError)?;
        Ok(results.len())
    }

    /// Returns true if nothing has been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, SinkError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ResultSink for InMemoryResultSink {
    async fn write(&self, result: &QueryResult) -> Result<(), SinkError> {
        let mut results = self.results.write().map_err(|_| SinkError::LockError)?;
        results.push(result.clone());
        Ok(())
    }
}
