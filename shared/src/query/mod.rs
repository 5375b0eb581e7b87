//! Query execution seam.
//!
//! Pollers never talk to a database driver directly. They ask a
//! [`Connector`] for a [`Connection`] once, then call
//! [`Connection::execute`] on every tick. Any rows returned are consumed and
//! discarded by the connection before `execute` returns, on success and on
//! failure alike.

pub mod clickhouse;

pub use self::clickhouse::{ClickHouseConnection, ClickHouseConnector};

use crate::config::DatabaseConfig;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a query backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The connection could not be established.
    #[error("error opening connection: {0}")]
    Connect(String),

    /// The query failed.
    #[error("error executing query: {0}")]
    Execute(String),
}

/// An established connection able to run queries.
///
/// Implementations must be safe to share between the concurrent tick tasks
/// of one poller.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Executes `query`, draining and discarding any returned rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execute`] if the query fails.
    async fn execute(&self, query: &str) -> Result<(), QueryError>;
}

/// Opens connections from connection parameters.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a connection to the database described by `database`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Connect`] if the database cannot be reached.
    async fn connect(&self, database: &DatabaseConfig) -> Result<Arc<dyn Connection>, QueryError>;
}
