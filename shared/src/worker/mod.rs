//! Polling engine.
//!
//! A [`PollableUnit`] is anything that can be started to produce a stream of
//! [`QueryResult`]s and later stopped. [`Poller`] is the unit bound to one
//! connector configuration; [`Aggregator`] starts a set of units and merges
//! their streams into one.
//!
//! Streams are bounded channels. Capacity `1` gives near-rendezvous
//! hand-off, larger capacities let producers run ahead of a slow consumer.

pub mod aggregator;
pub mod poller;

pub use aggregator::Aggregator;
pub use poller::{Poller, PollerState};

use crate::models::QueryResult;
use crate::query::QueryError;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Channel capacity used when none is configured.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Receiving end of a unit's results.
pub type ResultStream = mpsc::Receiver<QueryResult>;

/// Errors returned when starting a unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollerError {
    /// The unit's connection could not be established.
    #[error("[{name}] {source}")]
    Connection {
        /// Name of the unit.
        name: String,
        /// Error reported by the connector.
        source: QueryError,
    },

    /// The unit was stopped and cannot be started again.
    #[error("[{0}] poller has been stopped")]
    Stopped(String),
}

/// A worker that produces query results until told to stop.
#[async_trait]
pub trait PollableUnit: Send + Sync {
    /// Name identifying the unit in logs.
    fn name(&self) -> &str;

    /// Starts producing results.
    ///
    /// The underlying connection is opened at most once per unit, however
    /// often `start` is called. Every successful call returns a fresh stream
    /// fed by its own run loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection could not be established or the
    /// unit has already been stopped. The unit produces nothing in that case.
    async fn start(&self) -> Result<ResultStream, PollerError>;

    /// Signals every run loop of the unit to terminate.
    ///
    /// Does not wait for the loops to exit. Calling it more than once has no
    /// further effect.
    fn stop(&self);
}
