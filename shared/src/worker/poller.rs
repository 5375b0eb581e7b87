//! Connector-backed pollable unit.
//!
//! A [`Poller`] owns the connection for one connector. Once started, its run
//! loop ticks every polling interval and spawns one task per tick, so a slow
//! query never delays the next tick. Ticks may therefore overlap, and results
//! leave the poller in the order their queries finish.
//!
//! Stopping ends the run loop but not the ticks already executing: their
//! results are still published, and the stream closes once the last of them
//! is done.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, OnceCell};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{PollableUnit, PollerError, ResultStream, DEFAULT_CHANNEL_CAPACITY};
use crate::config::ConnectorConfig;
use crate::models::QueryResult;
use crate::query::{Connection, Connector, QueryError};

/// Lifecycle state of a [`Poller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Constructed, never started.
    Idle,
    /// At least one run loop has been launched.
    Running,
    /// `stop` has been called; the poller cannot be started again.
    Stopped,
}

/// Polls one connector on its configured interval.
///
/// # Example
///
/// ```no_run
/// use shared::config::{ConnectorConfig, DatabaseConfig};
/// use shared::query::ClickHouseConnector;
/// use shared::worker::{PollableUnit, Poller};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), shared::worker::PollerError> {
/// let config = ConnectorConfig::new("orders", "SELECT 1", DatabaseConfig::new("http://db:8123"));
/// let poller = Poller::new(config, Arc::new(ClickHouseConnector::new()));
///
/// let mut results = poller.start().await?;
/// while let Some(result) = results.recv().await {
///     println!("query took {}ms", result.duration().num_milliseconds());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Poller {
    config: Arc<ConnectorConfig>,
    connector: Arc<dyn Connector>,
    connection: OnceCell<Result<Arc<dyn Connection>, QueryError>>,
    started: AtomicBool,
    cancel: CancellationToken,
    capacity: usize,
}

impl Poller {
    /// Creates an idle poller. No connection is opened until [`start`](PollableUnit::start).
    #[must_use]
    pub fn new(config: ConnectorConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
            connection: OnceCell::new(),
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Sets the capacity of the result streams returned by `start`.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Returns the connector configuration this poller was built from.
    #[must_use]
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PollerState {
        if self.cancel.is_cancelled() {
            PollerState::Stopped
        } else if self.started.load(Ordering::SeqCst) {
            PollerState::Running
        } else {
            PollerState::Idle
        }
    }

    /// Opens the connection on first use and returns the outcome of that
    /// single attempt on every later call.
    async fn connection(&self) -> Result<Arc<dyn Connection>, PollerError> {
        let outcome = self
            .connection
            .get_or_init(|| async {
                info!(poller = %self.config.name, "Opening a connection");
                let outcome = self.connector.connect(&self.config.database).await;
                match &outcome {
                    Ok(_) => info!(poller = %self.config.name, "Connection opened"),
                    Err(e) => error!(poller = %self.config.name, error = %e, "Failed to open connection"),
                }
                outcome
            })
            .await;

        outcome.clone().map_err(|source| PollerError::Connection {
            name: self.config.name.clone(),
            source,
        })
    }
}

#[async_trait]
impl PollableUnit for Poller {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn start(&self) -> Result<ResultStream, PollerError> {
        if self.cancel.is_cancelled() {
            return Err(PollerError::Stopped(self.config.name.clone()));
        }

        let connection = self.connection().await?;
        let (results, stream) = mpsc::channel(self.capacity);
        self.started.store(true, Ordering::SeqCst);

        let run_loop = RunLoop {
            config: Arc::clone(&self.config),
            connection,
            cancel: self.cancel.clone(),
            results,
        };
        tokio::spawn(run_loop.run());

        Ok(stream)
    }

    fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!(poller = %self.config.name, "Stopping poller");
        }
        self.cancel.cancel();
    }
}

impl fmt::Display for Poller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.config.name)
    }
}

/// Everything a run loop and its tick tasks need, cloned into each tick.
#[derive(Clone)]
struct RunLoop {
    config: Arc<ConnectorConfig>,
    connection: Arc<dyn Connection>,
    cancel: CancellationToken,
    results: mpsc::Sender<QueryResult>,
}

impl RunLoop {
    async fn run(self) {
        let period = self.config.interval();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            poller = %self.config.name,
            interval_secs = self.config.polling_interval,
            "Starting ticker"
        );

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!(poller = %self.config.name, "Exiting run loop");
                    return;
                }
                _ = ticker.tick() => {
                    tokio::spawn(self.clone().tick());
                }
            }
        }
    }

    async fn tick(self) {
        let start = Utc::now();
        debug!(poller = %self.config.name, "Executing query");

        if let Err(e) = self.connection.execute(&self.config.query).await {
            error!(poller = %self.config.name, error = %e, "Query failed");
            return;
        }

        let result = QueryResult::new(
            start,
            Utc::now(),
            self.config.source_name.as_str(),
            self.config.destination_name.as_str(),
        );

        // Published even after stop; given up only once the reader is gone.
        tokio::select! {
            sent = self.results.send(result) => {
                if sent.is_err() {
                    debug!(poller = %self.config.name, "Result stream closed, discarding result");
                }
            }
            () = self.results.closed() => {
                debug!(poller = %self.config.name, "Result stream closed, discarding result");
            }
        }
    }
}
