//! Fan-in of many pollable units into one stream.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{PollableUnit, Poller, ResultStream, DEFAULT_CHANNEL_CAPACITY};
use crate::config::ConnectorConfig;
use crate::models::QueryResult;
use crate::query::Connector;

/// Starts a set of units and merges their results into a single stream.
///
/// Results from one unit keep their relative order on the combined stream.
/// Results from different units interleave in arrival order. The forwarding
/// stage never drops a result; a slow consumer applies backpressure instead.
pub struct Aggregator {
    units: Vec<Arc<dyn PollableUnit>>,
    capacity: usize,
    cancel: CancellationToken,
}

impl Aggregator {
    /// Creates an aggregator over already constructed units.
    #[must_use]
    pub fn new(units: Vec<Arc<dyn PollableUnit>>) -> Self {
        Self {
            units,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates one [`Poller`] per connector, all sharing `connector` to open
    /// their connections.
    ///
    /// `capacity` applies to every poller stream and to the combined stream.
    #[must_use]
    pub fn from_connectors(
        configs: Vec<ConnectorConfig>,
        connector: Arc<dyn Connector>,
        capacity: usize,
    ) -> Self {
        let units = configs
            .into_iter()
            .map(|config| {
                let poller = Poller::new(config, Arc::clone(&connector)).with_channel_capacity(capacity);
                Arc::new(poller) as Arc<dyn PollableUnit>
            })
            .collect();

        Self::new(units).with_channel_capacity(capacity)
    }

    /// Sets the capacity of the combined stream.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Returns the managed units.
    #[must_use]
    pub fn units(&self) -> &[Arc<dyn PollableUnit>] {
        &self.units
    }

    /// Starts every unit and returns the combined stream at once.
    ///
    /// Each unit is started on its own task, which then forwards the unit's
    /// results, so a unit that is slow to connect holds back nobody else. A
    /// unit that fails to start is logged and left out. The combined stream
    /// closes once every unit has either failed to start or closed its own
    /// stream.
    #[must_use]
    pub fn start(&self) -> ResultStream {
        let (combined, stream) = mpsc::channel(self.capacity);

        for unit in &self.units {
            tokio::spawn(start_and_forward(
                Arc::clone(unit),
                self.cancel.clone(),
                combined.clone(),
            ));
        }

        info!(total = self.units.len(), "Starting pollers");
        stream
    }

    /// Signals every unit to stop.
    ///
    /// Units still connecting are abandoned so they no longer hold the
    /// combined stream open.
    pub fn stop(&self) {
        self.cancel.cancel();
        for unit in &self.units {
            unit.stop();
        }
    }
}

/// Starts one unit, then forwards its stream onto the combined one.
async fn start_and_forward(
    unit: Arc<dyn PollableUnit>,
    cancel: CancellationToken,
    combined: mpsc::Sender<QueryResult>,
) {
    let started = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            warn!(poller = %unit.name(), "Aggregator stopped before poller started");
            return;
        }
        started = unit.start() => started,
    };

    match started {
        Ok(results) => {
            info!(poller = %unit.name(), "Poller started");
            forward(unit.name(), results, combined).await;
        }
        Err(e) => error!(poller = %unit.name(), error = %e, "Failed to start poller"),
    }
}

/// Republishes everything read from one unit onto the combined stream.
async fn forward(name: &str, mut results: ResultStream, combined: mpsc::Sender<QueryResult>) {
    while let Some(result) = results.recv().await {
        if combined.send(result).await.is_err() {
            warn!(poller = %name, "Combined stream closed, forwarder exiting");
            return;
        }
    }
    debug!(poller = %name, "Poller stream closed");
}
