//! meeseeqls Agent
//!
//! This crate wires the shared polling engine to its concrete collaborators:
//! it loads the connector configuration, opens the output file, starts one
//! poller per connector against `ClickHouse` and writes every result to the
//! output until the process is asked to stop.
//!
//! # Architecture
//!
//! - [`AgentSettings`] come from environment variables
//! - [`load_config`] reads the JSON connector file they point at
//! - [`run_pipeline`] drives an [`Aggregator`] into a [`ResultSink`] until a
//!   shutdown future resolves, then drains what is still in flight
//!
//! # Example
//!
//! ```no_run
//! use agent::run_agent;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_agent().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;

pub use config::AgentSettings;

use anyhow::{bail, Context, Result};
use shared::config::{AppConfig, ConnectorConfig};
use shared::query::{ClickHouseConnector, Connector};
use shared::storage::{DrainStats, JsonLinesSink, ResultSink, SinkWriter};
use shared::worker::Aggregator;
use std::future::Future;
use std::sync::Arc;

/// Runs the agent with settings from environment variables.
///
/// # Errors
///
/// Returns an error if:
/// - Settings or the configuration file cannot be loaded
/// - The output file cannot be opened
/// - No poller could be started
pub async fn run_agent() -> Result<()> {
    let settings = AgentSettings::from_env()?;
    run_agent_with_settings(settings).await
}

/// Runs the agent with the provided settings until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be loaded
/// - The output file cannot be opened
/// - No poller could be started
pub async fn run_agent_with_settings(settings: AgentSettings) -> Result<()> {
    let config = load_config(&settings)?;

    tracing::info!(
        connectors = config.connectors.len(),
        output = %config.output.path.display(),
        "meeseeqls agent starting"
    );

    let sink = JsonLinesSink::open(&config.output.path)
        .await
        .context("error opening results output")?;

    let stats = run_pipeline(
        config.connectors,
        Arc::new(ClickHouseConnector::new()),
        Arc::new(sink),
        &settings,
        shutdown_signal(),
    )
    .await?;

    tracing::info!(
        written = stats.written,
        failed = stats.failed,
        "Agent shutdown complete"
    );
    Ok(())
}

/// Loads the configuration file named by `settings`, applying the output
/// path override if one is set.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_config(settings: &AgentSettings) -> Result<AppConfig> {
    let mut config = AppConfig::load(&settings.config_path).with_context(|| {
        format!(
            "error initialising application config from {}",
            settings.config_path.display()
        )
    })?;

    if let Some(path) = &settings.output_path {
        config.output.path.clone_from(path);
    }

    Ok(config)
}

/// Starts one poller per connector and writes their results to `sink` until
/// `shutdown` resolves.
///
/// After shutdown every poller is stopped. Results already queued and those
/// of queries still in flight keep being written for at most
/// `settings.drain_timeout`.
///
/// # Errors
///
/// Returns an error if the combined stream closes before shutdown, which
/// happens only when no poller could be started.
pub async fn run_pipeline<F>(
    connectors: Vec<ConnectorConfig>,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn ResultSink>,
    settings: &AgentSettings,
    shutdown: F,
) -> Result<DrainStats>
where
    F: Future<Output = ()>,
{
    let aggregator = Aggregator::from_connectors(connectors, connector, settings.channel_capacity);
    let mut results = aggregator.start();
    let mut writer = SinkWriter::new(sink);

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            next = results.recv() => match next {
                Some(result) => writer.write(result).await,
                None => bail!("no poller is running, check the connector configuration"),
            },
        }
    }

    aggregator.stop();
    tracing::info!(
        timeout_secs = settings.drain_timeout.as_secs(),
        "Draining in-flight results"
    );
    if tokio::time::timeout(settings.drain_timeout, writer.drain(&mut results))
        .await
        .is_err()
    {
        tracing::warn!("Drain timed out, abandoning in-flight results");
    }

    Ok(writer.stats())
}

/// Describes what the agent would poll, one line per connector.
#[must_use]
pub fn describe_plan(config: &AppConfig) -> Vec<String> {
    config
        .connectors
        .iter()
        .map(|c| {
            format!(
                "{}: {} -> {} every {}s via {}",
                c.name, c.source_name, c.destination_name, c.polling_interval, c.database.connection_string
            )
        })
        .collect()
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, stopping pollers");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, stopping pollers");
        }
    }
}
