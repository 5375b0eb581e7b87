//! Agent settings module.
//!
//! Handles loading runtime settings from environment variables with sensible defaults.
//! The connector list itself lives in the JSON file these settings point at.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Agent runtime settings.
///
/// Settings can be set via environment variables:
/// - `MEESEEQLS_CONFIG`: Path of the JSON configuration file (default: "./meeseeqls.json")
/// - `MEESEEQLS_OUTPUT_PATH`: Overrides the output path from the configuration file
/// - `MEESEEQLS_CHANNEL_CAPACITY`: Capacity of result channels (default: 1)
/// - `MEESEEQLS_DRAIN_TIMEOUT_SECS`: Seconds to keep draining after a shutdown signal (default: 5)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    /// Path of the JSON configuration file.
    pub config_path: PathBuf,
    /// Output path overriding the configuration file.
    pub output_path: Option<PathBuf>,
    /// Capacity of every result channel.
    pub channel_capacity: usize,
    /// How long to keep draining in-flight results after shutdown is requested.
    pub drain_timeout: Duration,
}

impl AgentSettings {
    /// Creates settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates settings from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config_path = lookup("MEESEEQLS_CONFIG").map_or(defaults.config_path, PathBuf::from);
        let output_path = lookup("MEESEEQLS_OUTPUT_PATH").map(PathBuf::from);

        let channel_capacity = lookup("MEESEEQLS_CHANNEL_CAPACITY")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("MEESEEQLS_CHANNEL_CAPACITY must be a positive integer")?
            .unwrap_or(defaults.channel_capacity)
            .max(1);

        let drain_timeout = lookup("MEESEEQLS_DRAIN_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("MEESEEQLS_DRAIN_TIMEOUT_SECS must be a whole number of seconds")?
            .map_or(defaults.drain_timeout, Duration::from_secs);

        Ok(Self {
            config_path,
            output_path,
            channel_capacity,
            drain_timeout,
        })
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("./meeseeqls.json"),
            output_path: None,
            channel_capacity: shared::worker::DEFAULT_CHANNEL_CAPACITY,
            drain_timeout: Duration::from_secs(5),
        }
    }
}
