//! Configuration module for meeseeqls.
//!
//! The agent is configured from a single JSON file holding the output
//! location and the list of connectors to poll:
//!
//! ```json
//! {
//!   "output": { "path": "/var/log/meeseeqls.log" },
//!   "connectors": [
//!     {
//!       "name": "orders",
//!       "query": "SELECT count() FROM orders",
//!       "sourceName": "dc-east",
//!       "destinationName": "dc-west",
//!       "pollingInterval": 30,
//!       "database": { "username": "reader", "password": "secret", "connectionString": "http://db:8123" }
//!     }
//!   ]
//! }
//! ```

pub mod connector;

pub use connector::{ConnectorConfig, DatabaseConfig, DEFAULT_POLLING_INTERVAL_SECS};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::Validate;

/// Output path applied when the configuration file does not name one.
pub const DEFAULT_OUTPUT_PATH: &str = "./meeseeqls.log";

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is not valid JSON or does not match the schema.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A connector failed field validation.
    #[error("Invalid connector '{name}': {source}")]
    InvalidConnector {
        /// Name of the offending connector.
        name: String,
        /// Field validation errors.
        source: validator::ValidationErrors,
    },

    /// No connectors are configured.
    #[error("At least one connector must be configured")]
    NoConnectors,

    /// Two connectors share a name.
    #[error("Duplicate connector name: {0}")]
    DuplicateConnector(String),
}

/// Where results are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the append-only output file.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

/// Complete agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Connectors to poll, one poller each.
    #[serde(default)]
    pub connectors: Vec<ConnectorConfig>,
}

impl AppConfig {
    /// Parses and validates a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the configuration is invalid.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate_config()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or the
    /// configuration is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Configuration file read");
        Self::from_json_str(&contents)
    }

    /// Validates all connectors.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No connector is configured
    /// - A connector fails field validation
    /// - Two connectors share a name
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        if self.connectors.is_empty() {
            return Err(ConfigError::NoConnectors);
        }

        let mut seen = HashSet::new();
        for connector in &self.connectors {
            connector
                .validate()
                .map_err(|source| ConfigError::InvalidConnector {
                    name: connector.name.clone(),
                    source,
                })?;

            if !seen.insert(connector.name.as_str()) {
                return Err(ConfigError::DuplicateConnector(connector.name.clone()));
            }
        }

        Ok(())
    }
}
