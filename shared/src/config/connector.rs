//! Connector configuration.
//!
//! A connector describes one data source to poll: which query to run, how
//! often, how to reach the database and which labels to stamp on every
//! result it produces.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::Validate;

/// Polling interval applied when a connector does not specify one.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 60;

fn default_polling_interval() -> u64 {
    DEFAULT_POLLING_INTERVAL_SECS
}

/// Connection parameters for a connector's database.
///
/// The `connection_string` is handed to the query backend as-is; for the
/// `ClickHouse` backend it is the HTTP URL of the server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Username for authentication.
    #[serde(default)]
    pub username: String,

    /// Password for authentication.
    #[serde(default)]
    pub password: String,

    /// Address of the database server.
    #[validate(length(min = 1, message = "Connection string cannot be empty"))]
    pub connection_string: String,

    /// Optional database (schema) to run the query in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl DatabaseConfig {
    /// Creates connection parameters for the given address with empty credentials.
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            connection_string: connection_string.into(),
            database: None,
        }
    }

    /// Sets the username and password.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the database to run queries in.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connection_string", &self.connection_string)
            .field("database", &self.database)
            .finish()
    }
}

/// Static configuration of one polled data source.
///
/// # Example
///
/// ```
/// use shared::config::{ConnectorConfig, DatabaseConfig};
/// use std::time::Duration;
///
/// let connector = ConnectorConfig::new("orders", "SELECT 1", DatabaseConfig::new("http://db:8123"))
///     .with_labels("dc-east", "dc-west")
///     .with_polling_interval(30);
///
/// assert_eq!(connector.interval(), Duration::from_secs(30));
/// assert!(connector.validate_connector().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorConfig {
    /// Unique name of the connector, used to identify it in logs.
    #[validate(length(min = 1, message = "Connector name cannot be empty"))]
    pub name: String,

    /// Query executed on every tick.
    #[validate(length(min = 1, message = "Query cannot be empty"))]
    pub query: String,

    /// Label of the site the data is read from.
    #[serde(default)]
    pub source_name: String,

    /// Label of the site the data is destined for.
    #[serde(default)]
    pub destination_name: String,

    /// Seconds between two executions of the query.
    #[serde(default = "default_polling_interval")]
    #[validate(range(min = 1, message = "Polling interval must be at least one second"))]
    pub polling_interval: u64,

    /// How to reach the database.
    #[validate(nested)]
    pub database: DatabaseConfig,
}

impl ConnectorConfig {
    /// Creates a connector with empty labels and the default polling interval.
    #[must_use]
    pub fn new(name: impl Into<String>, query: impl Into<String>, database: DatabaseConfig) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            source_name: String::new(),
            destination_name: String::new(),
            polling_interval: DEFAULT_POLLING_INTERVAL_SECS,
            database,
        }
    }

    /// Sets the source and destination labels.
    #[must_use]
    pub fn with_labels(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.source_name = source.into();
        self.destination_name = destination.into();
        self
    }

    /// Sets the polling interval in seconds.
    #[must_use]
    pub fn with_polling_interval(mut self, seconds: u64) -> Self {
        self.polling_interval = seconds;
        self
    }

    /// Returns the polling interval as a `Duration`.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval)
    }

    /// Validates the connector.
    ///
    /// # Errors
    ///
    /// Returns an error if the name, query or connection string is empty, or
    /// if the polling interval is zero.
    pub fn validate_connector(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()
    }
}
