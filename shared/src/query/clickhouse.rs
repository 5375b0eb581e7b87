//! `ClickHouse` query backend.
//!
//! Queries are sent over the HTTP interface with [`clickhouse::Client`].
//! Note that the client treats `?` as a bind placeholder; queries containing
//! a literal question mark must escape it as `??`.

use async_trait::async_trait;
use clickhouse::Client;
use std::sync::Arc;

use super::{Connection, Connector, QueryError};
use crate::config::DatabaseConfig;

/// Query used to verify a freshly built client can reach the server.
const PING_QUERY: &str = "SELECT 1";

/// Opens [`ClickHouseConnection`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickHouseConnector;

impl ClickHouseConnector {
    /// Creates a new connector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds a client from connection parameters without contacting the server.
    #[must_use]
    pub fn client(database: &DatabaseConfig) -> Client {
        let mut client = Client::default()
            .with_url(&database.connection_string)
            .with_user(&database.username)
            .with_password(&database.password);

        if let Some(name) = &database.database {
            client = client.with_database(name);
        }

        client
    }
}

#[async_trait]
impl Connector for ClickHouseConnector {
    async fn connect(&self, database: &DatabaseConfig) -> Result<Arc<dyn Connection>, QueryError> {
        let client = Self::client(database);

        client
            .query(PING_QUERY)
            .execute()
            .await
            .map_err(|e| QueryError::Connect(e.to_string()))?;

        Ok(Arc::new(ClickHouseConnection::new(client)))
    }
}

/// A `ClickHouse` client bound to one connector.
#[derive(Clone)]
pub struct ClickHouseConnection {
    client: Client,
}

impl ClickHouseConnection {
    /// Wraps an already configured client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Connection for ClickHouseConnection {
    async fn execute(&self, query: &str) -> Result<(), QueryError> {
        // `execute` reads the response body to the end and drops it.
        self.client
            .query(query)
            .execute()
            .await
            .map_err(|e| QueryError::Execute(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_unreachable_server_fails() {
        let database = DatabaseConfig::new("http://127.0.0.1:1").with_credentials("reader", "secret");

        let result = ClickHouseConnector::new().connect(&database).await;

        assert!(matches!(result, Err(QueryError::Connect(_))));
    }

    #[tokio::test]
    async fn test_execute_against_unreachable_server_fails() {
        let database = DatabaseConfig::new("http://127.0.0.1:1")
            .with_credentials("reader", "secret")
            .with_database("metrics");
        let connection = ClickHouseConnection::new(ClickHouseConnector::client(&database));

        let result = connection.execute("SELECT count() FROM orders").await;

        assert!(matches!(result, Err(QueryError::Execute(_))));
    }
}
