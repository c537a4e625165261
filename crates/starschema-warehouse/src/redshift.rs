//! Amazon Redshift adapter over the PostgreSQL wire protocol
//!
//! Redshift speaks the PostgreSQL protocol, so the adapter is a thin layer
//! over `tokio-postgres`. It also works against plain PostgreSQL for the
//! statements PostgreSQL understands (everything but `COPY ... iam_role`
//! and the `IDENTITY`/`DISTKEY` column attributes).
//!
//! ## Usage
//!
//! ```rust,ignore
//! let warehouse = RedshiftWarehouse::connect(&cluster).await?;
//!
//! // Redshift clusters usually require SSL
//! let warehouse = RedshiftWarehouse::connect_with_tls(&cluster).await?;
//! ```

use crate::adapter::{ExecuteError, Warehouse};
use starschema_core::ClusterConfig;

#[cfg(feature = "postgres")]
use tokio_postgres::{Client, NoTls};

#[cfg(feature = "postgres")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "postgres")]
use native_tls::TlsConnector;

#[cfg(not(feature = "postgres"))]
const NOT_COMPILED: &str =
    "Redshift support not compiled. Rebuild with: cargo build --features postgres";

/// Redshift warehouse adapter
pub struct RedshiftWarehouse {
    /// PostgreSQL client (only available with postgres feature)
    #[cfg(feature = "postgres")]
    client: Client,

    /// Connection host
    host: String,

    /// Connection port
    port: u16,

    /// Database name
    database: String,
}

impl RedshiftWarehouse {
    /// Connect without TLS
    #[cfg(feature = "postgres")]
    pub async fn connect(cluster: &ClusterConfig) -> Result<Self, ExecuteError> {
        let (client, connection) = tokio_postgres::connect(&cluster.connection_string(), NoTls)
            .await
            .map_err(|e| ExecuteError::ConnectionError(format!(
                "Failed to connect to {}:{}: {}",
                cluster.host, cluster.db_port, e
            )))?;

        // Drive the connection in the background
        let host = cluster.host.clone();
        let port = cluster.db_port;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(%host, port, error = %e, "warehouse connection error");
            }
        });

        tracing::info!(host = %cluster.host, port = cluster.db_port, database = %cluster.db_name, "connected");
        Ok(Self::from_client(client, cluster))
    }

    /// Connect with TLS
    #[cfg(feature = "postgres")]
    pub async fn connect_with_tls(cluster: &ClusterConfig) -> Result<Self, ExecuteError> {
        let connector = TlsConnector::builder()
            .build()
            .map_err(|e| ExecuteError::ConfigError(format!(
                "Failed to create TLS connector: {}", e
            )))?;

        let tls = MakeTlsConnector::new(connector);

        let (client, connection) = tokio_postgres::connect(&cluster.connection_string(), tls)
            .await
            .map_err(|e| ExecuteError::ConnectionError(format!(
                "Failed to connect to {}:{} with TLS: {}",
                cluster.host, cluster.db_port, e
            )))?;

        let host = cluster.host.clone();
        let port = cluster.db_port;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(%host, port, error = %e, "warehouse TLS connection error");
            }
        });

        tracing::info!(host = %cluster.host, port = cluster.db_port, database = %cluster.db_name, "connected with TLS");
        Ok(Self::from_client(client, cluster))
    }

    #[cfg(feature = "postgres")]
    fn from_client(client: Client, cluster: &ClusterConfig) -> Self {
        Self {
            client,
            host: cluster.host.clone(),
            port: cluster.db_port,
            database: cluster.db_name.clone(),
        }
    }

    /// Connect without the postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub async fn connect(_cluster: &ClusterConfig) -> Result<Self, ExecuteError> {
        Err(ExecuteError::ConfigError(NOT_COMPILED.to_string()))
    }

    /// Connect without the postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub async fn connect_with_tls(_cluster: &ClusterConfig) -> Result<Self, ExecuteError> {
        Err(ExecuteError::ConfigError(NOT_COMPILED.to_string()))
    }

    /// Get the connection host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the connection port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the database name
    pub fn database(&self) -> &str {
        &self.database
    }
}

#[async_trait::async_trait]
impl Warehouse for RedshiftWarehouse {
    fn name(&self) -> &'static str {
        "Redshift"
    }

    #[cfg(feature = "postgres")]
    async fn execute(&self, sql: &str) -> Result<u64, ExecuteError> {
        // Simple query protocol: statements carry no bind parameters
        let messages = self
            .client
            .simple_query(sql)
            .await
            .map_err(|e| ExecuteError::from_query(sql, e.to_string()))?;

        let rows = messages
            .iter()
            .filter_map(|m| match m {
                tokio_postgres::SimpleQueryMessage::CommandComplete(n) => Some(*n),
                _ => None,
            })
            .sum();

        Ok(rows)
    }

    #[cfg(not(feature = "postgres"))]
    async fn execute(&self, _sql: &str) -> Result<u64, ExecuteError> {
        Err(ExecuteError::ConfigError(NOT_COMPILED.to_string()))
    }

    #[cfg(feature = "postgres")]
    async fn test_connection(&self) -> Result<(), ExecuteError> {
        self.client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| ExecuteError::ConnectionError(format!("Connection test failed: {}", e)))?;
        Ok(())
    }

    #[cfg(not(feature = "postgres"))]
    async fn test_connection(&self) -> Result<(), ExecuteError> {
        Err(ExecuteError::ConfigError(NOT_COMPILED.to_string()))
    }
}

#[cfg(all(test, not(feature = "postgres")))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_requires_feature() {
        let cluster = ClusterConfig {
            host: "localhost".to_string(),
            db_name: "dwh".to_string(),
            db_user: "dwhuser".to_string(),
            db_password: None,
            db_port: 5439,
        };

        let err = RedshiftWarehouse::connect(&cluster).await.err().unwrap();
        assert!(matches!(err, ExecuteError::ConfigError(_)));
    }
}
