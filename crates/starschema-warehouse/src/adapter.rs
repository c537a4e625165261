//! Warehouse trait for executing statements

/// Errors that can occur when talking to a warehouse
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {message}")]
    QueryError {
        /// Statement text that failed
        statement: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ExecuteError {
    /// Classify a driver error message for a statement
    pub fn from_query(statement: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.to_lowercase().contains("permission denied") {
            Self::PermissionDenied(message)
        } else {
            Self::QueryError {
                statement: statement.to_string(),
                message,
            }
        }
    }
}

/// A warehouse that can run catalog statements
#[async_trait::async_trait]
pub trait Warehouse: Send + Sync {
    /// Adapter name (e.g., "Redshift")
    fn name(&self) -> &'static str;

    /// Execute a single statement, returning the number of affected rows
    async fn execute(&self, sql: &str) -> Result<u64, ExecuteError>;

    /// Test the connection before running anything
    async fn test_connection(&self) -> Result<(), ExecuteError>;
}
