//! Mock warehouse for testing
//!
//! Records every statement it is asked to execute without connecting
//! anywhere. Useful for pipeline tests, dry runs and simulating failures.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let warehouse = MockWarehouse::new()
//!     .with_failure_on("staging_songs", "S3ServiceException: Access Denied")
//!     .with_rows_for("INSERT INTO fact_tables.songplays", 333);
//!
//! warehouse.execute("DROP SCHEMA IF EXISTS fact_tables CASCADE").await?;
//! assert_eq!(warehouse.executed().await.len(), 1);
//! ```

use crate::adapter::{ExecuteError, Warehouse};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock warehouse adapter
pub struct MockWarehouse {
    /// Statements executed so far, in order
    executed: Arc<Mutex<Vec<String>>>,

    /// (substring, message) pairs; a matching statement fails
    failures: Vec<(String, String)>,

    /// (substring, rows) pairs reported as affected rows
    rows: Vec<(String, u64)>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulate query latency (milliseconds)
    latency_ms: u64,
}

impl MockWarehouse {
    pub fn new() -> Self {
        Self {
            executed: Arc::new(Mutex::new(Vec::new())),
            failures: Vec::new(),
            rows: Vec::new(),
            fail_connection: false,
            latency_ms: 0,
        }
    }

    /// Fail any statement containing `pattern`
    pub fn with_failure_on(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.push((pattern.into(), message.into()));
        self
    }

    /// Report `rows` affected rows for statements containing `pattern`
    pub fn with_rows_for(mut self, pattern: impl Into<String>, rows: u64) -> Self {
        self.rows.push((pattern.into(), rows));
        self
    }

    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Snapshot of executed statements
    pub async fn executed(&self) -> Vec<String> {
        self.executed.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.executed.lock().await.clear();
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }
}

impl Default for MockWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Warehouse for MockWarehouse {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn execute(&self, sql: &str) -> Result<u64, ExecuteError> {
        self.simulate_latency().await;

        if let Some((_, message)) = self.failures.iter().find(|(p, _)| sql.contains(p.as_str())) {
            return Err(ExecuteError::from_query(sql, message.clone()));
        }

        self.executed.lock().await.push(sql.to_string());

        let rows = self
            .rows
            .iter()
            .find(|(p, _)| sql.contains(p.as_str()))
            .map(|(_, n)| *n)
            .unwrap_or(0);

        Ok(rows)
    }

    async fn test_connection(&self) -> Result<(), ExecuteError> {
        self.simulate_latency().await;

        if self.fail_connection {
            return Err(ExecuteError::ConnectionError("Simulated connection failure".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_statements_in_order() {
        let warehouse = MockWarehouse::new();
        warehouse.execute("SELECT 1").await.unwrap();
        warehouse.execute("SELECT 2").await.unwrap();

        assert_eq!(warehouse.executed().await, vec!["SELECT 1", "SELECT 2"]);

        warehouse.clear().await;
        assert!(warehouse.executed().await.is_empty());
    }

    #[tokio::test]
    async fn failing_statement_is_not_recorded() {
        let warehouse = MockWarehouse::new().with_failure_on("songs", "boom");

        let err = warehouse.execute("DROP TABLE songs").await.unwrap_err();
        assert!(matches!(err, ExecuteError::QueryError { .. }));
        assert!(warehouse.executed().await.is_empty());
    }

    #[tokio::test]
    async fn reports_configured_rows() {
        let warehouse = MockWarehouse::new().with_rows_for("INSERT", 42);

        assert_eq!(warehouse.execute("INSERT INTO t SELECT 1").await.unwrap(), 42);
        assert_eq!(warehouse.execute("DROP TABLE t").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn connection_failure() {
        assert!(MockWarehouse::new().test_connection().await.is_ok());
        assert!(MockWarehouse::new()
            .with_connection_failure()
            .test_connection()
            .await
            .is_err());
    }
}
