//! Sequential pipeline runner
//!
//! Statements run one at a time in catalog order. The first failure stops
//! the run; nothing is retried and nothing already executed is undone.

use starschema_core::{RunReport, StatementKind, StepFailure, StepRecord};
use starschema_sql::QueryCatalog;
use starschema_warehouse::{ExecuteError, Warehouse};
use std::fmt;
use std::time::Instant;

/// Which part of the refresh to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Drop and recreate schemas and tables
    Setup,

    /// Bulk-copy into staging, then transform into fact/dimension tables
    Load,

    /// Setup followed by load
    All,
}

impl Stage {
    /// Statement lists covered by this stage, in execution order
    pub fn kinds(&self) -> &'static [StatementKind] {
        const SETUP: &[StatementKind] = &[
            StatementKind::DropSchemas,
            StatementKind::CreateSchemas,
            StatementKind::DropTables,
            StatementKind::CreateTables,
        ];
        const LOAD: &[StatementKind] = &[StatementKind::Copy, StatementKind::Insert];

        match self {
            Self::Setup => SETUP,
            Self::Load => LOAD,
            Self::All => &StatementKind::ALL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Load => "load",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Warehouse connection check failed: {0}")]
    ConnectionFailed(#[source] ExecuteError),

    #[error("Statement {kind}[{index}] failed: {source}")]
    StatementFailed {
        kind: StatementKind,
        index: usize,
        #[source]
        source: ExecuteError,
        /// Report up to and including the failure
        report: Box<RunReport>,
    },
}

impl PipelineError {
    /// The partial run report, if statements were attempted
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::StatementFailed { report, .. } => Some(report),
            Self::ConnectionFailed(_) => None,
        }
    }
}

/// Runs a catalog against a warehouse
pub struct Pipeline<'a> {
    catalog: &'a QueryCatalog,
    warehouse: &'a dyn Warehouse,
    check_connection: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(catalog: &'a QueryCatalog, warehouse: &'a dyn Warehouse) -> Self {
        Self {
            catalog,
            warehouse,
            check_connection: true,
        }
    }

    /// Skip the connection test before the first statement
    pub fn without_connection_check(mut self) -> Self {
        self.check_connection = false;
        self
    }

    /// Run a stage, halting on the first failing statement
    pub async fn run(&self, stage: Stage) -> Result<RunReport, PipelineError> {
        if self.check_connection {
            self.warehouse
                .test_connection()
                .await
                .map_err(PipelineError::ConnectionFailed)?;
        }

        let mut report = RunReport::new(stage.as_str(), self.warehouse.name());
        tracing::info!(%stage, warehouse = self.warehouse.name(), "starting pipeline");

        for &kind in stage.kinds() {
            let statements = self.catalog.list(kind);
            tracing::info!(%kind, count = statements.len(), "running statements");

            for (index, sql) in statements.iter().enumerate() {
                tracing::debug!(%kind, index, sql = %sql, "executing");
                let start = Instant::now();

                match self.warehouse.execute(sql).await {
                    Ok(rows) => {
                        let elapsed_ms = start.elapsed().as_millis() as u64;
                        tracing::debug!(%kind, index, rows, elapsed_ms, "done");
                        report.record_step(StepRecord { kind, index, rows, elapsed_ms });
                    }
                    Err(source) => {
                        tracing::error!(%kind, index, error = %source, "statement failed, halting");
                        report.record_failure(StepFailure {
                            kind,
                            index,
                            message: source.to_string(),
                        });

                        return Err(PipelineError::StatementFailed {
                            kind,
                            index,
                            source,
                            report: Box::new(report),
                        });
                    }
                }
            }
        }

        tracing::info!(
            %stage,
            statements = report.steps.len(),
            rows = report.total_rows(),
            "pipeline finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_kinds() {
        assert_eq!(Stage::Setup.kinds().len(), 4);
        assert_eq!(Stage::Load.kinds(), &[StatementKind::Copy, StatementKind::Insert]);

        let all: Vec<StatementKind> = Stage::Setup
            .kinds()
            .iter()
            .chain(Stage::Load.kinds())
            .copied()
            .collect();
        assert_eq!(all, Stage::All.kinds().to_vec());
    }
}
