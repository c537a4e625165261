//! Run report (stable v1)
//!
//! Written after a pipeline run. Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::statement::StatementKind;

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One successfully executed statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// List the statement came from
    pub kind: StatementKind,

    /// Position within that list
    pub index: usize,

    /// Rows affected as reported by the warehouse
    pub rows: u64,

    /// Wall-clock duration
    pub elapsed_ms: u64,
}

/// The statement that halted the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub kind: StatementKind,
    pub index: usize,
    pub message: String,
}

/// Pipeline run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version
    pub version: ReportVersion,

    /// Start timestamp (RFC 3339)
    pub timestamp: String,

    /// Stage that was requested (setup, load, all)
    pub stage: String,

    /// Warehouse adapter name
    pub warehouse: String,

    /// Executed statements, in order
    pub steps: Vec<StepRecord>,

    /// Set when a statement failed and the run stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailure>,
}

impl RunReport {
    /// Create an empty report stamped with the current time
    pub fn new(stage: impl Into<String>, warehouse: impl Into<String>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            stage: stage.into(),
            warehouse: warehouse.into(),
            steps: Vec::new(),
            failure: None,
        }
    }

    pub fn record_step(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    pub fn record_failure(&mut self, failure: StepFailure) {
        self.failure = Some(failure);
    }

    /// True when no statement failed
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Sum of affected rows across all steps
    pub fn total_rows(&self) -> u64 {
        self.steps.iter().map(|s| s.rows).sum()
    }

    /// Sum of step durations
    pub fn total_elapsed_ms(&self) -> u64 {
        self.steps.iter().map(|s| s.elapsed_ms).sum()
    }

    /// Number of executed statements of a given kind
    pub fn count(&self, kind: StatementKind) -> usize {
        self.steps.iter().filter(|s| s.kind == kind).count()
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
