//! Statement linting using datafusion-sqlparser-rs
//!
//! Parses every catalog statement and reports the ones the parser rejects.
//! Bulk-copy statements and DDL using Redshift column attributes
//! (`IDENTITY`, `DISTKEY`) are outside what the parser understands and are
//! reported as skipped. Under the Redshift dialect so are statements that
//! extract Redshift-only dateparts such as `WEEKDAY`.

use serde::Serialize;
use sqlparser::dialect::{Dialect, GenericDialect, PostgreSqlDialect, RedshiftSqlDialect};
use sqlparser::parser::Parser;
use starschema_core::StatementKind;
use std::fmt;
use std::str::FromStr;

use crate::catalog::QueryCatalog;

/// Markers of warehouse-specific syntax the parser does not cover
const WAREHOUSE_EXTENSIONS: &[&str] = &["IDENTITY(", "DISTKEY", "SORTKEY"];

/// Dateparts Redshift accepts in `EXTRACT` that its parser dialect rejects
const REDSHIFT_DATEPARTS: &[&str] = &["WEEKDAY"];

/// Dialect used for parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LintDialect {
    #[default]
    Redshift,
    Postgres,
    Generic,
}

impl FromStr for LintDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redshift" => Ok(Self::Redshift),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "generic" | "ansi" => Ok(Self::Generic),
            other => Err(format!("unknown dialect '{}' (expected redshift, postgres or generic)", other)),
        }
    }
}

/// Result of linting one statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LintOutcome {
    /// Parsed as exactly one statement
    Ok,

    /// Not checked
    Skipped { reason: String },

    /// Rejected by the parser
    Failed { message: String },
}

/// Lint result for a statement at `kind[index]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    pub kind: StatementKind,
    pub index: usize,
    pub outcome: LintOutcome,
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            LintOutcome::Ok => write!(f, "{}[{}]: ok", self.kind, self.index),
            LintOutcome::Skipped { reason } => write!(f, "{}[{}]: skipped ({})", self.kind, self.index, reason),
            LintOutcome::Failed { message } => write!(f, "{}[{}]: {}", self.kind, self.index, message),
        }
    }
}

/// All findings for a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub findings: Vec<LintFinding>,
}

impl LintReport {
    pub fn failures(&self) -> impl Iterator<Item = &LintFinding> {
        self.findings
            .iter()
            .filter(|f| matches!(f.outcome, LintOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn checked(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| matches!(f.outcome, LintOutcome::Ok))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| matches!(f.outcome, LintOutcome::Skipped { .. }))
            .count()
    }
}

/// SQL linter with configurable dialect
pub struct StatementLinter {
    target: LintDialect,
    dialect: Box<dyn Dialect>,
}

impl StatementLinter {
    /// Create a linter for Redshift
    pub fn new() -> Self {
        Self::from_dialect(LintDialect::Redshift)
    }

    pub fn from_dialect(target: LintDialect) -> Self {
        let dialect: Box<dyn Dialect> = match target {
            LintDialect::Redshift => Box::new(RedshiftSqlDialect {}),
            LintDialect::Postgres => Box::new(PostgreSqlDialect {}),
            LintDialect::Generic => Box::new(GenericDialect {}),
        };

        Self { target, dialect }
    }

    /// Lint a single statement
    pub fn lint_statement(&self, kind: StatementKind, index: usize, sql: &str) -> LintFinding {
        let outcome = if kind == StatementKind::Copy {
            LintOutcome::Skipped {
                reason: "bulk-copy syntax is warehouse specific".to_string(),
            }
        } else if let Some(marker) = uses_warehouse_extension(sql) {
            LintOutcome::Skipped {
                reason: format!("uses warehouse extension {}", marker.trim_end_matches('(')),
            }
        } else if let Some(part) = self.unsupported_datepart(sql) {
            LintOutcome::Skipped {
                reason: format!("extracts datepart {} unknown to the parser", part),
            }
        } else {
            match Parser::parse_sql(&*self.dialect, sql) {
                Ok(statements) if statements.len() == 1 => LintOutcome::Ok,
                Ok(statements) => LintOutcome::Failed {
                    message: format!("expected one statement, found {}", statements.len()),
                },
                Err(e) => LintOutcome::Failed {
                    message: format!("Failed to parse SQL: {}", e),
                },
            }
        };

        if let LintOutcome::Failed { message } = &outcome {
            tracing::warn!(%kind, index, %message, "statement failed lint");
        }

        LintFinding { kind, index, outcome }
    }

    fn unsupported_datepart(&self, sql: &str) -> Option<&'static str> {
        if self.target != LintDialect::Redshift {
            return None;
        }

        let compact = sql
            .to_uppercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .replace("EXTRACT (", "EXTRACT(");

        REDSHIFT_DATEPARTS
            .iter()
            .copied()
            .find(|part| compact.contains(&format!("EXTRACT({} FROM", part)))
    }

    /// Lint every statement in a catalog, in execution order
    pub fn lint(&self, catalog: &QueryCatalog) -> LintReport {
        let findings = catalog
            .iter()
            .flat_map(|(kind, list)| {
                list.iter()
                    .enumerate()
                    .map(move |(index, sql)| (kind, index, sql))
            })
            .map(|(kind, index, sql)| self.lint_statement(kind, index, sql))
            .collect();

        LintReport { findings }
    }
}

impl Default for StatementLinter {
    fn default() -> Self {
        Self::new()
    }
}

fn uses_warehouse_extension(sql: &str) -> Option<&'static str> {
    let upper = sql.to_uppercase();
    WAREHOUSE_EXTENSIONS
        .iter()
        .copied()
        .find(|marker| upper.contains(marker))
}
