//! SQL for the star-schema warehouse
//!
//! This crate handles:
//! - The fact, dimension and staging table definitions
//! - Bulk-copy and insert-transform statement templates
//! - Assembling the ordered query catalog from configuration
//! - Linting catalog statements with sqlparser

pub mod tables;
pub mod queries;
pub mod catalog;
pub mod lint;

pub use catalog::QueryCatalog;
pub use lint::{StatementLinter, LintReport, LintFinding, LintOutcome, LintDialect};
