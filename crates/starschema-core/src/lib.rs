//! starschema core
//!
//! Domain model shared by every crate in the workspace: the warehouse
//! configuration file, the typed star-schema table model, the statement
//! kinds a catalog is made of, and the run report written after execution.

pub mod config;
pub mod schema;
pub mod statement;
pub mod report;

pub use config::{DwhConfig, S3Config, ClusterConfig, ConfigError};
pub use schema::{ColumnType, Column, Table, SchemaKind};
pub use statement::StatementKind;
pub use report::{RunReport, ReportVersion, StepRecord, StepFailure};
