//! Query catalog
//!
//! Assembles the six ordered statement lists from a [`DwhConfig`]. Building
//! a catalog is pure string construction; executing it is the pipeline's job.

use serde::Serialize;
use starschema_core::{ConfigError, DwhConfig, SchemaKind, StatementKind};
use std::path::Path;

use crate::{queries, tables};

/// Ordered statement lists for a full warehouse refresh
///
/// Fields serialize in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryCatalog {
    drop_schemas: Vec<String>,
    create_schemas: Vec<String>,
    drop_tables: Vec<String>,
    create_tables: Vec<String>,
    copy: Vec<String>,
    insert: Vec<String>,
}

impl QueryCatalog {
    /// Build the catalog from a loaded configuration
    pub fn new(config: &DwhConfig) -> Self {
        let all_tables = tables::all_tables();

        let catalog = Self {
            drop_schemas: SchemaKind::ALL.iter().map(|s| s.drop_statement()).collect(),
            create_schemas: SchemaKind::ALL
                .iter()
                .map(|s| s.create_statement(config.schema_owner()))
                .collect(),
            drop_tables: all_tables.iter().map(|t| t.drop_statement()).collect(),
            create_tables: all_tables.iter().map(|t| t.create_statement()).collect(),
            copy: vec![
                queries::staging_events_copy(&config.s3, &config.role_arn),
                queries::staging_songs_copy(&config.s3, &config.role_arn),
            ],
            insert: vec![
                queries::songplay_insert(),
                queries::user_insert(),
                queries::song_insert(),
                queries::artist_insert(),
                queries::time_insert(),
            ],
        };

        tracing::debug!(statements = catalog.len(), "built query catalog");
        catalog
    }

    /// Load the configuration file and build the catalog
    ///
    /// Fails before any statement is built when a required key is missing.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = DwhConfig::from_file(path)?;
        Ok(Self::new(&config))
    }

    pub fn drop_schemas(&self) -> &[String] {
        &self.drop_schemas
    }

    pub fn create_schemas(&self) -> &[String] {
        &self.create_schemas
    }

    pub fn drop_tables(&self) -> &[String] {
        &self.drop_tables
    }

    pub fn create_tables(&self) -> &[String] {
        &self.create_tables
    }

    /// Bulk-copy statements loading the staging tables
    pub fn copy(&self) -> &[String] {
        &self.copy
    }

    /// Insert-transform statements populating fact and dimension tables
    pub fn insert(&self) -> &[String] {
        &self.insert
    }

    /// Statements of one kind
    pub fn list(&self, kind: StatementKind) -> &[String] {
        match kind {
            StatementKind::DropSchemas => &self.drop_schemas,
            StatementKind::CreateSchemas => &self.create_schemas,
            StatementKind::DropTables => &self.drop_tables,
            StatementKind::CreateTables => &self.create_tables,
            StatementKind::Copy => &self.copy,
            StatementKind::Insert => &self.insert,
        }
    }

    /// All lists in execution order
    pub fn iter(&self) -> impl Iterator<Item = (StatementKind, &[String])> + '_ {
        StatementKind::ALL.into_iter().map(move |kind| (kind, self.list(kind)))
    }

    /// Total number of statements
    pub fn len(&self) -> usize {
        self.iter().map(|(_, list)| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
