//! Star-schema table model
//!
//! Tables are described as typed column lists and rendered into Redshift
//! DDL. Rendering is deterministic: the same definition always produces
//! the same statement text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Warehouse schema a table lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Measurable events (`fact_tables`)
    Fact,

    /// Descriptive entities (`dimension_tables`)
    Dimension,

    /// Raw landing zone (`staging_tables`)
    Staging,
}

impl SchemaKind {
    /// All schemas, in the order they are dropped and created
    pub const ALL: [SchemaKind; 3] = [SchemaKind::Fact, SchemaKind::Dimension, SchemaKind::Staging];

    /// Schema name in the warehouse
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fact => "fact_tables",
            Self::Dimension => "dimension_tables",
            Self::Staging => "staging_tables",
        }
    }

    /// `DROP SCHEMA IF EXISTS ... CASCADE`
    pub fn drop_statement(&self) -> String {
        format!("DROP SCHEMA IF EXISTS {} CASCADE", self.name())
    }

    /// `CREATE SCHEMA IF NOT EXISTS ... AUTHORIZATION owner`
    pub fn create_statement(&self, owner: &str) -> String {
        format!("CREATE SCHEMA IF NOT EXISTS {} AUTHORIZATION {}", self.name(), owner)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Column types used by the warehouse tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    BigInt,
    Float,
    Numeric,

    /// Variable length string, with optional max length
    Varchar {
        length: Option<u16>,
    },

    Timestamp,
}

impl ColumnType {
    /// `VARCHAR(n)`
    pub const fn varchar(length: u16) -> Self {
        Self::Varchar { length: Some(length) }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "INT"),
            Self::BigInt => write!(f, "BIGINT"),
            Self::Float => write!(f, "FLOAT"),
            Self::Numeric => write!(f, "NUMERIC"),
            Self::Varchar { length: Some(n) } => write!(f, "VARCHAR({})", n),
            Self::Varchar { length: None } => write!(f, "VARCHAR"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

/// A column in a table definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Column type
    pub column_type: ColumnType,

    /// Auto-incrementing surrogate key, `IDENTITY(0,1)`
    pub identity: bool,

    pub not_null: bool,

    pub primary_key: bool,

    /// Distribution key hint
    pub dist_key: bool,
}

impl Column {
    /// Create a nullable column with no constraints
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            identity: false,
            not_null: false,
            primary_key: false,
            dist_key: false,
        }
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn dist_key(mut self) -> Self {
        self.dist_key = true;
        self
    }

    /// Column definition as it appears inside `CREATE TABLE`
    pub fn definition(&self) -> String {
        let mut def = format!("{} {}", self.name, self.column_type);

        if self.identity {
            def.push_str(" IDENTITY(0,1)");
        }
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if self.dist_key {
            def.push_str(" DISTKEY");
        }

        def
    }
}

/// A table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Schema the table belongs to
    pub schema: SchemaKind,

    /// Unqualified table name
    pub name: String,

    /// Columns, in declaration order
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(schema: SchemaKind, name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            schema,
            name: name.into(),
            columns,
        }
    }

    /// `schema.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema.name(), self.name)
    }

    /// Find a column by name (case-sensitive)
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key column, if declared
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Distribution key column, if declared
    pub fn dist_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.dist_key)
    }

    /// Column names, excluding identity columns
    ///
    /// These are the columns an `INSERT` has to supply.
    pub fn insertable_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| !c.identity)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// `DROP TABLE IF EXISTS schema.table`
    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.qualified_name())
    }

    /// `CREATE TABLE IF NOT EXISTS schema.table (...)`
    pub fn create_statement(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.definition()))
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            self.qualified_name(),
            columns
        )
    }
}
