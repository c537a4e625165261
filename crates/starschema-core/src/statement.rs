//! Statement kinds making up a query catalog

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the six ordered statement lists
///
/// Variants are declared in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    DropSchemas,
    CreateSchemas,
    DropTables,
    CreateTables,

    /// Bulk-copy from object storage into staging tables
    Copy,

    /// Insert-transform from staging into fact/dimension tables
    Insert,
}

impl StatementKind {
    /// All kinds in execution order
    pub const ALL: [StatementKind; 6] = [
        StatementKind::DropSchemas,
        StatementKind::CreateSchemas,
        StatementKind::DropTables,
        StatementKind::CreateTables,
        StatementKind::Copy,
        StatementKind::Insert,
    ];

    /// Stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DropSchemas => "drop_schemas",
            Self::CreateSchemas => "create_schemas",
            Self::DropTables => "drop_tables",
            Self::CreateTables => "create_tables",
            Self::Copy => "copy",
            Self::Insert => "insert",
        }
    }

    /// Whether the statements are expected to be safe to re-run
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Self::Copy | Self::Insert)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");

        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                let known = Self::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ");
                format!("unknown statement kind '{}' (expected one of: {})", s, known)
            })
    }
}
