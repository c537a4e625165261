//! Warehouse adapters for executing catalog statements
//!
//! ## Features
//!
//! Enable live warehouse support via Cargo features:
//! - `postgres` - Amazon Redshift / PostgreSQL support
//!
//! ## Example
//!
//! ```rust,ignore
//! use starschema_warehouse::{RedshiftWarehouse, Warehouse};
//!
//! let warehouse = RedshiftWarehouse::connect(&cluster).await?;
//! warehouse.execute("DROP SCHEMA IF EXISTS staging_tables CASCADE").await?;
//! ```

pub mod adapter;
pub mod redshift;
pub mod mock;

pub use adapter::{Warehouse, ExecuteError};
pub use redshift::RedshiftWarehouse;
pub use mock::MockWarehouse;
