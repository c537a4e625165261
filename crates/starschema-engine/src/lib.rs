//! Pipeline engine
//!
//! Runs catalog statements against a warehouse in their fixed order.

pub mod pipeline;

pub use pipeline::{Pipeline, Stage, PipelineError};
