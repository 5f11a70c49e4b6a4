//! Pipeline module.
//!
//! This module provides the main preprocessing pipeline and related components.

mod builder;
pub mod outliers;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use outliers::{ColumnBounds, OutlierFilter, OutlierReport};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
