//! AI Developer Productivity Preprocessing Library
//!
//! Prepares the AI developer productivity dataset for model training.
//!
//! # Overview
//!
//! The pipeline runs four stages in a fixed order and stops at the first failure:
//!
//! - **Loading**: Reads the CSV and validates it against a fixed schema
//!   (six numeric features plus the `task_success` target)
//! - **Outlier Filtering**: Drops every row outside the 1.5 x IQR fences of any column
//! - **Scaling**: Fits a z-score transform on the remaining features and applies it
//! - **Persisting**: Writes the processed CSV and a versioned scaler artifact
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use devprod_processing::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .input_path("ai_dev_productivity.csv")
//!     .output_path("ai_dev_productivity_processed.csv")
//!     .scaler_path("scaler_model.pkl")
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| println!("[{:.0}%] {}", update.progress * 100.0, update.message))
//!     .build()?
//!     .run()?;
//!
//! println!("Kept {} of {} rows", result.summary.rows_after, result.summary.rows_before);
//! ```
//!
//! # Reusing the transform
//!
//! A saved transform standardizes new observations exactly as it did the
//! training rows:
//!
//! ```rust,ignore
//! use devprod_processing::{DataLoader, ScalingTransform};
//!
//! let scaler = ScalingTransform::load("scaler_model.pkl")?;
//! let raw = DataLoader::load_features("new_developers.csv")?;
//! let scaled = scaler.transform(&raw)?;
//! ```
//!
//! # Errors
//!
//! Every fallible operation returns [`PreprocessingError`]. Its three main
//! kinds are [`DataLoadError`] (missing or malformed input), [`ScalingError`]
//! (degenerate features) and I/O failures while writing outputs.

pub mod config;
pub mod error;
pub mod loader;
pub mod persister;
pub mod pipeline;
pub mod scaling;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{
    DataLoadError, PreprocessingError, Result as PreprocessingResult, ResultExt, ScalingError,
};
pub use loader::DataLoader;
pub use persister::write_dataset;
pub use pipeline::{
    ClosureProgressReporter, ColumnBounds, OutlierFilter, OutlierReport, Pipeline,
    PipelineBuilder, PipelineStage, ProgressReporter, ProgressUpdate,
};
pub use scaling::{ARTIFACT_FORMAT, ARTIFACT_VERSION, ScalerArtifact, ScalingTransform, StandardScaler};
pub use schema::{FEATURE_COLUMNS, FeatureVector, TARGET_COLUMN};
pub use types::{PipelineResult, PreprocessingSummary, ProcessedDataset};
