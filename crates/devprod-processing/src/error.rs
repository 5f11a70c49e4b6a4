//! Custom error types for the preprocessing pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Each pipeline
//! stage has its own error kind ([`DataLoadError`] for the loader,
//! [`ScalingError`] for the standardizer) and [`PreprocessingError`] ties them
//! together with the I/O failures raised while persisting outputs.
//!
//! Errors are serializable so the CLI can emit them as JSON.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading and validating the input dataset.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// The input path does not exist.
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The input file has zero bytes.
    #[error("Input file is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    /// The input file has a header but no data rows.
    #[error("Input file has no data rows: {}", .0.display())]
    NoRows(PathBuf),

    /// The CSV reader rejected the file (ragged rows, bad encoding, ...).
    #[error("Malformed input file {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    /// A required column is absent from the header.
    #[error("Required column '{0}' is missing from the header")]
    MissingColumn(String),

    /// The header contains a column outside the fixed schema.
    #[error("Unexpected column '{0}' in the header")]
    UnexpectedColumn(String),

    /// A column has empty cells, usually because a row was short.
    #[error("Column '{column}' has {count} missing values")]
    MissingValues { column: String, count: usize },

    /// A column contains values that cannot be parsed as numbers.
    #[error("Column '{column}' contains {count} non-numeric values")]
    NonNumeric { column: String, count: usize },
}

/// Errors raised while fitting or applying the scaling transform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScalingError {
    /// No rows were available to fit on.
    #[error("Cannot fit scaler on an empty table")]
    EmptyInput,

    /// A feature column is constant, so its z-score is undefined.
    #[error("Feature column '{0}' has zero variance")]
    ZeroVariance(String),

    /// A feature column is absent from the table.
    #[error("Feature column '{0}' not found in table")]
    MissingFeature(String),

    /// A feature column has no non-null values to fit on.
    #[error("Feature column '{0}' has no values to fit on")]
    NoValues(String),

    /// A statistic came out as NaN or infinite.
    #[error("Feature column '{0}' produced a non-finite statistic")]
    NonFinite(String),

    /// Mean, scale and variance vectors disagree with the feature list.
    #[error("Feature mismatch: expected {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },
}

/// The main error type for the preprocessing pipeline.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// Missing or malformed input.
    #[error("Failed to load dataset: {0}")]
    DataLoad(#[from] DataLoadError),

    /// Degenerate feature column or unusable scaler state.
    #[error("Failed to scale features: {0}")]
    Scaling(#[from] ScalingError),

    /// Reading or writing a file failed.
    #[error("IO error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A scaler artifact could not be reconstructed.
    #[error("Invalid scaler artifact '{}': {reason}", .path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PreprocessingError::Io {
            path: path.into(),
            source,
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DataLoad(_) => "DATA_LOAD_ERROR",
            Self::Scaling(_) => "SCALING_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::InvalidArtifact { .. } => "INVALID_ARTIFACT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Returns the innermost error, skipping context wrappers.
    pub fn root(&self) -> &PreprocessingError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error came from the loader.
    pub fn is_data_load(&self) -> bool {
        matches!(self.root(), Self::DataLoad(_))
    }

    /// Check if this error came from the standardizer.
    pub fn is_scaling(&self) -> bool {
        matches!(self.root(), Self::Scaling(_))
    }

    /// Check if this error is a file system failure.
    pub fn is_io(&self) -> bool {
        matches!(self.root(), Self::Io { .. })
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}
