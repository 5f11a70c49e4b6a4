//! Configuration types for the preprocessing pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default path of the raw input dataset.
pub const DEFAULT_INPUT_PATH: &str = "ai_dev_productivity.csv";

/// Default path of the processed dataset.
pub const DEFAULT_OUTPUT_PATH: &str = "ai_dev_productivity_processed.csv";

/// Default path of the serialized scaling transform.
pub const DEFAULT_SCALER_PATH: &str = "scaler_model.pkl";

/// Default multiplier applied to the IQR when computing outlier bounds.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Configuration for the preprocessing pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use devprod_processing::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .input_path("data/raw.csv")
///     .output_path("data/processed.csv")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Raw dataset to read.
    /// Default: "ai_dev_productivity.csv"
    pub input_path: PathBuf,

    /// Where the processed dataset is written.
    /// Default: "ai_dev_productivity_processed.csv"
    pub output_path: PathBuf,

    /// Where the fitted scaling transform is written.
    /// Default: "scaler_model.pkl"
    pub scaler_path: PathBuf,

    /// Rows with a value outside [Q1 - k*IQR, Q3 + k*IQR] in any column are dropped.
    /// Default: 1.5
    pub iqr_multiplier: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            scaler_path: PathBuf::from(DEFAULT_SCALER_PATH),
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(ConfigValidationError::InvalidIqrMultiplier(
                self.iqr_multiplier,
            ));
        }

        for (field, path) in [
            ("input_path", &self.input_path),
            ("output_path", &self.output_path),
            ("scaler_path", &self.scaler_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigValidationError::EmptyPath(field.to_string()));
            }
        }

        if self.output_path == self.input_path {
            return Err(ConfigValidationError::ConflictingPaths {
                first: "input_path".to_string(),
                second: "output_path".to_string(),
            });
        }

        if self.scaler_path == self.input_path {
            return Err(ConfigValidationError::ConflictingPaths {
                first: "input_path".to_string(),
                second: "scaler_path".to_string(),
            });
        }

        if self.scaler_path == self.output_path {
            return Err(ConfigValidationError::ConflictingPaths {
                first: "output_path".to_string(),
                second: "scaler_path".to_string(),
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid IQR multiplier: {0} (must be a finite, non-negative number)")]
    InvalidIqrMultiplier(f64),

    #[error("Path '{0}' must not be empty")]
    EmptyPath(String),

    #[error("'{first}' and '{second}' point to the same file")]
    ConflictingPaths { first: String, second: String },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    scaler_path: Option<PathBuf>,
    iqr_multiplier: Option<f64>,
}

impl PipelineConfigBuilder {
    /// Set the raw dataset path.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the processed dataset path.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the scaler artifact path.
    pub fn scaler_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scaler_path = Some(path.into());
        self
    }

    /// Set the IQR multiplier used for outlier bounds.
    ///
    /// # Arguments
    /// * `multiplier` - Non-negative factor (1.5 is the conventional Tukey fence)
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            input_path: self
                .input_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH)),
            output_path: self
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            scaler_path: self
                .scaler_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCALER_PATH)),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(DEFAULT_IQR_MULTIPLIER),
        };

        config.validate()?;
        Ok(config)
    }
}
