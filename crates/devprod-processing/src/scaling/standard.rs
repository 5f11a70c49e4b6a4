//! Standard scaler (z-score normalization).
//!
//! The standard score of a value `x` is
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the mean of the fitted samples and `s` their population
//! standard deviation (ddof = 0).
//!
//! # Example
//!
//! ```rust,ignore
//! use devprod_processing::scaling::{StandardScaler, ScalingTransform};
//!
//! let transform = StandardScaler::default().fit(&filtered)?;
//! let scaled = transform.transform(&filtered)?;
//! transform.save("scaler_model.pkl")?;
//!
//! // Later, in another process:
//! let transform = ScalingTransform::load("scaler_model.pkl")?;
//! let scaled_new = transform.transform(&new_rows)?;
//! ```

use crate::error::{Result, ScalingError};
use crate::schema::{FEATURE_COLUMNS, FeatureVector, N_FEATURES};
use crate::utils::{column_f64_values, mean_and_variance};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tolerance, relative to |mean|, under which a standard deviation counts as zero.
const ZERO_STD_TOLERANCE: f64 = 10.0 * f64::EPSILON;

/// Fits a [`ScalingTransform`] on a fixed list of columns.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    columns: Vec<String>,
}

impl Default for StandardScaler {
    /// A scaler over the six productivity feature columns.
    fn default() -> Self {
        Self::with_columns(FEATURE_COLUMNS)
    }
}

impl StandardScaler {
    /// Create a scaler over an explicit list of columns.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Columns this scaler fits and transforms.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Learn mean and standard deviation for every configured column.
    ///
    /// Other columns of `df` (the target, for instance) are ignored.
    ///
    /// # Errors
    ///
    /// - [`ScalingError::EmptyInput`] if `df` has no rows
    /// - [`ScalingError::MissingFeature`] if a configured column is absent
    /// - [`ScalingError::NoValues`] if a column holds only nulls
    /// - [`ScalingError::ZeroVariance`] if a column is constant
    /// - [`ScalingError::NonFinite`] if a statistic overflows or is NaN
    pub fn fit(&self, df: &DataFrame) -> Result<ScalingTransform> {
        if df.height() == 0 {
            return Err(ScalingError::EmptyInput.into());
        }

        let mut mean = Vec::with_capacity(self.columns.len());
        let mut scale = Vec::with_capacity(self.columns.len());
        let mut var = Vec::with_capacity(self.columns.len());
        let mut n_samples_seen = df.height();

        for name in &self.columns {
            if df.column(name).is_err() {
                return Err(ScalingError::MissingFeature(name.clone()).into());
            }

            let values: Vec<f64> = column_f64_values(df, name)?.into_iter().flatten().collect();
            let (column_mean, column_var) =
                mean_and_variance(&values).ok_or_else(|| ScalingError::NoValues(name.clone()))?;
            let column_std = column_var.sqrt();

            if !column_mean.is_finite() || !column_std.is_finite() {
                return Err(ScalingError::NonFinite(name.clone()).into());
            }

            if column_std == 0.0 || column_std <= ZERO_STD_TOLERANCE * column_mean.abs() {
                return Err(ScalingError::ZeroVariance(name.clone()).into());
            }

            debug!("{}: mean={:.6}, std={:.6}", name, column_mean, column_std);
            mean.push(column_mean);
            scale.push(column_std);
            var.push(column_var);
            n_samples_seen = n_samples_seen.min(values.len());
        }

        Ok(ScalingTransform {
            feature_names: self.columns.clone(),
            mean,
            scale,
            var,
            n_samples_seen,
        })
    }

    /// Fit on `df` and return it transformed alongside the fitted transform.
    pub fn fit_transform(&self, df: &DataFrame) -> Result<(DataFrame, ScalingTransform)> {
        let transform = self.fit(df)?;
        let scaled = transform.transform(df)?;
        Ok((scaled, transform))
    }
}

/// A fitted z-score transform.
///
/// Holds per-feature mean, standard deviation and variance. There is no way
/// to refit or mutate a transform; fit a new one with [`StandardScaler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingTransform {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
    var: Vec<f64>,
    n_samples_seen: usize,
}

impl ScalingTransform {
    /// Feature names in the order the statistics are stored.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Per-feature mean.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Per-feature standard deviation.
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Per-feature population variance.
    pub fn var(&self) -> &[f64] {
        &self.var
    }

    /// Number of values the statistics were computed from. Null cells are
    /// not counted; with nulls in several features this is the smallest count.
    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Check internal consistency. Used when a transform is read back from disk.
    pub fn validate(&self) -> std::result::Result<(), ScalingError> {
        let expected = self.feature_names.len();
        for got in [self.mean.len(), self.scale.len(), self.var.len()] {
            if got != expected {
                return Err(ScalingError::FeatureMismatch { expected, got });
            }
        }

        for (i, name) in self.feature_names.iter().enumerate() {
            if !self.mean[i].is_finite() || !self.scale[i].is_finite() || !self.var[i].is_finite()
            {
                return Err(ScalingError::NonFinite(name.clone()));
            }
            if self.scale[i] <= 0.0 {
                return Err(ScalingError::ZeroVariance(name.clone()));
            }
        }

        Ok(())
    }

    /// Standardize the feature columns of `df`.
    ///
    /// Columns that are not features pass through untouched and row order is
    /// kept, so the target stays aligned with its features. Null cells stay null.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map_features(df, |x, mean, scale| (x - mean) / scale)
    }

    /// Undo [`transform`](Self::transform).
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map_features(df, |z, mean, scale| z * scale + mean)
    }

    /// Standardize a single observation.
    pub fn transform_vector(
        &self,
        vector: &FeatureVector,
    ) -> std::result::Result<FeatureVector, ScalingError> {
        let raw = vector.to_array();
        let mut scaled = [0.0; N_FEATURES];

        for (slot, name) in FEATURE_COLUMNS.iter().enumerate() {
            let i = self
                .feature_names
                .iter()
                .position(|feature| feature == name)
                .ok_or_else(|| ScalingError::MissingFeature(name.to_string()))?;
            scaled[slot] = (raw[slot] - self.mean[i]) / self.scale[i];
        }

        Ok(FeatureVector::from_array(scaled))
    }

    fn map_features(&self, df: &DataFrame, f: impl Fn(f64, f64, f64) -> f64) -> Result<DataFrame> {
        let mut out = df.clone();

        for (i, name) in self.feature_names.iter().enumerate() {
            if df.column(name).is_err() {
                return Err(ScalingError::MissingFeature(name.clone()).into());
            }

            let (mean, scale) = (self.mean[i], self.scale[i]);
            let mapped: Vec<Option<f64>> = column_f64_values(df, name)?
                .into_iter()
                .map(|v| v.map(|x| f(x, mean, scale)))
                .collect();

            out.replace(name, Series::new(name.as_str().into(), mapped))?;
        }

        Ok(out)
    }
}
