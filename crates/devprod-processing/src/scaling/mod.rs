//! Feature standardization module.
//!
//! This module provides:
//! - [`StandardScaler`], which fits per-feature mean and standard deviation
//! - [`ScalingTransform`], the fitted, immutable z-score transform
//! - [`ScalerArtifact`], the versioned on-disk envelope for a transform

mod artifact;
mod standard;

pub use artifact::{ARTIFACT_FORMAT, ARTIFACT_VERSION, ScalerArtifact};
pub use standard::{ScalingTransform, StandardScaler};
