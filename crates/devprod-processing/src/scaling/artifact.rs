//! On-disk format for a fitted [`ScalingTransform`].
//!
//! The transform is written as pretty-printed JSON wrapped in a small
//! envelope carrying a format tag and a version number. Floats are written
//! with round-trip precision, so a loaded transform reproduces the original
//! outputs bit for bit.
//!
//! ```json
//! {
//!   "format": "devprod-standard-scaler",
//!   "version": 1,
//!   "created_at": "2026-01-01T00:00:00Z",
//!   "scaler": { "feature_names": [...], "mean": [...], ... }
//! }
//! ```

use super::ScalingTransform;
use crate::error::{PreprocessingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Format tag written into every artifact.
pub const ARTIFACT_FORMAT: &str = "devprod-standard-scaler";

/// Current artifact version. Readers reject anything newer.
pub const ARTIFACT_VERSION: u32 = 1;

/// Versioned envelope around a [`ScalingTransform`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub format: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub scaler: ScalingTransform,
}

/// Just the envelope fields, parsed before the payload.
#[derive(Deserialize)]
struct ArtifactHeader {
    format: String,
    version: u32,
}

impl ScalerArtifact {
    /// Wrap a transform in a current-version envelope.
    pub fn new(scaler: ScalingTransform) -> Self {
        Self {
            format: ARTIFACT_FORMAT.to_string(),
            version: ARTIFACT_VERSION,
            created_at: Utc::now(),
            scaler,
        }
    }

    /// Parse and check an artifact from raw bytes.
    ///
    /// `path` is only used for error messages.
    pub fn from_slice(bytes: &[u8], path: &Path) -> Result<Self> {
        let invalid = |reason: String| PreprocessingError::InvalidArtifact {
            path: path.to_path_buf(),
            reason,
        };

        let header: ArtifactHeader =
            serde_json::from_slice(bytes).map_err(|e| invalid(format!("not a scaler artifact: {e}")))?;

        if header.format != ARTIFACT_FORMAT {
            return Err(invalid(format!(
                "unknown format '{}', expected '{}'",
                header.format, ARTIFACT_FORMAT
            )));
        }

        if header.version == 0 || header.version > ARTIFACT_VERSION {
            return Err(invalid(format!(
                "unsupported version {} (this build reads up to {})",
                header.version, ARTIFACT_VERSION
            )));
        }

        let artifact: ScalerArtifact =
            serde_json::from_slice(bytes).map_err(|e| invalid(e.to_string()))?;
        artifact
            .scaler
            .validate()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(artifact)
    }
}

impl ScalingTransform {
    /// Write this transform to `path` as a versioned artifact.
    ///
    /// The parent directory must already exist.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec_pretty(&ScalerArtifact::new(self.clone()))?;
        fs::write(path, bytes).map_err(|e| PreprocessingError::io(path, e))?;

        info!("Saved scaler ({} features) to {}", self.n_features(), path.display());
        Ok(())
    }

    /// Read a transform previously written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| PreprocessingError::io(path, e))?;
        let artifact = ScalerArtifact::from_slice(&bytes, path)?;

        debug!(
            "Loaded scaler v{} created at {} from {}",
            artifact.version,
            artifact.created_at,
            path.display()
        );
        Ok(artifact.scaler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::StandardScaler;
    use polars::prelude::*;
    use tempfile::TempDir;

    fn fitted() -> ScalingTransform {
        let df = df![
            "hours_coding" => [5.0, 6.0, 4.0, 5.3],
            "coffee_intake_mg" => [200.0, 220.0, 180.0, 210.0],
            "commits" => [3.0, 4.0, 2.0, 3.0],
            "cognitive_load" => [4.0, 5.0, 3.0, 4.0],
            "ai_usage_hours" => [1.0, 2.0, 1.0, 2.0],
            "sleep_hours" => [7.0, 6.0, 8.0, 7.1],
        ]
        .unwrap();
        StandardScaler::default().fit(&df).unwrap()
    }

    #[test]
    fn test_save_then_load_is_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scaler_model.pkl");

        let transform = fitted();
        transform.save(&path).unwrap();
        let loaded = ScalingTransform::load(&path).unwrap();

        assert_eq!(loaded, transform);
    }

    #[test]
    fn test_saved_file_carries_envelope() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scaler.json");
        fitted().save(&path).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["format"], ARTIFACT_FORMAT);
        assert_eq!(value["version"], ARTIFACT_VERSION);
        assert_eq!(value["scaler"]["feature_names"][0], "hours_coding");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = ScalingTransform::load(dir.path().join("absent.pkl")).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_save_into_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = fitted()
            .save(dir.path().join("missing").join("scaler.pkl"))
            .unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_rejects_wrong_format() {
        let bytes = br#"{"format": "pickle", "version": 1}"#;
        let err = ScalerArtifact::from_slice(bytes, Path::new("x")).unwrap_err();
        assert!(matches!(err, PreprocessingError::InvalidArtifact { .. }));
        assert!(err.to_string().contains("pickle"));
    }

    #[test]
    fn test_rejects_newer_version() {
        let mut artifact = serde_json::to_value(ScalerArtifact::new(fitted())).unwrap();
        artifact["version"] = serde_json::json!(ARTIFACT_VERSION + 1);
        let bytes = serde_json::to_vec(&artifact).unwrap();

        let err = ScalerArtifact::from_slice(&bytes, Path::new("x")).unwrap_err();
        assert!(err.to_string().contains("unsupported version"));
    }

    #[test]
    fn test_rejects_garbage() {
        let err = ScalerArtifact::from_slice(b"\x80\x04\x95", Path::new("x")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARTIFACT");
    }

    #[test]
    fn test_rejects_inconsistent_payload() {
        let mut artifact = serde_json::to_value(ScalerArtifact::new(fitted())).unwrap();
        artifact["scaler"]["scale"][2] = serde_json::json!(0.0);
        let bytes = serde_json::to_vec(&artifact).unwrap();

        let err = ScalerArtifact::from_slice(&bytes, Path::new("x")).unwrap_err();
        assert!(err.to_string().contains("commits"));
    }
}
