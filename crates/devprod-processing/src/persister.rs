//! Writes processed datasets to disk.
//!
//! Scaler artifacts are written by
//! [`ScalingTransform::save`](crate::scaling::ScalingTransform::save).

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Write `df` as CSV: header row, comma separator, no index column.
///
/// Missing parent directories are not created; a destination that cannot be
/// opened is reported as [`PreprocessingError::Io`].
pub fn write_dataset(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path).map_err(|e| PreprocessingError::io(path, e))?;

    // CsvWriter needs a mutable frame
    let mut out = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut out)?;

    info!(
        "Dataset saved: {} ({} rows x {} columns)",
        path.display(),
        out.height(),
        out.width()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_write_dataset_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let df = df![
            "hours_coding" => [-0.5, 1.25],
            "task_success" => [1.0, 0.0],
        ]
        .unwrap();

        write_dataset(&df, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "hours_coding,task_success");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("-0.5,"));
    }

    #[test]
    fn test_write_empty_dataset_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        let df = df!["commits" => Vec::<f64>::new()].unwrap();

        write_dataset(&df, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "commits");
    }

    #[test]
    fn test_missing_parent_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no").join("such").join("dir.csv");
        let df = df!["commits" => [1.0]].unwrap();

        let err = write_dataset(&df, &path).unwrap_err();
        assert!(err.is_io());
        assert!(!path.exists());
    }
}
