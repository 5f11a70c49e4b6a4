//! Dataset loading and schema validation.
//!
//! Reads a comma-separated file with a header row into a polars `DataFrame`
//! and checks it against the fixed schema in [`crate::schema`]. Columns come
//! back in canonical order (features, then target). Features are `Float64`;
//! the target is `Int64` when every value is written as an integer and
//! `Float64` otherwise, so it is written back out as it was read.
//!
//! All columns are read as strings and cast afterwards, so empty cells and
//! unparsable values can be told apart and reported per column.

use crate::error::DataLoadError;
use crate::schema::{FEATURE_COLUMNS, TARGET_COLUMN, is_known_column};
use polars::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Loads productivity datasets from CSV files.
pub struct DataLoader;

impl DataLoader {
    /// Load a full training dataset: all six features and the target.
    pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataFrame, DataLoadError> {
        Self::load_with_schema(path.as_ref(), true)
    }

    /// Load raw features for inference. The target column is optional and,
    /// if present, passed through unchanged.
    pub fn load_features(path: impl AsRef<Path>) -> Result<DataFrame, DataLoadError> {
        Self::load_with_schema(path.as_ref(), false)
    }

    fn load_with_schema(path: &Path, require_target: bool) -> Result<DataFrame, DataLoadError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DataLoadError::NotFound(path.to_path_buf()),
            _ => DataLoadError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        if metadata.is_dir() {
            return Err(DataLoadError::Malformed {
                path: path.to_path_buf(),
                reason: "path is a directory".to_string(),
            });
        }

        if metadata.len() == 0 {
            return Err(DataLoadError::EmptyFile(path.to_path_buf()));
        }

        let raw = Self::read_csv(path)?;
        debug!("Read {} rows x {} columns from {}", raw.height(), raw.width(), path.display());

        let has_target = Self::validate_header(&raw, require_target)?;

        if raw.height() == 0 {
            return Err(DataLoadError::NoRows(path.to_path_buf()));
        }

        Self::to_numeric_frame(&raw, path, has_target)
    }

    /// Read every column as a string; typing happens in [`Self::to_numeric_frame`].
    fn read_csv(path: &Path) -> Result<DataFrame, DataLoadError> {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| DataLoadError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Check header names against the schema. Returns whether the target is present.
    fn validate_header(df: &DataFrame, require_target: bool) -> Result<bool, DataLoadError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        if let Some(unknown) = names.iter().find(|name| !is_known_column(name)) {
            return Err(DataLoadError::UnexpectedColumn(unknown.clone()));
        }

        for required in FEATURE_COLUMNS {
            if !names.iter().any(|name| name == required) {
                return Err(DataLoadError::MissingColumn(required.to_string()));
            }
        }

        let has_target = names.iter().any(|name| name == TARGET_COLUMN);
        if require_target && !has_target {
            return Err(DataLoadError::MissingColumn(TARGET_COLUMN.to_string()));
        }

        Ok(has_target)
    }

    /// Cast each schema column to its numeric type in canonical order.
    fn to_numeric_frame(
        raw: &DataFrame,
        path: &Path,
        has_target: bool,
    ) -> Result<DataFrame, DataLoadError> {
        let malformed = |e: PolarsError| DataLoadError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let mut names: Vec<&str> = FEATURE_COLUMNS.to_vec();
        if has_target {
            names.push(TARGET_COLUMN);
        }

        let mut columns: Vec<Column> = Vec::with_capacity(names.len());
        for name in names {
            let column = raw
                .column(name)
                .map_err(|_| DataLoadError::MissingColumn(name.to_string()))?;

            let missing = column.null_count();
            if missing > 0 {
                return Err(DataLoadError::MissingValues {
                    column: name.to_string(),
                    count: missing,
                });
            }

            let numeric = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(malformed)?;

            let unparsable = numeric.null_count();
            let non_finite = numeric
                .f64()
                .map_err(malformed)?
                .into_iter()
                .flatten()
                .filter(|v| !v.is_finite())
                .count();

            if unparsable + non_finite > 0 {
                return Err(DataLoadError::NonNumeric {
                    column: name.to_string(),
                    count: unparsable + non_finite,
                });
            }

            if name == TARGET_COLUMN {
                let integral = column
                    .as_materialized_series()
                    .cast(&DataType::Int64)
                    .map_err(malformed)?;
                if integral.null_count() == 0 {
                    columns.push(Column::from(integral));
                    continue;
                }
            }

            columns.push(Column::from(numeric));
        }

        DataFrame::new(columns).map_err(malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str =
        "hours_coding,coffee_intake_mg,commits,cognitive_load,ai_usage_hours,sleep_hours,task_success";

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_dataset() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "data.csv",
            &format!("{HEADER}\n5,200,3,4,1,7,1\n6.5,220,4,5,2,6,0\n"),
        );

        let df = DataLoader::load_dataset(&path).unwrap();
        assert_eq!(df.shape(), (2, 7));
        for name in FEATURE_COLUMNS {
            assert_eq!(df.column(name).unwrap().dtype(), &DataType::Float64);
        }
        assert_eq!(df.column(TARGET_COLUMN).unwrap().dtype(), &DataType::Int64);
        let hours = df.column("hours_coding").unwrap().f64().unwrap();
        assert_eq!(hours.get(1), Some(6.5));
    }

    #[test]
    fn test_load_reorders_columns_to_canonical_order() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "shuffled.csv",
            "task_success,sleep_hours,hours_coding,commits,coffee_intake_mg,ai_usage_hours,cognitive_load\n\
             1,7,5,3,200,1,4\n",
        );

        let df = DataLoader::load_dataset(&path).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, crate::schema::dataset_columns());
        assert_eq!(df.column("coffee_intake_mg").unwrap().f64().unwrap().get(0), Some(200.0));
    }

    #[test]
    fn test_fractional_target_stays_float() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "float_target.csv",
            &format!("{HEADER}\n5,200,3,4,1,7,1.0\n6,220,4,5,2,6,0.5\n"),
        );

        let df = DataLoader::load_dataset(&path).unwrap();
        let target = df.column(TARGET_COLUMN).unwrap();
        assert_eq!(target.dtype(), &DataType::Float64);
        assert_eq!(target.f64().unwrap().get(1), Some(0.5));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = DataLoader::load_dataset(dir.path().join("nope.csv"));
        assert!(matches!(result, Err(DataLoadError::NotFound(_))));
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "empty.csv", "");
        assert!(matches!(
            DataLoader::load_dataset(&path),
            Err(DataLoadError::EmptyFile(_))
        ));
    }

    #[test]
    fn test_header_only_file() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "header.csv", &format!("{HEADER}\n"));
        assert!(matches!(
            DataLoader::load_dataset(&path),
            Err(DataLoadError::NoRows(_))
        ));
    }

    #[test]
    fn test_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "no_sleep.csv",
            "hours_coding,coffee_intake_mg,commits,cognitive_load,ai_usage_hours,task_success\n5,200,3,4,1,1\n",
        );
        assert!(matches!(
            DataLoader::load_dataset(&path),
            Err(DataLoadError::MissingColumn(column)) if column == "sleep_hours"
        ));
    }

    #[test]
    fn test_unexpected_column() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "extra.csv",
            &format!("{HEADER},developer_id\n5,200,3,4,1,7,1,42\n"),
        );
        assert!(matches!(
            DataLoader::load_dataset(&path),
            Err(DataLoadError::UnexpectedColumn(column)) if column == "developer_id"
        ));
    }

    #[test]
    fn test_short_row_reports_missing_values() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "short.csv",
            &format!("{HEADER}\n5,200,3,4,1,7,1\n6,220,4,5,2,6,\n"),
        );
        assert!(matches!(
            DataLoader::load_dataset(&path),
            Err(DataLoadError::MissingValues { column, count: 1 }) if column == "task_success"
        ));
    }

    #[test]
    fn test_long_row_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "long.csv",
            &format!("{HEADER}\n5,200,3,4,1,7,1\n6,220,4,5,2,6,0,9,9\n"),
        );
        assert!(matches!(
            DataLoader::load_dataset(&path),
            Err(DataLoadError::Malformed { .. })
        ));
    }

    #[test]
    fn test_non_numeric_value() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "text.csv",
            &format!("{HEADER}\nfive,200,3,4,1,7,1\n"),
        );
        assert!(matches!(
            DataLoader::load_dataset(&path),
            Err(DataLoadError::NonNumeric { column, count: 1 }) if column == "hours_coding"
        ));
    }

    #[test]
    fn test_load_features_without_target() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "features.csv",
            "hours_coding,coffee_intake_mg,commits,cognitive_load,ai_usage_hours,sleep_hours\n5,200,3,4,1,7\n",
        );

        let df = DataLoader::load_features(&path).unwrap();
        assert_eq!(df.shape(), (1, 6));
        assert!(df.column(TARGET_COLUMN).is_err());

        assert!(matches!(
            DataLoader::load_dataset(&path),
            Err(DataLoadError::MissingColumn(column)) if column == TARGET_COLUMN
        ));
    }
}
