use crate::pipeline::outliers::{ColumnBounds, OutlierReport};
use crate::scaling::ScalingTransform;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Share of removed rows above which the summary carries a warning.
pub const HEAVY_ROW_LOSS_THRESHOLD: f32 = 0.30;

/// Output of [`Pipeline::process`](crate::Pipeline::process): the in-memory
/// result of filtering and scaling, before anything is written.
#[derive(Debug, Clone)]
pub struct ProcessedDataset {
    /// Filtered rows with standardized features and the untouched target.
    pub data: DataFrame,
    /// The transform fitted on the filtered rows.
    pub scaler: ScalingTransform,
    /// What the outlier filter did.
    pub outliers: OutlierReport,
}

/// Output of a full [`Pipeline::run`](crate::Pipeline::run).
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub data: DataFrame,
    pub scaler: ScalingTransform,
    pub summary: PreprocessingSummary,
}

/// Run summary for logging and the CLI's `--json` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessingSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows read from the input.
    pub rows_before: usize,
    /// Number of rows left after outlier filtering.
    pub rows_after: usize,
    /// Number of rows dropped as outliers.
    pub rows_removed: usize,

    /// Number of columns read from the input.
    pub columns_before: usize,
    /// Number of columns written to the output.
    pub columns_after: usize,

    /// IQR fences used for each column.
    pub outlier_bounds: Vec<ColumnBounds>,

    /// Files written by the run, in write order.
    pub output_files: Vec<PathBuf>,

    /// Warnings and notes generated during preprocessing.
    pub warnings: Vec<String>,
}

impl PreprocessingSummary {
    /// Build a summary from the filter report and the processed frame.
    ///
    /// Adds warnings for an empty result and for heavy row loss.
    pub fn from_report(report: &OutlierReport, columns_before: usize, columns_after: usize) -> Self {
        let mut summary = Self {
            rows_before: report.rows_before,
            rows_after: report.rows_after,
            rows_removed: report.rows_removed(),
            columns_before,
            columns_after,
            outlier_bounds: report.bounds.clone(),
            ..Self::default()
        };

        if summary.rows_after == 0 && summary.rows_before > 0 {
            summary.add_warning("Every row was removed as an outlier");
        } else if summary.rows_removed_percentage() > HEAVY_ROW_LOSS_THRESHOLD {
            summary.add_warning(format!(
                "Outlier filtering removed {:.1}% of rows ({} of {})",
                summary.rows_removed_percentage() * 100.0,
                summary.rows_removed,
                summary.rows_before
            ));
        }

        summary
    }

    /// Add a warning message.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Record a file written by the run.
    pub fn add_output_file(&mut self, path: impl Into<PathBuf>) {
        self.output_files.push(path.into());
    }

    /// Fraction of rows removed (0.0 - 1.0).
    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            self.rows_removed as f32 / self.rows_before as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(before: usize, after: usize) -> OutlierReport {
        OutlierReport {
            rows_before: before,
            rows_after: after,
            bounds: Vec::new(),
        }
    }

    #[test]
    fn test_summary_from_report() {
        let summary = PreprocessingSummary::from_report(&report(10, 9), 7, 7);
        assert_eq!(summary.rows_removed, 1);
        assert!((summary.rows_removed_percentage() - 0.1).abs() < 1e-6);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_summary_warns_on_heavy_loss() {
        let summary = PreprocessingSummary::from_report(&report(10, 6), 7, 7);
        assert_eq!(summary.warnings.len(), 1);
        assert!(summary.warnings[0].contains("40.0%"));
    }

    #[test]
    fn test_summary_warns_on_empty_result() {
        let summary = PreprocessingSummary::from_report(&report(5, 0), 7, 7);
        assert_eq!(summary.warnings, vec!["Every row was removed as an outlier"]);
    }

    #[test]
    fn test_summary_serializes() {
        let mut summary = PreprocessingSummary::from_report(&report(3, 3), 7, 7);
        summary.add_output_file("out.csv");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["rows_before"], 3);
        assert_eq!(json["output_files"][0], "out.csv");
    }
}
