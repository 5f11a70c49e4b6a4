//! Outlier filtering module.
//!
//! Removes rows that fall outside the interquartile-range fences of any
//! numeric column. Quartiles use linear interpolation between order
//! statistics. Bounds are recomputed from the table being filtered on every
//! call; nothing is carried over between runs.
//!
//! A column with zero IQR only admits values equal to its quartiles. This is
//! intentional and is not special-cased.

use crate::config::DEFAULT_IQR_MULTIPLIER;
use crate::error::Result;
use crate::utils::{column_f64_values, is_numeric_dtype, linear_quantile, sorted_finite};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Quartile fences for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnBounds {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
    /// Rows whose value in this column fell outside the fences.
    pub rejected: usize,
}

impl ColumnBounds {
    /// Whether a value lies inside the closed interval `[lower, upper]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// What a filter pass did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlierReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub bounds: Vec<ColumnBounds>,
}

impl OutlierReport {
    /// Number of rows dropped.
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Filters rows by per-column IQR fences.
#[derive(Debug, Clone, Copy)]
pub struct OutlierFilter {
    multiplier: f64,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self::new(DEFAULT_IQR_MULTIPLIER)
    }
}

impl OutlierFilter {
    /// Create a filter with fences at `Q1 - multiplier*IQR` and `Q3 + multiplier*IQR`.
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// The IQR multiplier in use.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Compute fences for every numeric column without filtering.
    ///
    /// Columns with no values (empty table, or all null) have no fences and
    /// are left out.
    pub fn compute_bounds(&self, df: &DataFrame) -> Result<Vec<ColumnBounds>> {
        let mut bounds = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let name = column.name().to_string();
            if !is_numeric_dtype(column.dtype()) {
                debug!("Skipping non-numeric column '{}'", name);
                continue;
            }

            let values = column_f64_values(df, &name)?;
            let sorted = sorted_finite(values.into_iter().flatten());

            let (Some(q1), Some(q3)) = (
                linear_quantile(&sorted, 0.25),
                linear_quantile(&sorted, 0.75),
            ) else {
                debug!("Column '{}' has no values, no fences computed", name);
                continue;
            };

            let iqr = q3 - q1;
            let column_bounds = ColumnBounds {
                column: name,
                q1,
                q3,
                iqr,
                lower: q1 - self.multiplier * iqr,
                upper: q3 + self.multiplier * iqr,
                rejected: 0,
            };

            debug!(
                "{}: Q1={:.4}, Q3={:.4}, IQR={:.4}, fences=[{:.4}, {:.4}]",
                column_bounds.column,
                column_bounds.q1,
                column_bounds.q3,
                column_bounds.iqr,
                column_bounds.lower,
                column_bounds.upper
            );
            bounds.push(column_bounds);
        }

        Ok(bounds)
    }

    /// Drop every row that is outside the fences of at least one column.
    ///
    /// Row order is preserved. Null cells never reject a row. An empty
    /// result is valid and returned as an empty frame with the same columns.
    pub fn filter(&self, df: &DataFrame) -> Result<(DataFrame, OutlierReport)> {
        let rows_before = df.height();
        let mut bounds = self.compute_bounds(df)?;
        let mut keep = vec![true; rows_before];

        for column_bounds in &mut bounds {
            let values = column_f64_values(df, &column_bounds.column)?;
            for (row, value) in values.into_iter().enumerate() {
                if let Some(v) = value
                    && !column_bounds.contains(v)
                {
                    column_bounds.rejected += 1;
                    keep[row] = false;
                }
            }
        }

        let mask = BooleanChunked::from_slice("mask".into(), &keep);
        let filtered = df.filter(&mask)?;

        let report = OutlierReport {
            rows_before,
            rows_after: filtered.height(),
            bounds,
        };

        debug!("Removed {} outlier rows", report.rows_removed());
        Ok((filtered, report))
    }
}
