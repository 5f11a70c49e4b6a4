//! Fixed schema of the AI developer productivity dataset.
//!
//! The pipeline never looks columns up by arbitrary name: every column it
//! touches is declared here, and the loader validates input files against
//! this list before any processing starts.

use serde::{Deserialize, Serialize};

/// Feature columns, in canonical order. These and only these are standardized.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "hours_coding",
    "coffee_intake_mg",
    "commits",
    "cognitive_load",
    "ai_usage_hours",
    "sleep_hours",
];

/// The outcome label. Never scaled.
pub const TARGET_COLUMN: &str = "task_success";

/// Number of feature columns.
pub const N_FEATURES: usize = FEATURE_COLUMNS.len();

/// All dataset columns in canonical order: features first, target last.
pub fn dataset_columns() -> Vec<&'static str> {
    FEATURE_COLUMNS
        .iter()
        .copied()
        .chain(std::iter::once(TARGET_COLUMN))
        .collect()
}

/// Returns true if `name` is one of the schema's columns.
pub fn is_known_column(name: &str) -> bool {
    name == TARGET_COLUMN || FEATURE_COLUMNS.contains(&name)
}

/// One raw (or scaled) observation of the six feature columns.
///
/// Used to push single records through a fitted
/// [`ScalingTransform`](crate::scaling::ScalingTransform) at inference time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub hours_coding: f64,
    pub coffee_intake_mg: f64,
    pub commits: f64,
    pub cognitive_load: f64,
    pub ai_usage_hours: f64,
    pub sleep_hours: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_COLUMNS`] order.
    pub fn to_array(&self) -> [f64; N_FEATURES] {
        [
            self.hours_coding,
            self.coffee_intake_mg,
            self.commits,
            self.cognitive_load,
            self.ai_usage_hours,
            self.sleep_hours,
        ]
    }

    /// Build from values in [`FEATURE_COLUMNS`] order.
    pub fn from_array(values: [f64; N_FEATURES]) -> Self {
        let [
            hours_coding,
            coffee_intake_mg,
            commits,
            cognitive_load,
            ai_usage_hours,
            sleep_hours,
        ] = values;
        Self {
            hours_coding,
            coffee_intake_mg,
            commits,
            cognitive_load,
            ai_usage_hours,
            sleep_hours,
        }
    }
}
