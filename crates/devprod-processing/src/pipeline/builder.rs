//! Main preprocessing pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating load, outlier filtering, scaling and persistence.

use crate::config::PipelineConfig;
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::loader::DataLoader;
use crate::persister::write_dataset;
use crate::pipeline::outliers::OutlierFilter;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::scaling::StandardScaler;
use crate::types::{PipelineResult, PreprocessingSummary, ProcessedDataset};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The preprocessing pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use devprod_processing::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().input_path("raw.csv").build()?)
///     .on_progress(|update| println!("{}", update.message))
///     .build()?
///     .run()?;
///
/// println!("{} rows kept", result.summary.rows_after);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    filter: OutlierFilter,
    scaler: StandardScaler,
}

// Callers may move a pipeline to a worker thread
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage: load the configured input, filter, scale, then write
    /// the processed dataset and the scaler artifact.
    ///
    /// Stops at the first failing stage. Files already written by earlier
    /// stages are left in place.
    pub fn run(&self) -> Result<PipelineResult> {
        self.finish(self.run_internal())
    }

    /// Filter and scale an already loaded table without touching the disk.
    ///
    /// # Errors
    ///
    /// Fails with [`ScalingError::EmptyInput`](crate::error::ScalingError::EmptyInput)
    /// when every row is an outlier, and with
    /// [`ScalingError::ZeroVariance`](crate::error::ScalingError::ZeroVariance)
    /// when a feature is constant after filtering.
    pub fn process(&self, df: DataFrame) -> Result<ProcessedDataset> {
        self.finish(self.process_internal(df))
    }

    /// Report the terminal progress update for `result`.
    fn finish<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(value)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self) -> Result<PipelineResult> {
        let start_time = Instant::now();
        info!("Starting preprocessing pipeline...");

        // Step 1: Load
        let stage = PipelineStage::Loading;
        self.report_progress(ProgressUpdate::new(
            stage,
            0.0,
            format!("Loading {}", self.config.input_path.display()),
        ));

        let df = DataLoader::load_dataset(&self.config.input_path)
            .map_err(PreprocessingError::from)
            .context(stage.display_name())?;
        let columns_before = df.width();

        info!("Loaded dataset: {} rows x {} columns", df.height(), df.width());
        self.report_progress(ProgressUpdate::new(
            stage,
            1.0,
            format!("Loaded dataset: {} rows x {} columns", df.height(), df.width()),
        ));

        // Steps 2 and 3: Filter and scale
        let processed = self.process_internal(df)?;

        // Step 4: Persist
        let stage = PipelineStage::Persisting;
        self.report_progress(ProgressUpdate::new(stage, 0.0, "Writing outputs..."));

        let mut summary = PreprocessingSummary::from_report(
            &processed.outliers,
            columns_before,
            processed.data.width(),
        );

        write_dataset(&processed.data, &self.config.output_path).context(stage.display_name())?;
        summary.add_output_file(&self.config.output_path);
        self.report_progress(ProgressUpdate::new(
            stage,
            0.5,
            format!("Saved dataset to {}", self.config.output_path.display()),
        ));

        processed
            .scaler
            .save(&self.config.scaler_path)
            .context(stage.display_name())?;
        summary.add_output_file(&self.config.scaler_path);
        self.report_progress(ProgressUpdate::new(
            stage,
            1.0,
            format!("Saved scaler to {}", self.config.scaler_path.display()),
        ));

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        for warning in &summary.warnings {
            warn!("{}", warning);
        }
        info!("Pipeline finished in {} ms", summary.duration_ms);

        Ok(PipelineResult {
            data: processed.data,
            scaler: processed.scaler,
            summary,
        })
    }

    fn process_internal(&self, df: DataFrame) -> Result<ProcessedDataset> {
        // Outlier filtering
        let stage = PipelineStage::OutlierFiltering;
        self.report_progress(ProgressUpdate::new(
            stage,
            0.0,
            format!(
                "Shape before outlier removal: {} rows x {} columns",
                df.height(),
                df.width()
            ),
        ));

        let (filtered, outliers) = self.filter.filter(&df).context(stage.display_name())?;

        info!(
            "Removed {} outlier rows ({} -> {})",
            outliers.rows_removed(),
            outliers.rows_before,
            outliers.rows_after
        );
        if filtered.height() == 0 {
            warn!("Every row was removed as an outlier");
        }
        self.report_progress(ProgressUpdate::new(
            stage,
            1.0,
            format!(
                "Shape after outlier removal: {} rows x {} columns",
                filtered.height(),
                filtered.width()
            ),
        ));

        // Scaling
        let stage = PipelineStage::Scaling;
        self.report_progress(ProgressUpdate::new(stage, 0.0, "Fitting standard scaler..."));

        let (data, scaler) = self
            .scaler
            .fit_transform(&filtered)
            .context(stage.display_name())?;

        info!("Standardized {} feature columns", scaler.n_features());
        self.report_progress(ProgressUpdate::new(
            stage,
            1.0,
            format!("Standardized {} feature columns", scaler.n_features()),
        ));

        Ok(ProcessedDataset {
            data,
            scaler,
            outliers,
        })
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let pipeline = Pipeline::builder()
    ///     .on_progress(|update| {
    ///         println!("[{:.0}%] {:?}: {}",
    ///             update.progress * 100.0,
    ///             update.stage,
    ///             update.message
    ///         );
    ///     })
    ///     .build()?;
    /// ```
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, crate::config::ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            filter: OutlierFilter::new(config.iqr_multiplier),
            scaler: StandardScaler::default(),
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScalingError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> DataFrame {
        df![
            "hours_coding" => [5.0, 6.0, 4.0, 5.0, 6.0, 5.0, 4.0, 5.0, 6.0, 500.0],
            "coffee_intake_mg" => [200.0, 220.0, 180.0, 210.0, 190.0, 205.0, 215.0, 195.0, 200.0, 200.0],
            "commits" => [3.0, 4.0, 2.0, 3.0, 4.0, 3.0, 2.0, 3.0, 4.0, 3.0],
            "cognitive_load" => [4.0, 5.0, 3.0, 4.0, 5.0, 4.0, 3.0, 5.0, 4.0, 4.0],
            "ai_usage_hours" => [1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 1.0],
            "sleep_hours" => [7.0, 6.0, 8.0, 7.0, 6.0, 7.0, 8.0, 7.0, 6.0, 7.0],
            "task_success" => [1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config().iqr_multiplier, 1.5);
        assert!(pipeline.progress_reporter.is_none());
    }

    #[test]
    fn test_pipeline_builder_with_config() {
        let config = PipelineConfig::builder().iqr_multiplier(3.0).build().unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();
        assert_eq!(pipeline.filter.multiplier(), 3.0);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            iqr_multiplier: -2.0,
            ..PipelineConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_process_drops_outlier_and_scales() {
        let pipeline = Pipeline::builder().build().unwrap();
        let processed = pipeline.process(sample()).unwrap();

        assert_eq!(processed.data.height(), 9);
        assert_eq!(processed.outliers.rows_removed(), 1);
        assert_eq!(processed.scaler.n_samples_seen(), 9);

        let target: Vec<f64> = processed
            .data
            .column("task_success")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(target, vec![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_process_reports_every_stage() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&stages);

        let pipeline = Pipeline::builder()
            .on_progress(move |update| seen.lock().unwrap().push(update.stage))
            .build()
            .unwrap();
        pipeline.process(sample()).unwrap();

        let stages = stages.lock().unwrap();
        assert!(stages.contains(&PipelineStage::OutlierFiltering));
        assert!(stages.contains(&PipelineStage::Scaling));
        assert_eq!(stages.last(), Some(&PipelineStage::Complete));
    }

    #[test]
    fn test_process_constant_feature_fails_with_stage_context() {
        let failures = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&failures);

        let mut df = sample().head(Some(9));
        df.replace("commits", Series::new("commits".into(), vec![3.0; 9]))
            .unwrap();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| {
                if update.stage == PipelineStage::Failed {
                    count.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap();

        let err = pipeline.process(df).unwrap_err();
        assert!(err.is_scaling());
        assert!(err.to_string().starts_with("Scaling Features"));
        assert!(matches!(
            err.root(),
            PreprocessingError::Scaling(ScalingError::ZeroVariance(name)) if name == "commits"
        ));
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_missing_input_is_data_load_error() {
        let config = PipelineConfig::builder()
            .input_path("definitely/not/here.csv")
            .build()
            .unwrap();
        let err = Pipeline::builder().config(config).build().unwrap().run().unwrap_err();
        assert!(err.is_data_load());
        assert_eq!(err.error_code(), "DATA_LOAD_ERROR");
    }
}
