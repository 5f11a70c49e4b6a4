//! CLI entry point for the productivity dataset preprocessing pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use devprod_processing::config::{
    DEFAULT_INPUT_PATH, DEFAULT_IQR_MULTIPLIER, DEFAULT_OUTPUT_PATH, DEFAULT_SCALER_PATH,
};
use devprod_processing::{
    DataLoader, Pipeline, PipelineConfig, PipelineResult, PreprocessingError, ScalingTransform,
    write_dataset,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Outlier filtering and feature standardization for the AI developer productivity dataset",
    long_about = "Reads the raw productivity dataset, drops every row outside the IQR fences of \
                  any column, standardizes the six feature columns and writes the processed \
                  dataset together with the fitted scaler.\n\n\
                  EXAMPLES:\n  \
                  # Run with default file names in the current directory\n  \
                  devprod-processing\n\n  \
                  # Explicit paths, machine-readable summary\n  \
                  devprod-processing -i raw.csv -o processed.csv -s scaler.json --json\n\n  \
                  # Standardize new observations with a saved scaler\n  \
                  devprod-processing apply --scaler scaler_model.pkl --input new.csv --output new_scaled.csv"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the raw dataset
    #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    /// Path of the processed dataset
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Path of the fitted scaler artifact
    #[arg(short, long, default_value = DEFAULT_SCALER_PATH)]
    scaler_output: PathBuf,

    /// Rows outside [Q1 - k*IQR, Q3 + k*IQR] in any column are dropped
    #[arg(long, default_value_t = DEFAULT_IQR_MULTIPLIER)]
    iqr_multiplier: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Standardize a CSV of raw features with a previously saved scaler
    Apply {
        /// Scaler artifact written by a previous run
        #[arg(long, default_value = DEFAULT_SCALER_PATH)]
        scaler: PathBuf,

        /// CSV with the six feature columns (target optional)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the standardized rows
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Machine-readable result of the `apply` subcommand.
#[derive(Debug, Serialize)]
struct ApplySummary {
    scaler: PathBuf,
    input: PathBuf,
    output: PathBuf,
    rows: usize,
    columns: usize,
}

/// Envelope printed with `--json`.
#[derive(Debug, Serialize)]
struct JsonOutput<'a, T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a PreprocessingError>,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    match &args.command {
        Some(Command::Apply {
            scaler,
            input,
            output,
        }) => run_apply(&args, scaler.clone(), input.clone(), output.clone()),
        None => run_pipeline(&args),
    }
}

/// Run the full pipeline and print results.
fn run_pipeline(args: &Args) -> Result<()> {
    let config = match PipelineConfig::builder()
        .input_path(&args.input)
        .output_path(&args.output)
        .scaler_path(&args.scaler_output)
        .iqr_multiplier(args.iqr_multiplier)
        .build()
    {
        Ok(config) => config,
        Err(e) => return fail(e.into(), args.json),
    };

    let mut builder = Pipeline::builder().config(config);

    // Progress lines are user-facing output, not logs
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            println!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    let pipeline = builder.build()?;
    info!("Reading dataset from: {}", args.input.display());

    match pipeline.run() {
        Ok(result) => {
            if args.json {
                print_json(Some(&result.summary), None)?;
            } else {
                print_human_readable_summary(&result, args);
            }
            Ok(())
        }
        Err(e) => fail(e, args.json),
    }
}

/// Standardize a new dataset with a saved scaler.
fn run_apply(args: &Args, scaler: PathBuf, input: PathBuf, output: PathBuf) -> Result<()> {
    let outcome = (|| -> devprod_processing::PreprocessingResult<ApplySummary> {
        let transform = ScalingTransform::load(&scaler)?;
        let raw = DataLoader::load_features(&input)?;
        info!("Loaded {} rows from {}", raw.height(), input.display());

        let scaled = transform.transform(&raw)?;
        write_dataset(&scaled, &output)?;

        Ok(ApplySummary {
            rows: scaled.height(),
            columns: scaled.width(),
            scaler,
            input,
            output,
        })
    })();

    match outcome {
        Ok(summary) => {
            if args.json {
                print_json(Some(&summary), None)?;
            } else if !args.quiet {
                println!(
                    "Standardized {} rows x {} columns -> {}",
                    summary.rows,
                    summary.columns,
                    summary.output.display()
                );
            }
            Ok(())
        }
        Err(e) => fail(e, args.json),
    }
}

/// Turn a failure into a non-zero exit. `main` prints the message.
fn fail(e: PreprocessingError, json: bool) -> Result<()> {
    if json {
        print_json::<()>(None, Some(&e))?;
    }
    Err(anyhow!("{}", e))
}

fn print_json<T: Serialize>(result: Option<&T>, error: Option<&PreprocessingError>) -> Result<()> {
    let output = JsonOutput {
        success: error.is_none(),
        result,
        error,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print a human-readable summary of a completed run.
///
/// This is the default output when neither `--json` nor `--quiet` are specified.
fn print_human_readable_summary(result: &PipelineResult, args: &Args) {
    let summary = &result.summary;

    if args.quiet {
        return;
    }

    println!();
    println!("{}", "=".repeat(80));
    println!("PREPROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        args.input.display(),
        summary.rows_before,
        summary.columns_before
    );
    println!(
        "Output: {} ({} rows x {} columns)",
        args.output.display(),
        summary.rows_after,
        summary.columns_after
    );
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed as outliers)",
        summary.rows_before, summary.rows_after, summary.rows_removed
    );
    println!("  Features standardized: {}", result.scaler.n_features());
    println!();

    println!("Generated Files:");
    for file in &summary.output_files {
        println!("  - {}", file.display());
    }
    println!();

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;
    use devprod_processing::DataLoadError;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_fail_does_not_log_the_error_again() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::TRACE)
            .finish();

        let err = PreprocessingError::from(DataLoadError::NotFound(PathBuf::from("raw.csv")));
        let result = tracing::subscriber::with_default(subscriber, || fail(err, false));

        let message = result.unwrap_err().to_string();
        assert!(message.contains("raw.csv"));
        assert!(logs.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cli_parses_apply_subcommand() {
        let args = Args::parse_from([
            "devprod-processing",
            "apply",
            "--scaler",
            "s.json",
            "-i",
            "new.csv",
            "-o",
            "out.csv",
            "--json",
        ]);
        assert!(args.json);
        assert!(matches!(
            args.command,
            Some(Command::Apply { ref input, .. }) if input == &PathBuf::from("new.csv")
        ));
    }
}
