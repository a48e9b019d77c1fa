//! Command-line interface components.

use crate::config::{MismatchPolicy, OutputFormat, WasdeConfig};
use crate::models::ProcessingStats;
use crate::processor::ReportProcessor;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "wasde-parser")]
#[command(about = "Extract world wheat and corn supply-and-use tables from WASDE reports")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory the output files (or the xlsx workbook) are written to
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Directory holding the downloaded reports (.txt, .xls, .xlsx)
    #[arg(short = 'd', long = "input-directory", value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Glob pattern selecting report files inside the input directory
    #[arg(long, default_value = crate::constants::DEFAULT_FILE_PATTERN)]
    pub pattern: String,

    /// Output format: per-commodity csv/parquet files or one xlsx workbook
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Pad rows with fewer values than columns with NA instead of rejecting the page
    #[arg(long)]
    pub pad_mismatched: bool,

    /// Maximum number of reports parsed concurrently (defaults to CPU count)
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and hide progress output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Processing configuration with the command-line overrides applied
    pub fn to_config(&self) -> WasdeConfig {
        let policy = if self.pad_mismatched {
            MismatchPolicy::PadMissing
        } else {
            MismatchPolicy::Reject
        };

        let mut config = WasdeConfig::default()
            .with_file_pattern(self.pattern.clone())
            .with_output_format(self.format)
            .with_mismatch_policy(policy);
        if let Some(limit) = self.max_concurrent {
            config = config.with_max_concurrent_files(limit);
        }
        config
    }
}

/// Set up structured logging to stderr
///
/// `RUST_LOG` overrides the level derived from the flags. Installing twice
/// is not an error.
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wasde_parser={}", log_level)));

    let installed = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if installed.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Run a full batch from parsed arguments
pub async fn run(args: Args) -> Result<ProcessingStats> {
    setup_logging(&args);

    let config = args.to_config();
    config.validate().context("Invalid configuration")?;

    let processor = ReportProcessor::new(args.input_dir.clone(), args.output_dir.clone())
        .with_context(|| format!("Cannot process {}", args.input_dir.display()))?
        .with_config(config)
        .with_progress(!args.quiet);

    let stats = processor.process().await.context("Processing failed")?;
    Ok(stats)
}
