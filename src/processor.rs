//! Batch processing of a directory of WASDE reports.
//!
//! Orchestrates the complete workflow: report discovery, concurrent
//! parsing on the blocking pool, per-commodity accumulation and output.

use crate::config::WasdeConfig;
use crate::error::{Result, WasdeError};
use crate::models::{FileReport, ProcessingStats};
use crate::report::parse_report;
use crate::writer::{Dataset, write_dataset};

use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{debug, warn};

/// Main processor for a report directory
pub struct ReportProcessor {
    input_dir: PathBuf,
    output_dir: PathBuf,
    config: WasdeConfig,
    show_progress: bool,
}

impl ReportProcessor {
    /// Create a new processor
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Result<Self> {
        if !input_dir.is_dir() {
            return Err(WasdeError::InputNotFound { path: input_dir });
        }

        Ok(Self {
            input_dir,
            output_dir,
            config: WasdeConfig::default(),
            show_progress: true,
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: WasdeConfig) -> Self {
        self.config = config;
        self
    }

    /// Show or hide the progress bar and summary
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Main processing entry point
    pub async fn process(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        self.config.validate()?;

        if self.show_progress {
            println!("{}", "Starting WASDE report processing".bright_green().bold());
            println!("  {} {}", "Input:".bright_cyan(), self.input_dir.display());
            println!("  {} {}", "Output:".bright_cyan(), self.output_dir.display());
        }

        let files = self.discover_reports()?;
        if self.show_progress {
            println!(
                "  {} {} report files",
                "Found".bright_green(),
                files.len().to_string().bright_white().bold()
            );
        }

        let mut stats = ProcessingStats {
            files_discovered: files.len(),
            ..Default::default()
        };

        if files.is_empty() {
            warn!(
                "No files match '{}' in {}",
                self.config.file_pattern,
                self.input_dir.display()
            );
            stats.processing_time_ms = start_time.elapsed().as_millis();
            return Ok(stats);
        }

        let dataset = self.parse_all(&files, &mut stats).await;

        stats.output_paths = write_dataset(
            &dataset,
            &self.config.commodities,
            &self.output_dir,
            self.config.output_format,
        )?;
        stats.processing_time_ms = start_time.elapsed().as_millis();

        if self.show_progress {
            print_summary(&stats);
        }

        Ok(stats)
    }

    /// Report files matching the configured pattern, in name order
    fn discover_reports(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.input_dir.join(&self.config.file_pattern);
        let pattern_str = pattern.to_string_lossy();
        debug!("Searching for reports with pattern: {}", pattern_str);

        let entries = glob::glob(&pattern_str).map_err(|e| WasdeError::Configuration {
            message: format!("invalid file pattern '{}': {}", self.config.file_pattern, e),
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        debug!("Found {} report files", files.len());
        Ok(files)
    }

    /// Parse every file with bounded concurrency, keeping discovery order
    async fn parse_all(&self, files: &[PathBuf], stats: &mut ProcessingStats) -> Dataset {
        let pb = if self.show_progress {
            ProgressBar::new(files.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Parsing reports");

        let concurrent_limit = self.config.max_concurrent_files.min(files.len()).max(1);
        let config = Arc::new(self.config.clone());

        let results: Vec<(PathBuf, Result<FileReport>)> = stream::iter(files.iter().cloned())
            .map(|path| {
                let config = Arc::clone(&config);
                let pb = pb.clone();
                async move {
                    let result = parse_blocking(path.clone(), config).await;
                    pb.inc(1);
                    (path, result)
                }
            })
            .buffered(concurrent_limit)
            .collect()
            .await;

        pb.finish_with_message("All reports parsed");

        let mut dataset = Dataset::new();
        for (path, result) in results {
            let name = display_name(&path);
            match result {
                Ok(report) => {
                    for problem in report.failures() {
                        warn!("{}: {}", name, problem);
                    }
                    for absent in report
                        .rejected
                        .iter()
                        .filter(|e| matches!(e, WasdeError::PageNotRecognized { .. }))
                    {
                        debug!("{}: {}", name, absent);
                    }
                    stats.files_processed += 1;
                    stats.pages_rejected += report.failures().count();
                    let added = dataset.absorb(report);
                    if added == 0 {
                        stats.files_without_tables += 1;
                        warn!("{}: no tables extracted", name);
                    }
                    stats.tables_extracted += added;
                }
                Err(e) => {
                    stats.files_failed += 1;
                    warn!("{}: skipped: {}", name, e);
                }
            }
        }

        dataset
    }
}

/// Run one parse on the blocking pool
async fn parse_blocking(path: PathBuf, config: Arc<WasdeConfig>) -> Result<FileReport> {
    let task_path = path.clone();
    task::spawn_blocking(move || parse_report(&task_path, &config))
        .await
        .map_err(|e| WasdeError::UnreadableFile {
            path,
            reason: format!("parse task failed: {}", e),
        })?
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    if stats.files_without_tables > 0 {
        println!(
            "  {} {}",
            "Files without tables:".bright_yellow(),
            stats.files_without_tables.to_string().bright_yellow()
        );
    }
    if stats.pages_rejected > 0 {
        println!(
            "  {} {}",
            "Pages rejected:".bright_yellow(),
            stats.pages_rejected.to_string().bright_yellow()
        );
    }
    println!(
        "  {} {}",
        "Tables extracted:".bright_cyan(),
        stats.tables_extracted.to_string().bright_white().bold()
    );
    for path in &stats.output_paths {
        println!("  {} {}", "Wrote:".bright_cyan(), path.display());
    }
}
