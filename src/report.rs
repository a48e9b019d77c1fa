//! Format dispatch for a single report file.

use crate::config::WasdeConfig;
use crate::error::{Result, WasdeError};
use crate::models::{FileReport, ReportFormat};
use crate::spreadsheet::parse_workbook;
use crate::text_parser::parse_text_report;
use std::path::Path;
use tracing::debug;

/// Parse one report, choosing the parser from the file extension
pub fn parse_report(path: &Path, config: &WasdeConfig) -> Result<FileReport> {
    let format = ReportFormat::from_path(path).ok_or_else(|| WasdeError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    debug!("Parsing {} as {:?}", path.display(), format);

    match format {
        ReportFormat::Text => parse_text_report(path, config),
        ReportFormat::Spreadsheet => parse_workbook(path, config),
    }
}
