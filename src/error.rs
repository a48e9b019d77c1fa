//! Error handling for WASDE report parsing.
//!
//! File-level kinds are returned from `report::parse_report` and logged by
//! the batch processor; page-level kinds are collected per file so that a
//! missing commodity and a broken page stay distinguishable.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WasdeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Cannot read report file: {path} - {reason}")]
    UnreadableFile { path: PathBuf, reason: String },

    #[error("No WASDE page header found in file: {path}")]
    NoHeaderFound { path: PathBuf },

    #[error("No page for {commodity} found in file: {path}")]
    PageNotRecognized { path: PathBuf, commodity: String },

    #[error(
        "Row/column mismatch for {commodity}, region '{region}': expected {expected} values, found {found}"
    )]
    RowColumnMismatch {
        commodity: String,
        region: String,
        expected: usize,
        found: usize,
    },

    #[error("Page for {commodity} in file {path} holds no data rows")]
    EmptyTable { path: PathBuf, commodity: String },

    #[error("Could not determine report date for file: {path} - {reason}")]
    DateUnparseable { path: PathBuf, reason: String },

    #[error("Input directory not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Unsupported report format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Spreadsheet error in file: {path} - {reason}")]
    Spreadsheet { path: PathBuf, reason: String },

    #[error("Workbook output error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl WasdeError {
    /// Page-level errors leave the rest of the file usable.
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            WasdeError::PageNotRecognized { .. }
                | WasdeError::RowColumnMismatch { .. }
                | WasdeError::EmptyTable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, WasdeError>;
