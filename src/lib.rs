//! WASDE Parser Library
//!
//! Extracts world wheat and corn supply-and-use tables from USDA WASDE
//! (World Agricultural Supply and Demand Estimates) reports and writes
//! them as per-commodity CSV or Parquet datasets, or as one xlsx workbook
//! with a worksheet per commodity.
//!
//! This library provides tools for:
//! - Segmenting plain-text reports into pages and selecting commodity pages
//! - Reconstructing labelled rows from ragged, footnoted text tables
//! - Reading the same tables from `.xls`/`.xlsx` releases
//! - Assembling rows against a fixed category schema with explicit
//!   handling of misaligned rows
//! - Batch processing a report directory concurrently

pub mod assembler;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod processor;
pub mod report;
pub mod spreadsheet;
pub mod text_parser;
pub mod writer;

// Re-export commonly used types
pub use config::{CommoditySpec, MismatchPolicy, OutputFormat, WasdeConfig};
pub use error::{Result, WasdeError};
pub use models::{FileReport, ParsedTable, ProcessingStats};
pub use processor::ReportProcessor;
pub use report::parse_report;
