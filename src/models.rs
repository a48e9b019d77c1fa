//! Core data structures and types for WASDE parsing.
//!
//! Defines report lines and pages, the parsed per-commodity tables,
//! per-file outcomes and processing statistics.

use crate::constants::OUTPUT_DATE_FORMAT;
use crate::error::WasdeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Report file formats the parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Spreadsheet,
}

impl ReportFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "txt" => Some(ReportFormat::Text),
            "xls" | "xlsx" => Some(ReportFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// One line of a text report with its position in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub index: usize,
    pub text: String,
}

impl RawLine {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Parsed page boundary line, e.g. `WASDE - 646 - 19`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub tag: String,
    pub report_number: u32,
    pub page_number: String,
}

/// A report page between two header lines
#[derive(Debug, Clone)]
pub struct Page {
    pub number: String,
    pub report_number: u32,
    pub title: String,
    pub lines: Vec<RawLine>,
}

impl Page {
    /// Whether any line of the page contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.text.contains(needle))
    }
}

/// A row label with its raw cells in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRow {
    pub label: String,
    pub values: Vec<String>,
}

impl LabeledRow {
    pub fn new(label: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

/// One commodity's supply-and-use table from a single report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTable {
    pub commodity: String,
    pub report_date: NaiveDate,
    pub season: Option<String>,
    pub report_number: Option<u32>,
    pub source: PathBuf,
    /// Region labels in the order they were discovered
    pub regions: Vec<String>,
    /// Category schema, in column order
    pub categories: Vec<String>,
    values: HashMap<(String, String), String>,
}

impl ParsedTable {
    pub fn new(
        commodity: impl Into<String>,
        report_date: NaiveDate,
        season: Option<String>,
        source: PathBuf,
    ) -> Self {
        Self {
            commodity: commodity.into(),
            report_date,
            season,
            report_number: None,
            source,
            regions: Vec::new(),
            categories: Vec::new(),
            values: HashMap::new(),
        }
    }

    pub fn with_report_number(mut self, report_number: Option<u32>) -> Self {
        self.report_number = report_number;
        self
    }

    pub(crate) fn set_layout(&mut self, regions: Vec<String>, categories: Vec<String>) {
        self.regions = regions;
        self.categories = categories;
    }

    pub(crate) fn insert(&mut self, category: &str, region: &str, value: impl Into<String>) {
        self.values
            .insert((category.to_string(), region.to_string()), value.into());
    }

    /// Raw value for a (category, region) pair
    pub fn value(&self, category: &str, region: &str) -> Option<&str> {
        self.values
            .get(&(category.to_string(), region.to_string()))
            .map(String::as_str)
    }

    /// Number of (category, region) values held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Report date as `MM/DD/YYYY`
    pub fn formatted_date(&self) -> String {
        self.report_date.format(OUTPUT_DATE_FORMAT).to_string()
    }

    /// Wide rows `Crop, Category, <Region>...`, one per category
    pub fn wide_rows(&self, regions: &[String]) -> Vec<WideRow<'_>> {
        self.categories
            .iter()
            .map(|category| WideRow {
                crop: &self.commodity,
                category,
                values: regions
                    .iter()
                    .map(|region| self.value(category, region))
                    .collect(),
            })
            .collect()
    }
}

/// One category row of a table in wide layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideRow<'a> {
    pub crop: &'a str,
    pub category: &'a str,
    pub values: Vec<Option<&'a str>>,
}

/// Outcome of parsing one report file
#[derive(Debug, Default)]
pub struct FileReport {
    pub path: PathBuf,
    pub tables: Vec<ParsedTable>,
    /// Page-level problems; the file's other tables are still usable
    pub rejected: Vec<WasdeError>,
}

impl FileReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Rejections other than a commodity simply being absent
    pub fn failures(&self) -> impl Iterator<Item = &WasdeError> {
        self.rejected
            .iter()
            .filter(|e| !matches!(e, WasdeError::PageNotRecognized { .. }))
    }
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub files_without_tables: usize,
    pub tables_extracted: usize,
    pub pages_rejected: usize,
    pub output_paths: Vec<PathBuf>,
    pub processing_time_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_from_path() {
        assert_eq!(
            ReportFormat::from_path(Path::new("wasde-03-08-2024.txt")),
            Some(ReportFormat::Text)
        );
        assert_eq!(
            ReportFormat::from_path(Path::new("reports/wasde0324.XLS")),
            Some(ReportFormat::Spreadsheet)
        );
        assert_eq!(
            ReportFormat::from_path(Path::new("wasde0324.xlsx")),
            Some(ReportFormat::Spreadsheet)
        );
        assert_eq!(ReportFormat::from_path(Path::new("wasde.pdf")), None);
        assert_eq!(ReportFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_parsed_table_wide_rows() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let mut table = ParsedTable::new("Wheat", date, Some("2023/24".into()), "a.txt".into());
        table.set_layout(
            vec!["World".into(), "Russia".into()],
            vec!["Production".into(), "Exports".into()],
        );
        table.insert("Production", "World", "789.17");
        table.insert("Exports", "World", "221.48");
        table.insert("Production", "Russia", "91.50");
        table.insert("Exports", "Russia", "NA");

        assert_eq!(table.len(), 4);
        assert_eq!(table.formatted_date(), "03/08/2024");
        assert_eq!(table.value("Exports", "Russia"), Some("NA"));
        assert_eq!(table.value("Exports", "Canada"), None);

        let regions = vec!["Russia".to_string(), "Canada".to_string()];
        let rows = table.wide_rows(&regions);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].crop, "Wheat");
        assert_eq!(rows[0].category, "Production");
        assert_eq!(rows[0].values, vec![Some("91.50"), None]);
        assert_eq!(rows[1].values, vec![Some("NA"), None]);
    }

    #[test]
    fn test_file_report_failures_exclude_absent_pages() {
        let mut report = FileReport::new("a.txt");
        report.rejected.push(WasdeError::PageNotRecognized {
            path: "a.txt".into(),
            commodity: "Corn".into(),
        });
        report.rejected.push(WasdeError::RowColumnMismatch {
            commodity: "Wheat".into(),
            region: "World".into(),
            expected: 7,
            found: 5,
        });
        assert_eq!(report.failures().count(), 1);
    }
}
