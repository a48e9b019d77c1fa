//! Parser for plain-text WASDE reports
//!
//! Text releases have no column grid: rows are recovered from ragged lines
//! with footnote markers, optional colon delimiters and wrapped values.
//!
//! ## Architecture
//!
//! - [`classifier`] - Pure line predicates (page header, data, row label)
//! - [`normalizer`] - Footnote, colon and annotation stripping
//! - [`segmenter`] - Splits a file into pages and finds the report date
//! - [`selector`] - Picks the page holding each commodity's table
//! - [`reconstructor`] - State machine recovering labelled rows
//!
//! Rows are then pivoted by [`crate::assembler`].

pub mod classifier;
pub mod normalizer;
pub mod reconstructor;
pub mod segmenter;
pub mod selector;

use crate::assembler::assemble;
use crate::config::WasdeConfig;
use crate::error::{Result, WasdeError};
use crate::models::{FileReport, ParsedTable, RawLine};
use std::path::Path;
use tracing::{debug, info};

pub use reconstructor::{ReconstructedPage, reconstruct};
pub use segmenter::{extract_report_date, read_lines, segment_pages};
pub use selector::select_pages;

/// Parse a text report file into one table per configured commodity
pub fn parse_text_report(path: &Path, config: &WasdeConfig) -> Result<FileReport> {
    let lines = read_lines(path)?;
    parse_text_lines(path, &lines, config)
}

/// Parse already-read report lines; `path` names the source
pub fn parse_text_lines(
    path: &Path,
    lines: &[RawLine],
    config: &WasdeConfig,
) -> Result<FileReport> {
    let pages = segment_pages(lines);
    if pages.is_empty() {
        return Err(WasdeError::NoHeaderFound {
            path: path.to_path_buf(),
        });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let first_line = lines.first().map(|l| l.text.as_str());
    let report_date = extract_report_date(&file_name, first_line).ok_or_else(|| {
        WasdeError::DateUnparseable {
            path: path.to_path_buf(),
            reason: format!(
                "no month-day-year token in the file name and no trailing date in {:?}",
                first_line.unwrap_or_default()
            ),
        }
    })?;

    debug!(
        "{}: {} pages, report date {}",
        path.display(),
        pages.len(),
        report_date
    );

    let mut report = FileReport::new(path);
    let selected = select_pages(&pages, &config.commodities);

    for (commodity, page) in config.commodities.iter().zip(selected) {
        let Some(page) = page else {
            report.rejected.push(WasdeError::PageNotRecognized {
                path: path.to_path_buf(),
                commodity: commodity.name.clone(),
            });
            continue;
        };

        let reconstructed = reconstruct(&page.lines);
        let table = ParsedTable::new(
            commodity.name.clone(),
            report_date,
            reconstructed.season.clone(),
            path.to_path_buf(),
        )
        .with_report_number(Some(page.report_number));

        match assemble(
            table,
            &commodity.categories,
            &reconstructed.rows,
            config.mismatch_policy,
        ) {
            Ok(table) if table.is_empty() => {
                report.rejected.push(WasdeError::EmptyTable {
                    path: path.to_path_buf(),
                    commodity: commodity.name.clone(),
                });
            }
            Ok(table) => {
                info!(
                    "{}: {} table from page {} ({} regions)",
                    file_name,
                    commodity.name,
                    page.number,
                    table.regions.len()
                );
                report.tables.push(table);
            }
            Err(e) => report.rejected.push(e),
        }
    }

    Ok(report)
}
