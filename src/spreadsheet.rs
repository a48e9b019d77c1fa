//! Parser for spreadsheet WASDE releases (`.xls` / `.xlsx`).
//!
//! Each commodity table lives on its own worksheet. The sheet is read into
//! a grid of display strings and located by density and anchor heuristics:
//!
//! - the header row is the first row with at least half its cells filled
//! - the label column is the first column with a cell starting with `World`
//! - a region's values sit one row below its label cell
//!
//! Numeric cells are rendered the way text releases print them: whole
//! numbers keep one decimal place (`212.0`, also for integer cells), other
//! floats use their shortest exact form (`266.72`).
//!
//! Labelled rows then go through the same assembler as text reports.

use crate::assembler::assemble;
use crate::config::{CommoditySpec, MismatchPolicy, WasdeConfig};
use crate::constants::{
    DATA_COLUMN_OFFSET, EDITORIAL_MARKER, HEADER_ROW_DENSITY, LABEL_COLUMN_ANCHOR, MISSING_VALUE,
    VALUE_ROW_OFFSET,
};
use crate::error::{Result, WasdeError};
use crate::models::{FileReport, LabeledRow, ParsedTable};
use crate::text_parser::normalizer::strip_footnote;
use crate::text_parser::segmenter::trailing_date;
use calamine::{Data, Range, Reader, open_workbook_auto};
use std::path::Path;
use tracing::{debug, info};

/// Worksheet contents as trimmed display strings, row-major
pub type Grid = Vec<Vec<String>>;

/// Parse every configured commodity sheet of a workbook
///
/// A workbook that cannot be opened fails the file; a missing or malformed
/// sheet only rejects that commodity.
pub fn parse_workbook(path: &Path, config: &WasdeConfig) -> Result<FileReport> {
    let mut workbook = open_workbook_auto(path).map_err(|e| WasdeError::Spreadsheet {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut report = FileReport::new(path);

    for commodity in &config.commodities {
        let Some(sheet) = commodity.sheet.as_deref() else {
            debug!("{} has no worksheet configured", commodity.name);
            continue;
        };

        let range = match workbook.worksheet_range(sheet) {
            Ok(range) => range,
            Err(e) => {
                debug!("{}: worksheet '{}' unavailable: {}", path.display(), sheet, e);
                report.rejected.push(WasdeError::PageNotRecognized {
                    path: path.to_path_buf(),
                    commodity: commodity.name.clone(),
                });
                continue;
            }
        };

        let grid = range_to_grid(&range);

        match parse_sheet(path, &grid, commodity, config.mismatch_policy) {
            Ok(table) => {
                info!(
                    "{}: {} table from sheet '{}' ({} regions)",
                    path.display(),
                    commodity.name,
                    sheet,
                    table.regions.len()
                );
                report.tables.push(table);
            }
            Err(e) => report.rejected.push(e),
        }
    }

    Ok(report)
}

/// Text of a single cell, matching the text-release token for numbers
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.is_finite() => format!("{:.1}", value),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => format!("{}.0", value),
        other => other.to_string().trim().to_string(),
    }
}

/// Grid anchored at A1, whatever cell the used range starts at
pub fn range_to_grid(range: &Range<Data>) -> Grid {
    let (first_row, first_column) = range.start().unwrap_or((0, 0));
    let padding = vec![String::new(); first_column as usize];

    let mut grid: Grid = vec![Vec::new(); first_row as usize];
    grid.extend(range.rows().map(|row| {
        padding
            .iter()
            .cloned()
            .chain(row.iter().map(cell_text))
            .collect::<Vec<_>>()
    }));
    grid
}

/// Extract one commodity table from a worksheet grid
pub fn parse_sheet(
    path: &Path,
    grid: &[Vec<String>],
    commodity: &CommoditySpec,
    policy: MismatchPolicy,
) -> Result<ParsedTable> {
    let malformed = |reason: &str| WasdeError::Spreadsheet {
        path: path.to_path_buf(),
        reason: format!("{} sheet: {}", commodity.name, reason),
    };

    let header_row = find_header_row(grid).ok_or_else(|| malformed("no header row"))?;
    let label_column = find_label_column(grid).ok_or_else(|| {
        malformed(&format!("no column starting with '{}'", LABEL_COLUMN_ANCHOR))
    })?;

    let date_cell = cell(grid, 0, 0);
    let report_date = trailing_date(date_cell).ok_or_else(|| WasdeError::DateUnparseable {
        path: path.to_path_buf(),
        reason: format!("cell A1 of the {} sheet reads {:?}", commodity.name, date_cell),
    })?;

    let season = cell(grid, header_row, label_column)
        .split_whitespace()
        .next()
        .map(str::to_string);

    let columns = data_columns(grid, header_row, label_column);
    let categories: Vec<String> = columns.iter().map(|(_, name)| name.clone()).collect();
    let rows = labeled_rows(grid, header_row, label_column, &columns);

    debug!(
        "{} sheet: header row {}, label column {}, {} categories, {} rows",
        commodity.name,
        header_row,
        label_column,
        categories.len(),
        rows.len()
    );

    let table = ParsedTable::new(
        commodity.name.clone(),
        report_date,
        season,
        path.to_path_buf(),
    );
    let table = assemble(table, &categories, &rows, policy)?;

    if table.is_empty() {
        return Err(WasdeError::EmptyTable {
            path: path.to_path_buf(),
            commodity: commodity.name.clone(),
        });
    }
    Ok(table)
}

fn cell(grid: &[Vec<String>], row: usize, column: usize) -> &str {
    grid.get(row)
        .and_then(|cells| cells.get(column))
        .map(String::as_str)
        .unwrap_or("")
}

fn grid_width(grid: &[Vec<String>]) -> usize {
    grid.iter().map(Vec::len).max().unwrap_or(0)
}

/// First row where at least half of the sheet's columns hold a value
pub fn find_header_row(grid: &[Vec<String>]) -> Option<usize> {
    let width = grid_width(grid);
    if width == 0 {
        return None;
    }
    grid.iter().position(|row| {
        let filled = row.iter().filter(|c| !c.is_empty()).count();
        filled as f64 / width as f64 >= HEADER_ROW_DENSITY
    })
}

/// First column holding a cell whose first word is the anchor
pub fn find_label_column(grid: &[Vec<String>]) -> Option<usize> {
    (0..grid_width(grid)).find(|&column| {
        grid.iter().any(|row| {
            row.get(column)
                .and_then(|c| c.split_whitespace().next())
                .is_some_and(|word| word == LABEL_COLUMN_ANCHOR)
        })
    })
}

/// Named data columns of the header row, left to right
fn data_columns(
    grid: &[Vec<String>],
    header_row: usize,
    label_column: usize,
) -> Vec<(usize, String)> {
    (label_column + DATA_COLUMN_OFFSET..grid_width(grid))
        .filter_map(|column| {
            let name = cell(grid, header_row, column)
                .replace('\n', " ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let name = strip_footnote(&name);
            (!name.is_empty()).then_some((column, name))
        })
        .collect()
}

/// Rows below the header with a label; the last row is a footer
fn labeled_rows(
    grid: &[Vec<String>],
    header_row: usize,
    label_column: usize,
    columns: &[(usize, String)],
) -> Vec<LabeledRow> {
    let last = grid.len().saturating_sub(1);
    (header_row + 1..last)
        .filter_map(|row| {
            let label = cell(grid, row, label_column);
            if label.is_empty() || label == EDITORIAL_MARKER {
                return None;
            }

            let value_row = row + VALUE_ROW_OFFSET;
            let cells: Vec<&str> = columns
                .iter()
                .map(|(column, _)| cell(grid, value_row, *column))
                .collect();

            // an all-empty row is a section heading
            let values = if cells.iter().all(|c| c.is_empty()) {
                Vec::new()
            } else {
                cells
                    .into_iter()
                    .map(|c| if c.is_empty() { MISSING_VALUE } else { c }.to_string())
                    .collect()
            };
            Some(LabeledRow::new(strip_footnote(label), values))
        })
        .collect()
}
