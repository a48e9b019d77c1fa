//! Table assembly: pivots labelled rows against a category schema.
//!
//! Values are carried through as raw tokens (`NA` included). Rows are
//! aligned by position, so a row shorter than the schema is either
//! rejected or explicitly padded, never shifted.

use crate::config::MismatchPolicy;
use crate::constants::MISSING_VALUE;
use crate::error::{Result, WasdeError};
use crate::models::{LabeledRow, ParsedTable};
use tracing::{debug, warn};

/// Fill `table` with one value per (category, region)
///
/// Section headings (rows without values) are skipped. Duplicate region
/// labels keep their first occurrence. Rows longer than the schema are
/// cut to schema width.
pub fn assemble(
    mut table: ParsedTable,
    categories: &[String],
    rows: &[LabeledRow],
    policy: MismatchPolicy,
) -> Result<ParsedTable> {
    let width = categories.len();
    let mut regions: Vec<String> = Vec::with_capacity(rows.len());
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(rows.len());

    for row in rows {
        if row.values.is_empty() {
            debug!("Skipping section heading '{}'", row.label);
            continue;
        }

        if regions.contains(&row.label) {
            warn!(
                "{}: duplicate region '{}' ignored, keeping its first row",
                table.commodity, row.label
            );
            continue;
        }

        let mut values = row.values.clone();
        if values.len() < width {
            match policy {
                MismatchPolicy::Reject => {
                    return Err(WasdeError::RowColumnMismatch {
                        commodity: table.commodity.clone(),
                        region: row.label.clone(),
                        expected: width,
                        found: values.len(),
                    });
                }
                MismatchPolicy::PadMissing => {
                    warn!(
                        "{}: region '{}' has {} of {} values, padding with {}",
                        table.commodity,
                        row.label,
                        values.len(),
                        width,
                        MISSING_VALUE
                    );
                    values.resize(width, MISSING_VALUE.to_string());
                }
            }
        } else if values.len() > width {
            debug!(
                "{}: region '{}' has {} values, keeping the first {}",
                table.commodity,
                row.label,
                values.len(),
                width
            );
            values.truncate(width);
        }

        regions.push(row.label.clone());
        cells.push(values);
    }

    for (region, values) in regions.iter().zip(&cells) {
        for (category, value) in categories.iter().zip(values) {
            table.insert(category, region, value.as_str());
        }
    }
    table.set_layout(regions, categories.to_vec());

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn empty_table() -> ParsedTable {
        ParsedTable::new(
            "Wheat",
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            Some("Mar 2024".into()),
            "wasde-03-08-2024.txt".into(),
        )
    }

    fn schema(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(label: &str, values: &[&str]) -> LabeledRow {
        LabeledRow::new(label, values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_longer_rows_are_cut_to_schema_width() {
        let rows = vec![
            row("United States", &["100", "50"]),
            row("Russia", &["200", "NA"]),
        ];
        let table = assemble(
            empty_table(),
            &schema(&["Exports"]),
            &rows,
            MismatchPolicy::Reject,
        )
        .unwrap();

        assert_eq!(table.regions, vec!["United States", "Russia"]);
        assert_eq!(table.categories, vec!["Exports"]);
        assert_eq!(table.value("Exports", "United States"), Some("100"));
        assert_eq!(table.value("Exports", "Russia"), Some("200"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_short_row_is_rejected_by_default() {
        let rows = vec![row("World", &["1", "2", "3"]), row("Russia", &["4"])];
        let err = assemble(
            empty_table(),
            &schema(&["A", "B", "C"]),
            &rows,
            MismatchPolicy::Reject,
        )
        .unwrap_err();

        match err {
            WasdeError::RowColumnMismatch {
                commodity,
                region,
                expected,
                found,
            } => {
                assert_eq!(commodity, "Wheat");
                assert_eq!(region, "Russia");
                assert_eq!(expected, 3);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_short_row_padded_when_requested() {
        let rows = vec![row("Russia", &["4"])];
        let table = assemble(
            empty_table(),
            &schema(&["A", "B", "C"]),
            &rows,
            MismatchPolicy::PadMissing,
        )
        .unwrap();

        assert_eq!(table.value("A", "Russia"), Some("4"));
        assert_eq!(table.value("B", "Russia"), Some("NA"));
        assert_eq!(table.value("C", "Russia"), Some("NA"));
    }

    #[test]
    fn test_headings_and_duplicates() {
        let rows = vec![
            row("Major Exporters", &[]),
            row("Argentina", &["1", "2"]),
            row("Argentina", &["9", "9"]),
        ];
        let table = assemble(
            empty_table(),
            &schema(&["A", "B"]),
            &rows,
            MismatchPolicy::Reject,
        )
        .unwrap();

        assert_eq!(table.regions, vec!["Argentina"]);
        assert_eq!(table.value("B", "Argentina"), Some("2"));
    }

    #[test]
    fn test_no_rows_gives_empty_table() {
        let table = assemble(empty_table(), &schema(&["A"]), &[], MismatchPolicy::Reject).unwrap();
        assert!(table.is_empty());
        assert!(table.regions.is_empty());
    }
}
