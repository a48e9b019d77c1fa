//! Line classification predicates for WASDE text reports.
//!
//! Every predicate is total: malformed input yields `false`/`None`,
//! never a panic.

use super::normalizer::{clean_label, strip_footnote};
use crate::constants::{MISSING_VALUE, REPORT_TAG, RULE_CHAR};
use crate::models::ReportHeader;

/// Parse a page boundary line such as `WASDE - 646 - 19`
///
/// The line must split on `-` into exactly three parts whose first words
/// are the report tag, the report number and the page number.
pub fn parse_page_header(line: &str) -> Option<ReportHeader> {
    let parts = line
        .trim()
        .split('-')
        .map(|part| part.split_whitespace().next())
        .collect::<Option<Vec<&str>>>()?;

    if parts.len() != 3 || parts[0] != REPORT_TAG {
        return None;
    }

    let report_number = parts[1].parse::<u32>().ok()?;
    parts[2].parse::<u32>().ok()?;

    Some(ReportHeader {
        tag: parts[0].to_string(),
        report_number,
        page_number: parts[2].to_string(),
    })
}

/// Whether the line opens a new page
pub fn is_page_header(line: &str) -> bool {
    parse_page_header(line).is_some()
}

/// Horizontal rules framing a table start with the rule character
pub fn is_rule_line(line: &str) -> bool {
    line.starts_with(RULE_CHAR)
}

/// Tokens a table row is made of; colons act as column separators
pub(crate) fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || c == ':')
        .filter(|t| !t.is_empty())
}

/// A numeric cell or the not-available marker
pub fn is_value_token(token: &str) -> bool {
    if token == MISSING_VALUE {
        return true;
    }
    let starts_numeric = token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    starts_numeric && token.replace(',', "").parse::<f64>().is_ok()
}

/// Whether the line may hold numeric data
pub fn could_be_data(line: &str) -> bool {
    let normalized = strip_footnote(line);
    !normalized.is_empty()
        && (normalized.chars().any(|c| c.is_ascii_digit())
            || tokens(&normalized).any(|t| t == MISSING_VALUE))
}

/// Split a line into its label prefix and the remaining cells
///
/// With a colon the prefix is everything before the first colon; without
/// one it is the run of words preceding the first value token.
pub(crate) fn split_label(line: &str) -> (&str, &str) {
    if let Some((label, rest)) = line.split_once(':') {
        return (label, rest);
    }

    let mut offset = 0;
    for token in line.split_whitespace() {
        let start = offset + line[offset..].find(token).unwrap_or(0);
        if is_value_token(token) {
            return (&line[..start], &line[start..]);
        }
        offset = start + token.len();
    }
    (line, "")
}

/// Whether a line opens a new row
///
/// Lines without digits or `NA` are label-only rows. Data-bearing lines
/// only open a row when they carry label text ahead of their values;
/// bare numeric lines continue the previous row.
pub fn has_row_label(line: &str) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    if !could_be_data(line) {
        return true;
    }
    let (label, _) = split_label(line);
    clean_label(label).chars().any(|c| c.is_alphabetic())
}

/// Whether the line carries at least one value after its label
pub fn has_inline_data(line: &str) -> bool {
    let (_, cells) = split_label(line);
    tokens(cells).any(is_value_token)
}

/// A pure continuation line: values without a label
pub fn is_data_only(line: &str) -> bool {
    !is_rule_line(line) && could_be_data(line) && !has_row_label(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_header_accepts_well_formed_lines() {
        assert!(is_page_header("WASDE-123-45"));
        assert!(is_page_header("WASDE - 646 - 19"));
        assert!(is_page_header("   WASDE - 646 - 19          March 2024"));

        let header = parse_page_header("WASDE - 646 - 19").unwrap();
        assert_eq!(header.tag, "WASDE");
        assert_eq!(header.report_number, 646);
        assert_eq!(header.page_number, "19");
    }

    #[test]
    fn test_page_header_rejects_malformed_lines() {
        assert!(!is_page_header(""));
        assert!(!is_page_header("WASDE-123"));
        assert!(!is_page_header("WASDE-123-45-6"));
        assert!(!is_page_header("WASDE-abc-45"));
        assert!(!is_page_header("WASDE-123-xy"));
        assert!(!is_page_header("REPORT-123-45"));
        assert!(!is_page_header("wasde-123-45"));
        assert!(!is_page_header("WASDE- -45"));
        assert!(!is_page_header("World Wheat Supply and Use"));
    }

    #[test]
    fn test_rule_line() {
        assert!(is_rule_line("=========="));
        assert!(!is_rule_line("  ======"));
        assert!(!is_rule_line("World: 1 2"));
    }

    #[test]
    fn test_could_be_data() {
        assert!(could_be_data("NA"));
        assert!(!could_be_data(""));
        assert!(could_be_data("Production: 120 45"));
        assert!(could_be_data("    120.5   45.2"));
        assert!(could_be_data("Russia: NA NA"));
        assert!(!could_be_data("World  4/"));
        assert!(!could_be_data("Major Exporters 5/ 6/:"));
        assert!(!could_be_data("NAFTA countries"));
        assert!(!could_be_data("=========="));
    }

    #[test]
    fn test_has_row_label() {
        assert!(has_row_label("United States: 100 50"));
        assert!(has_row_label("Russia: 200 NA"));
        assert!(has_row_label("World  4/    :  271.22   789.17"));
        assert!(has_row_label("Major Exporters 5/"));
        assert!(has_row_label("European Union 100 50"));

        assert!(!has_row_label("   100    50"));
        assert!(!has_row_label(": 100 50"));
        assert!(!has_row_label("NA NA"));
        assert!(!has_row_label(""));
    }

    #[test]
    fn test_inline_data_and_continuation() {
        assert!(has_inline_data("United States: 100 50"));
        assert!(has_inline_data("Canada NA 30"));
        assert!(!has_inline_data("2024/25 Proj.:"));
        assert!(!has_inline_data("Major Exporters 5/"));

        assert!(is_data_only("   60   70"));
        assert!(is_data_only("NA 12"));
        assert!(!is_data_only("Russia: 200 NA"));
        assert!(!is_data_only("=========="));
    }

    #[test]
    fn test_value_tokens() {
        assert!(is_value_token("271.22"));
        assert!(is_value_token("-0.5"));
        assert!(is_value_token("1,234.5"));
        assert!(is_value_token("NA"));
        assert!(!is_value_token("4/"));
        assert!(!is_value_token("Proj."));
        assert!(!is_value_token("nan"));
        assert!(!is_value_token(""));
    }

    #[test]
    fn test_split_label() {
        assert_eq!(
            split_label("United States: 100 50"),
            ("United States", " 100 50")
        );
        assert_eq!(split_label("Canada  NA 30"), ("Canada  ", "NA 30"));
        assert_eq!(split_label("   60 70"), ("   ", "60 70"));
        assert_eq!(split_label("Other Europe 2/ 12 13"), ("Other Europe 2/ ", "12 13"));
        assert_eq!(split_label("Major Exporters"), ("Major Exporters", ""));
    }
}
