//! Page segmentation and report date extraction for text reports.

use super::classifier::parse_page_header;
use crate::error::{Result, WasdeError};
use crate::models::{Page, RawLine};
use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Three dash-separated digit runs in a file name, e.g. `wasde-03-08-2024.txt`
///
/// Runs are matched whole, so `123-45-2024` never yields `23-45-2024`.
static FILE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)-(\d+)-(\d+)").expect("file date pattern is valid"));

/// Read a report file into numbered lines
///
/// Non-UTF-8 bytes are decoded lossily; binary content is rejected.
pub fn read_lines(path: &Path) -> Result<Vec<RawLine>> {
    let bytes = std::fs::read(path).map_err(|e| WasdeError::UnreadableFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if bytes.contains(&0) {
        return Err(WasdeError::UnreadableFile {
            path: path.to_path_buf(),
            reason: "file contains binary data".to_string(),
        });
    }

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "{} is not valid UTF-8, decoding lossily",
                path.display()
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    Ok(split_lines(&text))
}

/// Split text into numbered lines, dropping line terminators
pub fn split_lines(text: &str) -> Vec<RawLine> {
    text.lines()
        .enumerate()
        .map(|(index, line)| RawLine::new(index, line.trim_end_matches('\r')))
        .collect()
}

/// Split a report into pages at each `WASDE - <report> - <page>` line
///
/// Lines before the first header are discarded. A file without any header
/// yields no pages.
pub fn segment_pages(lines: &[RawLine]) -> Vec<Page> {
    let mut pages: Vec<Page> = Vec::new();

    for line in lines {
        if let Some(header) = parse_page_header(&line.text) {
            debug!(
                "Page {} of report {} starts at line {}",
                header.page_number, header.report_number, line.index
            );
            pages.push(Page {
                number: header.page_number,
                report_number: header.report_number,
                title: String::new(),
                lines: Vec::new(),
            });
        } else if let Some(page) = pages.last_mut() {
            page.lines.push(line.clone());
        }
    }

    if pages.is_empty() {
        warn!("No page header found in {} lines", lines.len());
    }

    for page in &mut pages {
        page.title = page_title(&page.lines);
    }

    pages
}

/// First non-blank line, cut at its first digit (footnote markers and
/// similar annotations follow the title)
pub fn page_title(lines: &[RawLine]) -> String {
    lines
        .iter()
        .find(|line| !line.is_blank())
        .map(|line| {
            let text = line.text.trim();
            let end = text.find(|c: char| c.is_ascii_digit()).unwrap_or(text.len());
            text[..end].trim().to_string()
        })
        .unwrap_or_default()
}

/// Publication date of a report
///
/// Prefers a `month-day-year` token in the file name; otherwise reads the
/// trailing date words of the first line (`March 8, 2024` or `March 2024`).
pub fn extract_report_date(file_name: &str, first_line: Option<&str>) -> Option<NaiveDate> {
    date_from_file_name(file_name).or_else(|| first_line.and_then(trailing_date))
}

/// First `M-D-YYYY` run in the name that is a real calendar date
fn date_from_file_name(file_name: &str) -> Option<NaiveDate> {
    FILE_DATE_RE.captures_iter(file_name).find_map(|caps| {
        let (month, day, year) = (&caps[1], &caps[2], &caps[3]);
        if month.len() > 2 || day.len() > 2 || year.len() != 4 {
            return None;
        }
        NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
    })
}

/// Trailing `March 8, 2024` or `March 2024` words of a line
pub(crate) fn trailing_date(line: &str) -> Option<NaiveDate> {
    let words: Vec<&str> = line.split_whitespace().collect();

    if words.len() >= 3 {
        let tail = words[words.len() - 3..].join(" ");
        if let Ok(date) = NaiveDate::parse_from_str(&tail, "%B %d, %Y") {
            return Some(date);
        }
    }

    if words.len() >= 2 {
        let month = words[words.len() - 2].trim_end_matches([',', '.']);
        let year = words[words.len() - 1].trim_end_matches([',', '.']);
        return NaiveDate::parse_from_str(&format!("1 {month} {year}"), "%d %B %Y").ok();
    }

    None
}
