//! Label normalization: footnote markers, colon delimiters and
//! projection annotations.

use super::classifier::{has_row_label, split_label, tokens};
use crate::constants::PROJECTION_ANNOTATIONS;
use regex::Regex;
use std::sync::LazyLock;

/// A trailing single-digit footnote marker such as `4/`, with the
/// whitespace around it. The marker group never follows another digit.
static FOOTNOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(?P<marker>\s*\d/\s*)$").expect("footnote pattern is valid")
});

/// Trim whitespace and trailing colons, then strip trailing footnote
/// markers until none remain.
///
/// Idempotent: `strip_footnote(strip_footnote(x)) == strip_footnote(x)`.
pub fn strip_footnote(label: &str) -> String {
    let mut current = label.trim();
    loop {
        let before = current;
        current = current.trim_end_matches(':').trim_end();
        if let Some(marker) = FOOTNOTE_RE.captures(current).and_then(|c| c.name("marker")) {
            current = current[..marker.start()].trim_end();
        }
        if current == before {
            return current.to_string();
        }
    }
}

/// Remove trailing projection annotations (`Proj.`, `(Projected)`)
pub fn strip_annotations(text: &str) -> String {
    let mut current = text.trim();
    loop {
        let before = current;
        current = current.trim_end_matches(':').trim_end();
        for annotation in PROJECTION_ANNOTATIONS {
            if let Some(stripped) = current.strip_suffix(annotation) {
                current = stripped.trim_end();
            }
        }
        if current == before {
            return current.to_string();
        }
    }
}

/// Full label cleanup: inner whitespace collapsed, then annotations and
/// footnotes stripped until stable.
pub fn clean_label(text: &str) -> String {
    let mut current = text.split_whitespace().collect::<Vec<_>>().join(" ");
    loop {
        let next = strip_footnote(&strip_annotations(&current));
        if next == current {
            return current;
        }
        current = next;
    }
}

/// The row label a line introduces
///
/// Label-bearing data lines contribute the text ahead of their values;
/// any other line is taken whole.
pub fn extract_label(line: &str) -> String {
    if has_row_label(line) {
        let (label, _) = split_label(line);
        if !label.trim().is_empty() {
            return clean_label(label);
        }
    }
    clean_label(line)
}

/// The ordered cells of a row: everything after the label, with colon
/// separators discarded. Unlabelled lines contribute every token.
pub fn row_tokens(line: &str) -> Vec<String> {
    let cells = if has_row_label(line) {
        split_label(line).1
    } else {
        line
    };
    tokens(cells).map(str::to_string).collect()
}
