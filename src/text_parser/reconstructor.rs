//! Row reconstruction for a selected text page.
//!
//! A page body is walked by a small state machine:
//!
//! ```text
//! Preamble --(2 rule lines)--> Season --(season line)--> Body --(rule line)--> Done
//!                                 \--(data row, no season)--/
//! ```
//!
//! Blank lines and editorial grouping lines are dropped before they reach
//! the machine. Inside the body a two-line window (current + next) decides
//! where a labelled row keeps its values.

use super::classifier::{has_inline_data, has_row_label, is_data_only, is_rule_line};
use super::normalizer::{clean_label, extract_label, row_tokens, strip_annotations};
use crate::constants::{EDITORIAL_MARKER, PREAMBLE_RULES};
use crate::models::{LabeledRow, RawLine};
use std::collections::VecDeque;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Preamble { rules_seen: usize },
    Season,
    Body,
    Done,
}

/// Where a labelled row finds its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// On the label line itself
    Inline,
    /// On the following unlabelled line
    NextLine,
    /// Nowhere: a section heading
    LabelOnly,
}

/// Decide a labelled line's placement from the line after it
pub fn classify_row(current: &str, next: Option<&str>) -> Placement {
    if has_inline_data(current) {
        Placement::Inline
    } else if next.is_some_and(is_data_only) {
        Placement::NextLine
    } else {
        Placement::LabelOnly
    }
}

/// A labelled line with inline values, unless a projection annotation
/// marks it as the season line (`Mar 2024 Proj.`)
pub fn looks_like_data_row(line: &str) -> bool {
    let bare = line.trim().trim_end_matches(':').trim_end();
    has_row_label(line) && has_inline_data(line) && strip_annotations(line) == bare
}

/// Result of reconstructing one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconstructedPage {
    pub season: Option<String>,
    /// Rows in discovery order; section headings have no values
    pub rows: Vec<LabeledRow>,
    /// Whether a terminating rule line was reached
    pub terminated: bool,
    /// Unlabelled data lines seen before any row
    pub orphan_lines: usize,
}

impl ReconstructedPage {
    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.label.as_str()).collect()
    }
}

/// Fixed-size lookahead over the significant lines of a page
struct LineWindow<'a, I>
where
    I: Iterator<Item = &'a RawLine>,
{
    source: I,
    buffer: VecDeque<&'a RawLine>,
}

impl<'a, I> LineWindow<'a, I>
where
    I: Iterator<Item = &'a RawLine>,
{
    const CAPACITY: usize = 2;

    fn new(source: I) -> Self {
        Self {
            source,
            buffer: VecDeque::with_capacity(Self::CAPACITY),
        }
    }

    fn fill(&mut self) {
        while self.buffer.len() < Self::CAPACITY {
            match self.source.next() {
                Some(line) => self.buffer.push_back(line),
                None => break,
            }
        }
    }

    fn current(&mut self) -> Option<&'a RawLine> {
        self.fill();
        self.buffer.front().copied()
    }

    fn next(&mut self) -> Option<&'a RawLine> {
        self.fill();
        self.buffer.get(1).copied()
    }

    fn advance(&mut self, count: usize) {
        for _ in 0..count {
            self.fill();
            self.buffer.pop_front();
        }
    }
}

fn is_significant(line: &RawLine) -> bool {
    !line.is_blank() && !line.text.contains(EDITORIAL_MARKER)
}

/// State machine recovering labelled rows from a page body
#[derive(Debug)]
pub struct RowReconstructor {
    state: State,
    page: ReconstructedPage,
}

impl Default for RowReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl RowReconstructor {
    pub fn new() -> Self {
        Self {
            state: State::Preamble { rules_seen: 0 },
            page: ReconstructedPage::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Run the machine over a page's lines
    pub fn run(mut self, lines: &[RawLine]) -> ReconstructedPage {
        let mut window = LineWindow::new(lines.iter().filter(|line| is_significant(line)));

        while self.state != State::Done {
            match window.current() {
                Some(line) => {
                    let next = window.next().map(|l| l.text.as_str());
                    let consumed = self.step(&line.text, next);
                    window.advance(consumed);
                }
                None => {
                    debug!("Page ended before a terminating rule line");
                    self.state = State::Done;
                }
            }
        }

        if self.page.orphan_lines > 0 {
            warn!(
                "{} data line(s) appeared before any row label",
                self.page.orphan_lines
            );
        }

        self.page
    }

    /// Feed one line with its successor; returns how many lines were consumed
    fn step(&mut self, line: &str, next: Option<&str>) -> usize {
        match self.state {
            State::Preamble { rules_seen } => {
                if is_rule_line(line) {
                    let rules_seen = rules_seen + 1;
                    self.state = if rules_seen >= PREAMBLE_RULES {
                        State::Season
                    } else {
                        State::Preamble { rules_seen }
                    };
                }
                1
            }
            State::Season => {
                self.state = State::Body;
                if is_rule_line(line) || looks_like_data_row(line) {
                    debug!("No season line; body starts directly");
                    0
                } else {
                    let season = clean_label(line);
                    self.page.season = (!season.is_empty()).then_some(season);
                    1
                }
            }
            State::Body => {
                if is_rule_line(line) {
                    self.page.terminated = true;
                    self.state = State::Done;
                    return 1;
                }

                if !has_row_label(line) {
                    self.continue_row(line);
                    return 1;
                }

                let label = extract_label(line);
                match classify_row(line, next) {
                    Placement::Inline => {
                        self.page.rows.push(LabeledRow::new(label, row_tokens(line)));
                        1
                    }
                    Placement::NextLine => {
                        let values = next.map(row_tokens).unwrap_or_default();
                        self.page.rows.push(LabeledRow::new(label, values));
                        2
                    }
                    Placement::LabelOnly => {
                        self.page.rows.push(LabeledRow::new(label, Vec::new()));
                        1
                    }
                }
            }
            State::Done => 0,
        }
    }

    /// Append an unlabelled data line to the previous row
    fn continue_row(&mut self, line: &str) {
        let values = row_tokens(line);
        if values.is_empty() {
            return;
        }
        match self.page.rows.last_mut() {
            Some(row) => row.values.extend(values),
            None => self.page.orphan_lines += 1,
        }
    }
}

/// Reconstruct the season and rows of a page body
pub fn reconstruct(lines: &[RawLine]) -> ReconstructedPage {
    RowReconstructor::new().run(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_parser::segmenter::split_lines;

    fn rebuild(text: &str) -> ReconstructedPage {
        reconstruct(&split_lines(text))
    }

    #[test]
    fn test_reference_body() {
        let page = rebuild(
            "==========\n\
             ==========\n\
             Mar 2024 Proj.\n\
             United States: 100 50\n\
             Selected Other\n\
             Russia: 200 NA\n\
             ==========\n",
        );

        assert_eq!(page.season.as_deref(), Some("Mar 2024"));
        assert_eq!(page.labels(), vec!["United States", "Russia"]);
        assert_eq!(page.rows[0].values, vec!["100", "50"]);
        assert_eq!(page.rows[1].values, vec!["200", "NA"]);
        assert!(page.terminated);
    }

    #[test]
    fn test_preamble_skips_title_and_column_headers() {
        let page = rebuild(
            "   World Wheat Supply and Use 1/\n\
             \n\
             ================================\n\
             :  Beginning :            : Ending\n\
             :  Stocks    : Production : Stocks\n\
             ================================\n\
             \n\
             2024/25 Proj.:\n\
             World 3/    :  266.7    793.2   257.2\n\
             ================================\n\
             Trailing notes 1/ 2/\n",
        );

        assert_eq!(page.season.as_deref(), Some("2024/25"));
        assert_eq!(page.labels(), vec!["World"]);
        assert_eq!(page.rows[0].values, vec!["266.7", "793.2", "257.2"]);
    }

    #[test]
    fn test_missing_season_falls_through_to_body() {
        let page = rebuild(
            "====\n\
             ====\n\
             United States: 1 2\n\
             Canada: 3 4\n\
             ====\n",
        );

        assert_eq!(page.season, None);
        assert_eq!(page.labels(), vec!["United States", "Canada"]);
    }

    #[test]
    fn test_missing_season_with_colonless_first_row() {
        let page = rebuild(
            "====\n\
             ====\n\
             Canada 1 2\n\
             Russia 3 4\n\
             ====\n",
        );

        assert_eq!(page.season, None);
        assert_eq!(page.labels(), vec!["Canada", "Russia"]);
        assert_eq!(page.rows[0].values, vec!["1", "2"]);
        assert_eq!(page.rows[1].values, vec!["3", "4"]);
    }

    #[test]
    fn test_continuation_lines_extend_previous_row() {
        let page = rebuild(
            "====\n\
             ====\n\
             Mar\n\
             European Union 5/: 10 20\n\
                  30 40\n\
             Russia: 1 2 3 4\n\
             ====\n",
        );

        assert_eq!(page.labels(), vec!["European Union", "Russia"]);
        assert_eq!(page.rows[0].values, vec!["10", "20", "30", "40"]);
        assert_eq!(page.rows[1].values, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_label_on_its_own_line() {
        let page = rebuild(
            "====\n\
             ====\n\
             2024/25 Proj.\n\
             Major Exporters 4/\n\
             Argentina:\n\
                 5.1  NA\n\
             Australia: 7.0 2.2\n\
             ====\n",
        );

        assert_eq!(
            page.labels(),
            vec!["Major Exporters", "Argentina", "Australia"]
        );
        assert!(page.rows[0].values.is_empty());
        assert_eq!(page.rows[1].values, vec!["5.1", "NA"]);
        assert_eq!(page.rows[2].values, vec!["7.0", "2.2"]);
    }

    #[test]
    fn test_unterminated_page_is_consumed_to_end() {
        let page = rebuild(
            "====\n\
             ====\n\
             Mar 2024 Proj.\n\
             World: 1 2\n",
        );

        assert!(!page.terminated);
        assert_eq!(page.labels(), vec!["World"]);
    }

    #[test]
    fn test_orphan_data_before_first_label() {
        let page = rebuild(
            "====\n\
             ====\n\
             Mar 2024 Proj.\n\
             12 13\n\
             World: 1 2\n\
             ====\n",
        );

        assert_eq!(page.orphan_lines, 1);
        assert_eq!(page.labels(), vec!["World"]);
    }

    #[test]
    fn test_page_without_rules_produces_nothing() {
        let page = rebuild("World: 1 2\nRussia: 3 4\n");
        assert!(page.rows.is_empty());
        assert_eq!(page.season, None);
    }

    #[test]
    fn test_classify_row() {
        assert_eq!(classify_row("World: 1 2", Some("Russia: 3")), Placement::Inline);
        assert_eq!(classify_row("World: 1 2", Some("  3 4")), Placement::Inline);
        assert_eq!(classify_row("Argentina:", Some("  3 4")), Placement::NextLine);
        assert_eq!(classify_row("Argentina:", Some("Brazil: 1")), Placement::LabelOnly);
        assert_eq!(classify_row("Argentina:", Some("=====")), Placement::LabelOnly);
        assert_eq!(classify_row("Argentina:", None), Placement::LabelOnly);
    }

    #[test]
    fn test_looks_like_data_row() {
        assert!(looks_like_data_row("United States: 100 50"));
        assert!(looks_like_data_row("Canada 1 2"));
        assert!(looks_like_data_row("World : 1 : 2 :"));
        assert!(!looks_like_data_row("Mar 2024 Proj."));
        assert!(!looks_like_data_row("2024/25 Proj.:"));
        assert!(!looks_like_data_row("2023/24 Est."));
        assert!(!looks_like_data_row("Mar"));
    }

    #[test]
    fn test_state_transitions() {
        let mut machine = RowReconstructor::new();
        assert_eq!(machine.state(), State::Preamble { rules_seen: 0 });
        assert_eq!(machine.step("====", None), 1);
        assert_eq!(machine.state(), State::Preamble { rules_seen: 1 });
        assert_eq!(machine.step("header text", None), 1);
        assert_eq!(machine.step("====", None), 1);
        assert_eq!(machine.state(), State::Season);
        assert_eq!(machine.step("World: 1 2", None), 0);
        assert_eq!(machine.state(), State::Body);
        assert_eq!(machine.step("World: 1 2", None), 1);
        assert_eq!(machine.step("====", None), 1);
        assert_eq!(machine.state(), State::Done);
    }
}
