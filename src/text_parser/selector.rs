//! Selection of the commodity pages worth reconstructing.

use super::normalizer::strip_footnote;
use crate::config::CommoditySpec;
use crate::constants::PROJECTION_MARKER;
use crate::models::Page;
use tracing::debug;

/// Lower-cased, whitespace-collapsed title for comparison
pub fn normalized_title(page: &Page) -> String {
    strip_footnote(&page.title)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A page is a candidate when its title names the commodity's table and
/// it carries current-period projections
pub fn is_candidate(page: &Page, commodity: &CommoditySpec) -> bool {
    normalized_title(page) == commodity.title.to_lowercase() && page.contains(PROJECTION_MARKER)
}

/// Pick at most one page per commodity, aligned with `commodities`
///
/// When several pages qualify the last one wins.
pub fn select_pages<'a>(pages: &'a [Page], commodities: &[CommoditySpec]) -> Vec<Option<&'a Page>> {
    commodities
        .iter()
        .map(|commodity| {
            let mut selected: Option<&Page> = None;
            for page in pages.iter().filter(|page| is_candidate(page, commodity)) {
                if let Some(previous) = selected {
                    debug!(
                        "{} page {} supersedes page {}",
                        commodity.name, page.number, previous.number
                    );
                }
                selected = Some(page);
            }
            match selected {
                Some(page) => debug!("Selected page {} for {}", page.number, commodity.name),
                None => debug!("No page matches {}", commodity.name),
            }
            selected
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawLine;

    fn page(number: &str, title: &str, body: &[&str]) -> Page {
        Page {
            number: number.to_string(),
            report_number: 646,
            title: title.to_string(),
            lines: body
                .iter()
                .enumerate()
                .map(|(i, text)| RawLine::new(i, *text))
                .collect(),
        }
    }

    #[test]
    fn test_title_match_is_case_insensitive() {
        let wheat = CommoditySpec::wheat();
        let p = page("19", "World  WHEAT Supply and Use", &["2024/25 Proj."]);
        assert_eq!(normalized_title(&p), "world wheat supply and use");
        assert!(is_candidate(&p, &wheat));
    }

    #[test]
    fn test_requires_projection_marker() {
        let wheat = CommoditySpec::wheat();
        let p = page("18", "World Wheat Supply and Use", &["2022/23", "2023/24 Est."]);
        assert!(!is_candidate(&p, &wheat));
    }

    #[test]
    fn test_unrelated_title_is_ignored() {
        let p = page("20", "World Coarse Grain Supply and Use", &["Proj."]);
        let selected = select_pages(
            std::slice::from_ref(&p),
            &[CommoditySpec::wheat(), CommoditySpec::corn()],
        );
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(Option::is_none));
    }

    #[test]
    fn test_last_match_wins() {
        let pages = vec![
            page("19", "World Wheat Supply and Use", &["2024/25 Proj. Feb"]),
            page("23", "World Corn Supply and Use", &["2024/25 Proj."]),
            page("29", "World Wheat Supply and Use", &["2024/25 Proj. Mar"]),
        ];
        let selected = select_pages(&pages, &[CommoditySpec::wheat(), CommoditySpec::corn()]);
        assert_eq!(selected[0].map(|p| p.number.as_str()), Some("29"));
        assert_eq!(selected[1].map(|p| p.number.as_str()), Some("23"));
    }
}
