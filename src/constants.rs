//! Application constants for the WASDE parser
//!
//! Literals of the WASDE report layout and the default values used by
//! `WasdeConfig`.

// =============================================================================
// Report Layout
// =============================================================================

/// Tag that opens every page header line, e.g. `WASDE - 646 - 19`
pub const REPORT_TAG: &str = "WASDE";

/// Substring marking a page that carries current-period projections
pub const PROJECTION_MARKER: &str = "Proj.";

/// Annotations stripped from season strings and row labels
pub const PROJECTION_ANNOTATIONS: &[&str] = &["(Projected)", "Proj."];

/// Editorial grouping line that never carries data
pub const EDITORIAL_MARKER: &str = "Selected Other";

/// First character of the horizontal rules framing a table
pub const RULE_CHAR: char = '=';

/// Rule lines seen before the season line
pub const PREAMBLE_RULES: usize = 2;

/// Not-available token used by the reports
pub const MISSING_VALUE: &str = "NA";

// =============================================================================
// Spreadsheet Layout
// =============================================================================

/// Fraction of non-empty cells that marks the header row
pub const HEADER_ROW_DENSITY: f64 = 0.5;

/// First word of the label column's anchor cell
pub const LABEL_COLUMN_ANCHOR: &str = "World";

/// Data columns start this many columns right of the label column
pub const DATA_COLUMN_OFFSET: usize = 2;

/// A row label's values sit this many rows below the label cell
pub const VALUE_ROW_OFFSET: usize = 1;

// =============================================================================
// Commodities
// =============================================================================

/// Column schema of the world supply-and-use text tables, left to right
pub const SUPPLY_AND_USE_CATEGORIES: &[&str] = &[
    "Beginning Stocks",
    "Production",
    "Imports",
    "Domestic Feed",
    "Domestic Total",
    "Exports",
    "Ending Stocks",
];

/// Regions written for wheat
pub const WHEAT_REGIONS: &[&str] = &["World", "United States", "Russia"];

/// Regions written for corn
pub const CORN_REGIONS: &[&str] = &["World", "United States"];

// =============================================================================
// Processing Defaults
// =============================================================================

/// Default glob pattern for report discovery
pub const DEFAULT_FILE_PATTERN: &str = "*";

/// Output date format, e.g. `03/08/2024`
pub const OUTPUT_DATE_FORMAT: &str = "%m/%d/%Y";

/// File stem of the single workbook written in xlsx mode
pub const WORKBOOK_FILE_STEM: &str = "wasde";

/// Fixed leading columns of every output table
pub const OUTPUT_LEADING_COLUMNS: [&str; 5] = ["Date", "Season", "Report", "Crop", "Category"];
