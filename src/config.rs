//! Configuration management and validation.
//!
//! Provides the commodity definitions the parsers look for, the policy
//! applied to misaligned rows, and the batch/output settings.

use crate::constants::{
    CORN_REGIONS, DEFAULT_FILE_PATTERN, SUPPLY_AND_USE_CATEGORIES, WHEAT_REGIONS,
};
use crate::error::{Result, WasdeError};
use serde::{Deserialize, Serialize};

/// A commodity whose supply-and-use table is extracted from each report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommoditySpec {
    /// Name written to the `Crop` column, e.g. "Wheat"
    pub name: String,

    /// Page title identifying the table, compared case-insensitively
    pub title: String,

    /// Ordered column schema of the text table
    pub categories: Vec<String>,

    /// Regions written to the output, in output order
    pub regions: Vec<String>,

    /// Worksheet holding the same table in spreadsheet releases
    pub sheet: Option<String>,
}

impl CommoditySpec {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            categories: SUPPLY_AND_USE_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            regions: Vec::new(),
            sheet: None,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// World wheat supply and use, page 19 of the report
    pub fn wheat() -> Self {
        Self::new("Wheat", "world wheat supply and use")
            .with_regions(WHEAT_REGIONS.iter().copied())
            .with_sheet("Page 19")
    }

    /// World corn supply and use, page 23 of the report
    pub fn corn() -> Self {
        Self::new("Corn", "world corn supply and use")
            .with_regions(CORN_REGIONS.iter().copied())
            .with_sheet("Page 23")
    }
}

/// What to do with a row holding fewer values than the category schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MismatchPolicy {
    /// Reject the commodity's table for that file
    #[default]
    Reject,
    /// Pad the missing trailing values with `NA`
    PadMissing,
}

/// Output file format for the assembled dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum OutputFormat {
    /// One CSV file per commodity
    #[default]
    Csv,
    /// One Parquet file per commodity (Snappy)
    Parquet,
    /// A single workbook with one worksheet per commodity
    Xlsx,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
            OutputFormat::Xlsx => "xlsx",
        }
    }

    /// Whether every commodity shares one output file
    pub fn is_workbook(&self) -> bool {
        matches!(self, OutputFormat::Xlsx)
    }
}

/// Main configuration for report processing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasdeConfig {
    /// Commodities extracted from every report
    pub commodities: Vec<CommoditySpec>,

    /// Handling of rows shorter than the category schema
    pub mismatch_policy: MismatchPolicy,

    /// Glob pattern matched inside the input directory
    pub file_pattern: String,

    /// Maximum concurrent file parses
    pub max_concurrent_files: usize,

    /// Format of the written dataset
    pub output_format: OutputFormat,
}

impl Default for WasdeConfig {
    fn default() -> Self {
        Self {
            commodities: vec![CommoditySpec::wheat(), CommoditySpec::corn()],
            mismatch_policy: MismatchPolicy::default(),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            max_concurrent_files: num_cpus::get().max(1),
            output_format: OutputFormat::default(),
        }
    }
}

impl WasdeConfig {
    /// Replace the commodity list
    pub fn with_commodities(mut self, commodities: Vec<CommoditySpec>) -> Self {
        self.commodities = commodities;
        self
    }

    /// Set the mismatch policy
    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }

    /// Set the discovery glob pattern
    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = pattern.into();
        self
    }

    /// Set maximum concurrent files
    pub fn with_max_concurrent_files(mut self, max_files: usize) -> Self {
        self.max_concurrent_files = max_files;
        self
    }

    /// Set the output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Look up a commodity by name (case-insensitive)
    pub fn commodity(&self, name: &str) -> Option<&CommoditySpec> {
        self.commodities
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Reject configurations the parsers cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.commodities.is_empty() {
            return Err(WasdeError::Configuration {
                message: "at least one commodity must be configured".to_string(),
            });
        }
        if self.max_concurrent_files == 0 {
            return Err(WasdeError::Configuration {
                message: "max_concurrent_files must be greater than zero".to_string(),
            });
        }
        for commodity in &self.commodities {
            if commodity.categories.is_empty() {
                return Err(WasdeError::Configuration {
                    message: format!("commodity {} has an empty category schema", commodity.name),
                });
            }
            let duplicate = self
                .commodities
                .iter()
                .filter(|other| other.name.eq_ignore_ascii_case(&commodity.name))
                .count()
                > 1;
            if duplicate {
                return Err(WasdeError::Configuration {
                    message: format!("commodity {} is configured twice", commodity.name),
                });
            }
        }
        glob::Pattern::new(&self.file_pattern).map_err(|e| WasdeError::Configuration {
            message: format!("invalid file pattern '{}': {}", self.file_pattern, e),
        })?;
        Ok(())
    }
}
