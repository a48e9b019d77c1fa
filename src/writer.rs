//! Dataset accumulation and tabular output.
//!
//! Tables from every parsed report are collected per commodity, then
//! flattened into one polars `DataFrame` per commodity with the layout
//! `Date, Season, Report, Crop, Category, <Region>...`. Frames are written
//! as CSV or Snappy-compressed Parquet files, one per commodity, or as the
//! worksheets of a single xlsx workbook.

use crate::config::{CommoditySpec, OutputFormat};
use crate::constants::{OUTPUT_LEADING_COLUMNS, WORKBOOK_FILE_STEM};
use crate::error::Result;
use crate::models::{FileReport, ParsedTable};
use polars::prelude::{
    AnyValue, Column, CsvWriter, DataFrame, ParquetCompression, ParquetWriter, SerWriter,
};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Parsed tables of a batch, grouped by commodity in arrival order
#[derive(Debug, Default)]
pub struct Dataset {
    tables: HashMap<String, Vec<ParsedTable>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a file's tables; returns how many were added
    pub fn absorb(&mut self, report: FileReport) -> usize {
        let count = report.tables.len();
        for table in report.tables {
            self.tables
                .entry(table.commodity.clone())
                .or_default()
                .push(table);
        }
        count
    }

    pub fn tables(&self, commodity: &str) -> &[ParsedTable] {
        self.tables
            .get(commodity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn table_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table_count() == 0
    }
}

/// Output region columns: the configured list, or every region seen in
/// discovery order when none is configured
pub fn output_regions(commodity: &CommoditySpec, tables: &[ParsedTable]) -> Vec<String> {
    if !commodity.regions.is_empty() {
        return commodity.regions.clone();
    }
    let mut regions: Vec<String> = Vec::new();
    for region in tables.iter().flat_map(|t| &t.regions) {
        if !regions.contains(region) {
            regions.push(region.clone());
        }
    }
    regions
}

/// Flatten a commodity's tables into one frame, oldest report first
pub fn build_frame(commodity: &CommoditySpec, tables: &[ParsedTable]) -> Result<DataFrame> {
    let regions = output_regions(commodity, tables);

    let mut ordered: Vec<&ParsedTable> = tables.iter().collect();
    ordered.sort_by_key(|table| table.report_date);

    let mut dates: Vec<String> = Vec::new();
    let mut seasons: Vec<Option<String>> = Vec::new();
    let mut reports: Vec<Option<i64>> = Vec::new();
    let mut crops: Vec<String> = Vec::new();
    let mut categories: Vec<String> = Vec::new();
    let mut region_values: Vec<Vec<Option<String>>> = vec![Vec::new(); regions.len()];

    for table in ordered {
        let date = table.formatted_date();
        for row in table.wide_rows(&regions) {
            dates.push(date.clone());
            seasons.push(table.season.clone());
            reports.push(table.report_number.map(i64::from));
            crops.push(row.crop.to_string());
            categories.push(row.category.to_string());
            for (column, value) in region_values.iter_mut().zip(row.values) {
                column.push(value.map(str::to_string));
            }
        }
    }

    let [date_col, season_col, report_col, crop_col, category_col] = OUTPUT_LEADING_COLUMNS;
    let mut columns = vec![
        Column::new(date_col.into(), dates),
        Column::new(season_col.into(), seasons),
        Column::new(report_col.into(), reports),
        Column::new(crop_col.into(), crops),
        Column::new(category_col.into(), categories),
    ];
    for (region, values) in regions.iter().zip(region_values) {
        columns.push(Column::new(region.as_str().into(), values));
    }

    Ok(DataFrame::new(columns)?)
}

/// Write a frame to `path` in the requested format
pub fn write_frame(df: &mut DataFrame, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut file = File::create(path)?;
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
        OutputFormat::Parquet => {
            let file = File::create(path)?;
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(df)?;
        }
        OutputFormat::Xlsx => {
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| WORKBOOK_FILE_STEM.to_string());
            write_workbook(&[(name, df.clone())], path)?;
        }
    }
    Ok(())
}

/// Write each named frame as a worksheet of one workbook
pub fn write_workbook(sheets: &[(String, DataFrame)], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for (name, df) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        write_sheet(worksheet, df, &header)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, df: &DataFrame, header: &Format) -> Result<()> {
    for (index, column) in df.get_columns().iter().enumerate() {
        let col = ColNum::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.write_string_with_format(0, col, column.name().as_str(), header)?;

        for row in 0..df.height() {
            let cell_row = RowNum::try_from(row + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
            match column.get(row)? {
                AnyValue::Null => {}
                AnyValue::Int64(number) => {
                    worksheet.write_number(cell_row, col, number as f64)?;
                }
                AnyValue::String(text) => write_text(worksheet, cell_row, col, text)?,
                AnyValue::StringOwned(text) => write_text(worksheet, cell_row, col, &text)?,
                other => {
                    worksheet.write_string(cell_row, col, other.to_string())?;
                }
            }
        }
    }
    Ok(())
}

/// Numeric cells become numbers; `NA` and labels stay text
fn write_text(worksheet: &mut Worksheet, row: RowNum, col: ColNum, text: &str) -> Result<()> {
    match text.parse::<f64>() {
        Ok(number) if number.is_finite() => worksheet.write_number(row, col, number)?,
        _ => worksheet.write_string(row, col, text)?,
    };
    Ok(())
}

/// Write the dataset into `output_dir`; returns the paths written
///
/// CSV and Parquet produce one file per commodity with tables. Xlsx
/// produces one workbook holding a sheet for every configured commodity.
pub fn write_dataset(
    dataset: &Dataset,
    commodities: &[CommoditySpec],
    output_dir: &Path,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    if format.is_workbook() {
        return write_dataset_workbook(dataset, commodities, output_dir);
    }

    let mut written = Vec::new();
    for commodity in commodities {
        let tables = dataset.tables(&commodity.name);
        if tables.is_empty() {
            warn!("No {} tables parsed, nothing to write", commodity.name);
            continue;
        }

        let mut df = build_frame(commodity, tables)?;
        let path = output_dir.join(format!("{}.{}", commodity.name, format.extension()));
        debug!(
            "Writing {} rows x {} columns to {}",
            df.height(),
            df.width(),
            path.display()
        );
        write_frame(&mut df, &path, format)?;
        info!(
            "Wrote {} {} tables to {}",
            tables.len(),
            commodity.name,
            path.display()
        );
        written.push(path);
    }

    Ok(written)
}

fn write_dataset_workbook(
    dataset: &Dataset,
    commodities: &[CommoditySpec],
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if dataset.is_empty() {
        warn!("No tables parsed, workbook not written");
        return Ok(Vec::new());
    }

    let mut sheets = Vec::with_capacity(commodities.len());
    for commodity in commodities {
        let tables = dataset.tables(&commodity.name);
        if tables.is_empty() {
            warn!("No {} tables parsed, its sheet holds headers only", commodity.name);
        }
        sheets.push((commodity.name.clone(), build_frame(commodity, tables)?));
    }

    let path = output_dir.join(format!(
        "{}.{}",
        WORKBOOK_FILE_STEM,
        OutputFormat::Xlsx.extension()
    ));
    debug!("Writing {} sheets to {}", sheets.len(), path.display());
    write_workbook(&sheets, &path)?;
    info!(
        "Wrote {} tables across {} sheets to {}",
        dataset.table_count(),
        sheets.len(),
        path.display()
    );

    Ok(vec![path])
}
