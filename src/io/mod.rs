//! Loading revenue workbooks and writing the consolidated table.
//!
//! The input format is chosen by file extension: `xlsx`, `xlsm`, `xlsb`,
//! `xls` and `ods` go through calamine, `csv` is read as a single sheet.

mod cell;
mod csv_file;
mod excel;

use std::path::Path;

use crate::core::{RevenueRecord, RevenueTable};
use crate::error::{ForecastError, Result};

/// Name of the single sheet in a consolidated workbook.
pub const CONSOLIDATED_SHEET: &str = "Combined";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Excel,
    Csv,
}

fn format_of(path: &Path) -> Result<Format> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Format::Excel),
        "csv" => Ok(Format::Csv),
        _ => Err(ForecastError::Io(format!(
            "unsupported spreadsheet format for {}",
            path.display()
        ))),
    }
}

/// Read every sheet of the workbook at `path` into a [`RevenueTable`].
///
/// # Errors
/// * `Io` if the file cannot be opened or has an unknown extension
/// * `MissingColumn` if a sheet lacks a required column
/// * `MalformedInput` if a year, amount or date cell cannot be parsed
pub fn read_workbook(path: impl AsRef<Path>) -> Result<RevenueTable> {
    let path = path.as_ref();
    let table = match format_of(path)? {
        Format::Excel => excel::read_excel(path)?,
        Format::Csv => csv_file::read_csv(path)?,
    };
    tracing::info!(
        path = %path.display(),
        sheets = table.sheets().len(),
        records = table.len(),
        "loaded workbook"
    );
    Ok(table)
}

/// Write every record of `table` to a single-sheet workbook (or CSV file).
pub fn write_consolidated(table: &RevenueTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match format_of(path)? {
        Format::Excel => {
            let is_xlsx = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| e.eq_ignore_ascii_case("xlsx"));
            if !is_xlsx {
                return Err(ForecastError::Io(format!(
                    "consolidated workbooks are written as .xlsx, got {}",
                    path.display()
                )));
            }
            excel::write_excel(table, path)?
        }
        Format::Csv => csv_file::write_csv(table, path)?,
    }
    tracing::info!(path = %path.display(), records = table.len(), "wrote consolidated table");
    Ok(())
}

/// A record's fields as text, in [`crate::core::STANDARD_COLUMNS`] order.
fn record_fields(record: &RevenueRecord) -> [String; 7] {
    [
        record.calendar_year.to_string(),
        record.municipal_code.clone(),
        record.account_code.clone(),
        record.level_2_category.clone().unwrap_or_default(),
        record.account_code_narrative.clone().unwrap_or_default(),
        record.amount.map(|a| a.to_string()).unwrap_or_default(),
        record
            .snapshot_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    ]
}
