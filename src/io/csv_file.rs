//! Single-sheet CSV input and output.

use std::path::Path;

use csv::{ReaderBuilder, Writer};

use super::cell::{Cell, SheetParser};
use super::record_fields;
use crate::core::{RevenueTable, STANDARD_COLUMNS};
use crate::error::{ForecastError, Result};

fn csv_error(path: &Path, err: csv::Error) -> ForecastError {
    ForecastError::Io(format!("{}: {}", path.display(), err))
}

/// Read a CSV file as one sheet named after the file stem.
pub(crate) fn read_csv(path: &Path) -> Result<RevenueTable> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet1".to_string());

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let parser = SheetParser::new(&name, header)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    let sheet = parser.parse(rows, 2)?;
    Ok(RevenueTable::new(vec![sheet]))
}

/// Write all records as one CSV table with the standard header.
pub(crate) fn write_csv(table: &RevenueTable, path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    writer
        .write_record(STANDARD_COLUMNS)
        .map_err(|e| csv_error(path, e))?;
    for record in table.concatenated() {
        writer
            .write_record(record_fields(record))
            .map_err(|e| csv_error(path, e))?;
    }
    writer.flush()?;
    Ok(())
}
