//! Workbook reading with calamine and consolidated output with
//! simple_excel_writer.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use simple_excel_writer::{Row, Workbook};

use super::cell::{Cell, SheetParser};
use super::{record_fields, CONSOLIDATED_SHEET};
use crate::core::{RevenueTable, STANDARD_COLUMNS};
use crate::error::{ForecastError, Result};

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => Cell::Date(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(format!("{:?}", e)),
        }
    }
}

/// Read every sheet of an Excel or OpenDocument workbook.
pub(crate) fn read_excel(path: &Path) -> Result<RevenueTable> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        ForecastError::Io(format!("could not open workbook {}: {}", path.display(), e))
    })?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ForecastError::Io(format!("could not read sheet '{}': {}", name, e)))?;

        let mut rows = range.rows();
        let header: Vec<String> = match rows.next() {
            Some(cells) => cells.iter().map(|c| c.to_string()).collect(),
            None => {
                tracing::debug!(sheet = %name, "skipping empty sheet");
                continue;
            }
        };

        let parser = SheetParser::new(&name, header)?;
        let data_rows = rows.map(|cells| cells.iter().map(Cell::from).collect::<Vec<_>>());
        let sheet = parser.parse(data_rows, range.start().map_or(1, |(r, _)| r as usize + 1) + 1)?;
        tracing::debug!(sheet = %sheet.name, records = sheet.records.len(), "read sheet");
        sheets.push(sheet);
    }

    Ok(RevenueTable::new(sheets))
}

/// Write all records into a single `Combined` sheet.
pub(crate) fn write_excel(table: &RevenueTable, path: &Path) -> Result<()> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ForecastError::Io(format!("path {} is not valid UTF-8", path.display())))?;

    let mut workbook = Workbook::create(path_str);
    let mut sheet = workbook.create_sheet(CONSOLIDATED_SHEET);

    workbook
        .write_sheet(&mut sheet, |writer| {
            let mut header = Row::new();
            for column in STANDARD_COLUMNS {
                header.add_cell(column);
            }
            writer.append_row(header)?;

            for record in table.concatenated() {
                let mut row = Row::new();
                row.add_cell(record.calendar_year as f64);
                for (i, field) in record_fields(record).into_iter().enumerate().skip(1) {
                    // AMOUNT stays numeric so the output is a valid input again.
                    match (i, record.amount) {
                        (5, Some(amount)) => row.add_cell(amount),
                        _ => row.add_cell(field),
                    }
                }
                writer.append_row(row)?;
            }
            Ok(())
        })
        .map_err(|e| ForecastError::Io(format!("could not write {}: {}", path.display(), e)))?;

    workbook
        .close()
        .map_err(|e| ForecastError::Io(format!("could not save {}: {}", path.display(), e)))?;
    Ok(())
}
