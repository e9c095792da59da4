//! Cell values shared by the workbook and CSV readers, and the row parser
//! that turns a header plus cells into [`RevenueRecord`]s.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::core::{columns, RevenueRecord, Sheet};
use crate::error::{ForecastError, Result};

/// A spreadsheet cell reduced to what the loader cares about.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Empty,
    Number(f64),
    Text(String),
    /// Excel serial date (days since 1899-12-30).
    Date(f64),
}

impl Cell {
    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn raw(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) | Cell::Date(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

const REQUIRED: [&str; 5] = [
    columns::CALENDAR_YEAR,
    columns::MUNICIPAL_CODE,
    columns::ACCOUNT_CODE,
    columns::AMOUNT,
    columns::SNAPSHOT_DATE,
];

/// Parses the data rows of one sheet against its header row.
pub(crate) struct SheetParser {
    name: String,
    header: Vec<String>,
    index: HashMap<String, usize>,
}

impl SheetParser {
    /// Validate the header of sheet `name`.
    pub(crate) fn new(name: &str, header: Vec<String>) -> Result<Self> {
        let header: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();
        let index: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .rev()
            .map(|(i, h)| (h.clone(), i))
            .collect();

        if let Some(column) = REQUIRED.iter().find(|c| !index.contains_key(**c)) {
            return Err(ForecastError::MissingColumn {
                sheet: name.to_string(),
                column: column.to_string(),
            });
        }
        if !index.contains_key(columns::LEVEL_2_CATEGORY)
            && !index.contains_key(columns::ACCOUNT_CODE_NARRATIVE)
        {
            return Err(ForecastError::MissingColumn {
                sheet: name.to_string(),
                column: format!(
                    "{} or {}",
                    columns::LEVEL_2_CATEGORY,
                    columns::ACCOUNT_CODE_NARRATIVE
                ),
            });
        }

        Ok(Self {
            name: name.to_string(),
            header,
            index,
        })
    }

    /// Parse data rows. `first_row` is the 1-based spreadsheet row number of
    /// the first data row, used in error messages.
    pub(crate) fn parse<I>(self, rows: I, first_row: usize) -> Result<Sheet>
    where
        I: IntoIterator<Item = Vec<Cell>>,
    {
        let mut records = Vec::new();
        let mut dropped = 0usize;

        for (offset, cells) in rows.into_iter().enumerate() {
            if cells.iter().all(Cell::is_blank) {
                continue;
            }
            match self.parse_row(&cells, first_row + offset)? {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!(sheet = %self.name, dropped, "skipped rows without a calendar year");
        }
        Ok(Sheet::new(self.name, self.header, records))
    }

    fn cell<'a>(&self, cells: &'a [Cell], column: &str) -> &'a Cell {
        self.index
            .get(column)
            .and_then(|&i| cells.get(i))
            .unwrap_or(&Cell::Empty)
    }

    fn malformed(&self, row: usize, column: &str, cell: &Cell) -> ForecastError {
        ForecastError::MalformedInput {
            sheet: self.name.clone(),
            row,
            column: column.to_string(),
            value: cell.raw(),
        }
    }

    fn parse_row(&self, cells: &[Cell], row: usize) -> Result<Option<RevenueRecord>> {
        let year_cell = self.cell(cells, columns::CALENDAR_YEAR);
        if year_cell.is_blank() {
            return Ok(None);
        }
        let calendar_year =
            parse_year(year_cell).ok_or_else(|| self.malformed(row, columns::CALENDAR_YEAR, year_cell))?;

        let amount_cell = self.cell(cells, columns::AMOUNT);
        let amount = if amount_cell.is_blank() {
            None
        } else {
            Some(
                parse_amount(amount_cell)
                    .ok_or_else(|| self.malformed(row, columns::AMOUNT, amount_cell))?,
            )
        };

        let date_cell = self.cell(cells, columns::SNAPSHOT_DATE);
        let snapshot_date = if date_cell.is_blank() {
            None
        } else {
            Some(
                parse_date(date_cell)
                    .ok_or_else(|| self.malformed(row, columns::SNAPSHOT_DATE, date_cell))?,
            )
        };

        Ok(Some(RevenueRecord {
            calendar_year,
            municipal_code: text(self.cell(cells, columns::MUNICIPAL_CODE)).unwrap_or_default(),
            account_code: text(self.cell(cells, columns::ACCOUNT_CODE)).unwrap_or_default(),
            level_2_category: text(self.cell(cells, columns::LEVEL_2_CATEGORY)),
            account_code_narrative: text(self.cell(cells, columns::ACCOUNT_CODE_NARRATIVE)),
            amount,
            snapshot_date,
        }))
    }
}

fn parse_year(cell: &Cell) -> Option<i32> {
    let value = match cell {
        Cell::Number(v) => *v,
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if value.fract() == 0.0 && value.abs() < i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

fn parse_amount(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(v) => *v,
        Cell::Text(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != '$').collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Number(serial) | Cell::Date(serial) => {
            if !serial.is_finite() || *serial < 0.0 {
                return None;
            }
            excel_epoch()?.checked_add_signed(Duration::days(serial.floor() as i64))
        }
        Cell::Text(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
                .ok()
        }
        Cell::Empty => None,
    }
}

/// Text content of a label or code cell. Integral numbers print without a
/// fractional part so numeric codes survive a round trip through Excel.
fn text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) if s.is_empty() => None,
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(v) | Cell::Date(v) => Some(if v.fract() == 0.0 {
            format!("{}", *v as i64)
        } else {
            v.to_string()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        crate::core::STANDARD_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn row(year: Cell, amount: Cell, date: Cell) -> Vec<Cell> {
        vec![
            year,
            Cell::Text("0350".into()),
            Cell::Number(1001.0),
            Cell::Text("SALES TAX".into()),
            Cell::Text("Sales Tax Receipts".into()),
            amount,
            date,
        ]
    }

    #[test]
    fn parses_mixed_cell_types() {
        let parser = SheetParser::new("2020", header()).unwrap();
        let sheet = parser
            .parse(
                vec![
                    row(Cell::Number(2020.0), Cell::Number(12.5), Cell::Date(44000.0)),
                    row(
                        Cell::Text("2021".into()),
                        Cell::Text("1,250.75".into()),
                        Cell::Text("2021-06-30".into()),
                    ),
                    row(Cell::Number(2022.0), Cell::Empty, Cell::Text("07/01/2022".into())),
                ],
                2,
            )
            .unwrap();

        assert_eq!(sheet.records.len(), 3);
        let first = &sheet.records[0];
        assert_eq!(first.calendar_year, 2020);
        assert_eq!(first.account_code, "1001");
        assert_eq!(first.municipal_code, "0350");
        assert_eq!(first.snapshot_date, NaiveDate::from_ymd_opt(2020, 6, 18));
        assert_eq!(sheet.records[1].amount, Some(1250.75));
        assert_eq!(sheet.records[2].amount, None);
        assert_eq!(sheet.records[2].snapshot_date, NaiveDate::from_ymd_opt(2022, 7, 1));
    }

    #[test]
    fn blank_rows_and_blank_years_are_skipped() {
        let parser = SheetParser::new("s", header()).unwrap();
        let sheet = parser
            .parse(
                vec![
                    vec![Cell::Empty; 7],
                    row(Cell::Empty, Cell::Number(1.0), Cell::Empty),
                    row(Cell::Number(2019.0), Cell::Number(1.0), Cell::Empty),
                ],
                2,
            )
            .unwrap();
        assert_eq!(sheet.records.len(), 1);
    }

    #[test]
    fn malformed_year_reports_row_and_column() {
        let parser = SheetParser::new("2018", header()).unwrap();
        let err = parser
            .parse(
                vec![
                    row(Cell::Number(2018.0), Cell::Number(1.0), Cell::Empty),
                    row(Cell::Text("FY18".into()), Cell::Number(1.0), Cell::Empty),
                ],
                2,
            )
            .unwrap_err();
        assert_eq!(
            err,
            ForecastError::MalformedInput {
                sheet: "2018".into(),
                row: 3,
                column: columns::CALENDAR_YEAR.into(),
                value: "FY18".into(),
            }
        );
    }

    #[test]
    fn malformed_amount_is_rejected() {
        let parser = SheetParser::new("s", header()).unwrap();
        let err = parser
            .parse(vec![row(Cell::Number(2018.0), Cell::Text("n/a".into()), Cell::Empty)], 2)
            .unwrap_err();
        assert!(matches!(err, ForecastError::MalformedInput { column, .. } if column == "AMOUNT"));
    }

    #[test]
    fn missing_columns_are_named() {
        let mut cols = header();
        cols.retain(|c| c != columns::AMOUNT);
        let err = SheetParser::new("2017", cols).err().unwrap();
        assert_eq!(
            err,
            ForecastError::MissingColumn {
                sheet: "2017".into(),
                column: "AMOUNT".into(),
            }
        );

        let mut cols = header();
        cols.retain(|c| c != columns::LEVEL_2_CATEGORY && c != columns::ACCOUNT_CODE_NARRATIVE);
        assert!(matches!(
            SheetParser::new("2017", cols),
            Err(ForecastError::MissingColumn { .. })
        ));
    }

    #[test]
    fn one_label_column_is_enough() {
        let mut cols = header();
        cols.retain(|c| c != columns::LEVEL_2_CATEGORY);
        assert!(SheetParser::new("2017", cols).is_ok());
    }
}
