//! Raw revenue rows as they come out of the workbook.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column headers of the revenue workbook.
pub mod columns {
    pub const CALENDAR_YEAR: &str = "CALENDAR_YEAR";
    pub const MUNICIPAL_CODE: &str = "MUNICIPAL_CODE";
    pub const ACCOUNT_CODE: &str = "ACCOUNT_CODE";
    pub const LEVEL_2_CATEGORY: &str = "LEVEL_2_CATEGORY";
    pub const ACCOUNT_CODE_NARRATIVE: &str = "ACCOUNT_CODE_NARRATIVE";
    pub const AMOUNT: &str = "AMOUNT";
    pub const SNAPSHOT_DATE: &str = "SNAPSHOT_DATE";
}

/// Column order used when writing a consolidated workbook.
pub const STANDARD_COLUMNS: [&str; 7] = [
    columns::CALENDAR_YEAR,
    columns::MUNICIPAL_CODE,
    columns::ACCOUNT_CODE,
    columns::LEVEL_2_CATEGORY,
    columns::ACCOUNT_CODE_NARRATIVE,
    columns::AMOUNT,
    columns::SNAPSHOT_DATE,
];

/// The label column a category filter matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelColumn {
    #[serde(rename = "LEVEL_2_CATEGORY")]
    Level2Category,
    #[serde(rename = "ACCOUNT_CODE_NARRATIVE")]
    AccountCodeNarrative,
}

impl LabelColumn {
    /// Header name of the column in the workbook.
    pub fn header(&self) -> &'static str {
        match self {
            LabelColumn::Level2Category => columns::LEVEL_2_CATEGORY,
            LabelColumn::AccountCodeNarrative => columns::ACCOUNT_CODE_NARRATIVE,
        }
    }

    /// Label of `record` in this column, if the cell was present.
    pub fn value<'a>(&self, record: &'a RevenueRecord) -> Option<&'a str> {
        match self {
            LabelColumn::Level2Category => record.level_2_category.as_deref(),
            LabelColumn::AccountCodeNarrative => record.account_code_narrative.as_deref(),
        }
    }
}

impl fmt::Display for LabelColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One row of the revenue workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueRecord {
    pub calendar_year: i32,
    pub municipal_code: String,
    pub account_code: String,
    pub level_2_category: Option<String>,
    pub account_code_narrative: Option<String>,
    /// Blank amounts are kept as `None` and contribute nothing to sums.
    pub amount: Option<f64>,
    pub snapshot_date: Option<NaiveDate>,
}

impl RevenueRecord {
    /// Minimal record, mostly useful for building fixtures.
    pub fn new(calendar_year: i32, amount: f64) -> Self {
        Self {
            calendar_year,
            municipal_code: String::new(),
            account_code: String::new(),
            level_2_category: None,
            account_code_narrative: None,
            amount: Some(amount),
            snapshot_date: None,
        }
    }

    pub fn with_level_2_category(mut self, label: impl Into<String>) -> Self {
        self.level_2_category = Some(label.into());
        self
    }

    pub fn with_narrative(mut self, label: impl Into<String>) -> Self {
        self.account_code_narrative = Some(label.into());
        self
    }
}

/// A named sheet of the workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    /// Headers exactly as they appeared in the first row.
    pub columns: Vec<String>,
    pub records: Vec<RevenueRecord>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>, records: Vec<RevenueRecord>) -> Self {
        Self {
            name: name.into(),
            columns,
            records,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// All sheets of a workbook, in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevenueTable {
    sheets: Vec<Sheet>,
}

impl RevenueTable {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Every record of every sheet, sheets concatenated in order.
    pub fn concatenated(&self) -> impl Iterator<Item = &RevenueRecord> + '_ {
        self.sheets.iter().flat_map(|s| s.records.iter())
    }

    /// True if at least one sheet carries `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.sheets.iter().any(|s| s.has_column(column))
    }

    /// Total number of records across sheets.
    pub fn len(&self) -> usize {
        self.sheets.iter().map(|s| s.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
