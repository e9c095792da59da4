//! Category selection by exact label match.

use serde::{Deserialize, Serialize};

use crate::core::{LabelColumn, RevenueRecord, RevenueTable};
use crate::error::{ForecastError, Result};

/// Accepts records whose label column equals one of the accepted variants.
///
/// Matching is exact and case-sensitive; every casing that appears in the
/// source data has to be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub column: LabelColumn,
    pub labels: Vec<String>,
}

impl CategoryFilter {
    pub fn new<I, S>(column: LabelColumn, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column,
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, record: &RevenueRecord) -> bool {
        self.column
            .value(record)
            .is_some_and(|label| self.labels.iter().any(|l| l == label))
    }

    /// Check that at least one sheet of `table` carries the label column.
    pub fn validate(&self, table: &RevenueTable) -> Result<()> {
        if table.has_column(self.column.header()) {
            return Ok(());
        }
        let sheets: Vec<&str> = table.sheets().iter().map(|s| s.name.as_str()).collect();
        Err(ForecastError::MissingColumn {
            sheet: sheets.join(", "),
            column: self.column.header().to_string(),
        })
    }
}
