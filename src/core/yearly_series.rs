//! Yearly aggregated revenue series.

use crate::error::{ForecastError, Result};

/// Amounts indexed by calendar year, years strictly increasing.
///
/// Gaps between years are allowed; [`YearlySeries::gaps`] lists them so the
/// caller can decide whether a gappy series is acceptable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearlySeries {
    years: Vec<i32>,
    values: Vec<f64>,
}

impl YearlySeries {
    /// Create a series from parallel year and amount vectors.
    ///
    /// # Errors
    /// `InvalidParameter` if the lengths differ, years are not strictly
    /// increasing, or an amount is not finite.
    pub fn new(years: Vec<i32>, values: Vec<f64>) -> Result<Self> {
        if years.len() != values.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "{} years but {} amounts",
                years.len(),
                values.len()
            )));
        }
        if let Some(w) = years.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ForecastError::InvalidParameter(format!(
                "years must be strictly increasing ({} followed by {})",
                w[0], w[1]
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "amount for year {} is not finite",
                years[i]
            )));
        }
        Ok(Self { years, values })
    }

    /// Create a series from `(year, amount)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i32, f64)>,
    {
        let (years, values) = pairs.into_iter().unzip();
        Self::new(years, values)
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    /// Amount for `year`, if present.
    pub fn get(&self, year: i32) -> Option<f64> {
        self.years
            .binary_search(&year)
            .ok()
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.years.iter().copied().zip(self.values.iter().copied())
    }

    /// Years missing between the first and last observed year.
    pub fn gaps(&self) -> Vec<i32> {
        self.years
            .windows(2)
            .flat_map(|w| (w[0] + 1)..w[1])
            .collect()
    }

    /// The `horizon` years following the last observed year.
    pub fn future_years(&self, horizon: usize) -> Vec<i32> {
        match self.last_year() {
            Some(last) => (1..=horizon as i32).map(|h| last + h).collect(),
            None => Vec::new(),
        }
    }
}
