//! Forecast containers.

use crate::error::{ForecastError, Result};

/// Point predictions for successive steps, with optional interval bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(values: Vec<f64>, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    pub fn point(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }
}

/// One forecast year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub year: i32,
    pub amount: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Forecast values keyed by calendar year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Attach years `last_year + 1 ..` to the steps of `forecast`.
    pub fn from_forecast(last_year: i32, forecast: &Forecast) -> Result<Self> {
        let horizon = forecast.horizon();
        for bounds in [forecast.lower(), forecast.upper()].into_iter().flatten() {
            if bounds.len() != horizon {
                return Err(ForecastError::ComputationError(format!(
                    "interval has {} steps but forecast has {}",
                    bounds.len(),
                    horizon
                )));
            }
        }

        let points = forecast
            .point()
            .iter()
            .enumerate()
            .map(|(h, &amount)| ForecastPoint {
                year: last_year + h as i32 + 1,
                amount,
                lower: forecast.lower().map(|l| l[h]),
                upper: forecast.upper().map(|u| u[h]),
            })
            .collect();
        Ok(Self { points })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn years(&self) -> Vec<i32> {
        self.points.iter().map(|p| p.year).collect()
    }

    pub fn amounts(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.amount).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
