//! Automatic ARIMA order selection.
//!
//! The differencing order comes from repeated KPSS tests; (p, q) and the
//! constant are chosen by the Hyndman-Khandakar stepwise search minimizing
//! AIC (or by an exhaustive grid when stepwise search is disabled).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::{Forecast, YearlySeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::model::ARIMA;
use crate::models::arima::order::ModelOrder;
use crate::models::Forecaster;
use crate::validation::ndiffs;

/// Configuration for AutoARIMA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoARIMAConfig {
    /// Maximum AR order to consider.
    pub max_p: usize,
    /// Maximum MA order to consider.
    pub max_q: usize,
    /// Maximum `p + q`.
    pub max_order: usize,
    /// Maximum differencing order.
    pub max_d: usize,
    /// Use stepwise search (faster) vs exhaustive.
    pub stepwise: bool,
    /// Significance level of the KPSS tests choosing `d`.
    pub alpha: f64,
    /// Maximum number of moves of the stepwise search.
    pub max_steps: usize,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_order: 5,
            max_d: 2,
            stepwise: true,
            alpha: 0.05,
            max_steps: 100,
        }
    }
}

impl AutoARIMAConfig {
    /// Set maximum orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Use exhaustive search instead of stepwise.
    pub fn exhaustive(mut self) -> Self {
        self.stepwise = false;
        self
    }
}

/// One model evaluated by the search.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub order: ModelOrder,
    pub with_intercept: bool,
    /// AIC of the fitted model, or why the fit failed.
    pub aic: std::result::Result<f64, ForecastError>,
}

impl Candidate {
    /// AIC, with failed fits ranked last.
    pub fn score(&self) -> f64 {
        match &self.aic {
            Ok(aic) if aic.is_finite() => *aic,
            _ => f64::INFINITY,
        }
    }
}

/// Automatic ARIMA model selection.
///
/// # Example
/// ```
/// use revenue_forecast::models::arima::AutoARIMA;
///
/// let values: Vec<f64> = (0..24)
///     .map(|i| 500.0 + 12.0 * i as f64 + 9.0 * (i as f64 * 2.1).sin())
///     .collect();
/// let mut auto = AutoARIMA::new();
/// auto.fit_values(&values).unwrap();
///
/// let order = auto.selected_order().unwrap();
/// assert!(order.p + order.q <= 5);
/// assert!(!auto.trace().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
    selected: Option<ARIMA>,
    trace: Vec<Candidate>,
}

impl AutoARIMA {
    /// Create a new AutoARIMA with default configuration.
    pub fn new() -> Self {
        Self::with_config(AutoARIMAConfig::default())
    }

    /// Create AutoARIMA with custom configuration.
    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            selected: None,
            trace: Vec::new(),
        }
    }

    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }

    /// Get the selected order.
    pub fn selected_order(&self) -> Option<ModelOrder> {
        self.selected.as_ref().map(|m| m.order())
    }

    /// The fitted model at the selected order.
    pub fn selected_model(&self) -> Option<&ARIMA> {
        self.selected.as_ref()
    }

    /// Every evaluated candidate, best score first.
    pub fn trace(&self) -> &[Candidate] {
        &self.trace
    }

    /// Run the search over raw values (oldest first).
    pub fn fit_values(&mut self, values: &[f64]) -> Result<()> {
        self.selected = None;
        self.trace.clear();

        let d = ndiffs(values, self.config.alpha, self.config.max_d)?;
        let allow_intercept = d < 2;
        // Orders beyond a third of the sample cannot be estimated sensibly.
        let max_p = self.config.max_p.min(values.len() / 3);
        let max_q = self.config.max_q.min(values.len() / 3);
        tracing::debug!(d, max_p, max_q, "starting automatic order search");

        let mut search = Search {
            values,
            d,
            max_p,
            max_q,
            max_order: self.config.max_order,
            tried: HashSet::new(),
            trace: Vec::new(),
            best: None,
        };

        if self.config.stepwise {
            search.stepwise(allow_intercept, self.config.max_steps);
        } else {
            search.exhaustive(allow_intercept);
        }

        let Search {
            mut trace, best, ..
        } = search;
        trace.sort_by(|a, b| {
            a.score()
                .partial_cmp(&b.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.trace = trace;

        let (model, aic) = best.ok_or_else(|| {
            ForecastError::ModelFit(format!(
                "no candidate model could be fitted ({} tried)",
                self.trace.len()
            ))
        })?;
        tracing::info!(
            order = %model.order(),
            intercept = model.has_intercept(),
            aic,
            candidates = self.trace.len(),
            "automatic order search finished"
        );
        self.selected = Some(model);
        Ok(())
    }
}

impl Default for AutoARIMA {
    fn default() -> Self {
        Self::new()
    }
}

/// Bookkeeping of one search run.
struct Search<'a> {
    values: &'a [f64],
    d: usize,
    max_p: usize,
    max_q: usize,
    max_order: usize,
    tried: HashSet<(usize, usize, bool)>,
    trace: Vec<Candidate>,
    best: Option<(ARIMA, f64)>,
}

impl Search<'_> {
    fn admissible(&self, p: usize, q: usize) -> bool {
        p <= self.max_p && q <= self.max_q && p + q <= self.max_order
    }

    /// Fit a candidate unless already tried. Returns true when it became
    /// the new best.
    fn try_candidate(&mut self, p: usize, q: usize, with_intercept: bool) -> bool {
        if !self.admissible(p, q) || !self.tried.insert((p, q, with_intercept)) {
            return false;
        }

        let order = ModelOrder::new(p, self.d, q);
        let mut model = ARIMA::from_order(order).with_intercept(with_intercept);
        let outcome = model.fit_values(self.values).and_then(|()| {
            model
                .aic()
                .filter(|aic| aic.is_finite())
                .ok_or_else(|| ForecastError::ModelFit("AIC is not finite".into()))
        });

        let improved = match &outcome {
            Ok(aic) => {
                tracing::debug!(order = %order, intercept = with_intercept, aic, "candidate fitted");
                let better = self.best.as_ref().map_or(true, |(_, best)| *aic < *best);
                if better {
                    self.best = Some((model, *aic));
                }
                better
            }
            Err(err) => {
                tracing::debug!(order = %order, intercept = with_intercept, error = %err, "candidate failed");
                false
            }
        };

        self.trace.push(Candidate {
            order,
            with_intercept,
            aic: outcome,
        });
        improved
    }

    fn stepwise(&mut self, allow_intercept: bool, max_steps: usize) {
        let p0 = self.max_p.min(2);
        let q0 = self.max_q.min(2);
        self.try_candidate(p0, q0, allow_intercept);
        self.try_candidate(0, 0, allow_intercept);
        self.try_candidate(1.min(self.max_p), 0, allow_intercept);
        self.try_candidate(0, 1.min(self.max_q), allow_intercept);
        if allow_intercept {
            self.try_candidate(0, 0, false);
        }

        let mut steps = 0;
        while steps < max_steps {
            let (p, q, intercept) = match &self.best {
                Some((model, _)) => (model.order().p, model.order().q, model.has_intercept()),
                None => return,
            };

            let mut neighbours: Vec<(usize, usize, bool)> = Vec::with_capacity(9);
            let moves: [(isize, isize); 8] = [
                (-1, 0),
                (1, 0),
                (0, -1),
                (0, 1),
                (-1, -1),
                (-1, 1),
                (1, -1),
                (1, 1),
            ];
            for (dp, dq) in moves {
                let np = p as isize + dp;
                let nq = q as isize + dq;
                if np >= 0 && nq >= 0 {
                    neighbours.push((np as usize, nq as usize, intercept));
                }
            }
            if allow_intercept {
                neighbours.push((p, q, !intercept));
            }

            let moved = neighbours
                .into_iter()
                .any(|(np, nq, c)| self.try_candidate(np, nq, c));
            if !moved {
                break;
            }
            steps += 1;
        }
        if steps >= max_steps {
            tracing::warn!(max_steps, "stepwise search stopped at the step limit");
        }
    }

    fn exhaustive(&mut self, allow_intercept: bool) {
        for p in 0..=self.max_p {
            for q in 0..=self.max_q {
                self.try_candidate(p, q, allow_intercept);
                if allow_intercept {
                    self.try_candidate(p, q, false);
                }
            }
        }
    }
}

impl Forecaster for AutoARIMA {
    fn fit(&mut self, series: &YearlySeries) -> Result<()> {
        self.fit_values(series.values())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected.as_ref().and_then(|m| m.fitted_values())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected.as_ref().and_then(|m| m.residuals())
    }

    fn name(&self) -> &str {
        "AutoARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fixtures::{random_walk, white_noise};

    #[test]
    fn selects_no_differencing_for_noise() {
        let values: Vec<f64> = white_noise(60, 7).iter().map(|v| 10.0 + v).collect();
        let mut auto = AutoARIMA::new();
        auto.fit_values(&values).unwrap();

        let order = auto.selected_order().unwrap();
        assert_eq!(order.d, 0);
        assert!(auto.selected_model().unwrap().has_intercept());
    }

    #[test]
    fn differences_a_trend() {
        let values: Vec<f64> = (0..40)
            .map(|i| 100.0 + 5.0 * i as f64 + 3.0 * (i as f64 * 2.3).sin())
            .collect();
        let mut auto = AutoARIMA::new();
        auto.fit_values(&values).unwrap();
        assert!(auto.selected_order().unwrap().d >= 1);
    }

    #[test]
    fn trace_is_sorted_and_respects_limits() {
        let values = random_walk(50, 3);
        let mut auto = AutoARIMA::new();
        auto.fit_values(&values).unwrap();

        let trace = auto.trace();
        assert!(trace.len() >= 4);
        for pair in trace.windows(2) {
            assert!(pair[0].score() <= pair[1].score());
        }
        for candidate in trace {
            assert!(candidate.order.p + candidate.order.q <= 5);
            assert!(candidate.order.p <= 5 && candidate.order.q <= 5);
        }

        let best = &trace[0];
        assert_eq!(Some(best.order), auto.selected_order());
        let model = auto.selected_model().unwrap();
        assert_eq!(best.aic, Ok(model.aic().unwrap()));
    }

    #[test]
    fn candidates_are_never_refitted() {
        let values = random_walk(50, 3);
        let mut auto = AutoARIMA::new();
        auto.fit_values(&values).unwrap();

        let mut seen = HashSet::new();
        for c in auto.trace() {
            assert!(seen.insert((c.order.p, c.order.q, c.with_intercept)));
        }
    }

    #[test]
    fn short_series_limits_orders() {
        let values = random_walk(9, 5);
        let mut auto = AutoARIMA::new();
        auto.fit_values(&values).unwrap();
        for c in auto.trace() {
            assert!(c.order.p <= 3 && c.order.q <= 3);
        }
    }

    #[test]
    fn exhaustive_grid_covers_all_small_orders() {
        let values: Vec<f64> = white_noise(40, 2).iter().map(|v| 3.0 + v).collect();
        let config = AutoARIMAConfig::default()
            .with_max_orders(1, 2, 1)
            .exhaustive();
        let mut auto = AutoARIMA::with_config(config);
        auto.fit_values(&values).unwrap();
        // d = 0 allows the constant, so 4 orders x 2 constant settings.
        assert_eq!(auto.trace().len(), 8);
    }

    #[test]
    fn predict_requires_fit() {
        let auto = AutoARIMA::new();
        assert!(matches!(auto.predict(2), Err(ForecastError::FitRequired)));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: AutoARIMAConfig = toml::from_str("max_p = 3\nstepwise = false").unwrap();
        assert_eq!(config.max_p, 3);
        assert_eq!(config.max_q, 5);
        assert!(!config.stepwise);
        assert!(toml::from_str::<AutoARIMAConfig>("max_r = 1").is_err());
    }
}
