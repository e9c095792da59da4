//! ARIMA (Autoregressive Integrated Moving Average) model.
//!
//! The series is differenced `d` times and the ARMA(p, q) part, with an
//! optional mean, is estimated by exact Gaussian maximum likelihood. The
//! likelihood comes from a Kalman filter started at the stationary state
//! covariance, so no observations are lost to conditioning.

use crate::core::{Forecast, YearlySeries};
use crate::error::{ForecastError, Result};
use crate::features::pacf;
use crate::models::arima::diff::{difference, integrate, integrated_ar};
use crate::models::arima::kalman::{FilterOutput, StateSpace};
use crate::models::arima::order::ModelOrder;
use crate::models::arima::params::{
    constrain_ar, constrain_ma, is_invertible, is_stationary, partial_to_unconstrained,
    within_bounds,
};
use crate::models::Forecaster;
use crate::utils::linalg::invert;
use crate::utils::optimization::{nelder_mead, numeric_hessian, NelderMeadConfig};
use crate::utils::stats::{is_constant, mean, quantile_normal, std_dev, two_sided_p_value};
use crate::validation::{
    heteroskedasticity, jarque_bera, ljung_box, HeteroskedasticityResult, JarqueBeraResult,
    LjungBoxResult,
};

/// One estimated parameter with its standard error.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientEstimate {
    /// Parameter name (`mean`, `ar.L1`, `ma.L1`, `sigma2`).
    pub name: String,
    pub estimate: f64,
    /// Standard error from the inverse numeric Hessian; NaN when the
    /// Hessian is not invertible at the estimate.
    pub std_error: f64,
}

impl CoefficientEstimate {
    /// z statistic `estimate / std_error`.
    pub fn z_value(&self) -> f64 {
        self.estimate / self.std_error
    }

    /// Two-sided p-value of the z statistic.
    pub fn p_value(&self) -> f64 {
        two_sided_p_value(self.z_value())
    }
}

/// Residual checks reported with the model summary, computed on the
/// standardized innovations.
#[derive(Debug, Clone)]
pub struct ResidualDiagnostics {
    /// Ljung-Box Q at lag 1.
    pub ljung_box: LjungBoxResult,
    pub jarque_bera: JarqueBeraResult,
    pub heteroskedasticity: HeteroskedasticityResult,
}

/// Everything a fitted model reports.
#[derive(Debug, Clone)]
pub struct ModelSummary {
    pub order: ModelOrder,
    pub include_mean: bool,
    /// Observations entering the likelihood (`n - d`).
    pub nobs: usize,
    pub coefficients: Vec<CoefficientEstimate>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub aicc: f64,
    pub diagnostics: ResidualDiagnostics,
}

#[derive(Debug, Clone)]
struct FittedArima {
    original: Vec<f64>,
    mean: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
    /// Standard errors in `parameter_names` order.
    std_errors: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    innovations: Vec<f64>,
    standardized: Vec<f64>,
    next_state: Vec<f64>,
    iterations: usize,
}

/// Position of each parameter group in the optimizer's vector.
#[derive(Debug, Clone, Copy)]
struct Layout {
    mean: bool,
    p: usize,
    q: usize,
}

impl Layout {
    fn len(&self) -> usize {
        usize::from(self.mean) + self.p + self.q
    }

    fn split<'a>(&self, x: &'a [f64]) -> (f64, &'a [f64], &'a [f64]) {
        let offset = usize::from(self.mean);
        let mu = if self.mean { x[0] } else { 0.0 };
        (mu, &x[offset..offset + self.p], &x[offset + self.p..offset + self.p + self.q])
    }

    /// Filter output for unconstrained parameters, `None` if out of bounds.
    fn evaluate(&self, series: &[f64], x: &[f64]) -> Option<FilterOutput> {
        let (mu, ar_u, ma_u) = self.split(x);
        if !mu.is_finite() || !within_bounds(ar_u) || !within_bounds(ma_u) {
            return None;
        }
        let ar = constrain_ar(ar_u);
        let ma = constrain_ma(ma_u);
        let centered: Vec<f64> = series.iter().map(|v| v - mu).collect();
        StateSpace::new(&ar, &ma).filter(&centered)
    }
}

/// ARIMA forecasting model.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing for stationarity
/// - MA(q): Moving average component
///
/// # Example
/// ```
/// use revenue_forecast::models::arima::ARIMA;
/// use revenue_forecast::models::Forecaster;
///
/// let values: Vec<f64> = (0..30)
///     .map(|i| 100.0 + 3.0 * i as f64 + 4.0 * (i as f64 * 1.7).sin())
///     .collect();
/// let mut model = ARIMA::new(1, 1, 0).with_intercept(true);
/// model.fit_values(&values).unwrap();
///
/// let forecast = model.predict_with_intervals(2, 0.95).unwrap();
/// assert_eq!(forecast.horizon(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ARIMA {
    order: ModelOrder,
    include_mean: bool,
    fitted: Option<FittedArima>,
}

impl ARIMA {
    /// Create a new ARIMA model. A mean is estimated only when `d == 0`.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_order(ModelOrder::new(p, d, q))
    }

    pub fn from_order(order: ModelOrder) -> Self {
        Self {
            order,
            include_mean: order.d == 0,
            fitted: None,
        }
    }

    /// Estimate a mean for the differenced series (a drift when `d == 1`).
    pub fn with_intercept(mut self, include: bool) -> Self {
        self.include_mean = include;
        self.fitted = None;
        self
    }

    pub fn order(&self) -> ModelOrder {
        self.order
    }

    pub fn has_intercept(&self) -> bool {
        self.include_mean
    }

    /// Smallest series length the model accepts.
    pub fn min_observations(&self) -> usize {
        self.order.d + self.order.p + self.order.q + usize::from(self.include_mean) + 3
    }

    /// Number of estimated parameters, `sigma^2` included.
    pub fn num_params(&self) -> usize {
        self.order.p + self.order.q + usize::from(self.include_mean) + 1
    }

    /// Observations entering the likelihood.
    pub fn nobs(&self) -> Option<usize> {
        self.fitted
            .as_ref()
            .map(|f| f.original.len() - self.order.d)
    }

    /// AR coefficients (empty before fitting).
    pub fn ar_coefficients(&self) -> &[f64] {
        self.fitted.as_ref().map(|f| f.ar.as_slice()).unwrap_or(&[])
    }

    /// MA coefficients (empty before fitting).
    pub fn ma_coefficients(&self) -> &[f64] {
        self.fitted.as_ref().map(|f| f.ma.as_slice()).unwrap_or(&[])
    }

    /// Mean of the differenced series (zero when not estimated).
    pub fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.mean)
    }

    /// Innovation variance.
    pub fn sigma2(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.sigma2)
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.log_likelihood)
    }

    /// Optimizer iterations used by the last fit.
    pub fn iterations(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.iterations)
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        let ll = self.log_likelihood()?;
        Some(-2.0 * ll + 2.0 * self.num_params() as f64)
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        let ll = self.log_likelihood()?;
        let nobs = self.nobs()? as f64;
        Some(-2.0 * ll + self.num_params() as f64 * nobs.ln())
    }

    /// Small-sample corrected AIC; infinite when `nobs <= k + 1`.
    pub fn aicc(&self) -> Option<f64> {
        let aic = self.aic()?;
        let nobs = self.nobs()? as f64;
        let k = self.num_params() as f64;
        let denom = nobs - k - 1.0;
        Some(if denom > 0.0 {
            aic + 2.0 * k * (k + 1.0) / denom
        } else {
            f64::INFINITY
        })
    }

    /// One-step innovations on the differenced scale (length `n - d`).
    pub fn innovations(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.innovations.as_slice())
    }

    /// Innovations scaled to unit variance.
    pub fn standardized_residuals(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.standardized.as_slice())
    }

    fn parameter_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.num_params());
        if self.include_mean {
            names.push("mean".to_string());
        }
        names.extend((1..=self.order.p).map(|i| format!("ar.L{}", i)));
        names.extend((1..=self.order.q).map(|i| format!("ma.L{}", i)));
        names.push("sigma2".to_string());
        names
    }

    /// Estimates with standard errors, in `mean, ar, ma, sigma2` order.
    pub fn coefficients(&self) -> Option<Vec<CoefficientEstimate>> {
        let fit = self.fitted.as_ref()?;
        let estimates = self.natural_parameters(fit);
        Some(
            self.parameter_names()
                .into_iter()
                .zip(estimates)
                .zip(fit.std_errors.iter())
                .map(|((name, estimate), &std_error)| CoefficientEstimate {
                    name,
                    estimate,
                    std_error,
                })
                .collect(),
        )
    }

    /// Summary table with information criteria and residual diagnostics.
    pub fn summary(&self) -> Result<ModelSummary> {
        let fit = self.fitted.as_ref().ok_or(ForecastError::FitRequired)?;
        let coefficients = self.coefficients().ok_or(ForecastError::FitRequired)?;
        let aic = self.aic().ok_or(ForecastError::FitRequired)?;
        let bic = self.bic().ok_or(ForecastError::FitRequired)?;
        let aicc = self.aicc().ok_or(ForecastError::FitRequired)?;
        let nobs = self.nobs().ok_or(ForecastError::FitRequired)?;

        Ok(ModelSummary {
            order: self.order,
            include_mean: self.include_mean,
            nobs,
            coefficients,
            sigma2: fit.sigma2,
            log_likelihood: fit.log_likelihood,
            aic,
            bic,
            aicc,
            diagnostics: ResidualDiagnostics {
                ljung_box: ljung_box(&fit.standardized, Some(1), 0),
                jarque_bera: jarque_bera(&fit.standardized),
                heteroskedasticity: heteroskedasticity(&fit.standardized),
            },
        })
    }

    fn natural_parameters(&self, fit: &FittedArima) -> Vec<f64> {
        let mut params = Vec::with_capacity(self.num_params());
        if self.include_mean {
            params.push(fit.mean);
        }
        params.extend_from_slice(&fit.ar);
        params.extend_from_slice(&fit.ma);
        params.push(fit.sigma2);
        params
    }

    fn layout(&self) -> Layout {
        Layout {
            mean: self.include_mean,
            p: self.order.p,
            q: self.order.q,
        }
    }

    /// Yule-Walker start: the sample PACF is exactly the partial
    /// autocorrelation parameterization of the AR part.
    fn start_values(&self, series: &[f64]) -> Vec<f64> {
        let mut start = Vec::with_capacity(self.layout().len());
        if self.include_mean {
            start.push(mean(series));
        }
        if self.order.p > 0 {
            let partials = pacf(series, self.order.p);
            start.extend(partials[1..].iter().map(|&r| partial_to_unconstrained(r)));
        }
        start.extend(std::iter::repeat(0.0).take(self.order.q));
        start
    }

    /// Fit the model to raw values (oldest first).
    pub fn fit_values(&mut self, values: &[f64]) -> Result<()> {
        self.fitted = None;
        let d = self.order.d;

        let needed = self.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "series contains non-finite values".into(),
            ));
        }

        let differenced = difference(values, d);
        if is_constant(&differenced) && (self.include_mean || differenced[0] == 0.0) {
            return Err(ForecastError::ModelFit(format!(
                "series differenced {} time(s) is constant",
                d
            )));
        }

        // Optimize on a unit-scale copy; revenue amounts run to 1e8.
        let sd = std_dev(&differenced);
        let scale = if sd.is_finite() && sd > 0.0 {
            sd
        } else {
            mean(&differenced).abs().max(1.0)
        };
        let scaled: Vec<f64> = differenced.iter().map(|v| v / scale).collect();
        let layout = self.layout();
        let nobs = scaled.len() as f64;

        let (optimum, iterations) = if layout.len() == 0 {
            (Vec::new(), 0)
        } else {
            let config = NelderMeadConfig {
                max_iter: 5000,
                x_tolerance: 1e-6,
                f_tolerance: 1e-9,
                restarts: 2,
                ..Default::default()
            };
            let result = nelder_mead(
                |x| match layout.evaluate(&scaled, x) {
                    Some(out) => -out.concentrated_log_likelihood() / nobs,
                    None => f64::NAN,
                },
                &self.start_values(&scaled),
                config,
            );
            if !result.converged {
                return Err(ForecastError::ModelFit(format!(
                    "likelihood optimization did not converge after {} iterations",
                    result.iterations
                )));
            }
            (result.optimal_point, result.iterations)
        };

        let (mu_scaled, ar_u, ma_u) = layout.split(&optimum);
        let mu = mu_scaled * scale;
        let ar = constrain_ar(ar_u);
        let ma = constrain_ma(ma_u);
        if !is_stationary(&ar) {
            return Err(ForecastError::ModelFit(
                "estimated AR polynomial is not stationary".into(),
            ));
        }
        if !is_invertible(&ma) {
            return Err(ForecastError::ModelFit(
                "estimated MA polynomial is not invertible".into(),
            ));
        }

        let state_space = StateSpace::new(&ar, &ma);
        let centered: Vec<f64> = differenced.iter().map(|v| v - mu).collect();
        let output = state_space.filter(&centered).ok_or_else(|| {
            ForecastError::ModelFit("Kalman filter failed at the estimate".into())
        })?;
        let sigma2 = output.sigma2();
        let log_likelihood = output.concentrated_log_likelihood();
        if !log_likelihood.is_finite() || !(sigma2.is_finite() && sigma2 > 0.0) {
            return Err(ForecastError::ModelFit(
                "log-likelihood is not finite".into(),
            ));
        }

        let mut fitted = vec![f64::NAN; values.len()];
        let mut residuals = vec![f64::NAN; values.len()];
        for (i, &v) in output.innovations.iter().enumerate() {
            fitted[i + d] = values[i + d] - v;
            residuals[i + d] = v;
        }

        let mut fit = FittedArima {
            original: values.to_vec(),
            mean: mu,
            ar,
            ma,
            sigma2,
            log_likelihood,
            std_errors: Vec::new(),
            fitted,
            residuals,
            innovations: output.innovations.clone(),
            standardized: output.standardized(sigma2),
            next_state: output.next_state,
            iterations,
        };
        fit.std_errors = self.standard_errors(&fit, &differenced, scale);
        self.fitted = Some(fit);
        Ok(())
    }

    /// Standard errors from the inverse Hessian of the full log-likelihood
    /// in `(mean, ar, ma, sigma2)`.
    fn standard_errors(&self, fit: &FittedArima, differenced: &[f64], scale: f64) -> Vec<f64> {
        let (p, q) = (self.order.p, self.order.q);
        let include_mean = self.include_mean;
        let point = self.natural_parameters(fit);
        let k = point.len();

        let log_likelihood = |x: &[f64]| -> f64 {
            let offset = usize::from(include_mean);
            let mu = if include_mean { x[0] } else { 0.0 };
            let sigma2 = x[k - 1];
            if sigma2 <= 0.0 {
                return f64::NAN;
            }
            let centered: Vec<f64> = differenced.iter().map(|v| v - mu).collect();
            StateSpace::new(&x[offset..offset + p], &x[offset + p..offset + p + q])
                .filter(&centered)
                .map_or(f64::NAN, |out| out.log_likelihood(sigma2))
        };

        let steps: Vec<f64> = point
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let typical = if include_mean && i == 0 { scale } else { 1.0 };
                1e-4 * v.abs().max(typical)
            })
            .collect();
        let hessian = numeric_hessian(log_likelihood, &point, &steps);
        let negated: Vec<Vec<f64>> = hessian
            .iter()
            .map(|row| row.iter().map(|h| -h).collect())
            .collect();

        let nan = vec![f64::NAN; k];
        if negated.iter().flatten().any(|h| !h.is_finite()) {
            return nan;
        }
        match invert(&negated) {
            Some(cov) => (0..k)
                .map(|i| {
                    if cov[i][i] > 0.0 {
                        cov[i][i].sqrt()
                    } else {
                        f64::NAN
                    }
                })
                .collect(),
            None => nan,
        }
    }
}

/// psi-weights of `theta(B) / a(B)`, where `a` holds the integrated AR
/// coefficients.
fn psi_weights(ar: &[f64], ma: &[f64], count: usize) -> Vec<f64> {
    let mut psi = vec![0.0; count];
    if count == 0 {
        return psi;
    }
    psi[0] = 1.0;
    for j in 1..count {
        let mut value = ma.get(j - 1).copied().unwrap_or(0.0);
        for i in 1..=j.min(ar.len()) {
            value += ar[i - 1] * psi[j - i];
        }
        psi[j] = value;
    }
    psi
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &YearlySeries) -> Result<()> {
        self.fit_values(series.values())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let fit = self.fitted.as_ref().ok_or(ForecastError::FitRequired)?;
        if horizon == 0 {
            return Ok(Forecast::from_values(Vec::new()));
        }

        let path = StateSpace::new(&fit.ar, &fit.ma).forecast(&fit.next_state, horizon);
        let differenced: Vec<f64> = path.iter().map(|x| x + fit.mean).collect();
        Ok(Forecast::from_values(integrate(
            &differenced,
            &fit.original,
            self.order.d,
        )))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval level must lie in (0, 1), got {}",
                level
            )));
        }
        let forecast = self.predict(horizon)?;
        let fit = self.fitted.as_ref().ok_or(ForecastError::FitRequired)?;

        let psi = psi_weights(&integrated_ar(&fit.ar, self.order.d), &fit.ma, horizon);
        let z = quantile_normal((1.0 + level) / 2.0);

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        let mut cumulative = 0.0;
        for (point, weight) in forecast.point().iter().zip(psi.iter()) {
            cumulative += weight * weight;
            let se = (fit.sigma2 * cumulative).sqrt();
            lower.push(point - z * se);
            upper.push(point + z * se);
        }

        Ok(Forecast::from_values_with_intervals(
            forecast.point().to_vec(),
            lower,
            upper,
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.residuals.as_slice())
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}
