//! Unit-root and stationarity tests.
//!
//! The ADF test follows the usual regression with a constant,
//!
//! ```text
//! Δy_t = α + β y_{t-1} + Σ_{i=1..k} γ_i Δy_{t-i} + ε_t
//! ```
//!
//! with the augmentation order `k` chosen by AIC. P-values come from the
//! MacKinnon (1994) response surface, critical values from MacKinnon (2010).

use crate::error::{ForecastError, Result};
use crate::models::arima::difference;
use crate::utils::ols::{ols_fit, OLSResult};
use crate::utils::stats::{is_constant, normal_cdf};

/// Significance level at which the ADF null of a unit root is rejected.
pub const STATIONARITY_SIGNIFICANCE: f64 = 0.05;

/// Default maximum number of differences before giving up.
pub const DEFAULT_MAX_DIFF: usize = 2;

/// Result of a stationarity test.
#[derive(Debug, Clone, PartialEq)]
pub struct StationarityResult {
    /// Test statistic
    pub statistic: f64,
    /// P-value
    pub p_value: f64,
    /// Number of lags used
    pub lags: usize,
    /// Observations in the final regression
    pub nobs: usize,
    /// Whether the series is classified stationary. The tests classify at
    /// 5%; [`difference_until_stationary`] reclassifies each stage at its
    /// own significance.
    pub is_stationary: bool,
    /// Critical values at common significance levels
    pub critical_values: CriticalValues,
    /// Best information criterion from automatic lag selection, if any
    pub ic_best: Option<f64>,
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

impl StationarityResult {
    /// ADF reading: stationary when `p_value <= alpha`.
    pub fn rejects_unit_root(&self, alpha: f64) -> bool {
        self.p_value <= alpha
    }
}

// MacKinnon (1994), one variable, constant only.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

// MacKinnon (2010) finite-sample critical value polynomials in 1/T.
const CRIT_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
const CRIT_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// MacKinnon approximate p-value of an ADF statistic (constant, N = 1).
pub fn mackinnon_p_value(tau: f64) -> f64 {
    if tau.is_nan() {
        return f64::NAN;
    }
    if tau > TAU_MAX {
        return 1.0;
    }
    if tau < TAU_MIN {
        return 0.0;
    }
    let coefs: &[f64] = if tau <= TAU_STAR {
        &TAU_SMALL_P
    } else {
        &TAU_LARGE_P
    };
    normal_cdf(polyval(coefs, tau))
}

/// MacKinnon (2010) critical values for `nobs` observations.
pub fn mackinnon_critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs as f64;
    CriticalValues {
        cv_1pct: polyval(&CRIT_1PCT, inv),
        cv_5pct: polyval(&CRIT_5PCT, inv),
        cv_10pct: polyval(&CRIT_10PCT, inv),
    }
}

/// Largest augmentation order usable for `n` observations, or `None` if the
/// series is too short for the regression.
fn max_lag_limit(n: usize) -> Option<usize> {
    (n / 2).checked_sub(2)
}

/// Default maximum lag, `ceil(12 (n/100)^{1/4})`, capped at `n/2 - 2`.
pub fn default_max_lag(n: usize) -> Option<usize> {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    max_lag_limit(n).map(|limit| schwert.min(limit))
}

/// ADF regression at a fixed augmentation order using the last `nobs`
/// observations of the differenced series.
fn adf_regression(series: &[f64], diff: &[f64], lag: usize, nobs: usize) -> Result<OLSResult> {
    let n_diff = diff.len();
    let start = n_diff - nobs;
    let y: Vec<f64> = diff[start..].to_vec();
    let design: Vec<Vec<f64>> = (start..n_diff)
        .map(|t| {
            let mut row = Vec::with_capacity(lag + 2);
            row.push(series[t]);
            row.extend((1..=lag).map(|i| diff[t - i]));
            row.push(1.0);
            row
        })
        .collect();
    ols_fit(&y, &design)
}

/// Augmented Dickey-Fuller test with a constant and AIC lag selection.
///
/// Tests the null hypothesis that the series has a unit root. Rejection
/// (small p-value) implies stationarity.
///
/// # Arguments
/// * `series` - Time series data
/// * `max_lags` - Maximum augmentation order (default: `ceil(12 (n/100)^{1/4})`,
///   capped at `n/2 - 2`)
///
/// # Errors
/// * `InsufficientData` for fewer than 4 observations
/// * `InvalidParameter` for a constant series or an oversized `max_lags`
/// * `ComputationError` if the final regression degenerates
pub fn adf_test(series: &[f64], max_lags: Option<usize>) -> Result<StationarityResult> {
    let n = series.len();
    let limit = match max_lag_limit(n) {
        Some(limit) if n >= 4 => limit,
        _ => return Err(ForecastError::InsufficientData { needed: 4, got: n }),
    };
    if series.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::InvalidParameter(
            "series contains non-finite values".into(),
        ));
    }
    if is_constant(series) {
        return Err(ForecastError::InvalidParameter(
            "ADF test is undefined for a constant series".into(),
        ));
    }

    let max_lag = match max_lags {
        Some(lag) if lag > limit => {
            return Err(ForecastError::InvalidParameter(format!(
                "max_lags {} exceeds {} for {} observations",
                lag, limit, n
            )))
        }
        Some(lag) => lag,
        None => limit.min(default_max_lag(n).unwrap_or(0)),
    };

    let diff = difference(series, 1);

    // Every candidate uses the sample available to the largest lag.
    let common_nobs = diff.len() - max_lag;
    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let aic = match adf_regression(series, &diff, lag, common_nobs) {
            Ok(fit) => fit.aic(),
            Err(_) => continue,
        };
        if aic.is_nan() {
            continue;
        }
        // Strict comparison keeps the smaller lag on ties.
        if best.map_or(true, |(best_aic, _)| aic < best_aic) {
            best = Some((aic, lag));
        }
    }
    let (ic_best, lag) = best.ok_or_else(|| {
        ForecastError::ComputationError("no ADF regression could be estimated".into())
    })?;

    let nobs = diff.len() - lag;
    let fit = adf_regression(series, &diff, lag, nobs)?;
    let statistic = fit.t_value(0);
    if !statistic.is_finite() {
        return Err(ForecastError::ComputationError(
            "ADF statistic is not finite (perfect fit)".into(),
        ));
    }

    let p_value = mackinnon_p_value(statistic);
    Ok(StationarityResult {
        statistic,
        p_value,
        lags: lag,
        nobs,
        is_stationary: p_value <= STATIONARITY_SIGNIFICANCE,
        critical_values: mackinnon_critical_values(nobs),
        ic_best: Some(ic_best),
    })
}

// KPSS level-stationarity critical values and their tail probabilities.
const KPSS_CRIT: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
const KPSS_P: [f64; 4] = [0.10, 0.05, 0.025, 0.01];

/// Linear interpolation in the KPSS table, clamped at both ends.
fn kpss_p_value(stat: f64) -> f64 {
    if stat.is_nan() {
        return f64::NAN;
    }
    if stat <= KPSS_CRIT[0] {
        return KPSS_P[0];
    }
    if stat >= KPSS_CRIT[3] {
        return KPSS_P[3];
    }
    let i = KPSS_CRIT.iter().rposition(|&c| c <= stat).unwrap_or(0);
    let t = (stat - KPSS_CRIT[i]) / (KPSS_CRIT[i + 1] - KPSS_CRIT[i]);
    KPSS_P[i] + t * (KPSS_P[i + 1] - KPSS_P[i])
}

/// KPSS test for level stationarity.
///
/// Tests the null hypothesis that the series is stationary around a level.
/// Rejection (small p-value) implies a unit root. The p-value is read from
/// the KPSS table and is therefore clipped to `[0.01, 0.10]`.
///
/// # Arguments
/// * `series` - Time series data
/// * `lags` - Bartlett window size (default: `trunc(3 √n / 13)`)
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> Result<StationarityResult> {
    let n = series.len();
    if n < 3 {
        return Err(ForecastError::InsufficientData { needed: 3, got: n });
    }

    let lags = lags
        .unwrap_or_else(|| (3.0 * (n as f64).sqrt() / 13.0) as usize)
        .min(n - 1);

    let mean = series.iter().sum::<f64>() / n as f64;
    let residuals: Vec<f64> = series.iter().map(|&x| x - mean).collect();

    let mut partial = 0.0;
    let eta: f64 = residuals
        .iter()
        .map(|&e| {
            partial += e;
            partial * partial
        })
        .sum::<f64>()
        / (n * n) as f64;

    let mut long_run = residuals.iter().map(|&e| e * e).sum::<f64>() / n as f64;
    let mut weighted = 0.0;
    for i in 1..=lags {
        let autocov: f64 = (i..n).map(|j| residuals[j] * residuals[j - i]).sum();
        weighted += (1.0 - i as f64 / (lags + 1) as f64) * autocov;
    }
    long_run += 2.0 * weighted / n as f64;

    let statistic = if long_run > 0.0 {
        eta / long_run
    } else {
        f64::NAN
    };
    let p_value = kpss_p_value(statistic);

    Ok(StationarityResult {
        statistic,
        p_value,
        lags,
        nobs: n,
        is_stationary: !(p_value < STATIONARITY_SIGNIFICANCE),
        critical_values: CriticalValues {
            cv_1pct: KPSS_CRIT[3],
            cv_5pct: KPSS_CRIT[1],
            cv_10pct: KPSS_CRIT[0],
        },
        ic_best: None,
    })
}

/// Number of differences suggested by repeated KPSS tests.
///
/// Differences while the KPSS test rejects level stationarity at `alpha`,
/// up to `max_d` times. A series that becomes constant stops the loop.
pub fn ndiffs(series: &[f64], alpha: f64, max_d: usize) -> Result<usize> {
    if max_d == 0 {
        return Err(ForecastError::InvalidParameter(
            "max_d must be at least 1".into(),
        ));
    }
    if is_constant(series) {
        return Ok(0);
    }

    let mut d = 0;
    let mut x = series.to_vec();
    let mut result = kpss_test(&x, None)?;
    if result.p_value.is_nan() {
        return Ok(0);
    }
    while result.p_value < alpha && d < max_d {
        d += 1;
        x = difference(&x, 1);
        if is_constant(&x) {
            return Ok(d);
        }
        result = match kpss_test(&x, None) {
            Ok(r) => r,
            Err(ForecastError::InsufficientData { .. }) => return Ok(d),
            Err(e) => return Err(e),
        };
        if result.p_value.is_nan() {
            return Ok(d - 1);
        }
    }
    Ok(d)
}

/// One ADF test in the differencing loop.
#[derive(Debug, Clone, PartialEq)]
pub struct StationarityStage {
    /// Differencing order of `series`.
    pub order: usize,
    /// The series that was tested.
    pub series: Vec<f64>,
    pub result: StationarityResult,
}

/// Outcome of [`difference_until_stationary`].
#[derive(Debug, Clone, PartialEq)]
pub struct StationarityAnalysis {
    /// Every test performed, in order, starting at `d = 0`.
    pub stages: Vec<StationarityStage>,
    /// Differencing order at which the threshold was met.
    pub d: usize,
    /// Significance threshold used.
    pub significance: f64,
}

impl StationarityAnalysis {
    /// The stationary (possibly differenced) series.
    pub fn final_series(&self) -> &[f64] {
        self.stages
            .last()
            .map(|s| s.series.as_slice())
            .unwrap_or(&[])
    }

    /// ADF result of the final stage.
    pub fn final_result(&self) -> Option<&StationarityResult> {
        self.stages.last().map(|s| &s.result)
    }
}

/// Test with ADF, differencing and retesting until `p <= significance`.
///
/// Never differences more than `max_d` times.
///
/// # Errors
/// `InsufficientStationarity` if the series is still non-stationary at
/// `max_d`; ADF errors are propagated.
pub fn difference_until_stationary(
    series: &[f64],
    max_d: usize,
    significance: f64,
) -> Result<StationarityAnalysis> {
    difference_until_stationary_with(series, max_d, significance, |x| adf_test(x, None))
}

/// [`difference_until_stationary`] with a caller-supplied unit-root test.
pub fn difference_until_stationary_with<F>(
    series: &[f64],
    max_d: usize,
    significance: f64,
    test: F,
) -> Result<StationarityAnalysis>
where
    F: Fn(&[f64]) -> Result<StationarityResult>,
{
    if !(significance > 0.0 && significance < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "significance must lie in (0, 1), got {}",
            significance
        )));
    }

    let mut stages = Vec::new();
    let mut current = series.to_vec();
    let mut d = 0;
    loop {
        let mut result = test(&current)?;
        result.is_stationary = result.rejects_unit_root(significance);
        tracing::info!(
            d,
            statistic = result.statistic,
            p_value = result.p_value,
            lags = result.lags,
            "ADF test"
        );
        let stationary = result.is_stationary;
        let p_value = result.p_value;
        stages.push(StationarityStage {
            order: d,
            series: current.clone(),
            result,
        });

        if stationary {
            return Ok(StationarityAnalysis {
                stages,
                d,
                significance,
            });
        }
        if d >= max_d {
            return Err(ForecastError::InsufficientStationarity { max_d, p_value });
        }
        current = difference(&current, 1);
        d += 1;
    }
}
