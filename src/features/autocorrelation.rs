//! Sample autocorrelation and partial autocorrelation profiles.
//!
//! These back the manual order estimate: the number of lags whose
//! correlation falls outside the `±1.96/√n` band suggests `q` (ACF) and
//! `p` (PACF).

use crate::error::{ForecastError, Result};
use crate::utils::stats::{is_constant, mean};

/// Two-sided 95% normal quantile used for the significance band.
pub const BAND_Z: f64 = 1.96;

/// Correlations at lags `1..=nlags` together with the significance band.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationProfile {
    /// `values[k - 1]` is the correlation at lag `k`.
    pub values: Vec<f64>,
    /// Half-width of the band, `1.96/√n`.
    pub band: f64,
    /// Number of observations the profile was computed from.
    pub nobs: usize,
}

impl CorrelationProfile {
    pub fn nlags(&self) -> usize {
        self.values.len()
    }

    /// Whether the correlation at `lag` lies outside the band.
    pub fn is_significant(&self, lag: usize) -> bool {
        lag >= 1
            && self
                .values
                .get(lag - 1)
                .is_some_and(|v| v.abs() > self.band)
    }

    /// Number of lags outside the band.
    pub fn significant_count(&self) -> usize {
        (1..=self.nlags()).filter(|&k| self.is_significant(k)).count()
    }

    /// Lags outside the band, ascending.
    pub fn significant_lags(&self) -> Vec<usize> {
        (1..=self.nlags()).filter(|&k| self.is_significant(k)).collect()
    }
}

/// Significance band half-width for `n` observations.
pub fn significance_band(n: usize) -> f64 {
    BAND_Z / (n as f64).sqrt()
}

/// Biased sample autocorrelation at lags `0..=nlags`.
///
/// Returns NaN beyond lag `n - 1` and zeros for a constant series.
pub fn acf(series: &[f64], nlags: usize) -> Vec<f64> {
    let n = series.len();
    if n == 0 {
        return vec![f64::NAN; nlags + 1];
    }
    let m = mean(series);
    let denom: f64 = series.iter().map(|x| (x - m).powi(2)).sum();

    (0..=nlags)
        .map(|lag| {
            if lag >= n {
                f64::NAN
            } else if denom < 1e-300 {
                if lag == 0 {
                    1.0
                } else {
                    0.0
                }
            } else {
                let num: f64 = (lag..n)
                    .map(|t| (series[t] - m) * (series[t - lag] - m))
                    .sum();
                num / denom
            }
        })
        .collect()
}

/// Partial autocorrelation at lags `0..=nlags` by the Durbin-Levinson
/// recursion on the biased ACF (Yule-Walker, MLE flavour).
///
/// If the recursion degenerates the remaining lags are NaN.
pub fn pacf(series: &[f64], nlags: usize) -> Vec<f64> {
    let r = acf(series, nlags);
    durbin_levinson(&r)
}

/// Run Durbin-Levinson on autocorrelations `r[0..]`, returning the partial
/// autocorrelations with `pacf[0] = 1`.
pub(crate) fn durbin_levinson(r: &[f64]) -> Vec<f64> {
    let nlags = r.len().saturating_sub(1);
    let mut out = vec![f64::NAN; nlags + 1];
    if r.is_empty() {
        return out;
    }
    out[0] = 1.0;

    let mut phi: Vec<f64> = Vec::with_capacity(nlags);
    let mut v = 1.0;
    for k in 1..=nlags {
        if !r[k].is_finite() || v <= 1e-12 {
            break;
        }
        let num = r[k] - phi.iter().enumerate().map(|(j, p)| p * r[k - 1 - j]).sum::<f64>();
        let kk = num / v;
        let prev = phi.clone();
        for j in 0..phi.len() {
            phi[j] = prev[j] - kk * prev[prev.len() - 1 - j];
        }
        phi.push(kk);
        v *= 1.0 - kk * kk;
        out[k] = kk;
    }
    out
}

fn check_window(series: &[f64], nlags: usize) -> Result<usize> {
    if series.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "cannot compute correlations of an empty series".into(),
        ));
    }
    if nlags == 0 {
        return Err(ForecastError::InvalidParameter(
            "lag window must be at least 1".into(),
        ));
    }
    if series.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            got: series.len(),
        });
    }
    if is_constant(series) {
        return Err(ForecastError::InvalidParameter(
            "correlations of a constant series are undefined".into(),
        ));
    }
    Ok(nlags.min(series.len() - 1))
}

/// ACF profile over lags `1..=nlags`, window clamped to `n - 1`.
pub fn acf_profile(series: &[f64], nlags: usize) -> Result<CorrelationProfile> {
    let nlags = check_window(series, nlags)?;
    Ok(CorrelationProfile {
        values: acf(series, nlags)[1..].to_vec(),
        band: significance_band(series.len()),
        nobs: series.len(),
    })
}

/// PACF profile over lags `1..=nlags`, window clamped to `n - 1`.
pub fn pacf_profile(series: &[f64], nlags: usize) -> Result<CorrelationProfile> {
    let nlags = check_window(series, nlags)?;
    Ok(CorrelationProfile {
        values: pacf(series, nlags)[1..].to_vec(),
        band: significance_band(series.len()),
        nobs: series.len(),
    })
}
