//! Residual diagnostics reported with a fitted model.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};

/// Ljung-Box test result.
#[derive(Debug, Clone, PartialEq)]
pub struct LjungBoxResult {
    /// Test statistic Q
    pub statistic: f64,
    /// P-value from the chi-squared distribution
    pub p_value: f64,
    /// Number of lags tested
    pub lags: usize,
    /// Degrees of freedom
    pub df: usize,
}

impl LjungBoxResult {
    /// Fail to reject independence at `alpha`.
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Jarque-Bera normality test result.
#[derive(Debug, Clone, PartialEq)]
pub struct JarqueBeraResult {
    pub statistic: f64,
    pub p_value: f64,
    pub skewness: f64,
    /// Pearson kurtosis (3 for a normal distribution).
    pub kurtosis: f64,
}

/// Two-sided test comparing residual variance in the last and first thirds.
#[derive(Debug, Clone, PartialEq)]
pub struct HeteroskedasticityResult {
    /// Ratio of sums of squares, last third over first third.
    pub statistic: f64,
    pub p_value: f64,
    /// Observations in each third.
    pub window: usize,
}

fn chi_squared_sf(x: f64, df: usize) -> f64 {
    if !x.is_finite() {
        return f64::NAN;
    }
    ChiSquared::new(df as f64)
        .map(|dist| dist.sf(x))
        .unwrap_or(f64::NAN)
}

/// Ljung-Box test for autocorrelation in residuals.
///
/// # Arguments
/// * `residuals` - Model residuals
/// * `lags` - Number of lags to include (default: `min(10, n/5)`, at least 1)
/// * `fitted_params` - Degrees of freedom to subtract for estimated ARMA terms
pub fn ljung_box(residuals: &[f64], lags: Option<usize>, fitted_params: usize) -> LjungBoxResult {
    let n = residuals.len();
    if n < 3 {
        return LjungBoxResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            df: 0,
        };
    }

    let lags = lags.unwrap_or_else(|| 10.min(n / 5).max(1)).min(n - 1);
    let df = lags.saturating_sub(fitted_params).max(1);

    let mean = residuals.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = residuals.iter().map(|&x| x - mean).collect();
    let ss: f64 = centered.iter().map(|x| x * x).sum();
    if ss == 0.0 {
        return LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
            df,
        };
    }

    let q: f64 = (1..=lags)
        .map(|k| {
            let r: f64 = (k..n).map(|t| centered[t] * centered[t - k]).sum::<f64>() / ss;
            r * r / (n - k) as f64
        })
        .sum::<f64>()
        * (n * (n + 2)) as f64;

    LjungBoxResult {
        statistic: q,
        p_value: chi_squared_sf(q, df),
        lags,
        df,
    }
}

/// Jarque-Bera test of residual normality.
pub fn jarque_bera(residuals: &[f64]) -> JarqueBeraResult {
    let n = residuals.len();
    if n < 3 {
        return JarqueBeraResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            skewness: f64::NAN,
            kurtosis: f64::NAN,
        };
    }
    let nf = n as f64;
    let mean = residuals.iter().sum::<f64>() / nf;
    let moment = |k: i32| residuals.iter().map(|x| (x - mean).powi(k)).sum::<f64>() / nf;
    let m2 = moment(2);
    if m2 == 0.0 {
        return JarqueBeraResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            skewness: f64::NAN,
            kurtosis: f64::NAN,
        };
    }
    let skewness = moment(3) / m2.powf(1.5);
    let kurtosis = moment(4) / (m2 * m2);
    let statistic = nf / 6.0 * (skewness.powi(2) + (kurtosis - 3.0).powi(2) / 4.0);

    JarqueBeraResult {
        statistic,
        p_value: chi_squared_sf(statistic, 2),
        skewness,
        kurtosis,
    }
}

/// Variance-ratio heteroskedasticity test over the first and last thirds.
pub fn heteroskedasticity(residuals: &[f64]) -> HeteroskedasticityResult {
    let n = residuals.len();
    let window = ((n as f64) / 3.0).round() as usize;
    let nan = HeteroskedasticityResult {
        statistic: f64::NAN,
        p_value: f64::NAN,
        window,
    };
    if window == 0 {
        return nan;
    }

    let first: f64 = residuals[..window].iter().map(|x| x * x).sum();
    let last: f64 = residuals[n - window..].iter().map(|x| x * x).sum();
    if first == 0.0 {
        return nan;
    }
    let statistic = last / first;

    let p_value = FisherSnedecor::new(window as f64, window as f64)
        .map(|f| 2.0 * f.cdf(statistic).min(f.sf(statistic)))
        .unwrap_or(f64::NAN);

    HeteroskedasticityResult {
        statistic,
        p_value,
        window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fixtures::{random_walk, white_noise};
    use approx::assert_relative_eq;

    // ==================== ljung_box ====================

    #[test]
    fn ljung_box_white_noise_passes() {
        let result = ljung_box(&white_noise(200, 3), Some(10), 0);
        assert_eq!(result.df, 10);
        assert!(result.is_white_noise(0.05), "p = {}", result.p_value);
    }

    #[test]
    fn ljung_box_random_walk_fails() {
        let result = ljung_box(&random_walk(200, 3), Some(5), 0);
        assert!(!result.is_white_noise(0.05));
    }

    #[test]
    fn ljung_box_single_lag_by_hand() {
        // r1 = 0.4 for 1..5 (see autocorrelation tests); Q = n(n+2) r1^2/(n-1)
        let result = ljung_box(&[1.0, 2.0, 3.0, 4.0, 5.0], Some(1), 0);
        assert_relative_eq!(result.statistic, 35.0 * 0.16 / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn ljung_box_degenerate_inputs() {
        assert!(ljung_box(&[1.0, 2.0], None, 0).statistic.is_nan());
        let constant = ljung_box(&[2.0; 10], None, 0);
        assert_eq!(constant.p_value, 1.0);
    }

    // ==================== jarque_bera ====================

    #[test]
    fn jarque_bera_symmetric_sample() {
        let result = jarque_bera(&[-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_relative_eq!(result.skewness, 0.0, epsilon = 1e-12);
        // m2 = 2, m4 = 6.8
        assert_relative_eq!(result.kurtosis, 1.7, epsilon = 1e-12);
        assert_relative_eq!(result.statistic, 5.0 / 6.0 * (1.3f64.powi(2) / 4.0), epsilon = 1e-12);
        assert!(result.p_value > 0.5);
    }

    // ==================== heteroskedasticity ====================

    #[test]
    fn heteroskedasticity_detects_growing_variance() {
        let residuals: Vec<f64> = white_noise(90, 11)
            .iter()
            .enumerate()
            .map(|(i, e)| e * (1.0 + i as f64 / 5.0))
            .collect();
        let result = heteroskedasticity(&residuals);
        assert_eq!(result.window, 30);
        assert!(result.statistic > 10.0);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn heteroskedasticity_equal_thirds_has_p_one() {
        let result = heteroskedasticity(&[1.0, -1.0, 0.5, 2.0, 1.0, -1.0]);
        assert_relative_eq!(result.statistic, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-9);
    }
}
