//! Ordinary Least Squares regression used by the unit-root tests.
//!
//! The design matrix is factorized with Householder QR rather than by forming
//! the normal equations, since ADF designs mix a constant column with level
//! columns that can be eight orders of magnitude larger.

use crate::error::{ForecastError, Result};

/// Fitted OLS regression with the statistics needed for inference.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Coefficients in design-column order.
    pub coefficients: Vec<f64>,
    /// Standard errors of the coefficients.
    pub std_errors: Vec<f64>,
    /// Residual sum of squares.
    pub ssr: f64,
    /// Number of observations.
    pub nobs: usize,
    /// Gaussian log-likelihood at the estimate.
    pub log_likelihood: f64,
}

impl OLSResult {
    /// t statistic of coefficient `i`.
    pub fn t_value(&self, i: usize) -> f64 {
        self.coefficients[i] / self.std_errors[i]
    }

    /// Number of estimated coefficients.
    pub fn num_params(&self) -> usize {
        self.coefficients.len()
    }

    /// Residual degrees of freedom.
    pub fn df_resid(&self) -> usize {
        self.nobs - self.num_params()
    }

    /// Akaike information criterion, `-2 llf + 2 k`.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood + 2.0 * self.num_params() as f64
    }
}

/// Fit `y = X b + e` by least squares.
///
/// # Arguments
/// * `y` - Response (length n)
/// * `design` - Design matrix rows (n rows of k columns); include a column of
///   ones for an intercept
pub fn ols_fit(y: &[f64], design: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    if design.len() != n {
        return Err(ForecastError::InvalidParameter(format!(
            "design has {} rows but response has {}",
            design.len(),
            n
        )));
    }
    let k = design.first().map_or(0, |row| row.len());
    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "design matrix has no columns".into(),
        ));
    }
    if n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }

    // Column-major working copy.
    let mut a: Vec<Vec<f64>> = (0..k)
        .map(|j| design.iter().map(|row| row[j]).collect())
        .collect();
    let column_norms: Vec<f64> = a
        .iter()
        .map(|col| col.iter().map(|v| v * v).sum::<f64>().sqrt())
        .collect();
    let mut qty = y.to_vec();
    let mut r_diag = vec![0.0; k];

    for j in 0..k {
        let norm = a[j][j..].iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm <= 1e-10 * column_norms[j] || norm == 0.0 {
            return Err(ForecastError::ComputationError(format!(
                "design matrix is rank deficient at column {}",
                j
            )));
        }
        let alpha = if a[j][j] > 0.0 { -norm } else { norm };

        let mut v: Vec<f64> = a[j][j..].to_vec();
        v[0] -= alpha;
        let v_norm_sq: f64 = v.iter().map(|x| x * x).sum();

        if v_norm_sq > 0.0 {
            for col in a.iter_mut().skip(j) {
                let dot: f64 = v.iter().zip(col[j..].iter()).map(|(vi, ci)| vi * ci).sum();
                let factor = 2.0 * dot / v_norm_sq;
                for (ci, vi) in col[j..].iter_mut().zip(v.iter()) {
                    *ci -= factor * vi;
                }
            }
            let dot: f64 = v.iter().zip(qty[j..].iter()).map(|(vi, yi)| vi * yi).sum();
            let factor = 2.0 * dot / v_norm_sq;
            for (yi, vi) in qty[j..].iter_mut().zip(v.iter()) {
                *yi -= factor * vi;
            }
        }
        r_diag[j] = alpha;
        a[j][j] = alpha;
    }

    // R[i][j] = a[j][i] for i <= j.
    let r = |i: usize, j: usize| if i == j { r_diag[i] } else { a[j][i] };

    let mut coefficients = vec![0.0; k];
    for i in (0..k).rev() {
        let mut sum = qty[i];
        for j in (i + 1)..k {
            sum -= r(i, j) * coefficients[j];
        }
        coefficients[i] = sum / r(i, i);
    }

    let ssr: f64 = design
        .iter()
        .zip(y.iter())
        .map(|(row, &yi)| {
            let fitted: f64 = row.iter().zip(coefficients.iter()).map(|(x, b)| x * b).sum();
            (yi - fitted).powi(2)
        })
        .sum();

    // (X'X)^-1 = R^-1 R^-T
    let mut r_inv = vec![vec![0.0; k]; k];
    for col in 0..k {
        r_inv[col][col] = 1.0 / r(col, col);
        for i in (0..col).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..=col {
                sum += r(i, j) * r_inv[j][col];
            }
            r_inv[i][col] = -sum / r(i, i);
        }
    }

    let sigma2 = ssr / (n - k) as f64;
    let std_errors: Vec<f64> = (0..k)
        .map(|i| {
            let diag: f64 = (i..k).map(|j| r_inv[i][j] * r_inv[i][j]).sum();
            (sigma2 * diag).sqrt()
        })
        .collect();

    let nf = n as f64;
    let log_likelihood = -0.5 * nf * ((2.0 * std::f64::consts::PI).ln() + (ssr / nf).ln() + 1.0);

    Ok(OLSResult {
        coefficients,
        std_errors,
        ssr,
        nobs: n,
        log_likelihood,
    })
}
