//! Exact Gaussian likelihood of an ARMA process by Kalman filtering.
//!
//! The process `x_t` (mean already removed) is written in Harvey's state
//! space form with state dimension `m = max(p, q + 1)`:
//!
//! ```text
//! x_t     = Z a_t                 Z = (1, 0, ..., 0)
//! a_{t+1} = T a_t + R e_{t+1}     T = [phi | I; 0], R = (1, theta_1, ..., theta_{m-1})'
//! ```
//!
//! The filter runs with unit innovation variance, so the innovation
//! variances `F_t` are relative to `sigma^2`, which can then be concentrated
//! out of the likelihood.

use std::f64::consts::PI;

use crate::utils::linalg::solve;

/// Transition and selection matrices of an ARMA state space model.
#[derive(Debug, Clone)]
pub(crate) struct StateSpace {
    transition: Vec<Vec<f64>>,
    selection: Vec<f64>,
}

impl StateSpace {
    pub(crate) fn new(ar: &[f64], ma: &[f64]) -> Self {
        let m = ar.len().max(ma.len() + 1);
        let mut transition = vec![vec![0.0; m]; m];
        for (i, row) in transition.iter_mut().enumerate() {
            row[0] = ar.get(i).copied().unwrap_or(0.0);
            if i + 1 < m {
                row[i + 1] = 1.0;
            }
        }
        let mut selection = vec![0.0; m];
        selection[0] = 1.0;
        for (j, &theta) in ma.iter().enumerate() {
            selection[j + 1] = theta;
        }
        Self {
            transition,
            selection,
        }
    }

    pub(crate) fn dim(&self) -> usize {
        self.selection.len()
    }

    fn transition_apply(&self, state: &[f64]) -> Vec<f64> {
        let m = self.dim();
        (0..m)
            .map(|i| {
                let carried = if i + 1 < m { state[i + 1] } else { 0.0 };
                self.transition[i][0] * state[0] + carried
            })
            .collect()
    }

    /// Solve `P = T P T' + R R'` for the stationary state covariance.
    ///
    /// Returns `None` when `I - T (x) T` is singular, i.e. the AR part has a
    /// unit root.
    pub(crate) fn stationary_covariance(&self) -> Option<Vec<Vec<f64>>> {
        let m = self.dim();
        let size = m * m;
        let t = &self.transition;
        let mut system = vec![vec![0.0; size]; size];
        let mut rhs = vec![0.0; size];
        for i in 0..m {
            for j in 0..m {
                let row = i * m + j;
                rhs[row] = self.selection[i] * self.selection[j];
                for k in 0..m {
                    for l in 0..m {
                        let col = k * m + l;
                        let identity = if row == col { 1.0 } else { 0.0 };
                        system[row][col] = identity - t[i][k] * t[j][l];
                    }
                }
            }
        }
        let vec_p = solve(&system, &rhs)?;
        let cov: Vec<Vec<f64>> = (0..m).map(|i| vec_p[i * m..(i + 1) * m].to_vec()).collect();
        if cov.iter().enumerate().all(|(i, row)| row[i] > 0.0) {
            Some(cov)
        } else {
            None
        }
    }

    /// Run the filter over a zero-mean series.
    ///
    /// Returns `None` for a non-stationary model or a degenerate innovation
    /// variance.
    pub(crate) fn filter(&self, observations: &[f64]) -> Option<FilterOutput> {
        let m = self.dim();
        let mut state = vec![0.0; m];
        let mut cov = self.stationary_covariance()?;
        let mut innovations = Vec::with_capacity(observations.len());
        let mut variances = Vec::with_capacity(observations.len());

        for &x in observations {
            let v = x - state[0];
            let f = cov[0][0];
            if !f.is_finite() || f < 1e-10 {
                return None;
            }

            // Predicted state: a' = T (a + P Z v / F); P' = T (P - P Z Z' P / F) T' + R R'.
            let updated_state: Vec<f64> = (0..m).map(|i| state[i] + cov[i][0] * v / f).collect();
            let updated_cov: Vec<Vec<f64>> = (0..m)
                .map(|i| (0..m).map(|j| cov[i][j] - cov[i][0] * cov[0][j] / f).collect())
                .collect();

            state = self.transition_apply(&updated_state);
            let tp: Vec<Vec<f64>> = (0..m)
                .map(|i| {
                    (0..m)
                        .map(|j| {
                            let carried = if i + 1 < m { updated_cov[i + 1][j] } else { 0.0 };
                            self.transition[i][0] * updated_cov[0][j] + carried
                        })
                        .collect()
                })
                .collect();
            cov = (0..m)
                .map(|i| {
                    (0..m)
                        .map(|j| {
                            let carried = if j + 1 < m { tp[i][j + 1] } else { 0.0 };
                            tp[i][0] * self.transition[j][0]
                                + carried
                                + self.selection[i] * self.selection[j]
                        })
                        .collect()
                })
                .collect();

            innovations.push(v);
            variances.push(f);
        }

        Some(FilterOutput {
            innovations,
            variances,
            next_state: state,
        })
    }

    /// Point forecasts `E[x_{n+h}]` for `h = 1..=horizon` from the state
    /// predicted after the last observation.
    pub(crate) fn forecast(&self, next_state: &[f64], horizon: usize) -> Vec<f64> {
        let mut state = next_state.to_vec();
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            out.push(state[0]);
            state = self.transition_apply(&state);
        }
        out
    }
}

/// Innovations of a filter pass.
#[derive(Debug, Clone)]
pub(crate) struct FilterOutput {
    /// One-step prediction errors `v_t`.
    pub innovations: Vec<f64>,
    /// Innovation variances `F_t` relative to `sigma^2`.
    pub variances: Vec<f64>,
    /// State predicted for the first period after the sample.
    pub next_state: Vec<f64>,
}

impl FilterOutput {
    fn nobs(&self) -> f64 {
        self.innovations.len() as f64
    }

    fn sum_log_variance(&self) -> f64 {
        self.variances.iter().map(|f| f.ln()).sum()
    }

    fn scaled_ssr(&self) -> f64 {
        self.innovations
            .iter()
            .zip(self.variances.iter())
            .map(|(v, f)| v * v / f)
            .sum()
    }

    /// Maximum likelihood estimate of `sigma^2`.
    pub(crate) fn sigma2(&self) -> f64 {
        self.scaled_ssr() / self.nobs()
    }

    /// Log-likelihood with `sigma^2` concentrated out.
    pub(crate) fn concentrated_log_likelihood(&self) -> f64 {
        let n = self.nobs();
        -0.5 * n * ((2.0 * PI).ln() + self.sigma2().ln() + 1.0) - 0.5 * self.sum_log_variance()
    }

    /// Log-likelihood at a given `sigma^2`.
    pub(crate) fn log_likelihood(&self, sigma2: f64) -> f64 {
        let n = self.nobs();
        -0.5 * n * (2.0 * PI).ln()
            - 0.5 * n * sigma2.ln()
            - 0.5 * self.sum_log_variance()
            - 0.5 * self.scaled_ssr() / sigma2
    }

    /// Innovations divided by their standard deviation.
    pub(crate) fn standardized(&self, sigma2: f64) -> Vec<f64> {
        self.innovations
            .iter()
            .zip(self.variances.iter())
            .map(|(v, f)| v / (f * sigma2).sqrt())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ar1_stationary_variance() {
        let ss = StateSpace::new(&[0.6], &[]);
        let p = ss.stationary_covariance().unwrap();
        assert_relative_eq!(p[0][0], 1.0 / (1.0 - 0.36), epsilon = 1e-12);
    }

    #[test]
    fn ma1_stationary_covariance() {
        let ss = StateSpace::new(&[], &[0.4]);
        assert_eq!(ss.dim(), 2);
        let p = ss.stationary_covariance().unwrap();
        assert_relative_eq!(p[0][0], 1.0 + 0.16, epsilon = 1e-12);
        assert_relative_eq!(p[0][1], 0.4, epsilon = 1e-12);
        assert_relative_eq!(p[1][1], 0.16, epsilon = 1e-12);
    }

    #[test]
    fn unit_root_has_no_stationary_covariance() {
        assert!(StateSpace::new(&[1.0], &[]).stationary_covariance().is_none());
    }

    #[test]
    fn white_noise_likelihood_is_gaussian() {
        let x = [0.5, -1.0, 0.25, 1.5];
        let out = StateSpace::new(&[], &[]).filter(&x).unwrap();
        assert_eq!(out.innovations, x.to_vec());
        let ssr: f64 = x.iter().map(|v| v * v).sum();
        assert_relative_eq!(out.sigma2(), ssr / 4.0, epsilon = 1e-12);
        let expected = -2.0 * ((2.0 * PI).ln() + (ssr / 4.0).ln() + 1.0);
        assert_relative_eq!(out.concentrated_log_likelihood(), expected, epsilon = 1e-12);
        assert_relative_eq!(
            out.log_likelihood(out.sigma2()),
            out.concentrated_log_likelihood(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn ar1_innovations_after_first_are_conditional_errors() {
        let phi = 0.5;
        let x = [1.0, 2.0, -1.0, 0.5];
        let out = StateSpace::new(&[phi], &[]).filter(&x).unwrap();
        assert_relative_eq!(out.innovations[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(out.variances[0], 1.0 / (1.0 - phi * phi), epsilon = 1e-12);
        for t in 1..x.len() {
            assert_relative_eq!(out.innovations[t], x[t] - phi * x[t - 1], epsilon = 1e-12);
            assert_relative_eq!(out.variances[t], 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(out.next_state[0], phi * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn ma1_innovation_variance_decreases_toward_one() {
        let x = [0.3, -0.2, 0.8, 0.1, -0.5, 0.4, 0.0, 0.2];
        let out = StateSpace::new(&[], &[0.5]).filter(&x).unwrap();
        for w in out.variances.windows(2) {
            assert!(w[1] <= w[0] + 1e-12);
        }
        assert!(*out.variances.last().unwrap() >= 1.0);
    }

    #[test]
    fn forecast_decays_for_ar1() {
        let ss = StateSpace::new(&[0.5], &[]);
        let path = ss.forecast(&[2.0], 3);
        assert_eq!(path, vec![2.0, 1.0, 0.5]);
    }
}
