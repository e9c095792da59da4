//! Derivative-free optimization for likelihood maximization.

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed (across restarts).
    pub iterations: usize,
    /// Number of objective evaluations.
    pub evaluations: usize,
    /// Whether the final run met both tolerances.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations per run.
    pub max_iter: usize,
    /// Absolute tolerance on the spread of vertex coordinates.
    pub x_tolerance: f64,
    /// Absolute tolerance on the spread of objective values.
    pub f_tolerance: f64,
    /// Use dimension-dependent coefficients (Gao & Han, 2012).
    pub adaptive: bool,
    /// Relative step for non-zero starting coordinates.
    pub relative_step: f64,
    /// Absolute step for zero starting coordinates.
    pub zero_step: f64,
    /// Number of restarts from the best vertex after convergence.
    pub restarts: usize,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            x_tolerance: 1e-8,
            f_tolerance: 1e-10,
            adaptive: true,
            relative_step: 0.05,
            zero_step: 0.1,
            restarts: 1,
        }
    }
}

struct Coefficients {
    reflect: f64,
    expand: f64,
    contract: f64,
    shrink: f64,
}

impl Coefficients {
    fn for_dimension(n: usize, adaptive: bool) -> Self {
        if adaptive && n > 1 {
            let n = n as f64;
            Self {
                reflect: 1.0,
                expand: 1.0 + 2.0 / n,
                contract: 0.75 - 1.0 / (2.0 * n),
                shrink: 1.0 - 1.0 / n,
            }
        } else {
            Self {
                reflect: 1.0,
                expand: 2.0,
                contract: 0.5,
                shrink: 0.5,
            }
        }
    }
}

/// Minimize `objective` with the Nelder-Mead simplex method.
///
/// Non-finite objective values are treated as `+inf`, so an objective may
/// signal an infeasible point by returning `f64::NAN` or `f64::INFINITY`.
///
/// # Example
/// ```
/// use revenue_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-4);
/// assert!((result.optimal_point[1] - 3.0).abs() < 1e-4);
/// ```
pub fn nelder_mead<F>(objective: F, initial: &[f64], config: NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            evaluations: 0,
            converged: false,
        };
    }

    let guarded = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let mut start = initial.to_vec();
    let mut total_iterations = 0;
    let mut total_evaluations = 0;
    let mut last = None;

    for _ in 0..=config.restarts {
        let run = run_simplex(&guarded, &start, &config);
        total_iterations += run.iterations;
        total_evaluations += run.evaluations;
        start = run.optimal_point.clone();

        let improved = match &last {
            Some(prev) => {
                let prev: &NelderMeadResult = prev;
                prev.optimal_value - run.optimal_value > config.f_tolerance
            }
            None => true,
        };
        let stop = !improved && run.converged;
        last = Some(run);
        if stop {
            break;
        }
    }

    let mut result = last.unwrap_or(NelderMeadResult {
        optimal_point: initial.to_vec(),
        optimal_value: f64::NAN,
        iterations: 0,
        evaluations: 0,
        converged: false,
    });
    result.iterations = total_iterations;
    result.evaluations = total_evaluations;
    if !result.optimal_value.is_finite() {
        result.converged = false;
    }
    result
}

/// Central-difference Hessian of `f` at `x` with per-coordinate steps.
///
/// Entry `(i, j)` uses the four-point stencil
/// `[f(++) - f(+-) - f(-+) + f(--)] / (4 h_i h_j)`, which on the diagonal
/// reduces to a second difference with step `2 h_i`.
pub fn numeric_hessian<F>(f: F, x: &[f64], steps: &[f64]) -> Vec<Vec<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let n = x.len();
    let shifted = |i: usize, si: f64, j: usize, sj: f64| {
        let mut point = x.to_vec();
        point[i] += si * steps[i];
        point[j] += sj * steps[j];
        f(&point)
    };

    let mut hessian = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let value = (shifted(i, 1.0, j, 1.0) - shifted(i, 1.0, j, -1.0)
                - shifted(i, -1.0, j, 1.0)
                + shifted(i, -1.0, j, -1.0))
                / (4.0 * steps[i] * steps[j]);
            hessian[i][j] = value;
            hessian[j][i] = value;
        }
    }
    hessian
}

fn run_simplex<F>(objective: &F, initial: &[f64], config: &NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let coef = Coefficients::for_dimension(n, config.adaptive);

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(initial.to_vec());
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if vertex[i] != 0.0 {
            config.relative_step * vertex[i]
        } else {
            config.zero_step
        };
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();
    let mut evaluations = n + 1;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        order_simplex(&mut simplex, &mut values);

        let f_spread = values[1..]
            .iter()
            .map(|v| (v - values[0]).abs())
            .fold(0.0, f64::max);
        let x_spread = simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(simplex[0].iter()).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        if values[0].is_finite() && f_spread <= config.f_tolerance && x_spread <= config.x_tolerance
        {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let worst = simplex[n].clone();
        let along = |t: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(worst.iter())
                .map(|(c, w)| c + t * (c - w))
                .collect()
        };

        let reflected = along(coef.reflect);
        let f_reflected = objective(&reflected);
        evaluations += 1;

        if f_reflected < values[0] {
            let expanded = along(coef.reflect * coef.expand);
            let f_expanded = objective(&expanded);
            evaluations += 1;
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let (candidate, f_candidate, accept_at) = if f_reflected < values[n] {
            let outside = along(coef.reflect * coef.contract);
            let f = objective(&outside);
            (outside, f, f_reflected)
        } else {
            let inside = along(-coef.contract);
            let f = objective(&inside);
            (inside, f, values[n])
        };
        evaluations += 1;

        if f_candidate <= accept_at {
            simplex[n] = candidate;
            values[n] = f_candidate;
            continue;
        }

        let best = simplex[0].clone();
        for i in 1..=n {
            for j in 0..n {
                simplex[i][j] = best[j] + coef.shrink * (simplex[i][j] - best[j]);
            }
            values[i] = objective(&simplex[i]);
        }
        evaluations += n;
    }

    order_simplex(&mut simplex, &mut values);
    NelderMeadResult {
        optimal_point: simplex[0].clone(),
        optimal_value: values[0],
        iterations,
        evaluations,
        converged,
    }
}

/// Sort vertices by objective value, best first. Ties keep insertion order.
fn order_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    *simplex = order.iter().map(|&i| simplex[i].clone()).collect();
    *values = order.iter().map(|&i| values[i]).collect();
}
