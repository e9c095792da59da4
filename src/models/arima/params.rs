//! Unconstrained parameterization of AR and MA polynomials.
//!
//! An unconstrained value `u` maps to a partial autocorrelation
//! `r = u / sqrt(1 + u^2)` in (-1, 1), and the Durbin-Levinson recursion turns
//! the partial autocorrelations into polynomial coefficients. Every real
//! vector therefore yields a stationary AR polynomial, and the negated map
//! yields an invertible MA polynomial (Jones, 1980; Monahan, 1984).

/// Largest partial autocorrelation magnitude the optimizer may reach.
pub(crate) const MAX_PARTIAL: f64 = 0.999;

fn to_partial(u: f64) -> f64 {
    u / (1.0 + u * u).sqrt()
}

fn from_partial(r: f64) -> f64 {
    r / (1.0 - r * r).sqrt()
}

/// Coefficients `phi` of a stationary `1 - phi_1 B - ... - phi_p B^p` from
/// partial autocorrelations.
pub(crate) fn partials_to_coefficients(partials: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(partials.len());
    for &r in partials {
        let previous = phi.clone();
        let k = previous.len();
        for j in 0..k {
            phi[j] = previous[j] - r * previous[k - 1 - j];
        }
        phi.push(r);
    }
    phi
}

/// Inverse of [`partials_to_coefficients`] (Durbin-Levinson step-down).
///
/// Returns `None` when some partial autocorrelation reaches magnitude one,
/// which happens exactly when the polynomial has a root on or inside the
/// unit circle.
pub(crate) fn coefficients_to_partials(phi: &[f64]) -> Option<Vec<f64>> {
    let mut current = phi.to_vec();
    let mut partials = vec![0.0; phi.len()];
    for k in (0..phi.len()).rev() {
        let r = current[k];
        if !r.is_finite() || r.abs() >= 1.0 {
            return None;
        }
        partials[k] = r;
        let denom = 1.0 - r * r;
        current = (0..k)
            .map(|j| (current[j] + r * current[k - 1 - j]) / denom)
            .collect();
    }
    Some(partials)
}

/// Stationary AR coefficients from unconstrained values.
pub fn constrain_ar(unconstrained: &[f64]) -> Vec<f64> {
    let partials: Vec<f64> = unconstrained.iter().map(|&u| to_partial(u)).collect();
    partials_to_coefficients(&partials)
}

/// Invertible MA coefficients (`theta(B) = 1 + theta_1 B + ...`) from
/// unconstrained values.
pub fn constrain_ma(unconstrained: &[f64]) -> Vec<f64> {
    constrain_ar(unconstrained).into_iter().map(|c| -c).collect()
}

/// Unconstrained values for stationary AR coefficients.
pub fn unconstrain_ar(phi: &[f64]) -> Option<Vec<f64>> {
    coefficients_to_partials(phi).map(|partials| partials.into_iter().map(from_partial).collect())
}

/// Unconstrained values for invertible MA coefficients.
pub fn unconstrain_ma(theta: &[f64]) -> Option<Vec<f64>> {
    let negated: Vec<f64> = theta.iter().map(|c| -c).collect();
    unconstrain_ar(&negated)
}

/// True when `1 - phi_1 B - ... - phi_p B^p` has all roots outside the unit circle.
pub fn is_stationary(phi: &[f64]) -> bool {
    coefficients_to_partials(phi).is_some()
}

/// True when `1 + theta_1 B + ... + theta_q B^q` has all roots outside the unit circle.
pub fn is_invertible(theta: &[f64]) -> bool {
    let negated: Vec<f64> = theta.iter().map(|c| -c).collect();
    is_stationary(&negated)
}

/// True when every unconstrained value maps inside `MAX_PARTIAL`.
pub(crate) fn within_bounds(unconstrained: &[f64]) -> bool {
    unconstrained
        .iter()
        .all(|&u| u.is_finite() && to_partial(u).abs() <= MAX_PARTIAL)
}

/// Unconstrained value of a partial autocorrelation, clipped to the bounds.
pub(crate) fn partial_to_unconstrained(r: f64) -> f64 {
    if r.is_finite() {
        from_partial(r.clamp(-0.95, 0.95))
    } else {
        0.0
    }
}
