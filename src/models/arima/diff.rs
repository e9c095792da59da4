//! Differencing and its inverse.

/// Difference a series `d` times.
///
/// Each pass shortens the series by one, so the result has `n - d` values
/// (or none when `d >= n`).
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut current = series.to_vec();
    for _ in 0..d {
        if current.is_empty() {
            break;
        }
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }
    current
}

/// Undo `d` rounds of differencing for values that continue `original`.
///
/// `differenced` holds future values on the d-times differenced scale.
/// They are accumulated level by level, each level anchored at the last
/// observed value of `original` differenced to that level.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut current = differenced.to_vec();
    for level in (0..d).rev() {
        let anchor = difference(original, level).last().copied().unwrap_or(0.0);
        current = current
            .iter()
            .scan(anchor, |acc, &step| {
                *acc += step;
                Some(*acc)
            })
            .collect();
    }
    current
}

/// Coefficients of the AR polynomial of the integrated model.
///
/// Given `phi` for `phi(B) = 1 - phi_1 B - ... - phi_p B^p`, returns the
/// coefficients `a` of `phi(B)(1 - B)^d = 1 - a_1 B - ... - a_{p+d} B^{p+d}`.
pub fn integrated_ar(phi: &[f64], d: usize) -> Vec<f64> {
    // Full polynomial with leading 1, signs explicit.
    let mut poly: Vec<f64> = std::iter::once(1.0).chain(phi.iter().map(|c| -c)).collect();
    for _ in 0..d {
        let mut next = vec![0.0; poly.len() + 1];
        for (i, &c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        poly = next;
    }
    poly[1..].iter().map(|c| -c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_shortens_by_order() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 0), series);
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn difference_past_length_is_empty() {
        assert!(difference(&[1.0, 2.0], 2).is_empty());
        assert!(difference(&[1.0, 2.0], 5).is_empty());
        assert!(difference(&[], 1).is_empty());
    }

    #[test]
    fn integrate_first_order_continues_last_value() {
        let original = vec![10.0, 12.0, 15.0];
        let future = integrate(&[1.0, 2.0], &original, 1);
        assert_eq!(future, vec![16.0, 18.0]);
    }

    #[test]
    fn integrate_second_order() {
        // Second differences of a quadratic are constant.
        let original = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        let future = integrate(&[1.0, 1.0], &original, 2);
        assert_eq!(future, vec![21.0, 28.0]);
    }

    #[test]
    fn integrate_order_zero_is_identity() {
        assert_eq!(integrate(&[4.0, 5.0], &[1.0], 0), vec![4.0, 5.0]);
    }

    #[test]
    fn integrated_ar_expands_unit_roots() {
        // (1 - B): a = [1]
        assert_eq!(integrated_ar(&[], 1), vec![1.0]);
        // (1 - B)^2 = 1 - 2B + B^2: a = [2, -1]
        assert_eq!(integrated_ar(&[], 2), vec![2.0, -1.0]);
        // (1 - 0.5B)(1 - B) = 1 - 1.5B + 0.5B^2: a = [1.5, -0.5]
        let a = integrated_ar(&[0.5], 1);
        assert_relative_eq!(a[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(a[1], -0.5, epsilon = 1e-12);
        assert_eq!(integrated_ar(&[0.3, 0.2], 0), vec![0.3, 0.2]);
    }
}
