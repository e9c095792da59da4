//! Deterministic pseudo-random series for unit tests.

/// Uniform noise on `[-0.5, 0.5)` from a 64-bit LCG.
pub(crate) fn white_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as f64 / 2f64.powi(31) - 0.5
        })
        .collect()
}

/// Cumulative sum of [`white_noise`], starting at zero.
pub(crate) fn random_walk(n: usize, seed: u64) -> Vec<f64> {
    let noise = white_noise(n, seed);
    let mut walk = vec![0.0; n];
    for i in 1..n {
        walk[i] = walk[i - 1] + noise[i];
    }
    walk
}
