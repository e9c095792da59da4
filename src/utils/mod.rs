//! Numerical utilities shared by the tests and models.

pub mod linalg;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use ols::{ols_fit, OLSResult};
pub use optimization::{nelder_mead, numeric_hessian, NelderMeadConfig, NelderMeadResult};
pub use stats::{mean, normal_cdf, quantile_normal, std_dev, two_sided_p_value, variance};

#[cfg(test)]
pub(crate) mod fixtures;
