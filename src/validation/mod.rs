//! Stationarity tests and residual diagnostics.
//!
//! # Example
//!
//! ```
//! use revenue_forecast::validation::{adf_test, difference_until_stationary};
//!
//! let series = vec![
//!     1.0, 1.4, 0.7, 1.1, 1.6, 0.8, 1.3, 0.9, 1.5, 0.6, 1.2, 1.0,
//! ];
//! let adf = adf_test(&series, None).unwrap();
//! assert!(adf.p_value >= 0.0 && adf.p_value <= 1.0);
//!
//! match difference_until_stationary(&series, 2, 0.05) {
//!     Ok(analysis) => println!("stationary after {} difference(s)", analysis.d),
//!     Err(err) => println!("{}", err),
//! }
//! ```

pub mod residual_tests;
pub mod stationarity;

pub use residual_tests::{
    heteroskedasticity, jarque_bera, ljung_box, HeteroskedasticityResult, JarqueBeraResult,
    LjungBoxResult,
};

pub use stationarity::{
    adf_test, default_max_lag, difference_until_stationary, difference_until_stationary_with,
    kpss_test, mackinnon_critical_values, mackinnon_p_value, ndiffs, CriticalValues,
    StationarityAnalysis, StationarityResult, StationarityStage, DEFAULT_MAX_DIFF,
    STATIONARITY_SIGNIFICANCE,
};
