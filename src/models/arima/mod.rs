//! Non-seasonal ARIMA models.
//!
//! This module provides:
//! - ARIMA(p, d, q) fitted by exact maximum likelihood
//! - AutoARIMA for automatic order selection
//! - Differencing and integration helpers

mod auto_arima;
mod diff;
mod kalman;
mod model;
mod order;
mod params;

pub use auto_arima::{AutoARIMA, AutoARIMAConfig, Candidate};
pub use diff::{difference, integrate, integrated_ar};
pub use model::{CoefficientEstimate, ModelSummary, ResidualDiagnostics, ARIMA};
pub use order::ModelOrder;
pub use params::{
    constrain_ar, constrain_ma, is_invertible, is_stationary, unconstrain_ar, unconstrain_ma,
};
