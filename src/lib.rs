//! # revenue-forecast
//!
//! Yearly municipal revenue analysis: load a multi-sheet revenue workbook,
//! aggregate selected categories by calendar year, difference until the
//! ADF test reports stationarity, choose an ARIMA order both from the
//! ACF/PACF profiles and by a stepwise AIC search, then fit the model by
//! exact maximum likelihood and forecast the next years.
//!
//! # Example
//!
//! ```
//! use revenue_forecast::prelude::*;
//!
//! let series = YearlySeries::new(
//!     (2004..2024).collect(),
//!     vec![
//!         101.2, 98.7, 103.5, 99.1, 100.4, 102.8, 97.9, 101.7, 99.6, 100.9,
//!         98.4, 102.1, 100.2, 99.3, 101.5, 98.8, 100.6, 102.4, 99.0, 100.3,
//!     ],
//! )
//! .unwrap();
//!
//! let mut model = ARIMA::new(0, 0, 0);
//! model.fit(&series).unwrap();
//! let forecast = model.predict(2).unwrap();
//! assert_eq!(forecast.horizon(), 2);
//! ```

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod selection;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, PipelineError, Result, Stage};

pub mod prelude {
    pub use crate::config::{CategoryConfig, PipelineConfig};
    pub use crate::core::{Forecast, ForecastResult, LabelColumn, RevenueTable, YearlySeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{AutoARIMA, Forecaster, ModelOrder, ARIMA};
    pub use crate::selection::OrderPolicy;
}
