//! Core data structures for revenue records, yearly series and forecasts.

mod forecast;
mod record;
mod yearly_series;

pub use forecast::{Forecast, ForecastPoint, ForecastResult};
pub use record::{columns, LabelColumn, RevenueRecord, RevenueTable, Sheet, STANDARD_COLUMNS};
pub use yearly_series::YearlySeries;
