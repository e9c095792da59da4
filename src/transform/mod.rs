//! Row filtering and yearly aggregation.
//!
//! # Example
//!
//! ```
//! use revenue_forecast::core::{LabelColumn, RevenueRecord};
//! use revenue_forecast::transform::{aggregate_yearly, CategoryFilter};
//!
//! let records = vec![
//!     RevenueRecord::new(2020, 10.0).with_level_2_category("SALES TAX"),
//!     RevenueRecord::new(2020, 5.0).with_level_2_category("Sales Tax"),
//!     RevenueRecord::new(2021, 7.0).with_level_2_category("PARKING"),
//! ];
//! let filter = CategoryFilter::new(LabelColumn::Level2Category, ["SALES TAX", "Sales Tax"]);
//!
//! let series = aggregate_yearly(&records, &filter).unwrap();
//! assert_eq!(series.years(), &[2020]);
//! assert_eq!(series.values(), &[15.0]);
//! ```

pub mod aggregate;
pub mod filter;

pub use aggregate::{aggregate_table, aggregate_yearly, merge_yearly};
pub use filter::CategoryFilter;
