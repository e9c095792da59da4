//! Order selection: the manual estimate read off the correlation profiles,
//! and its resolution against the automatic search.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::features::{acf_profile, pacf_profile, CorrelationProfile};
use crate::models::ModelOrder;

/// Manual `(p, d, q)` from significance counts.
///
/// `p` counts PACF lags outside `±1.96/√n`, `q` counts ACF lags outside the
/// same band, and `d` is the differencing order found by the stationarity
/// analysis.
#[derive(Debug, Clone)]
pub struct ManualOrderEstimate {
    pub order: ModelOrder,
    pub acf: CorrelationProfile,
    pub pacf: CorrelationProfile,
}

impl ManualOrderEstimate {
    pub fn from_profiles(acf: CorrelationProfile, pacf: CorrelationProfile, d: usize) -> Self {
        let order = ModelOrder::new(pacf.significant_count(), d, acf.significant_count());
        Self { order, acf, pacf }
    }
}

/// Compute both profiles of the final differenced series and count
/// significant lags.
pub fn estimate_manual_order(
    series: &[f64],
    lag_window: usize,
    d: usize,
) -> Result<ManualOrderEstimate> {
    let acf = acf_profile(series, lag_window)?;
    let pacf = pacf_profile(series, lag_window)?;
    let estimate = ManualOrderEstimate::from_profiles(acf, pacf, d);
    tracing::info!(
        order = %estimate.order,
        acf_lags = ?estimate.acf.significant_lags(),
        pacf_lags = ?estimate.pacf.significant_lags(),
        "manual order estimated"
    );
    Ok(estimate)
}

/// Which order the final model is fitted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPolicy {
    /// The manual estimate; the analyst stays the arbiter.
    #[default]
    Manual,
    /// The automatic search result.
    Automatic,
    /// An order confirmed by the analyst, e.g. `{ fixed = [0, 1, 0] }`.
    Fixed(ModelOrder),
}

impl fmt::Display for OrderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderPolicy::Manual => f.write_str("manual"),
            OrderPolicy::Automatic => f.write_str("automatic"),
            OrderPolicy::Fixed(order) => write!(f, "fixed {}", order),
        }
    }
}

/// Both estimates and the order actually used.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDecision {
    pub manual: ModelOrder,
    /// `None` when the automatic search could not fit any model.
    pub automatic: Option<ModelOrder>,
    pub chosen: ModelOrder,
    pub policy: OrderPolicy,
    /// True when both estimates are the same order.
    pub agrees: bool,
}

/// Resolve the order to fit according to `policy`.
///
/// Disagreement between the estimates is reported, never reconciled.
pub fn compare_orders(
    manual: ModelOrder,
    automatic: Option<ModelOrder>,
    policy: OrderPolicy,
) -> Result<OrderDecision> {
    let chosen = match policy {
        OrderPolicy::Manual => manual,
        OrderPolicy::Fixed(order) => order,
        OrderPolicy::Automatic => automatic.ok_or_else(|| {
            ForecastError::ModelFit("automatic order search produced no model".into())
        })?,
    };
    let agrees = automatic == Some(manual);

    match automatic {
        Some(auto) if !agrees => tracing::warn!(
            manual = %manual,
            automatic = %auto,
            chosen = %chosen,
            "manual and automatic orders disagree"
        ),
        None => tracing::warn!(
            manual = %manual,
            chosen = %chosen,
            "no automatic order to compare against"
        ),
        _ => {}
    }

    Ok(OrderDecision {
        manual,
        automatic,
        chosen,
        policy,
        agrees,
    })
}
