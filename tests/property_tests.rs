//! Property-based tests for the revenue analysis building blocks.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated yearly data.

use revenue_forecast::core::{
    Forecast, ForecastResult, LabelColumn, RevenueRecord, YearlySeries,
};
use revenue_forecast::features::{acf_profile, pacf_profile};
use revenue_forecast::models::arima::{
    constrain_ar, constrain_ma, difference, integrate, is_invertible, is_stationary,
};
use revenue_forecast::models::{Forecaster, ARIMA};
use revenue_forecast::transform::{aggregate_yearly, merge_yearly, CategoryFilter};
use revenue_forecast::validation::adf_test;
use proptest::prelude::*;

/// Yearly series starting in 1990.
fn make_series(values: &[f64]) -> YearlySeries {
    YearlySeries::new((1990..1990 + values.len() as i32).collect(), values.to_vec()).unwrap()
}

/// Strategy for revenue-like amounts.
/// Adds a small ramp so no series is constant.
fn amounts_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(1.0..1000.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.001;
            }
            v
        })
    })
}

/// Strategy for label-tagged rows spread over a few years.
fn records_strategy() -> impl Strategy<Value = Vec<RevenueRecord>> {
    prop::collection::vec(
        (2000..2012_i32, -500.0..5000.0_f64, prop::bool::ANY, prop::bool::ANY),
        0..60,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(year, amount, upper, keep)| {
                let label = match (keep, upper) {
                    (true, true) => "SALES TAX",
                    (true, false) => "Sales Tax",
                    (false, _) => "PARKING",
                };
                RevenueRecord::new(year, amount).with_level_2_category(label)
            })
            .collect()
    })
}

fn sales_filter() -> CategoryFilter {
    CategoryFilter::new(LabelColumn::Level2Category, ["SALES TAX", "Sales Tax"])
}

// =============================================================================
// Property: differencing shortens by d and integration continues the series
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn differencing_drops_one_value_per_order(
        values in amounts_strategy(3, 40),
        d in 0usize..3
    ) {
        prop_assert_eq!(difference(&values, d).len(), values.len() - d);
    }

    #[test]
    fn integration_recovers_a_continuation(
        history in amounts_strategy(4, 30),
        future in prop::collection::vec(1.0..1000.0_f64, 1..5),
        d in 1usize..3
    ) {
        let extended: Vec<f64> = history.iter().chain(&future).copied().collect();
        let diffs = difference(&extended, d);
        let tail = &diffs[diffs.len() - future.len()..];
        let restored = integrate(tail, &history, d);
        prop_assert_eq!(restored.len(), future.len());
        for (r, f) in restored.iter().zip(&future) {
            prop_assert!((r - f).abs() < 1e-6 * f.abs().max(1.0));
        }
    }
}

// =============================================================================
// Property: aggregation
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn aggregation_is_associative_over_sheets(
        records in records_strategy(),
        split in 0usize..60
    ) {
        let split = split.min(records.len());
        let filter = sales_filter();
        let whole = aggregate_yearly(&records, &filter).unwrap();
        let first = aggregate_yearly(&records[..split], &filter).unwrap();
        let second = aggregate_yearly(&records[split..], &filter).unwrap();
        let merged = merge_yearly([&first, &second]).unwrap();

        prop_assert_eq!(whole.years(), merged.years());
        for (a, b) in whole.values().iter().zip(merged.values()) {
            prop_assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn aggregated_years_are_strictly_increasing(records in records_strategy()) {
        let series = aggregate_yearly(&records, &sales_filter()).unwrap();
        prop_assert!(series.years().windows(2).all(|w| w[0] < w[1]));
        let expected = series.last_year().zip(series.first_year())
            .map(|(last, first)| (last - first + 1) as usize - series.len())
            .unwrap_or(0);
        prop_assert_eq!(series.gaps().len(), expected);
    }
}

// =============================================================================
// Property: statistics stay in range
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn correlation_profiles_are_bounded(
        values in amounts_strategy(6, 60),
        window in 1usize..20
    ) {
        let acf = acf_profile(&values, window).unwrap();
        let pacf = pacf_profile(&values, window).unwrap();
        prop_assert_eq!(acf.nlags(), window.min(values.len() - 1));
        prop_assert!(acf.values.iter().all(|v| v.abs() <= 1.0 + 1e-9));
        prop_assert!(acf.significant_count() <= acf.nlags());
        prop_assert!(pacf.significant_count() <= pacf.nlags());
    }

    #[test]
    fn adf_is_deterministic_with_valid_p_value(values in amounts_strategy(12, 50)) {
        let a = adf_test(&values, None).unwrap();
        let b = adf_test(&values, None).unwrap();
        prop_assert_eq!(a.statistic, b.statistic);
        prop_assert!((0.0..=1.0).contains(&a.p_value));
        prop_assert_eq!(a.rejects_unit_root(0.05), a.p_value <= 0.05);
    }

    #[test]
    fn reparameterization_is_stationary_and_invertible(
        u in prop::collection::vec(-5.0..5.0_f64, 1..5)
    ) {
        prop_assert!(is_stationary(&constrain_ar(&u)));
        prop_assert!(is_invertible(&constrain_ma(&u)));
    }
}

// =============================================================================
// Property: forecasts
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn random_walk_forecast_matches_horizon(
        values in amounts_strategy(8, 40),
        horizon in 1usize..6
    ) {
        let mut model = ARIMA::new(0, 1, 0);
        model.fit(&make_series(&values)).unwrap();
        let forecast = model.predict_with_intervals(horizon, 0.95).unwrap();
        prop_assert_eq!(forecast.horizon(), horizon);

        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        for h in 0..horizon {
            prop_assert!(lower[h] <= forecast.point()[h]);
            prop_assert!(forecast.point()[h] <= upper[h]);
        }
        // Intervals widen with the horizon.
        for h in 1..horizon {
            prop_assert!(upper[h] - lower[h] >= upper[h - 1] - lower[h - 1]);
        }
    }

    #[test]
    fn forecast_years_follow_the_last_year(
        last_year in 1990..2100_i32,
        values in prop::collection::vec(0.0..1e6_f64, 1..6)
    ) {
        let horizon = values.len();
        let result = ForecastResult::from_forecast(last_year, &Forecast::from_values(values)).unwrap();
        let expected: Vec<i32> = (1..=horizon as i32).map(|h| last_year + h).collect();
        prop_assert_eq!(result.years(), expected);
    }
}
