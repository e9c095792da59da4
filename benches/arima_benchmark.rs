//! Benchmarks for stationarity testing, ARIMA estimation and order search
//! on yearly-sized series.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use revenue_forecast::core::YearlySeries;
use revenue_forecast::models::{AutoARIMA, Forecaster, ARIMA};
use revenue_forecast::validation::{adf_test, difference_until_stationary, kpss_test};

fn generate_revenue(n: usize) -> Vec<f64> {
    let mut level = 1000.0;
    (0..n)
        .map(|i| {
            level += 20.0 + 35.0 * (i as f64 * 1.7).sin();
            level
        })
        .collect()
}

fn yearly(values: &[f64]) -> YearlySeries {
    YearlySeries::new((1990..1990 + values.len() as i32).collect(), values.to_vec()).unwrap()
}

fn bench_stationarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("stationarity");

    for size in [15, 30, 60, 120].iter() {
        let values = generate_revenue(*size);

        group.bench_with_input(BenchmarkId::new("ADF", size), size, |b, _| {
            b.iter(|| adf_test(black_box(&values), None))
        });

        group.bench_with_input(BenchmarkId::new("KPSS", size), size, |b, _| {
            b.iter(|| kpss_test(black_box(&values), None))
        });

        group.bench_with_input(BenchmarkId::new("difference_until_stationary", size), size, |b, _| {
            b.iter(|| difference_until_stationary(black_box(&values), 2, 0.05))
        });
    }

    group.finish();
}

fn bench_arima_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("arima_fit");

    for size in [15, 30, 60].iter() {
        let series = yearly(&generate_revenue(*size));

        for (p, d, q) in [(0, 1, 0), (1, 1, 0), (1, 1, 1), (2, 1, 2)] {
            let label = format!("ARIMA({},{},{})", p, d, q);
            group.bench_with_input(BenchmarkId::new(label, size), size, |b, _| {
                b.iter(|| {
                    let mut model = ARIMA::new(p, d, q);
                    model.fit(black_box(&series)).ok();
                    model
                })
            });
        }
    }

    group.finish();
}

fn bench_auto_arima(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_arima");
    group.sample_size(10);

    for size in [15, 30].iter() {
        let series = yearly(&generate_revenue(*size));

        group.bench_with_input(BenchmarkId::new("stepwise", size), size, |b, _| {
            b.iter(|| {
                let mut auto = AutoARIMA::new();
                auto.fit(black_box(&series)).ok();
                auto.selected_order()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_stationarity, bench_arima_fit, bench_auto_arima);
criterion_main!(benches);
