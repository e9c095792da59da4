//! PNG charts rendered with plotters.
//!
//! Chart failures are reported as [`ForecastError::Plotting`]; the batch
//! entry point [`plot_category`] logs them and carries on.

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::core::YearlySeries;
use crate::error::{ForecastError, Result};
use crate::features::CorrelationProfile;
use crate::pipeline::CategoryReport;
use crate::validation::StationarityStage;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;

fn plotting<E: std::fmt::Display>(err: E) -> ForecastError {
    ForecastError::Plotting(err.to_string())
}

/// `[min, max]` of `values` widened by 5%, never empty.
fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> Result<(f64, f64)> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return Err(ForecastError::Plotting("nothing to draw".into()));
    }
    let margin = if max > min {
        (max - min) * 0.05
    } else {
        min.abs().max(1.0) * 0.05
    };
    Ok((min - margin, max + margin))
}

fn file_stem(category: &str) -> String {
    category
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Line plot of one stationarity stage against its calendar years.
pub fn plot_stage(
    path: &Path,
    category: &str,
    years: &[i32],
    stage: &StationarityStage,
) -> Result<()> {
    // Differencing drops the leading years.
    let years = years.get(stage.order..).unwrap_or(&[]);
    let points: Vec<(f64, f64)> = years
        .iter()
        .zip(&stage.series)
        .map(|(&y, &v)| (y as f64, v))
        .collect();
    let (x_min, x_max) = padded_range(points.iter().map(|p| p.0))?;
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1))?;

    let title = if stage.order == 0 {
        format!("{} (original series)", category)
    } else {
        format!("{} (difference order {})", category, stage.order)
    };

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plotting)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plotting)?;
    chart
        .configure_mesh()
        .x_desc("Year")
        .x_label_formatter(&|x| format!("{:.0}", x))
        .draw()
        .map_err(plotting)?;
    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
        .map_err(plotting)?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 3, BLUE.filled())))
        .map_err(plotting)?;
    root.present().map_err(plotting)?;
    Ok(())
}

/// Stem plot of a correlation profile with its `±band` lines.
pub fn plot_correlation(path: &Path, title: &str, profile: &CorrelationProfile) -> Result<()> {
    let nlags = profile.nlags();
    if nlags == 0 {
        return Err(ForecastError::Plotting("empty correlation profile".into()));
    }
    let (y_min, y_max) = padded_range(
        profile
            .values
            .iter()
            .copied()
            .chain([profile.band, -profile.band, 0.0]),
    )?;
    let x_range = 0.0..(nlags as f64 + 1.0);

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plotting)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_min..y_max)
        .map_err(plotting)?;
    chart
        .configure_mesh()
        .x_desc("Lag")
        .x_label_formatter(&|x| format!("{:.0}", x))
        .draw()
        .map_err(plotting)?;

    chart
        .draw_series(profile.values.iter().enumerate().map(|(i, &v)| {
            let lag = (i + 1) as f64;
            PathElement::new(vec![(lag, 0.0), (lag, v)], BLUE.stroke_width(2))
        }))
        .map_err(plotting)?;
    chart
        .draw_series(
            profile
                .values
                .iter()
                .enumerate()
                .map(|(i, &v)| Circle::new(((i + 1) as f64, v), 4, BLUE.filled())),
        )
        .map_err(plotting)?;
    for level in [profile.band, -profile.band] {
        chart
            .draw_series(LineSeries::new(
                vec![(0.0, level), (nlags as f64 + 1.0, level)],
                RED.mix(0.6),
            ))
            .map_err(plotting)?;
    }
    chart
        .draw_series(LineSeries::new(
            vec![(0.0, 0.0), (nlags as f64 + 1.0, 0.0)],
            &BLACK,
        ))
        .map_err(plotting)?;
    root.present().map_err(plotting)?;
    Ok(())
}

/// History as a blue line with circles and the forecast as red crosses.
pub fn plot_forecast(
    path: &Path,
    category: &str,
    amount_label: &str,
    history: &YearlySeries,
    forecast: &[(i32, f64)],
) -> Result<()> {
    let historical: Vec<(f64, f64)> = history.iter().map(|(y, v)| (y as f64, v)).collect();
    let predicted: Vec<(f64, f64)> = forecast.iter().map(|&(y, v)| (y as f64, v)).collect();
    let all = || historical.iter().chain(&predicted);
    let (x_min, x_max) = padded_range(all().map(|p| p.0))?;
    let (y_min, y_max) = padded_range(all().map(|p| p.1))?;

    let title = format!(
        "{} Revenue Forecast for Next {} Years",
        category,
        predicted.len()
    );

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plotting)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plotting)?;
    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc(amount_label)
        .x_label_formatter(&|x| format!("{:.0}", x))
        .draw()
        .map_err(plotting)?;

    chart
        .draw_series(LineSeries::new(historical.iter().copied(), &BLUE))
        .map_err(plotting)?
        .label("Historical")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart
        .draw_series(historical.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))
        .map_err(plotting)?;
    chart
        .draw_series(
            predicted
                .iter()
                .map(|&p| Cross::new(p, 7, RED.stroke_width(3))),
        )
        .map_err(plotting)?
        .label("Forecast")
        .legend(|(x, y)| Cross::new((x + 10, y), 5, RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plotting)?;
    root.present().map_err(plotting)?;
    Ok(())
}

/// Render every chart of `report` into `dir`, returning the files written.
///
/// A chart that fails is logged and skipped.
pub fn plot_category(report: &CategoryReport, dir: &Path) -> Vec<PathBuf> {
    let stem = file_stem(&report.category);
    let mut jobs: Vec<(PathBuf, Box<dyn Fn(&Path) -> Result<()> + '_>)> = Vec::new();

    for stage in &report.stationarity.stages {
        jobs.push((
            dir.join(format!("{}_d{}.png", stem, stage.order)),
            Box::new(move |path: &Path| plot_stage(path, &report.category, report.series.years(), stage)),
        ));
    }
    let acf_title = format!("{} ACF (d = {})", report.category, report.stationarity.d);
    let pacf_title = format!("{} PACF (d = {})", report.category, report.stationarity.d);
    jobs.push((
        dir.join(format!("{}_acf.png", stem)),
        Box::new(move |path: &Path| plot_correlation(path, &acf_title, &report.manual.acf)),
    ));
    jobs.push((
        dir.join(format!("{}_pacf.png", stem)),
        Box::new(move |path: &Path| plot_correlation(path, &pacf_title, &report.manual.pacf)),
    ));
    let forecast: Vec<(i32, f64)> = report
        .forecast
        .points()
        .iter()
        .map(|p| (p.year, p.amount))
        .collect();
    jobs.push((
        dir.join(format!("{}_forecast.png", stem)),
        Box::new(move |path: &Path| {
            plot_forecast(
                path,
                &report.category,
                &report.amount_label,
                &report.series,
                &forecast,
            )
        }),
    ));

    let mut written = Vec::new();
    for (path, draw) in jobs {
        match draw(&path) {
            Ok(()) => written.push(path),
            Err(err) => tracing::warn!(
                category = %report.category,
                path = %path.display(),
                error = %err,
                "chart not rendered"
            ),
        }
    }
    written
}
