//! Per-category analysis pipeline.
//!
//! Each configured category runs through
//! `Aggregate → Test → [Difference → Test]* → SelectOrder → Fit → Forecast`
//! against one shared, read-only [`RevenueTable`]. A failure ends that
//! category only and is returned as a [`PipelineError`] naming the stage.

use std::path::Path;

use crate::config::{AnalysisSettings, CategoryConfig, PipelineConfig};
use crate::core::{ForecastResult, RevenueTable, YearlySeries};
use crate::error::{ForecastError, PipelineError, Result, Stage};
use crate::io::{read_workbook, write_consolidated};
use crate::models::arima::{Candidate, ModelSummary};
use crate::models::{AutoARIMA, Forecaster, ARIMA};
use crate::report::plot::plot_category;
use crate::selection::{compare_orders, estimate_manual_order, ManualOrderEstimate, OrderDecision};
use crate::transform::aggregate_table;
use crate::validation::{difference_until_stationary, StationarityAnalysis};

/// Everything computed for one category.
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub category: String,
    /// Y-axis label of the forecast chart.
    pub amount_label: String,
    pub series: YearlySeries,
    pub stationarity: StationarityAnalysis,
    pub manual: ManualOrderEstimate,
    /// Candidates of the automatic search, best first. Kept even when the
    /// search found no model.
    pub search_trace: Vec<Candidate>,
    pub decision: OrderDecision,
    pub summary: ModelSummary,
    pub forecast: ForecastResult,
}

/// Outcome of a multi-category run.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub reports: Vec<CategoryReport>,
    pub failures: Vec<PipelineError>,
}

impl RunOutcome {
    /// True when every category completed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

fn at(category: &str, stage: Stage) -> impl Fn(ForecastError) -> PipelineError + '_ {
    move |source| PipelineError::new(category, stage, source)
}

/// Run one category against `table`.
pub fn run_category(
    table: &RevenueTable,
    category: &CategoryConfig,
    settings: &AnalysisSettings,
) -> std::result::Result<CategoryReport, PipelineError> {
    let name = category.name.as_str();

    let series = aggregate_table(table, &category.filter()).map_err(at(name, Stage::Aggregate))?;
    if series.is_empty() {
        return Err(PipelineError::new(
            name,
            Stage::Aggregate,
            ForecastError::EmptySeries {
                category: category.name.clone(),
            },
        ));
    }
    let gaps = series.gaps();
    if !gaps.is_empty() {
        tracing::warn!(category = name, gaps = ?gaps, "yearly series has missing years");
    }
    tracing::info!(
        category = name,
        years = series.len(),
        first = ?series.first_year(),
        last = ?series.last_year(),
        "aggregated yearly series"
    );

    let stationarity = difference_until_stationary(
        series.values(),
        settings.max_diff_order,
        settings.significance,
    )
    .map_err(at(name, Stage::Test))?;
    tracing::info!(category = name, d = stationarity.d, "stationarity reached");

    let manual = estimate_manual_order(
        stationarity.final_series(),
        category.lag_window(settings),
        stationarity.d,
    )
    .map_err(at(name, Stage::SelectOrder))?;

    let mut auto = AutoARIMA::with_config(settings.auto.clone());
    let automatic = match auto.fit_values(series.values()) {
        Ok(()) => auto.selected_order(),
        Err(err) => {
            tracing::warn!(category = name, error = %err, "automatic order search failed");
            None
        }
    };
    let decision = compare_orders(manual.order, automatic, category.order_policy)
        .map_err(at(name, Stage::SelectOrder))?;

    let mut model = ARIMA::from_order(decision.chosen);
    model.fit(&series).map_err(at(name, Stage::Fit))?;
    let summary = model.summary().map_err(at(name, Stage::Fit))?;
    tracing::info!(
        category = name,
        order = %decision.chosen,
        aic = summary.aic,
        sigma2 = summary.sigma2,
        "model fitted"
    );

    let forecast = model
        .predict_with_intervals(settings.horizon, settings.interval_level)
        .and_then(|f| {
            let last_year = series.last_year().ok_or(ForecastError::EmptyData)?;
            ForecastResult::from_forecast(last_year, &f)
        })
        .map_err(at(name, Stage::Forecast))?;
    tracing::info!(
        category = name,
        years = ?forecast.years(),
        amounts = ?forecast.amounts(),
        "forecast produced"
    );

    Ok(CategoryReport {
        category: category.name.clone(),
        amount_label: category.amount_label.clone(),
        series,
        stationarity,
        manual,
        search_trace: auto.trace().to_vec(),
        decision,
        summary,
        forecast,
    })
}

/// Run every configured category. Categories are independent.
pub fn run_all(table: &RevenueTable, config: &PipelineConfig) -> RunOutcome {
    let mut outcome = RunOutcome::default();
    for category in &config.categories {
        tracing::info!(category = %category.name, "starting category");
        match run_category(table, category, &config.analysis) {
            Ok(report) => outcome.reports.push(report),
            Err(err) => {
                tracing::error!(category = %err.category, stage = %err.stage, error = %err.source, "category failed");
                outcome.failures.push(err);
            }
        }
    }
    outcome
}

/// Load the input, optionally write the consolidated table, run every
/// category and render charts into `config.plot_dir`.
///
/// # Errors
/// Only loading and consolidation are fatal to the whole run; category
/// failures are collected in the returned [`RunOutcome`].
pub fn run(config: &PipelineConfig) -> Result<RunOutcome> {
    let table = read_workbook(&config.input)?;
    if let Some(path) = &config.consolidated_output {
        write_consolidated(&table, path)?;
    }

    let outcome = run_all(&table, config);
    if let Some(dir) = &config.plot_dir {
        render_plots(&outcome, dir);
    }
    Ok(outcome)
}

fn render_plots(outcome: &RunOutcome, dir: &Path) {
    if let Err(err) = std::fs::create_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), error = %err, "cannot create plot directory");
        return;
    }
    for report in &outcome.reports {
        let written = plot_category(report, dir);
        tracing::info!(category = %report.category, charts = written.len(), "charts rendered");
    }
}
