//! Console report and charts.
//!
//! Rendering only reads a [`CategoryReport`]; nothing here changes a
//! computed value.

pub mod plot;

use std::fmt::Write;

use crate::pipeline::{CategoryReport, RunOutcome};
use crate::validation::StationarityStage;

/// Text report of one category.
pub fn render_category(report: &CategoryReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_category(&mut out, report);
    out
}

/// Reports of every completed category followed by the failures.
pub fn render_run(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    for report in &outcome.reports {
        out.push_str(&render_category(report));
        out.push('\n');
    }
    if !outcome.failures.is_empty() {
        out.push_str("Failed categories:\n");
        for failure in &outcome.failures {
            let _ = writeln!(out, "  {}", failure);
        }
    }
    out
}

fn write_category(out: &mut String, report: &CategoryReport) -> std::fmt::Result {
    writeln!(out, "=== {} ===", report.category)?;
    writeln!(
        out,
        "Years {}-{} ({} observations)",
        report.series.first_year().unwrap_or_default(),
        report.series.last_year().unwrap_or_default(),
        report.series.len()
    )?;
    let gaps = report.series.gaps();
    if !gaps.is_empty() {
        writeln!(out, "Missing years: {:?}", gaps)?;
    }

    writeln!(out, "\nStationarity (ADF)")?;
    for stage in &report.stationarity.stages {
        write_stage(out, stage, report.stationarity.significance)?;
    }
    writeln!(
        out,
        "  Differencing order d = {}",
        report.stationarity.d
    )?;

    writeln!(out, "\nCorrelation profiles (band ±{:.4})", report.manual.acf.band)?;
    writeln!(out, "{:>5} {:>10} {:>10}", "lag", "ACF", "PACF")?;
    for (i, (a, p)) in report
        .manual
        .acf
        .values
        .iter()
        .zip(&report.manual.pacf.values)
        .enumerate()
    {
        let lag = i + 1;
        writeln!(
            out,
            "{:>5} {:>9.4}{} {:>9.4}{}",
            lag,
            a,
            marker(report.manual.acf.is_significant(lag)),
            p,
            marker(report.manual.pacf.is_significant(lag))
        )?;
    }

    let decision = &report.decision;
    writeln!(out, "\nOrder selection")?;
    writeln!(out, "  Manual (ACF/PACF):  ARIMA{}", decision.manual)?;
    match decision.automatic {
        Some(order) => writeln!(out, "  Automatic (AIC):    ARIMA{}", order)?,
        None => writeln!(out, "  Automatic (AIC):    no model")?,
    }
    writeln!(
        out,
        "  Agreement:          {}",
        if decision.agrees { "yes" } else { "no" }
    )?;
    writeln!(
        out,
        "  Chosen ({}):  ARIMA{}",
        decision.policy, decision.chosen
    )?;

    if !report.search_trace.is_empty() {
        writeln!(out, "\nAutomatic search ({} candidates)", report.search_trace.len())?;
        for candidate in &report.search_trace {
            let constant = if candidate.with_intercept { "with constant" } else { "" };
            match &candidate.aic {
                Ok(aic) => writeln!(
                    out,
                    "  ARIMA{} {:<13} AIC = {:.2}",
                    candidate.order, constant, aic
                )?,
                Err(err) => writeln!(
                    out,
                    "  ARIMA{} {:<13} failed: {}",
                    candidate.order, constant, err
                )?,
            }
        }
    }

    let summary = &report.summary;
    writeln!(out, "\nARIMA{} fit on {} observations", summary.order, summary.nobs)?;
    writeln!(
        out,
        "{:<10} {:>14} {:>12} {:>8} {:>8}",
        "", "coef", "std err", "z", "P>|z|"
    )?;
    writeln!(out, "{:-<56}", "")?;
    for coef in &summary.coefficients {
        writeln!(
            out,
            "{:<10} {:>14.4} {:>12.4} {:>8.3} {:>8.3}",
            coef.name,
            coef.estimate,
            coef.std_error,
            coef.z_value(),
            coef.p_value()
        )?;
    }
    writeln!(out, "{:-<56}", "")?;
    writeln!(out, "Log likelihood {:>12.3}", summary.log_likelihood)?;
    writeln!(out, "AIC            {:>12.3}", summary.aic)?;
    writeln!(out, "BIC            {:>12.3}", summary.bic)?;
    writeln!(out, "AICc           {:>12.3}", summary.aicc)?;
    let diag = &summary.diagnostics;
    writeln!(
        out,
        "Ljung-Box (L1) Q {:.3} (p {:.3}), Jarque-Bera {:.3} (p {:.3}), H {:.3} (p {:.3})",
        diag.ljung_box.statistic,
        diag.ljung_box.p_value,
        diag.jarque_bera.statistic,
        diag.jarque_bera.p_value,
        diag.heteroskedasticity.statistic,
        diag.heteroskedasticity.p_value
    )?;

    writeln!(out, "\nForecast")?;
    writeln!(
        out,
        "{:>6} {:>16} {:>16} {:>16}",
        "year", "lower", report.amount_label, "upper"
    )?;
    for point in report.forecast.points() {
        writeln!(
            out,
            "{:>6} {:>16.2} {:>16.2} {:>16.2}",
            point.year,
            point.lower.unwrap_or(f64::NAN),
            point.amount,
            point.upper.unwrap_or(f64::NAN)
        )?;
    }
    Ok(())
}

fn write_stage(out: &mut String, stage: &StationarityStage, significance: f64) -> std::fmt::Result {
    let r = &stage.result;
    let cv = &r.critical_values;
    writeln!(
        out,
        "  d = {}: ADF {:.4}, p-value {:.4}, lags {}, nobs {} -> {}",
        stage.order,
        r.statistic,
        r.p_value,
        r.lags,
        r.nobs,
        if r.rejects_unit_root(significance) {
            "stationary"
        } else {
            "non-stationary"
        }
    )?;
    writeln!(
        out,
        "         critical values 1%: {:.4}, 5%: {:.4}, 10%: {:.4}",
        cv.cv_1pct, cv.cv_5pct, cv.cv_10pct
    )
}

fn marker(significant: bool) -> char {
    if significant {
        '*'
    } else {
        ' '
    }
}
