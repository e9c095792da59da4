use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revenue_forecast::config::PipelineConfig;
use revenue_forecast::pipeline;
use revenue_forecast::report::render_run;

#[derive(Debug, Parser)]
#[command(name = "revenue-forecast", version, about)]
struct Args {
    /// TOML configuration file. Built-in defaults are used without one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input workbook (.xlsx/.xls/.ods) or .csv file.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Only run the named category. May be repeated.
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Directory for PNG charts.
    #[arg(long)]
    plot_dir: Option<PathBuf>,

    /// Also write all sheets concatenated into this workbook.
    #[arg(long)]
    consolidate: Option<PathBuf>,

    /// Years to forecast.
    #[arg(long)]
    horizon: Option<usize>,

    /// Skip chart rendering.
    #[arg(long)]
    no_plots: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(dir) = self.plot_dir {
            config.plot_dir = Some(dir);
        }
        if self.no_plots {
            config.plot_dir = None;
        }
        if let Some(path) = self.consolidate {
            config.consolidated_output = Some(path);
        }
        if let Some(horizon) = self.horizon {
            config.analysis.horizon = horizon;
        }
        config.retain_categories(&self.categories)?;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Args::parse().into_config()?;
    let outcome = pipeline::run(&config)
        .with_context(|| format!("processing {}", config.input.display()))?;

    print!("{}", render_run(&outcome));

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(failed = outcome.failures.len(), "some categories failed");
        Ok(ExitCode::FAILURE)
    }
}
