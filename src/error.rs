//! Error types for the revenue analysis pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading, testing, fitting or reporting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// The input file could not be opened, read or written.
    #[error("i/o error: {0}")]
    Io(String),

    /// A required column is absent from a sheet.
    #[error("sheet '{sheet}' is missing required column {column}")]
    MissingColumn { sheet: String, column: String },

    /// A cell could not be interpreted as the column's type.
    #[error("sheet '{sheet}' row {row}: column {column} has malformed value '{value}'")]
    MalformedInput {
        sheet: String,
        row: usize,
        column: String,
        value: String,
    },

    /// No rows matched the category filter.
    #[error("no rows matched category '{category}'")]
    EmptySeries { category: String },

    /// The ADF threshold was not met within the allowed differencing order.
    #[error("could not achieve stationarity within d = {max_d} (last p-value {p_value:.4})")]
    InsufficientStationarity { max_d: usize, p_value: f64 },

    /// Model estimation failed (non-convergence, invalid order, degenerate likelihood).
    #[error("model fit failed: {0}")]
    ModelFit(String),

    /// Rendering a chart failed. Never fatal for a pipeline run.
    #[error("plotting failed: {0}")]
    Plotting(String),

    /// Configuration could not be parsed or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

/// Stage of a category pipeline, used to give errors their context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Aggregate,
    Test,
    SelectOrder,
    Fit,
    Forecast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Aggregate => "aggregate",
            Stage::Test => "stationarity test",
            Stage::SelectOrder => "order selection",
            Stage::Fit => "model fit",
            Stage::Forecast => "forecast",
        };
        f.write_str(name)
    }
}

/// A fatal failure of one category's pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("category '{category}' failed during {stage}: {source}")]
pub struct PipelineError {
    pub category: String,
    pub stage: Stage,
    #[source]
    pub source: ForecastError,
}

impl PipelineError {
    pub fn new(category: impl Into<String>, stage: Stage, source: ForecastError) -> Self {
        Self {
            category: category.into(),
            stage,
            source,
        }
    }
}
