//! Run configuration.
//!
//! Everything has a default, so an empty file (or no file at all) describes
//! the standard four-category analysis of `Syracuse-Revenue_Piro.xlsx`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::LabelColumn;
use crate::error::{ForecastError, Result};
use crate::models::AutoARIMAConfig;
use crate::selection::OrderPolicy;
use crate::transform::CategoryFilter;
use crate::validation::{DEFAULT_MAX_DIFF, STATIONARITY_SIGNIFICANCE};

/// Default input workbook.
pub const DEFAULT_INPUT: &str = "Syracuse-Revenue_Piro.xlsx";
/// Default y-axis label of the forecast chart.
pub const DEFAULT_AMOUNT_LABEL: &str = "Amount ($)";

/// Top-level configuration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input workbook (`.xlsx`, `.xls`, `.ods`) or `.csv` file.
    pub input: PathBuf,
    /// Where to write the concatenation of all sheets, if anywhere.
    pub consolidated_output: Option<PathBuf>,
    /// Directory for PNG charts; `None` disables plotting.
    pub plot_dir: Option<PathBuf>,
    pub analysis: AnalysisSettings,
    pub categories: Vec<CategoryConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            consolidated_output: None,
            plot_dir: Some(PathBuf::from("plots")),
            analysis: AnalysisSettings::default(),
            categories: default_categories(),
        }
    }
}

/// Statistical settings shared by all categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSettings {
    /// ADF p-value at or below which a series counts as stationary.
    pub significance: f64,
    /// Maximum number of differences in the stationarity loop.
    pub max_diff_order: usize,
    /// ACF/PACF lag window, clamped to `n - 1` of the tested series.
    pub lag_window: usize,
    /// Years to forecast.
    pub horizon: usize,
    /// Coverage of the prediction intervals.
    pub interval_level: f64,
    pub auto: AutoARIMAConfig,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            significance: STATIONARITY_SIGNIFICANCE,
            max_diff_order: DEFAULT_MAX_DIFF,
            lag_window: 14,
            horizon: 2,
            interval_level: 0.95,
            auto: AutoARIMAConfig::default(),
        }
    }
}

/// One revenue category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    pub name: String,
    /// Label column the filter matches against.
    pub column: LabelColumn,
    /// Accepted labels, each casing listed explicitly.
    pub labels: Vec<String>,
    /// Overrides the shared lag window.
    #[serde(default)]
    pub lag_window: Option<usize>,
    #[serde(default)]
    pub order_policy: OrderPolicy,
    #[serde(default = "default_amount_label")]
    pub amount_label: String,
}

fn default_amount_label() -> String {
    DEFAULT_AMOUNT_LABEL.to_string()
}

impl CategoryConfig {
    pub fn new<I, S>(name: impl Into<String>, column: LabelColumn, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            column,
            labels: labels.into_iter().map(Into::into).collect(),
            lag_window: None,
            order_policy: OrderPolicy::default(),
            amount_label: default_amount_label(),
        }
    }

    pub fn with_lag_window(mut self, lag_window: usize) -> Self {
        self.lag_window = Some(lag_window);
        self
    }

    pub fn with_order_policy(mut self, policy: OrderPolicy) -> Self {
        self.order_policy = policy;
        self
    }

    pub fn with_amount_label(mut self, label: impl Into<String>) -> Self {
        self.amount_label = label.into();
        self
    }

    pub fn filter(&self) -> CategoryFilter {
        CategoryFilter::new(self.column, self.labels.iter().cloned())
    }

    /// Lag window for this category.
    pub fn lag_window(&self, settings: &AnalysisSettings) -> usize {
        self.lag_window.unwrap_or(settings.lag_window)
    }
}

/// The four categories of the municipal revenue analysis.
pub fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new(
            "Property Tax",
            LabelColumn::Level2Category,
            ["REAL PROPERTY TAXES", "Real Property Taxes"],
        )
        .with_lag_window(14)
        .with_amount_label("Amount (10s of Millions of $)"),
        CategoryConfig::new(
            "Sales Tax",
            LabelColumn::Level2Category,
            ["SALES TAX DISTRIBUTION", "Sales Tax Distribution"],
        )
        .with_lag_window(14),
        CategoryConfig::new(
            "Building Permits",
            LabelColumn::AccountCodeNarrative,
            [
                "Building And Alteration Permits",
                "Building and Alteration Permits",
            ],
        )
        .with_lag_window(8),
        CategoryConfig::new(
            "Parking Fees",
            LabelColumn::AccountCodeNarrative,
            ["Parking Fees", "PARKING FEES"],
        ),
    ]
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ForecastError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            categories = config.categories.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Check value ranges and category consistency.
    pub fn validate(&self) -> Result<()> {
        let a = &self.analysis;
        if !(a.significance > 0.0 && a.significance < 1.0) {
            return Err(ForecastError::Config(format!(
                "significance must lie in (0, 1), got {}",
                a.significance
            )));
        }
        if !(a.interval_level > 0.0 && a.interval_level < 1.0) {
            return Err(ForecastError::Config(format!(
                "interval_level must lie in (0, 1), got {}",
                a.interval_level
            )));
        }
        if a.horizon == 0 {
            return Err(ForecastError::Config("horizon must be at least 1".into()));
        }
        if a.max_diff_order == 0 || a.auto.max_d == 0 {
            return Err(ForecastError::Config(
                "differencing limits must be at least 1".into(),
            ));
        }
        if self.categories.is_empty() {
            return Err(ForecastError::Config("no categories configured".into()));
        }

        let mut names = HashSet::new();
        for category in &self.categories {
            if !names.insert(category.name.as_str()) {
                return Err(ForecastError::Config(format!(
                    "category '{}' is listed twice",
                    category.name
                )));
            }
            if category.labels.is_empty() {
                return Err(ForecastError::Config(format!(
                    "category '{}' has no labels",
                    category.name
                )));
            }
            if category.lag_window(a) == 0 {
                return Err(ForecastError::Config(format!(
                    "category '{}' has a zero lag window",
                    category.name
                )));
            }
        }
        Ok(())
    }

    /// Keep only the named categories, in configuration order.
    pub fn retain_categories(&mut self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.categories.iter().any(|c| &c.name == *n))
        {
            return Err(ForecastError::Config(format!(
                "unknown category '{}'",
                unknown
            )));
        }
        self.categories.retain(|c| names.contains(&c.name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelOrder;

    #[test]
    fn defaults_describe_four_categories() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Property Tax", "Sales Tax", "Building Permits", "Parking Fees"]
        );
        assert_eq!(config.categories[2].lag_window(&config.analysis), 8);
        assert_eq!(config.categories[3].lag_window(&config.analysis), 14);
        assert_eq!(config.analysis.horizon, 2);
        assert_eq!(config.analysis.significance, 0.05);
    }

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(
            PipelineConfig::from_toml_str("").unwrap(),
            PipelineConfig::default()
        );
    }

    #[test]
    fn parses_full_document() {
        let text = r#"
            input = "revenue.csv"
            consolidated_output = "combined.xlsx"
            plot_dir = "out"

            [analysis]
            significance = 0.01
            max_diff_order = 3
            lag_window = 10
            horizon = 3

            [analysis.auto]
            max_p = 3
            stepwise = false

            [[categories]]
            name = "Parking"
            column = "ACCOUNT_CODE_NARRATIVE"
            labels = ["Parking Fees"]
            order_policy = { fixed = [1, 2, 0] }

            [[categories]]
            name = "Sales"
            column = "LEVEL_2_CATEGORY"
            labels = ["SALES TAX DISTRIBUTION"]
            lag_window = 6
            order_policy = "automatic"
            amount_label = "Dollars"
        "#;
        let config = PipelineConfig::from_toml_str(text).unwrap();
        assert_eq!(config.input, PathBuf::from("revenue.csv"));
        assert_eq!(config.plot_dir, Some(PathBuf::from("out")));
        assert_eq!(config.analysis.max_diff_order, 3);
        assert_eq!(config.analysis.interval_level, 0.95);
        assert_eq!(config.analysis.auto.max_p, 3);
        assert!(!config.analysis.auto.stepwise);
        assert_eq!(config.categories.len(), 2);

        let parking = &config.categories[0];
        assert_eq!(parking.column, LabelColumn::AccountCodeNarrative);
        assert_eq!(
            parking.order_policy,
            OrderPolicy::Fixed(ModelOrder::new(1, 2, 0))
        );
        assert_eq!(parking.amount_label, DEFAULT_AMOUNT_LABEL);
        assert_eq!(parking.lag_window(&config.analysis), 10);

        let sales = &config.categories[1];
        assert_eq!(sales.order_policy, OrderPolicy::Automatic);
        assert_eq!(sales.lag_window(&config.analysis), 6);
        assert_eq!(sales.amount_label, "Dollars");
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            PipelineConfig::from_toml_str("inptu = \"x.xlsx\""),
            Err(ForecastError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("[analysis]\nsignificance = 1.5"),
            Err(ForecastError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("[analysis]\nhorizon = 0"),
            Err(ForecastError::Config(_))
        ));
        let twice = r#"
            [[categories]]
            name = "A"
            column = "LEVEL_2_CATEGORY"
            labels = ["X"]
            [[categories]]
            name = "A"
            column = "LEVEL_2_CATEGORY"
            labels = ["Y"]
        "#;
        assert!(matches!(
            PipelineConfig::from_toml_str(twice),
            Err(ForecastError::Config(msg)) if msg.contains("twice")
        ));
    }

    #[test]
    fn retain_categories_filters_by_name() {
        let mut config = PipelineConfig::default();
        config
            .retain_categories(&["Sales Tax".to_string(), "Property Tax".to_string()])
            .unwrap();
        let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Property Tax", "Sales Tax"]);

        assert!(matches!(
            config.retain_categories(&["Water".to_string()]),
            Err(ForecastError::Config(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            PipelineConfig::load("/nonexistent/revenue.toml"),
            Err(ForecastError::Config(_))
        ));
    }

    #[test]
    fn category_filter_uses_all_labels() {
        let config = PipelineConfig::default();
        let filter = config.categories[0].filter();
        assert_eq!(filter.labels.len(), 2);
        assert_eq!(filter.column, LabelColumn::Level2Category);
    }
}
