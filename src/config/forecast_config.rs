//! Forecast pipeline configuration.
//!
//! Loaded from `FORECAST_*` environment variables or from a TOML file. Both
//! sources fall back to the same defaults.

use crate::domain::forecasting::{Granularity, TargetSelection};
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Largest chart side accepted, in pixels
pub const MAX_CHART_SIDE: u32 = 8000;

/// Where the rendered chart goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChartOutputMode {
    /// PNG bytes returned with the result
    #[default]
    InMemory,
    /// PNG written under `directory`, path returned with the result
    File { directory: PathBuf },
}

/// Pipeline configuration: one struct for every variant of the forecast
/// (daily or monthly, price only or price and quantity, chart in memory or
/// on disk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub granularity: Granularity,
    pub targets: TargetSelection,
    pub chart_output: ChartOutputMode,

    // Validation
    pub folds: usize,

    // Random forest
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub seed: u64,

    // Runtime
    pub timeout_secs: u64,
    /// Longest horizon a caller may request, in periods
    pub max_horizon: u32,

    // Chart
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Monthly,
            targets: TargetSelection::PriceAndQuantity,
            chart_output: ChartOutputMode::InMemory,
            folds: 5,
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
            timeout_secs: 120,
            max_horizon: 3650,
            chart_width: 1000,
            chart_height: 800,
        }
    }
}

impl ForecastConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let chart_output = match lookup("FORECAST_CHART_OUTPUT")
            .unwrap_or_else(|| "in_memory".to_string())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "in_memory" | "memory" => ChartOutputMode::InMemory,
            "file" => ChartOutputMode::File {
                directory: lookup("FORECAST_CHART_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("static/images")),
            },
            other => bail!(
                "Invalid FORECAST_CHART_OUTPUT: {}. Must be 'in_memory' or 'file'",
                other
            ),
        };

        let max_depth = match lookup("FORECAST_MAX_DEPTH") {
            Some(raw) if !raw.trim().is_empty() && raw.trim() != "none" => Some(
                raw.trim()
                    .parse::<u16>()
                    .context("Failed to parse FORECAST_MAX_DEPTH")?,
            ),
            _ => defaults.max_depth,
        };

        let config = Self {
            granularity: parse_var(&lookup, "FORECAST_GRANULARITY", defaults.granularity)?,
            targets: parse_var(&lookup, "FORECAST_TARGETS", defaults.targets)?,
            chart_output,
            folds: parse_var(&lookup, "FORECAST_FOLDS", defaults.folds)?,
            n_trees: parse_var(&lookup, "FORECAST_N_TREES", defaults.n_trees)?,
            max_depth,
            min_samples_split: parse_var(
                &lookup,
                "FORECAST_MIN_SAMPLES_SPLIT",
                defaults.min_samples_split,
            )?,
            seed: parse_var(&lookup, "FORECAST_SEED", defaults.seed)?,
            timeout_secs: parse_var(&lookup, "FORECAST_TIMEOUT_SECS", defaults.timeout_secs)?,
            max_horizon: parse_var(&lookup, "FORECAST_MAX_HORIZON", defaults.max_horizon)?,
            chart_width: parse_var(&lookup, "FORECAST_CHART_WIDTH", defaults.chart_width)?,
            chart_height: parse_var(&lookup, "FORECAST_CHART_HEIGHT", defaults.chart_height)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Failed to parse forecast config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read forecast config {:?}", path))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.folds < 2 {
            bail!("folds must be at least 2, got {}", self.folds);
        }
        if self.n_trees == 0 {
            bail!("n_trees must be positive");
        }
        if self.min_samples_split < 2 {
            bail!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            );
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be positive");
        }
        if self.max_horizon == 0 {
            bail!("max_horizon must be positive");
        }
        if self.chart_width < 100 || self.chart_height < 100 {
            bail!(
                "chart must be at least 100x100 px, got {}x{}",
                self.chart_width,
                self.chart_height
            );
        }
        if self.chart_width > MAX_CHART_SIDE || self.chart_height > MAX_CHART_SIDE {
            bail!(
                "chart must be at most {}x{} px, got {}x{}",
                MAX_CHART_SIDE,
                MAX_CHART_SIDE,
                self.chart_width,
                self.chart_height
            );
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Failed to parse {}='{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ForecastConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ForecastConfig::default());
        assert_eq!(config.folds, 5);
        assert_eq!(config.n_trees, 100);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_overrides() {
        let config = ForecastConfig::from_lookup(lookup_from(&[
            ("FORECAST_GRANULARITY", "daily"),
            ("FORECAST_TARGETS", "price"),
            ("FORECAST_CHART_OUTPUT", "file"),
            ("FORECAST_CHART_DIR", "/tmp/charts"),
            ("FORECAST_FOLDS", "3"),
            ("FORECAST_MAX_DEPTH", "8"),
        ]))
        .unwrap();

        assert_eq!(config.granularity, Granularity::Daily);
        assert_eq!(config.targets, TargetSelection::Price);
        assert_eq!(
            config.chart_output,
            ChartOutputMode::File {
                directory: PathBuf::from("/tmp/charts")
            }
        );
        assert_eq!(config.folds, 3);
        assert_eq!(config.max_depth, Some(8));
    }

    #[test]
    fn test_invalid_value_names_variable() {
        let err = ForecastConfig::from_lookup(lookup_from(&[("FORECAST_FOLDS", "many")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("FORECAST_FOLDS"));
    }

    #[test]
    fn test_rejects_oversized_chart() {
        let result = ForecastConfig::from_lookup(lookup_from(&[
            ("FORECAST_CHART_WIDTH", "40000"),
            ("FORECAST_CHART_HEIGHT", "40000"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_max_horizon_override_and_bounds() {
        let config =
            ForecastConfig::from_lookup(lookup_from(&[("FORECAST_MAX_HORIZON", "24")])).unwrap();
        assert_eq!(config.max_horizon, 24);
        assert!(ForecastConfig::from_lookup(lookup_from(&[("FORECAST_MAX_HORIZON", "0")])).is_err());
    }

    #[test]
    fn test_rejects_single_fold() {
        assert!(ForecastConfig::from_lookup(lookup_from(&[("FORECAST_FOLDS", "1")])).is_err());
    }

    #[test]
    fn test_toml_partial_uses_defaults() {
        let config = ForecastConfig::from_toml_str(
            r#"
            granularity = "daily"
            n_trees = 25

            [chart_output]
            mode = "file"
            directory = "static/images"
            "#,
        )
        .unwrap();

        assert_eq!(config.granularity, Granularity::Daily);
        assert_eq!(config.n_trees, 25);
        assert_eq!(config.folds, 5);
        assert_eq!(
            config.chart_output,
            ChartOutputMode::File {
                directory: PathBuf::from("static/images")
            }
        );
    }
}
