//! Runtime settings for the binaries: where the history lives and the
//! horizon used when the caller does not give one.

use anyhow::{Context, Result, bail};
use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/produtos.db";
pub const DEFAULT_PERIOD: i64 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub database_url: String,
    pub default_period: i64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            default_period: DEFAULT_PERIOD,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_period = match lookup("FORECAST_DEFAULT_PERIOD") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .context("Failed to parse FORECAST_DEFAULT_PERIOD")?,
            None => DEFAULT_PERIOD,
        };
        if default_period <= 0 {
            bail!(
                "FORECAST_DEFAULT_PERIOD must be positive, got {}",
                default_period
            );
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            default_period,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_defaults() {
        let config = RuntimeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.default_period, 12);
    }

    #[test]
    fn test_runtime_rejects_non_positive_period() {
        let result = RuntimeConfig::from_lookup(|key| {
            (key == "FORECAST_DEFAULT_PERIOD").then(|| "0".to_string())
        });
        assert!(result.is_err());
    }
}
