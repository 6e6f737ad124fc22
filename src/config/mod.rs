//! Configuration module.
//!
//! Structured configuration loaded from environment variables (or a TOML
//! file), split by concern: the forecast pipeline and the runtime around it.

mod forecast_config;
mod runtime_config;

pub use forecast_config::{ChartOutputMode, ForecastConfig, MAX_CHART_SIDE};
pub use runtime_config::{DEFAULT_DATABASE_URL, DEFAULT_PERIOD, RuntimeConfig};
