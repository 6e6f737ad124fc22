use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the forecasting pipeline.
///
/// Every variant is returned synchronously to the caller. Nothing is retried:
/// the pipeline is deterministic, so re-running it on the same rows would fail
/// the same way.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("No history found for product '{produto}'")]
    NoData { produto: String },

    #[error("Required column '{column}' is missing from the history source")]
    Schema { column: String },

    #[error("Insufficient history: need at least {needed} {unit}, got {got}")]
    InsufficientHistory {
        needed: usize,
        got: usize,
        unit: &'static str,
    },

    #[error("Invalid forecast period {period}: must be a positive number of periods")]
    InvalidPeriod { period: i64 },

    #[error("Malformed price '{raw}': expected a value like 1.234,56")]
    MalformedPrice { raw: String },

    #[error("Unparseable timestamp '{raw}'")]
    InvalidTimestamp { raw: String },

    #[error("Sum of '{column}' overflows in period {period}")]
    Overflow {
        column: &'static str,
        period: NaiveDate,
    },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("Forecast timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("History source failed: {0}")]
    Source(#[from] anyhow::Error),

    #[error("Forecast worker failed: {0}")]
    Worker(String),
}

impl ForecastError {
    pub fn insufficient_periods(needed: usize, got: usize) -> Self {
        Self::InsufficientHistory {
            needed,
            got,
            unit: "periods",
        }
    }

    pub fn insufficient_rows(needed: usize, got: usize) -> Self {
        Self::InsufficientHistory {
            needed,
            got,
            unit: "feature rows",
        }
    }
}
