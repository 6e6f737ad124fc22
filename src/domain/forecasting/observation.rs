use crate::domain::errors::ForecastError;
use crate::domain::forecasting::price::normalize_price;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row as stored by the data-collection side, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawObservation {
    pub data: String,
    pub preco: Option<String>,
    pub quantidade_vendida: Option<i64>,
}

/// Which optional columns the source table actually has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPresence {
    pub date: bool,
    pub price: bool,
    pub quantity: bool,
}

impl ColumnPresence {
    pub fn all() -> Self {
        Self {
            date: true,
            price: true,
            quantity: true,
        }
    }
}

/// Every stored row for one product, plus the shape of the table they came from.
#[derive(Debug, Clone)]
pub struct HistoryBatch {
    pub columns: ColumnPresence,
    pub rows: Vec<RawObservation>,
}

impl HistoryBatch {
    pub fn new(columns: ColumnPresence, rows: Vec<RawObservation>) -> Self {
        Self { columns, rows }
    }
}

/// A parsed historical record.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDate,
    pub price: Option<Decimal>,
    pub quantity_sold: Option<i64>,
}

impl TryFrom<&RawObservation> for Observation {
    type Error = ForecastError;

    fn try_from(raw: &RawObservation) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamp: parse_timestamp(&raw.data)?,
            price: raw.preco.as_deref().map(normalize_price).transpose()?,
            quantity_sold: raw.quantidade_vendida,
        })
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parses the stored `data` column into a calendar date.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDate, ForecastError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }

    Err(ForecastError::InvalidTimestamp {
        raw: raw.to_string(),
    })
}
