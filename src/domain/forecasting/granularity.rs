use crate::domain::errors::ForecastError;
use anyhow::{Result, anyhow};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of one period in the regularised series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    /// Label of the period containing `date`.
    ///
    /// Monthly periods are labelled by the last day of the month, daily
    /// periods by the date itself.
    pub fn period_of(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Monthly => month_end(date).unwrap_or(date),
        }
    }

    /// Returns the label `n` periods after `label`.
    pub fn advance(&self, label: NaiveDate, n: u32) -> Result<NaiveDate, ForecastError> {
        let next = match self {
            Granularity::Daily => label.checked_add_days(Days::new(u64::from(n))),
            Granularity::Monthly => label
                .with_day(1)
                .and_then(|first| first.checked_add_months(Months::new(n)))
                .and_then(month_end),
        };

        next.ok_or_else(|| ForecastError::InvalidTimestamp {
            raw: format!("{} + {} {}", label, n, self.unit()),
        })
    }

    /// Every period label from `first` to `last` inclusive.
    pub fn labels_between(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<NaiveDate>, ForecastError> {
        let mut labels = Vec::new();
        let mut current = self.period_of(first);
        let last = self.period_of(last);

        while current <= last {
            labels.push(current);
            current = self.advance(current, 1)?;
        }

        Ok(labels)
    }

    /// Calendar attributes for a period label, in feature order.
    pub fn calendar_features(&self, label: NaiveDate) -> Vec<f64> {
        match self {
            Granularity::Monthly => vec![f64::from(label.year()), f64::from(label.month())],
            Granularity::Daily => vec![
                f64::from(label.year()),
                f64::from(label.month()),
                f64::from(label.weekday().num_days_from_monday()),
            ],
        }
    }

    /// Plural unit name used in log lines and error messages
    pub fn unit(&self) -> &'static str {
        match self {
            Granularity::Daily => "days",
            Granularity::Monthly => "months",
        }
    }
}

fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Daily => write!(f, "daily"),
            Granularity::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Granularity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" | "day" => Ok(Granularity::Daily),
            "monthly" | "m" | "month" => Ok(Granularity::Monthly),
            _ => Err(anyhow!(
                "Invalid granularity: {}. Must be 'daily' or 'monthly'",
                s
            )),
        }
    }
}
