use crate::domain::forecasting::granularity::Granularity;
use crate::domain::forecasting::target::Target;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One future period in the forecast table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
}

/// Out-of-sample error estimate for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    pub target: Target,
    /// Mean of per-fold mean absolute error, rounded to 2 places
    pub mae: f64,
    /// Folds actually used after auto-reduction
    pub folds: usize,
}

/// Rendered chart, either kept in memory or written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartArtifact {
    Png(Vec<u8>),
    File(PathBuf),
}

impl ChartArtifact {
    pub fn png_bytes(&self) -> Option<&[u8]> {
        match self {
            ChartArtifact::Png(bytes) => Some(bytes),
            ChartArtifact::File(_) => None,
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ChartArtifact::Png(_) => None,
            ChartArtifact::File(path) => Some(path),
        }
    }
}

/// Complete output of one forecast request.
#[derive(Debug, Clone)]
pub struct ForecastResult {
    pub produto: String,
    pub granularity: Granularity,
    pub rows: Vec<ForecastRow>,
    pub reports: Vec<TargetReport>,
    pub chart: ChartArtifact,
}

impl ForecastResult {
    pub fn mae(&self, target: Target) -> Option<f64> {
        self.reports
            .iter()
            .find(|r| r.target == target)
            .map(|r| r.mae)
    }

    /// Predicted values for one target, in date order.
    pub fn predictions(&self, target: Target) -> Vec<(NaiveDate, f64)> {
        self.rows
            .iter()
            .filter_map(|row| match target {
                Target::Price => Some((row.date, row.price)),
                Target::Quantity => row.quantity.map(|q| (row.date, q)),
            })
            .collect()
    }
}
