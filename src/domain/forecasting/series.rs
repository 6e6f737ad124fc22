use crate::domain::forecasting::granularity::Granularity;
use crate::domain::forecasting::target::Target;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Gap-free series of aggregated values, one entry per period.
///
/// `labels` is strictly increasing with consecutive periods, and every vector
/// in `values` has the same length as `labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularSeries {
    pub granularity: Granularity,
    pub labels: Vec<NaiveDate>,
    pub values: BTreeMap<Target, Vec<f64>>,
}

impl RegularSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn last_label(&self) -> Option<NaiveDate> {
        self.labels.last().copied()
    }

    pub fn values_for(&self, target: Target) -> Option<&[f64]> {
        self.values.get(&target).map(Vec::as_slice)
    }

    /// `(label, value)` pairs for one target, in time order.
    pub fn history(&self, target: Target) -> Vec<(NaiveDate, f64)> {
        self.values_for(target)
            .map(|values| {
                self.labels
                    .iter()
                    .copied()
                    .zip(values.iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One supervised training example.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub label: NaiveDate,
    pub features: Vec<f64>,
    pub target: f64,
}

/// Feature rows for a single target, in time order.
///
/// `seed` holds the two most recent values of the target (most recent first),
/// which is where iterative projection starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub target: Target,
    pub granularity: Granularity,
    pub rows: Vec<FeatureRow>,
    pub last_label: NaiveDate,
    pub seed: [f64; 2],
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.features.clone()).collect()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.target).collect()
    }
}
