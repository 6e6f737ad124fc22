//! Turns raw stored rows into a gap-free series and lagged feature rows.

use crate::domain::errors::ForecastError;
use crate::domain::forecasting::{
    FeatureRow, FeatureSet, Granularity, HistoryBatch, Observation, RegularSeries, Target,
    TargetSelection,
};
use crate::domain::ml::feature_registry::{LAG_DEPTH, feature_row};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use tracing::debug;

/// Smallest series that still yields one row with a defined lag-2 value.
pub const MIN_PERIODS: usize = LAG_DEPTH + 1;

/// Running totals for one period
#[derive(Debug, Default)]
struct PeriodAccumulator {
    price_sum: Decimal,
    price_count: u32,
    quantity_sum: i64,
    quantity_count: u32,
}

impl PeriodAccumulator {
    fn add(&mut self, obs: &Observation, period: NaiveDate) -> Result<(), ForecastError> {
        let overflow = |target: Target| ForecastError::Overflow {
            column: target.column(),
            period,
        };

        if let Some(price) = obs.price {
            self.price_sum = self
                .price_sum
                .checked_add(price)
                .ok_or_else(|| overflow(Target::Price))?;
            self.price_count += 1;
        }
        if let Some(quantity) = obs.quantity_sold {
            self.quantity_sum = self
                .quantity_sum
                .checked_add(quantity)
                .ok_or_else(|| overflow(Target::Quantity))?;
            self.quantity_count += 1;
        }
        Ok(())
    }

    fn value(&self, target: Target) -> Option<f64> {
        match target {
            Target::Price if self.price_count > 0 => {
                (self.price_sum / Decimal::from(self.price_count)).to_f64()
            }
            Target::Quantity if self.quantity_count > 0 => Some(self.quantity_sum as f64),
            _ => None,
        }
    }
}

pub struct SeriesBuilder {
    granularity: Granularity,
    targets: TargetSelection,
}

impl SeriesBuilder {
    pub fn new(granularity: Granularity, targets: TargetSelection) -> Self {
        Self {
            granularity,
            targets,
        }
    }

    /// Builds the regularised series for every requested target.
    ///
    /// Quantity is summed and price averaged per period. Periods with no value
    /// are linearly interpolated from their neighbours.
    pub fn build(&self, produto: &str, batch: &HistoryBatch) -> Result<RegularSeries, ForecastError> {
        if batch.rows.is_empty() {
            return Err(ForecastError::NoData {
                produto: produto.to_string(),
            });
        }
        self.check_schema(batch)?;

        let mut periods: BTreeMap<NaiveDate, PeriodAccumulator> = BTreeMap::new();
        for raw in &batch.rows {
            let obs = Observation::try_from(raw)?;
            let period = self.granularity.period_of(obs.timestamp);
            periods.entry(period).or_default().add(&obs, period)?;
        }

        let (first, last) = match (periods.keys().next(), periods.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                return Err(ForecastError::NoData {
                    produto: produto.to_string(),
                });
            }
        };

        let labels = self.granularity.labels_between(first, last)?;
        if labels.len() < MIN_PERIODS {
            return Err(ForecastError::insufficient_periods(MIN_PERIODS, labels.len()));
        }

        let mut values = BTreeMap::new();
        for target in self.targets.targets() {
            let sparse: Vec<Option<f64>> = labels
                .iter()
                .map(|label| periods.get(label).and_then(|acc| acc.value(target)))
                .collect();
            let missing = sparse.iter().filter(|v| v.is_none()).count();

            let filled = interpolate_gaps(&sparse).ok_or_else(|| ForecastError::NoData {
                produto: produto.to_string(),
            })?;

            debug!(
                "{} series for {}: {} periods, {} interpolated ({})",
                target,
                produto,
                labels.len(),
                missing,
                target.aggregation()
            );
            values.insert(target, filled);
        }

        Ok(RegularSeries {
            granularity: self.granularity,
            labels,
            values,
        })
    }

    /// Lag-1/lag-2 plus calendar feature rows, one set per target.
    ///
    /// The first `LAG_DEPTH` periods have undefined lags and are dropped.
    pub fn feature_sets(&self, series: &RegularSeries) -> Result<Vec<FeatureSet>, ForecastError> {
        let last_label = series
            .last_label()
            .ok_or_else(|| ForecastError::insufficient_periods(MIN_PERIODS, 0))?;

        if series.len() < MIN_PERIODS {
            return Err(ForecastError::insufficient_periods(MIN_PERIODS, series.len()));
        }

        self.targets
            .targets()
            .into_iter()
            .map(|target| {
                let values = series.values_for(target).ok_or_else(|| ForecastError::Schema {
                    column: target.column().to_string(),
                })?;

                let rows = (LAG_DEPTH..values.len())
                    .map(|t| FeatureRow {
                        label: series.labels[t],
                        features: feature_row(
                            series.granularity,
                            series.labels[t],
                            values[t - 1],
                            values[t - 2],
                        ),
                        target: values[t],
                    })
                    .collect();

                let n = values.len();
                Ok(FeatureSet {
                    target,
                    granularity: series.granularity,
                    rows,
                    last_label,
                    seed: [values[n - 1], values[n - 2]],
                })
            })
            .collect()
    }

    fn check_schema(&self, batch: &HistoryBatch) -> Result<(), ForecastError> {
        let missing = if !batch.columns.date {
            Some("data")
        } else if !batch.columns.price {
            Some(Target::Price.column())
        } else if self.targets.includes_quantity() && !batch.columns.quantity {
            Some(Target::Quantity.column())
        } else {
            None
        };

        match missing {
            Some(column) => Err(ForecastError::Schema {
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Linear interpolation over the period index. Leading and trailing gaps take
/// the nearest known value. Returns `None` when nothing is known.
pub fn interpolate_gaps(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let first = values.iter().position(Option::is_some)?;
    let last = values.iter().rposition(Option::is_some)?;

    let mut result = vec![0.0; values.len()];
    let mut prev_idx = first;
    let mut prev_val = values[first]?;

    for slot in result.iter_mut().take(first + 1) {
        *slot = prev_val;
    }

    for i in (first + 1)..=last {
        if let Some(v) = values[i] {
            let gap = i - prev_idx;
            let slope = (v - prev_val) / gap as f64;
            for j in 1..gap {
                result[prev_idx + j] = prev_val + slope * j as f64;
            }
            result[i] = v;
            prev_idx = i;
            prev_val = v;
        }
    }

    for slot in result.iter_mut().skip(last + 1) {
        *slot = prev_val;
    }

    Some(result)
}
