//! Iterative multi-step projection.
//!
//! Each step predicts one period ahead from the two most recent values in a
//! rolling lag buffer, then pushes its own (rounded) prediction into the
//! buffer. From step 2 on the lags are predictions rather than observations,
//! so error compounds with the horizon.

use crate::application::ml::predictor::TargetPredictor;
use crate::domain::errors::ForecastError;
use crate::domain::forecasting::{FeatureSet, Granularity};
use crate::domain::ml::feature_registry::feature_row;
use chrono::NaiveDate;

/// Upper bound on steps reserved up front; longer runs grow as they go
const PREALLOCATED_STEPS: u32 = 1024;

/// Rounds to 2 decimal places, half away from zero.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The two most recent values of a target, most recent first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagBuffer {
    lag_1: f64,
    lag_2: f64,
}

impl LagBuffer {
    pub fn new(lag_1: f64, lag_2: f64) -> Self {
        Self { lag_1, lag_2 }
    }

    pub fn lag_1(&self) -> f64 {
        self.lag_1
    }

    pub fn lag_2(&self) -> f64 {
        self.lag_2
    }

    /// Shifts `value` in as the new lag-1.
    pub fn push(&mut self, value: f64) {
        self.lag_2 = self.lag_1;
        self.lag_1 = value;
    }
}

/// Output of one projection step.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedStep {
    /// 1-based step index
    pub step: u32,
    pub date: NaiveDate,
    pub features: Vec<f64>,
    pub value: f64,
}

/// Projection state: origin period, lag buffer and step index.
pub struct Projection<'a, P: TargetPredictor + ?Sized> {
    predictor: &'a P,
    granularity: Granularity,
    origin: NaiveDate,
    buffer: LagBuffer,
    step: u32,
    horizon: u32,
}

impl<'a, P: TargetPredictor + ?Sized> Projection<'a, P> {
    pub fn new(
        predictor: &'a P,
        granularity: Granularity,
        origin: NaiveDate,
        buffer: LagBuffer,
        horizon: u32,
    ) -> Self {
        Self {
            predictor,
            granularity,
            origin,
            buffer,
            step: 0,
            horizon,
        }
    }

    /// Seeds the projection from the end of a feature set.
    pub fn from_feature_set(predictor: &'a P, set: &FeatureSet, horizon: u32) -> Self {
        Self::new(
            predictor,
            set.granularity,
            set.last_label,
            LagBuffer::new(set.seed[0], set.seed[1]),
            horizon,
        )
    }

    pub fn buffer(&self) -> LagBuffer {
        self.buffer
    }

    /// Steps completed so far
    pub fn steps_taken(&self) -> u32 {
        self.step
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.horizon
    }

    /// Runs one step, or returns `None` once the horizon is reached.
    pub fn advance(&mut self) -> Result<Option<ProjectedStep>, ForecastError> {
        if self.is_finished() {
            return Ok(None);
        }

        let step = self.step + 1;
        let date = self.granularity.advance(self.origin, step)?;
        let features = feature_row(
            self.granularity,
            date,
            self.buffer.lag_1(),
            self.buffer.lag_2(),
        );
        let value = round_to_cents(self.predictor.predict(&features)?);

        self.buffer.push(value);
        self.step = step;

        Ok(Some(ProjectedStep {
            step,
            date,
            features,
            value,
        }))
    }

    /// Runs the remaining steps.
    pub fn run(mut self) -> Result<Vec<ProjectedStep>, ForecastError> {
        let remaining = self.horizon.saturating_sub(self.step);
        let mut steps = Vec::with_capacity(remaining.min(PREALLOCATED_STEPS) as usize);
        while let Some(step) = self.advance()? {
            steps.push(step);
        }
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts lag-1 plus a fixed drift.
    struct DriftPredictor {
        drift: f64,
    }

    impl TargetPredictor for DriftPredictor {
        fn predict(&self, features: &[f64]) -> Result<f64, ForecastError> {
            Ok(features[features.len() - 2] + self.drift)
        }

        fn name(&self) -> &str {
            "drift"
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(1.234), 1.23);
        assert_eq!(round_to_cents(1.235000001), 1.24);
        assert_eq!(round_to_cents(-0.004), 0.0);
    }

    #[test]
    fn test_lag_buffer_shift() {
        let mut buffer = LagBuffer::new(10.0, 9.0);
        buffer.push(11.0);
        assert_eq!(buffer, LagBuffer::new(11.0, 10.0));
    }

    #[test]
    fn test_each_step_feeds_the_next() {
        let predictor = DriftPredictor { drift: 1.0 };
        let mut projection = Projection::new(
            &predictor,
            Granularity::Monthly,
            date(2023, 12, 31),
            LagBuffer::new(10.0, 9.0),
            3,
        );

        let first = projection.advance().unwrap().unwrap();
        assert_eq!(first.step, 1);
        assert_eq!(first.date, date(2024, 1, 31));
        assert_eq!(first.features, vec![2024.0, 1.0, 10.0, 9.0]);
        assert_eq!(first.value, 11.0);
        assert_eq!(projection.buffer(), LagBuffer::new(11.0, 10.0));

        // Lags are now the previous prediction, not ground truth
        let second = projection.advance().unwrap().unwrap();
        assert_eq!(second.date, date(2024, 2, 29));
        assert_eq!(second.features, vec![2024.0, 2.0, 11.0, 10.0]);
        assert_eq!(second.value, 12.0);

        let third = projection.advance().unwrap().unwrap();
        assert_eq!(third.value, 13.0);
        assert!(projection.is_finished());
        assert_eq!(projection.advance().unwrap(), None);
        assert_eq!(projection.steps_taken(), 3);
    }

    #[test]
    fn test_predictions_are_rounded_before_feedback() {
        let predictor = DriftPredictor { drift: 0.333 };
        let steps = Projection::new(
            &predictor,
            Granularity::Daily,
            date(2024, 1, 1),
            LagBuffer::new(1.0, 1.0),
            2,
        )
        .run()
        .unwrap();

        assert_eq!(steps[0].value, 1.33);
        // 1.33 + 0.333 = 1.663 -> 1.66
        assert_eq!(steps[1].features[3], 1.33);
        assert_eq!(steps[1].value, 1.66);
        assert_eq!(steps[1].date, date(2024, 1, 3));
    }

    #[test]
    fn test_unreachable_horizon_stops_with_error() {
        let predictor = DriftPredictor { drift: 1.0 };
        let result = Projection::new(
            &predictor,
            Granularity::Daily,
            NaiveDate::MAX,
            LagBuffer::new(1.0, 1.0),
            u32::MAX,
        )
        .run();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_horizon_yields_nothing() {
        let predictor = DriftPredictor { drift: 1.0 };
        let steps = Projection::new(
            &predictor,
            Granularity::Monthly,
            date(2023, 12, 31),
            LagBuffer::new(1.0, 1.0),
            0,
        )
        .run()
        .unwrap();
        assert!(steps.is_empty());
    }
}
