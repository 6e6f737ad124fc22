use super::predictor::TargetPredictor;
use super::smartcore_predictor::{ForestModel, ForestParams};
use super::validation::{FoldSplit, RollingOriginSplitter};
use crate::config::ForecastConfig;
use crate::domain::errors::ForecastError;
use crate::domain::forecasting::FeatureSet;
use crate::domain::ml::feature_registry::feature_names;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Fitted model plus its out-of-sample error estimate.
pub struct TrainingOutcome {
    /// Final model, fitted on every available row
    pub model: ForestModel,
    /// Mean of the per-fold MAEs
    pub mae: f64,
    pub fold_maes: Vec<f64>,
}

impl TrainingOutcome {
    pub fn folds(&self) -> usize {
        self.fold_maes.len()
    }
}

/// Rolling-origin validation followed by a full refit.
pub struct ModelTrainer {
    splitter: RollingOriginSplitter,
    params: ForestParams,
}

impl ModelTrainer {
    pub fn new(folds: usize, params: ForestParams) -> Self {
        Self {
            splitter: RollingOriginSplitter::new(folds),
            params,
        }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.folds, ForestParams::from(config))
    }

    /// Validates on time-ordered folds, then refits scaler and forest on the
    /// whole feature set.
    ///
    /// Each fold fits its own scaler on its training window only. Folds run
    /// in parallel; their errors are collected in fold order.
    pub fn train(&self, set: &FeatureSet) -> Result<TrainingOutcome, ForecastError> {
        let x = set.matrix();
        let y = set.targets();
        let splits = self.splitter.split(x.len())?;
        debug!(
            "{} features: {:?}",
            set.target,
            feature_names(set.granularity)
        );

        let fold_maes = splits
            .par_iter()
            .map(|split| self.evaluate_fold(&x, &y, split))
            .collect::<Result<Vec<f64>, ForecastError>>()?;

        let mae = fold_maes.iter().sum::<f64>() / fold_maes.len() as f64;
        if !mae.is_finite() {
            warn!("{} validation produced a non-finite MAE", set.target);
            return Err(ForecastError::Model(format!(
                "non-finite validation error for {}",
                set.target
            )));
        }

        let model = ForestModel::fit(&x, &y, self.params)?;

        info!(
            "Trained {} {} on {} rows ({} folds, MAE={:.4})",
            set.target,
            model.name(),
            x.len(),
            fold_maes.len(),
            mae
        );

        Ok(TrainingOutcome {
            model,
            mae,
            fold_maes,
        })
    }

    fn evaluate_fold(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        split: &FoldSplit,
    ) -> Result<f64, ForecastError> {
        let model = ForestModel::fit(&x[split.train.clone()], &y[split.train.clone()], self.params)?;
        let predicted = model.predict_batch(&x[split.test.clone()])?;
        let mae = mean_absolute_error(&y[split.test.clone()], &predicted);

        debug!(
            "Fold {}: train={} test={} MAE={:.4}",
            split.fold,
            split.train.len(),
            split.test.len(),
            mae
        );
        Ok(mae)
    }
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecasting::{FeatureRow, Granularity, Target};
    use crate::domain::ml::feature_registry::feature_row;
    use chrono::NaiveDate;

    fn params() -> ForestParams {
        ForestParams {
            n_trees: 25,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }

    fn feature_set(values: &[f64]) -> FeatureSet {
        let g = Granularity::Monthly;
        let mut label = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        let mut labels = Vec::new();
        for _ in values {
            labels.push(label);
            label = g.advance(label, 1).unwrap();
        }
        let rows = (2..values.len())
            .map(|t| FeatureRow {
                label: labels[t],
                features: feature_row(g, labels[t], values[t - 1], values[t - 2]),
                target: values[t],
            })
            .collect();
        let n = values.len();
        FeatureSet {
            target: Target::Price,
            granularity: g,
            rows,
            last_label: labels[n - 1],
            seed: [values[n - 1], values[n - 2]],
        }
    }

    #[test]
    fn test_mae() {
        assert_eq!(mean_absolute_error(&[1.0, 2.0, 3.0], &[2.0, 2.0, 1.0]), 1.0);
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
    }

    #[test]
    fn test_constant_series_has_zero_error() {
        let set = feature_set(&[12.5; 16]);
        let outcome = ModelTrainer::new(5, params()).train(&set).unwrap();
        assert_eq!(outcome.folds(), 5);
        assert!(outcome.mae.abs() < 1e-9);
    }

    #[test]
    fn test_error_is_finite_and_non_negative() {
        let values: Vec<f64> = (0..24).map(|i| 100.0 + (i as f64 * 1.7).sin() * 15.0).collect();
        let outcome = ModelTrainer::new(5, params()).train(&feature_set(&values)).unwrap();
        assert!(outcome.mae.is_finite());
        assert!(outcome.mae >= 0.0);
        assert!(outcome.fold_maes.iter().all(|m| *m >= 0.0));
    }

    #[test]
    fn test_short_history_reduces_folds() {
        // 8 periods -> 6 feature rows -> 4 folds
        let values: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let outcome = ModelTrainer::new(5, params()).train(&feature_set(&values)).unwrap();
        assert_eq!(outcome.folds(), 4);
    }

    #[test]
    fn test_too_short_history_fails() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ModelTrainer::new(5, params()).train(&feature_set(&values));
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn test_training_is_deterministic() {
        let values: Vec<f64> = (0..30).map(|i| ((i * 7) % 11) as f64 * 3.0).collect();
        let set = feature_set(&values);
        let trainer = ModelTrainer::new(5, params());
        let a = trainer.train(&set).unwrap();
        let b = trainer.train(&set).unwrap();
        assert_eq!(a.fold_maes, b.fold_maes);
        assert_eq!(a.mae, b.mae);
    }
}
