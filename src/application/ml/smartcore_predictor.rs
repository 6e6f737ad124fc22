use super::predictor::TargetPredictor;
use super::scaler::StandardScaler;
use crate::config::ForecastConfig;
use crate::domain::errors::ForecastError;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest hyperparameters. Fixed per deployment; there is no search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl ForestParams {
    fn to_smartcore(self) -> RandomForestRegressorParameters {
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.n_trees)
            .with_min_samples_split(self.min_samples_split)
            .with_seed(self.seed);

        match self.max_depth {
            Some(depth) => params.with_max_depth(depth),
            None => params,
        }
    }
}

impl From<&ForecastConfig> for ForestParams {
    fn from(config: &ForecastConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            seed: config.seed,
        }
    }
}

/// Scaler plus random forest, fitted together on the same rows.
///
/// Owned by one request and dropped with it; never shared or persisted.
pub struct ForestModel {
    scaler: StandardScaler,
    forest: Forest,
}

impl ForestModel {
    /// Fits the scaler on `x`, then the forest on the scaled rows.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: ForestParams) -> Result<Self, ForecastError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(ForecastError::Model(format!(
                "cannot fit on {} rows with {} targets",
                x.len(),
                y.len()
            )));
        }

        let scaler = StandardScaler::fit(x);
        let scaled = scaler.transform(x);
        let matrix = DenseMatrix::from_2d_vec(&scaled)
            .map_err(|e| ForecastError::Model(format!("Matrix creation failed: {}", e)))?;

        let forest = Forest::fit(&matrix, &y.to_vec(), params.to_smartcore())
            .map_err(|e| ForecastError::Model(format!("Training failed: {}", e)))?;

        Ok(Self { scaler, forest })
    }

    pub fn predict_batch(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ForecastError> {
        if x.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = DenseMatrix::from_2d_vec(&self.scaler.transform(x))
            .map_err(|e| ForecastError::Model(format!("Matrix creation failed: {}", e)))?;

        self.forest
            .predict(&matrix)
            .map_err(|e| ForecastError::Model(format!("Prediction failed: {}", e)))
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}

impl TargetPredictor for ForestModel {
    fn predict(&self, features: &[f64]) -> Result<f64, ForecastError> {
        let predictions = self.predict_batch(&[features.to_vec()])?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| ForecastError::Model("No prediction returned".to_string()))
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ForestParams {
        ForestParams {
            n_trees: 20,
            max_depth: None,
            min_samples_split: 2,
            seed: 7,
        }
    }

    #[test]
    fn test_constant_target_predicts_constant() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![2024.0, i as f64, 5.0, 5.0]).collect();
        let y = vec![5.0; 10];
        let model = ForestModel::fit(&x, &y, params()).unwrap();
        let pred = model.predict(&[2025.0, 3.0, 5.0, 5.0]).unwrap();
        assert!((pred - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let x: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, (i % 12) as f64, (i * 3 % 7) as f64])
            .collect();
        let y: Vec<f64> = (0..20).map(|i| (i * i % 13) as f64).collect();

        let a = ForestModel::fit(&x, &y, params()).unwrap();
        let b = ForestModel::fit(&x, &y, params()).unwrap();
        assert_eq!(a.predict_batch(&x).unwrap(), b.predict_batch(&x).unwrap());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let x = vec![vec![1.0], vec![2.0]];
        assert!(matches!(
            ForestModel::fit(&x, &[1.0], params()),
            Err(ForecastError::Model(_))
        ));
    }
}
