use crate::domain::errors::ForecastError;

/// A fitted single-target regressor over raw (unscaled) feature rows.
pub trait TargetPredictor: Send + Sync {
    /// Predict the target for one feature row, in `feature_registry` order
    fn predict(&self, features: &[f64]) -> Result<f64, ForecastError>;

    /// Get model name/type
    fn name(&self) -> &str;
}
