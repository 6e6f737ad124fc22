pub mod predictor;
pub mod scaler;
pub mod smartcore_predictor;
pub mod trainer;
pub mod validation;

pub use predictor::TargetPredictor;
pub use smartcore_predictor::{ForestModel, ForestParams};
pub use trainer::{ModelTrainer, TrainingOutcome};
