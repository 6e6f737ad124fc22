// Series building, projection and the forecast service
pub mod forecasting;

// Scaling, validation and model fitting
pub mod ml;
