// Domain-specific error types
pub mod errors;

// Observations, series, targets and results
pub mod forecasting;

// Feature layout shared by training and projection
pub mod ml;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;
