pub mod pipeline;
pub mod projection;
pub mod series_builder;
pub mod service;

pub use pipeline::{ForecastContext, ForecastPipeline, perform_forecast, validate_period};
pub use service::ForecastService;
