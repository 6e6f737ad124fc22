pub mod forecast_csv;

pub use forecast_csv::{export_forecast_csv, write_forecast_csv};
