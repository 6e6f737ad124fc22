use crate::domain::errors::ForecastError;
use crate::domain::forecasting::target::Target;
use chrono::NaiveDate;

/// Data for one chart panel: the known history followed by the projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPanel {
    pub target: Target,
    pub history: Vec<(NaiveDate, f64)>,
    pub forecast: Vec<(NaiveDate, f64)>,
}

/// Renders forecast panels into an encoded PNG.
///
/// Implementations must not share drawing buffers between calls; concurrent
/// requests each get their own image.
pub trait ChartRenderer: Send + Sync {
    fn render_png(&self, panels: &[ChartPanel]) -> Result<Vec<u8>, ForecastError>;
}
