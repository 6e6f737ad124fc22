pub mod chart;
pub mod chart_store;

pub use chart::PlottersChartRenderer;
pub use chart_store::store_chart;
