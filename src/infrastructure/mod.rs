pub mod export;
pub mod persistence;
pub mod rendering;
pub mod repositories;

pub use persistence::{Database, SqliteProductHistoryRepository};
pub use rendering::PlottersChartRenderer;
pub use repositories::InMemoryProductHistoryRepository;
