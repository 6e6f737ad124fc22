pub mod granularity;
pub mod observation;
pub mod price;
pub mod result;
pub mod series;
pub mod target;

pub use granularity::Granularity;
pub use observation::{ColumnPresence, HistoryBatch, Observation, RawObservation};
pub use result::{ChartArtifact, ForecastResult, ForecastRow, TargetReport};
pub use series::{FeatureRow, FeatureSet, RegularSeries};
pub use target::{Target, TargetSelection};
