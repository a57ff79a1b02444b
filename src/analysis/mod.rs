pub mod aggregator;
pub mod fibonacci;
pub mod levels;
pub mod pivots;
pub mod trend_line;
pub mod trend_projection;
pub mod volume_profile;

pub use aggregator::{AggregatedLevels, aggregate_levels};
pub use levels::{Level, LevelSide, LevelSource, LevelTier};
pub use pivots::{PivotPoint, PivotSet, PivotSide, detect_pivots};
pub use trend_line::{TrendLine, fit_trend_line};
