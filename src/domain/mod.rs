pub mod candle;
pub mod timeframe;
pub mod trend;

pub use candle::{Candle, CandleSeries};
pub use timeframe::Timeframe;
pub use trend::{TrendContext, TrendDirection};
