//! Decision and ranking layer: turns patterns + levels + trend context
//! into recommendations, and orders them across timeframes.

pub mod analyzer;
pub mod decision;
pub mod ranker;

pub use analyzer::{AnalysisRequest, analyze_symbol, analyze_timeframe};
pub use decision::{Action, DecisionEngine, Recommendation};
