// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod models;
pub mod patterns;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use analysis::{AggregatedLevels, Level, PivotSet, TrendLine};
pub use config::AnalysisConfig;
pub use domain::{Candle, CandleSeries, Timeframe, TrendContext, TrendDirection};
pub use engine::{Action, AnalysisRequest, Recommendation, analyze_symbol, analyze_timeframe};
pub use models::{AnalysisReport, TimeframeReport};
pub use patterns::{Pattern, PatternKind, PatternStatus};

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Candle JSON file to analyze (symbol + per-timeframe candles)
    pub input: std::path::PathBuf,

    /// Pretty-print the report JSON
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}
