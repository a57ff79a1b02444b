//! Serializable analysis output, consumed by the reporting side.

use serde::Serialize;

use crate::analysis::Level;
use crate::config::DecisionSettings;
use crate::domain::Timeframe;
use crate::engine::decision::Recommendation;
use crate::patterns::Pattern;

/// Everything one (symbol, timeframe) run produced: the recommendation
/// plus the full pattern and level lists behind it.
#[derive(Clone, Debug, Serialize)]
pub struct TimeframeReport {
    pub timeframe: Timeframe,
    pub current_price: f64,
    /// True when there were too few candles to analyze; the
    /// recommendation is then wait at its neutral confidence.
    pub insufficient_data: bool,
    /// Set when the analysis itself failed; such reports rank last.
    pub error: Option<String>,
    pub patterns: Vec<Pattern>,
    pub supports: Vec<Level>,
    pub resistances: Vec<Level>,
    pub recommendation: Recommendation,
    /// Cross-timeframe ranking score, filled by the ranker.
    pub rank_score: f64,
}

impl TimeframeReport {
    pub fn insufficient(timeframe: Timeframe, current_price: f64, settings: &DecisionSettings) -> Self {
        TimeframeReport {
            timeframe,
            current_price,
            insufficient_data: true,
            error: None,
            patterns: Vec::new(),
            supports: Vec::new(),
            resistances: Vec::new(),
            recommendation: Recommendation::neutral_wait(settings),
            rank_score: 0.0,
        }
    }

    pub fn failed(timeframe: Timeframe, message: String, settings: &DecisionSettings) -> Self {
        TimeframeReport {
            timeframe,
            current_price: 0.0,
            insufficient_data: false,
            error: Some(message),
            patterns: Vec::new(),
            supports: Vec::new(),
            resistances: Vec::new(),
            recommendation: Recommendation::neutral_wait(settings),
            rank_score: 0.0,
        }
    }
}

/// Full multi-timeframe report for one symbol, ordered best signal first.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub generated_at_ms: i64,
    pub timeframes: Vec<TimeframeReport>,
}
