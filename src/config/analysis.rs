//! Analysis and computation configuration.
//!
//! Every heuristic threshold lives here, one settings struct per checker
//! family, so the algorithm code stays free of magic numbers and tests can
//! tune sensitivity without touching the checkers.

use crate::domain::Timeframe;

/// Minimum number of candles any sub-analysis needs.
/// Below this the pipeline reports "insufficient data" instead of running.
pub const MIN_CANDLES_FOR_ANALYSIS: usize = 20;

/// Pivot (swing high/low) detection.
#[derive(Debug, Clone)]
pub struct PivotSettings {
    /// Minimum candle spacing between two pivots on the same side.
    pub distance: usize,
    /// Prominence = mean true range over `atr_window` candles * this multiplier.
    pub prominence_multiplier: f64,
    /// Trailing window for the mean-true-range volatility estimate.
    pub atr_window: usize,
}

/// Shared knobs for the pattern-checker library.
#[derive(Debug, Clone)]
pub struct PatternSettings {
    /// Pivot search window in candles (capped to half the series).
    pub lookback: usize,
    /// Relative price tolerance when matching pivot prices (0.03 = 3%).
    pub price_tolerance: f64,
    /// Minimum trend-line r-squared for wedge lines.
    pub min_fit_quality: f64,
    /// Flags: maximum pole retracement before the pattern is discarded.
    pub max_flag_retracement: f64,
    /// Flags: minimum pole height as a fraction of mean close.
    pub min_pole_height_pct: f64,
    /// Flags: minimum pole speed (height per candle) as a fraction of mean close.
    pub min_pole_speed_pct: f64,
    /// Flags: |upper slope - lower slope| bound relative to the flag's own slope.
    pub flag_parallel_tolerance: f64,
    /// Double bottom: minimum depth (neckline to mean low) relative to neckline.
    pub min_double_bottom_depth: f64,
    /// Discount applied to invalidation levels (0.01 = 1% buffer).
    pub invalidation_buffer: f64,
    /// Starting point for the shared confidence scorer.
    pub base_confidence: f64,
}

/// Classic support/resistance extraction and clustering.
#[derive(Debug, Clone)]
pub struct LevelSettings {
    /// Peak prominence for raw level candidates, as a fraction of the
    /// series' full price range.
    pub peak_prominence_pct: f64,
    /// Minimum candle spacing between raw level candidates.
    pub peak_distance: usize,
    /// Relative tolerance when clustering raw levels into zones.
    pub cluster_tolerance: f64,
    /// Tighter tolerance for the cross-source confluence merge.
    pub merge_tolerance: f64,
    /// Keep at most this many zones per side after clustering.
    pub max_levels_per_side: usize,
}

/// Fibonacci retracement/extension levels.
#[derive(Debug, Clone)]
pub struct FibonacciSettings {
    pub lookback: usize,
}

/// Volume-profile levels (POC and high-volume nodes).
#[derive(Debug, Clone)]
pub struct VolumeProfileSettings {
    pub bins: usize,
    /// A bin is a high-volume node when its volume exceeds mean * this factor.
    pub hvn_factor: f64,
}

/// Trend-line support/resistance projection.
#[derive(Debug, Clone)]
pub struct TrendProjectionSettings {
    pub lookback: usize,
}

/// Decision engine thresholds.
#[derive(Debug, Clone)]
pub struct DecisionSettings {
    /// Patterns below this confidence produce "wait", not an entry.
    pub actionable_confidence: f64,
    /// Confidence reported when there is nothing to act on.
    pub neutral_confidence: f64,
    /// Breakout volume spike factor versus the trailing volume average.
    pub breakout_volume_factor: f64,
    /// Trailing window for the volume average used above.
    pub volume_avg_window: usize,
    /// Rank multiplier applied to "wait" recommendations.
    pub wait_penalty: f64,
}

/// The master analysis configuration. Read-only inside the core.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub pivots: PivotSettings,
    pub patterns: PatternSettings,
    pub levels: LevelSettings,
    pub fibonacci: FibonacciSettings,
    pub volume_profile: VolumeProfileSettings,
    pub trend_projection: TrendProjectionSettings,
    pub decision: DecisionSettings,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            pivots: PivotSettings {
                distance: 5,
                prominence_multiplier: 1.5,
                atr_window: 14,
            },
            patterns: PatternSettings {
                lookback: 80,
                price_tolerance: 0.03,
                min_fit_quality: 0.6,
                max_flag_retracement: 0.618,
                min_pole_height_pct: 0.05,
                min_pole_speed_pct: 0.005,
                flag_parallel_tolerance: 0.5,
                min_double_bottom_depth: 0.01,
                invalidation_buffer: 0.01,
                base_confidence: 55.0,
            },
            levels: LevelSettings {
                peak_prominence_pct: 0.02,
                peak_distance: 10,
                cluster_tolerance: 0.01,
                merge_tolerance: 0.005,
                max_levels_per_side: 5,
            },
            fibonacci: FibonacciSettings { lookback: 90 },
            volume_profile: VolumeProfileSettings {
                bins: 50,
                hvn_factor: 2.0,
            },
            trend_projection: TrendProjectionSettings { lookback: 100 },
            decision: DecisionSettings {
                actionable_confidence: 65.0,
                neutral_confidence: 50.0,
                breakout_volume_factor: 1.5,
                volume_avg_window: 20,
                wait_penalty: 0.1,
            },
        }
    }
}

impl AnalysisConfig {
    /// Per-timeframe overrides. Higher timeframes look further back; the
    /// intraday frames keep tighter tolerances.
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        let mut config = AnalysisConfig::default();
        match timeframe {
            Timeframe::M15 => {
                config.patterns.lookback = 60;
                config.patterns.price_tolerance = 0.02;
                config.fibonacci.lookback = 60;
            }
            Timeframe::H1 => {}
            Timeframe::H4 => {
                config.patterns.lookback = 100;
                config.fibonacci.lookback = 120;
                config.trend_projection.lookback = 120;
            }
            Timeframe::D1 => {
                config.patterns.lookback = 120;
                config.patterns.price_tolerance = 0.04;
                config.fibonacci.lookback = 180;
                config.trend_projection.lookback = 150;
            }
        }
        config
    }
}
