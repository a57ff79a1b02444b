//! Configuration module for the pattern-scout analysis engine.

pub mod analysis;

pub use analysis::{
    AnalysisConfig, DecisionSettings, FibonacciSettings, LevelSettings, PatternSettings,
    PivotSettings, TrendProjectionSettings, VolumeProfileSettings, MIN_CANDLES_FOR_ANALYSIS,
};
