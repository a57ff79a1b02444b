//! The pattern-checker library.
//!
//! Every checker implements [`PatternChecker`] and is listed in the
//! compile-time [`registry`]; adding a new pattern means adding one
//! implementation and one registry entry. Checkers are independent and
//! order-insensitive, and a fault inside one checker never takes down the
//! rest of the run.

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;

mod ascending_triangle;
mod double_bottom;
mod flag;
mod wedge;

pub mod context;

pub use ascending_triangle::AscendingTriangleChecker;
pub use context::{PatternInput, VolumeAnalysis};
pub use double_bottom::DoubleBottomChecker;
pub use flag::{BearFlagChecker, BullFlagChecker};
pub use wedge::{FallingWedgeChecker, RisingWedgeChecker};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum PatternKind {
    #[strum(serialize = "Ascending Triangle")]
    AscendingTriangle,
    #[strum(serialize = "Bull Flag")]
    BullFlag,
    #[strum(serialize = "Bear Flag")]
    BearFlag,
    #[strum(serialize = "Double Bottom")]
    DoubleBottom,
    #[strum(serialize = "Rising Wedge")]
    RisingWedge,
    #[strum(serialize = "Falling Wedge")]
    FallingWedge,
}

impl PatternKind {
    /// Semantic direction of the expected breakout.
    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            PatternKind::AscendingTriangle
                | PatternKind::BullFlag
                | PatternKind::DoubleBottom
                | PatternKind::FallingWedge
        )
    }
}

/// Invalidated patterns are never surfaced; price action that kills a
/// setup makes the checker return nothing at all.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum PatternStatus {
    Forming,
    Active,
}

/// One detected chart pattern. Created fresh each analysis run from the
/// current pivot set and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub status: PatternStatus,
    /// Price whose breach flips the pattern from forming to active.
    pub activation_level: f64,
    /// Price whose breach kills the setup (stop-loss anchor).
    pub invalidation_level: f64,
    pub target1: f64,
    pub target2: Option<f64>,
    pub target3: Option<f64>,
    /// Clamped to [30, 95] by the shared scorer.
    pub confidence: f64,
    /// Geometry-quality score (touches, line fits), 0-100.
    pub strength: f64,
}

impl Pattern {
    pub fn rank_score(&self) -> f64 {
        self.confidence + self.strength
    }

    /// Guard against a misbehaving checker leaking NaN/Inf or an
    /// out-of-range confidence into the pipeline.
    pub fn is_well_formed(&self) -> bool {
        let numbers = [
            self.activation_level,
            self.invalidation_level,
            self.target1,
            self.target2.unwrap_or(self.target1),
            self.target3.unwrap_or(self.target1),
            self.confidence,
            self.strength,
        ];
        numbers.iter().all(|n| n.is_finite())
            && self.target1 > 0.0
            && (30.0..=95.0).contains(&self.confidence)
    }
}

pub trait PatternChecker: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, input: &PatternInput) -> Vec<Pattern>;
}

/// Compile-time checker registry.
pub fn registry() -> Vec<Box<dyn PatternChecker>> {
    vec![
        Box::new(AscendingTriangleChecker),
        Box::new(BullFlagChecker),
        Box::new(BearFlagChecker),
        Box::new(DoubleBottomChecker),
        Box::new(RisingWedgeChecker),
        Box::new(FallingWedgeChecker),
    ]
}

/// Run every registered checker over the same input and concatenate the
/// results, sorted best-first. A panicking checker is logged and skipped,
/// and malformed output is dropped at this boundary.
pub fn run_all_checkers(input: &PatternInput) -> Vec<Pattern> {
    let mut patterns: Vec<Pattern> = Vec::new();

    for checker in registry() {
        match catch_unwind(AssertUnwindSafe(|| checker.check(input))) {
            Ok(found) => {
                for pattern in found {
                    if pattern.is_well_formed() {
                        patterns.push(pattern);
                    } else {
                        log::warn!(
                            "checker {} produced a malformed {} result; dropping it",
                            checker.name(),
                            pattern.kind
                        );
                    }
                }
            }
            Err(_) => {
                log::error!(
                    "pattern checker {} panicked on {} {}; other checkers continue",
                    checker.name(),
                    input.series.symbol,
                    input.series.timeframe
                );
            }
        }
    }

    patterns.sort_by(|a, b| {
        b.rank_score()
            .total_cmp(&a.rank_score())
            .then_with(|| (a.kind as u8).cmp(&(b.kind as u8)))
    });
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::detect_pivots;
    use crate::config::AnalysisConfig;
    use crate::testing::double_bottom_series;

    struct PanickyChecker;

    impl PatternChecker for PanickyChecker {
        fn name(&self) -> &'static str {
            "panicky"
        }
        fn check(&self, _input: &PatternInput) -> Vec<Pattern> {
            panic!("boom");
        }
    }

    #[test]
    fn test_panicking_checker_is_contained() {
        let config = AnalysisConfig::default();
        let series = double_bottom_series();
        let pivots = detect_pivots(&series, &config.pivots);
        let input = PatternInput {
            series: &series,
            pivots: &pivots,
            current_price: series.last_close().unwrap(),
            trend: None,
            settings: &config.patterns,
        };

        // The panicky checker alone must yield nothing rather than abort.
        let result = catch_unwind(AssertUnwindSafe(|| PanickyChecker.check(&input)));
        assert!(result.is_err());

        // The full run still produces the double bottom.
        let patterns = run_all_checkers(&input);
        assert!(
            patterns
                .iter()
                .any(|p| p.kind == PatternKind::DoubleBottom)
        );
    }

    #[test]
    fn test_results_sorted_by_rank_score() {
        let config = AnalysisConfig::default();
        let series = double_bottom_series();
        let pivots = detect_pivots(&series, &config.pivots);
        let input = PatternInput {
            series: &series,
            pivots: &pivots,
            current_price: series.last_close().unwrap(),
            trend: None,
            settings: &config.patterns,
        };
        let patterns = run_all_checkers(&input);
        for pair in patterns.windows(2) {
            assert!(pair[0].rank_score() >= pair[1].rank_score());
        }
    }

    #[test]
    fn test_confidence_always_in_range() {
        let config = AnalysisConfig::default();
        let series = double_bottom_series();
        let pivots = detect_pivots(&series, &config.pivots);
        let input = PatternInput {
            series: &series,
            pivots: &pivots,
            current_price: series.last_close().unwrap(),
            trend: None,
            settings: &config.patterns,
        };
        for pattern in run_all_checkers(&input) {
            assert!((30.0..=95.0).contains(&pattern.confidence));
        }
    }
}
