use itertools::Itertools;

use crate::patterns::context::{
    ConfidenceFactors, PatternInput, analyze_volume, pattern_strength, score_confidence,
};
use crate::patterns::{Pattern, PatternChecker, PatternKind, PatternStatus};
use crate::utils::maths_utils::relative_diff;

/// Two matched lows separated by a neckline high. Breakout above the
/// neckline projects the base depth upward.
pub struct DoubleBottomChecker;

impl PatternChecker for DoubleBottomChecker {
    fn name(&self) -> &'static str {
        "double_bottom"
    }

    fn check(&self, input: &PatternInput) -> Vec<Pattern> {
        // Reversal bases can be old; scan the full pivot history rather
        // than the recency window the continuation checkers use.
        let highs = &input.pivots.highs;
        let lows = &input.pivots.lows;
        if lows.len() < 2 || highs.is_empty() {
            return Vec::new();
        }
        let settings = input.settings;

        for (bottom1, bottom2) in lows.iter().tuple_combinations() {
            if relative_diff(bottom1.price, bottom2.price) > settings.price_tolerance {
                continue;
            }

            // The neckline is the tallest pivot high strictly between
            // the two bottoms.
            let neckline = highs
                .iter()
                .filter(|h| bottom1.index < h.index && h.index < bottom2.index)
                .max_by(|a, b| a.price.total_cmp(&b.price));
            let Some(neckline) = neckline else {
                continue;
            };
            if bottom1.price >= neckline.price || bottom2.price >= neckline.price {
                continue;
            }

            let mean_low = (bottom1.price + bottom2.price) / 2.0;
            let depth = neckline.price - mean_low;
            if depth <= 0.0 || depth / neckline.price < settings.min_double_bottom_depth {
                continue;
            }

            // Price trading through the base kills the setup; it is
            // suppressed, never reported as failed.
            if input.current_price < mean_low * (1.0 - settings.price_tolerance) {
                continue;
            }

            let lowest = bottom1.price.min(bottom2.price);
            let status = if input.current_price > neckline.price {
                PatternStatus::Active
            } else {
                PatternStatus::Forming
            };

            let volume = analyze_volume(
                input.series,
                &[bottom1.index, neckline.index, bottom2.index],
                bottom1.index,
            );
            let volume_confirms = volume.declining
                || (status == PatternStatus::Active && volume.breakout_ratio > 1.5);

            // Symmetry of the two bottoms, on top of the tolerance gate.
            let symmetry =
                1.0 - relative_diff(bottom1.price, bottom2.price) / settings.price_tolerance;
            let factors = ConfidenceFactors {
                fit_quality: symmetry.clamp(0.0, 1.0),
                extra_touches: 0,
                volume_confirms,
                trend_agrees: input.trend_agrees(true),
                quality_bonus: 0.0,
            };

            return vec![Pattern {
                kind: PatternKind::DoubleBottom,
                status,
                activation_level: neckline.price,
                invalidation_level: lowest * (1.0 - settings.invalidation_buffer),
                target1: neckline.price + depth,
                target2: Some(neckline.price + 0.8 * depth),
                target3: None,
                confidence: score_confidence(settings.base_confidence, &factors),
                strength: pattern_strength(symmetry.clamp(0.0, 1.0), 3),
            }];
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::detect_pivots;
    use crate::config::AnalysisConfig;
    use crate::testing::{double_bottom_series, trending_series};

    fn input<'a>(
        series: &'a crate::domain::CandleSeries,
        pivots: &'a crate::analysis::PivotSet,
        config: &'a AnalysisConfig,
        current_price: f64,
    ) -> PatternInput<'a> {
        PatternInput {
            series,
            pivots,
            current_price,
            trend: None,
            settings: &config.patterns,
        }
    }

    #[test]
    fn test_textbook_double_bottom_detected() {
        let config = AnalysisConfig::default();
        let series = double_bottom_series();
        let pivots = detect_pivots(&series, &config.pivots);
        let current = series.last_close().unwrap();

        let patterns =
            DoubleBottomChecker.check(&input(&series, &pivots, &config, current));
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.kind, PatternKind::DoubleBottom);
        assert_eq!(p.status, PatternStatus::Active);
        // Neckline 110, mean low 100.25: aggressive 119.75, conservative
        // 110 + 0.8 * 9.75 = 117.8.
        assert!((p.activation_level - 110.0).abs() < 0.5);
        assert!((p.target1 - 119.75).abs() < 0.5);
        assert!((p.target2.unwrap() - 117.8).abs() < 0.5);
        assert!((p.invalidation_level - 99.0).abs() < 0.5);
    }

    #[test]
    fn test_levels_are_ordered_sanely() {
        let config = AnalysisConfig::default();
        let series = double_bottom_series();
        let pivots = detect_pivots(&series, &config.pivots);
        let current = series.last_close().unwrap();

        let patterns =
            DoubleBottomChecker.check(&input(&series, &pivots, &config, current));
        let p = &patterns[0];
        assert!(p.invalidation_level < p.activation_level);
        assert!(p.activation_level < p.target2.unwrap());
        assert!(p.target2.unwrap() < p.target1);
    }

    #[test]
    fn test_breakdown_through_base_suppresses_pattern() {
        let config = AnalysisConfig::default();
        let series = double_bottom_series();
        let pivots = detect_pivots(&series, &config.pivots);

        // Live price well below both bottoms: pattern must vanish, not
        // come back as "failed".
        let patterns = DoubleBottomChecker.check(&input(&series, &pivots, &config, 90.0));
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_trending_series_has_no_double_bottom() {
        let config = AnalysisConfig::default();
        let series = trending_series(60, 100.0, 1.0);
        let pivots = detect_pivots(&series, &config.pivots);
        let current = series.last_close().unwrap();
        assert!(
            DoubleBottomChecker
                .check(&input(&series, &pivots, &config, current))
                .is_empty()
        );
    }
}
