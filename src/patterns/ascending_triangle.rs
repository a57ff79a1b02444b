use itertools::Itertools;

use crate::analysis::trend_line::fit_trend_line;
use crate::patterns::context::{
    ConfidenceFactors, PatternInput, analyze_volume, pattern_strength, score_confidence,
};
use crate::patterns::{Pattern, PatternChecker, PatternKind, PatternStatus};
use crate::utils::maths_utils::relative_diff;

/// Flat resistance hammered by at least two pivot highs, with rising
/// pivot lows squeezing price into it from below.
pub struct AscendingTriangleChecker;

impl PatternChecker for AscendingTriangleChecker {
    fn name(&self) -> &'static str {
        "ascending_triangle"
    }

    fn check(&self, input: &PatternInput) -> Vec<Pattern> {
        let highs = &input.pivots.highs;
        let lows = &input.pivots.lows;
        if highs.len() < 2 || lows.len() < 2 {
            return Vec::new();
        }
        let settings = input.settings;

        // Resistance = the price-proximate pivot-high cluster with the
        // most touches. Pairs seed the clusters; first best wins so the
        // scan stays deterministic.
        let mut best_resistance = 0.0_f64;
        let mut max_touches = 0_usize;
        for (first, second) in highs.iter().tuple_combinations() {
            if relative_diff(first.price, second.price) > settings.price_tolerance {
                continue;
            }
            let price = (first.price + second.price) / 2.0;
            let touches = highs
                .iter()
                .filter(|h| relative_diff(h.price, price) <= settings.price_tolerance)
                .count();
            if touches > max_touches {
                max_touches = touches;
                best_resistance = price;
            }
        }
        if max_touches < 2 || best_resistance <= 0.0 {
            return Vec::new();
        }

        let support_lows: Vec<_> = lows
            .iter()
            .filter(|l| l.price < best_resistance)
            .copied()
            .collect();
        if support_lows.len() < 2 {
            return Vec::new();
        }

        let points: Vec<(usize, f64)> =
            support_lows.iter().map(|l| (l.index, l.price)).collect();
        let support_line = fit_trend_line(&points);
        if support_line.is_neutral() || support_line.slope <= 0.0 {
            return Vec::new();
        }

        // The rising support must still be under the resistance, otherwise
        // the triangle has already resolved.
        let support_current = support_line.value_at(input.last_index());
        if support_current > best_resistance {
            return Vec::new();
        }

        let height = best_resistance - support_line.value_at(support_lows[0].index);
        if height <= 0.0 {
            return Vec::new();
        }

        let last_low = support_lows[support_lows.len() - 1];
        let status = if input.current_price > best_resistance {
            PatternStatus::Active
        } else {
            PatternStatus::Forming
        };

        let pivot_indices: Vec<usize> = highs
            .iter()
            .chain(support_lows.iter())
            .map(|p| p.index)
            .collect();
        let volume = analyze_volume(input.series, &pivot_indices, support_lows[0].index);
        let volume_confirms = volume.declining
            || (status == PatternStatus::Active && volume.breakout_ratio > 1.5);

        let extra_touches =
            max_touches.saturating_sub(2) + support_lows.len().saturating_sub(2);
        let factors = ConfidenceFactors {
            fit_quality: support_line.fit_quality,
            extra_touches,
            volume_confirms,
            trend_agrees: input.trend_agrees(true),
            quality_bonus: 0.0,
        };

        vec![Pattern {
            kind: PatternKind::AscendingTriangle,
            status,
            activation_level: best_resistance,
            invalidation_level: last_low.price * (1.0 - settings.invalidation_buffer),
            target1: best_resistance + height,
            target2: None,
            target3: None,
            confidence: score_confidence(settings.base_confidence, &factors),
            strength: pattern_strength(
                support_line.fit_quality,
                max_touches + support_lows.len(),
            ),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::detect_pivots;
    use crate::config::AnalysisConfig;
    use crate::testing::{waypoint_series, zigzag_series};

    /// Flat ceiling at 110 touched three times, lows stepping up.
    fn triangle_series() -> crate::domain::CandleSeries {
        waypoint_series(&[
            (0, 100.0),
            (10, 110.0),
            (20, 102.0),
            (30, 110.0),
            (40, 105.0),
            (50, 110.0),
            (55, 108.0),
        ])
    }

    fn check_at(current_price: f64) -> Vec<Pattern> {
        let config = AnalysisConfig::default();
        let series = triangle_series();
        let pivots = detect_pivots(&series, &config.pivots);
        AscendingTriangleChecker.check(&PatternInput {
            series: &series,
            pivots: &pivots,
            current_price,
            trend: None,
            settings: &config.patterns,
        })
    }

    #[test]
    fn test_triangle_forming_below_resistance() {
        let patterns = check_at(108.0);
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.kind, PatternKind::AscendingTriangle);
        assert_eq!(p.status, PatternStatus::Forming);
        assert!((p.activation_level - 110.5).abs() < 1.0);
        assert!(p.target1 > p.activation_level);
        assert!(p.invalidation_level < p.activation_level);
    }

    #[test]
    fn test_triangle_active_above_resistance() {
        let patterns = check_at(115.0);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].status, PatternStatus::Active);
    }

    #[test]
    fn test_flat_support_is_rejected() {
        // A symmetric zigzag has a flat ceiling but also flat lows: no
        // rising support line, no triangle.
        let config = AnalysisConfig::default();
        let series = zigzag_series(80);
        let pivots = detect_pivots(&series, &config.pivots);
        let patterns = AscendingTriangleChecker.check(&PatternInput {
            series: &series,
            pivots: &pivots,
            current_price: series.last_close().unwrap(),
            trend: None,
            settings: &config.patterns,
        });
        assert!(patterns.is_empty());
    }
}
