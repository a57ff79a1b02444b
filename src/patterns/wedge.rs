//! Rising and falling wedge checkers: two converging trend lines sloping
//! the same way, resolved by a breakout against the slope direction.

use crate::analysis::trend_line::{TrendLine, fit_trend_line};
use crate::patterns::context::{
    ConfidenceFactors, PatternInput, analyze_volume, pattern_strength, score_confidence,
};
use crate::patterns::{Pattern, PatternChecker, PatternKind, PatternStatus};

pub struct RisingWedgeChecker;
pub struct FallingWedgeChecker;

/// Index where the two lines would intersect. None when they are parallel.
fn apex_index(upper: &TrendLine, lower: &TrendLine) -> Option<f64> {
    let slope_gap = upper.slope - lower.slope;
    if slope_gap == 0.0 {
        return None;
    }
    Some((lower.intercept - upper.intercept) / slope_gap)
}

struct WedgeLines {
    upper: TrendLine,
    lower: TrendLine,
    touch_count: usize,
    max_high: f64,
    min_low: f64,
}

/// Fit both boundary lines over the recent pivot window; the caller
/// checks slope direction and convergence. None when there are too few
/// pivots or either line is a poor fit.
fn fit_wedge_lines(input: &PatternInput) -> Option<WedgeLines> {
    let (highs, lows) = input.window_pivots();
    if highs.len() < 3 || lows.len() < 3 {
        return None;
    }

    let upper_points: Vec<(usize, f64)> = highs.iter().map(|p| (p.index, p.price)).collect();
    let lower_points: Vec<(usize, f64)> = lows.iter().map(|p| (p.index, p.price)).collect();
    let upper = fit_trend_line(&upper_points);
    let lower = fit_trend_line(&lower_points);

    let floor = input.settings.min_fit_quality;
    if upper.fit_quality < floor || lower.fit_quality < floor {
        return None;
    }

    Some(WedgeLines {
        upper,
        lower,
        touch_count: highs.len() + lows.len(),
        max_high: highs
            .iter()
            .map(|p| p.price)
            .fold(f64::NEG_INFINITY, f64::max),
        min_low: lows.iter().map(|p| p.price).fold(f64::INFINITY, f64::min),
    })
}

/// How much the channel has narrowed from the window start to now, 0..1.
fn compression(lines: &WedgeLines, start: usize, end: usize) -> f64 {
    let width_start = lines.upper.value_at(start) - lines.lower.value_at(start);
    let width_end = lines.upper.value_at(end) - lines.lower.value_at(end);
    if width_start <= 0.0 {
        return 0.0;
    }
    (1.0 - width_end / width_start).clamp(0.0, 1.0)
}

impl PatternChecker for RisingWedgeChecker {
    fn name(&self) -> &'static str {
        "rising_wedge"
    }

    fn check(&self, input: &PatternInput) -> Vec<Pattern> {
        let Some(lines) = fit_wedge_lines(input) else {
            return Vec::new();
        };
        let settings = input.settings;

        // Both lines rising, support steeper than resistance: the squeeze
        // points up while momentum fades.
        if lines.upper.slope <= 0.0
            || lines.lower.slope <= 0.0
            || lines.lower.slope <= lines.upper.slope
        {
            return Vec::new();
        }

        let last = input.last_index();
        // Converging lines must meet strictly in the future.
        match apex_index(&lines.upper, &lines.lower) {
            Some(apex) if apex > last as f64 => {}
            _ => return Vec::new(),
        }

        let support_now = lines.lower.value_at(last);
        let resistance_now = lines.upper.value_at(last);

        // An upward escape through the resistance voids the bearish read.
        if input.current_price > resistance_now {
            return Vec::new();
        }
        let status = if input.current_price < support_now {
            PatternStatus::Active
        } else {
            PatternStatus::Forming
        };

        let height = lines.max_high - lines.min_low;
        let target1 = support_now - height;
        if target1 <= 0.0 {
            return Vec::new();
        }
        let target2 = support_now - height * 1.618;

        let window_start = input.series.tail_start(settings.lookback.min(input.series.len() / 2));
        let volume = analyze_volume(input.series, &pivot_indices(input), window_start);
        let fit = lines.upper.fit_quality.min(lines.lower.fit_quality);
        let factors = ConfidenceFactors {
            fit_quality: fit,
            extra_touches: lines.touch_count.saturating_sub(6),
            volume_confirms: volume.declining,
            trend_agrees: input.trend_agrees(false),
            quality_bonus: compression(&lines, window_start, last) * 5.0,
        };

        vec![Pattern {
            kind: PatternKind::RisingWedge,
            status,
            activation_level: support_now,
            invalidation_level: lines.max_high * (1.0 + settings.invalidation_buffer),
            target1,
            target2: (target2 > 0.0).then_some(target2),
            target3: None,
            confidence: score_confidence(settings.base_confidence, &factors),
            strength: pattern_strength(fit, lines.touch_count),
        }]
    }
}

impl PatternChecker for FallingWedgeChecker {
    fn name(&self) -> &'static str {
        "falling_wedge"
    }

    fn check(&self, input: &PatternInput) -> Vec<Pattern> {
        let Some(lines) = fit_wedge_lines(input) else {
            return Vec::new();
        };
        let settings = input.settings;

        // Both lines falling, resistance steeper than support.
        if lines.upper.slope >= 0.0
            || lines.lower.slope >= 0.0
            || lines.upper.slope >= lines.lower.slope
        {
            return Vec::new();
        }

        let last = input.last_index();
        match apex_index(&lines.upper, &lines.lower) {
            Some(apex) if apex > last as f64 => {}
            _ => return Vec::new(),
        }

        let support_now = lines.lower.value_at(last);
        let resistance_now = lines.upper.value_at(last);

        // A breakdown through the support voids the bullish read.
        if input.current_price < support_now {
            return Vec::new();
        }
        let status = if input.current_price > resistance_now {
            PatternStatus::Active
        } else {
            PatternStatus::Forming
        };

        let height = lines.max_high - lines.min_low;
        let target1 = resistance_now + height;
        let target2 = resistance_now + height * 1.618;

        let window_start = input.series.tail_start(settings.lookback.min(input.series.len() / 2));
        let volume = analyze_volume(input.series, &pivot_indices(input), window_start);
        let fit = lines.upper.fit_quality.min(lines.lower.fit_quality);
        let factors = ConfidenceFactors {
            fit_quality: fit,
            extra_touches: lines.touch_count.saturating_sub(6),
            volume_confirms: volume.declining,
            trend_agrees: input.trend_agrees(true),
            quality_bonus: compression(&lines, window_start, last) * 5.0,
        };

        vec![Pattern {
            kind: PatternKind::FallingWedge,
            status,
            activation_level: resistance_now,
            invalidation_level: lines.min_low * (1.0 - settings.invalidation_buffer),
            target1,
            target2: Some(target2),
            target3: None,
            confidence: score_confidence(settings.base_confidence, &factors),
            strength: pattern_strength(fit, lines.touch_count),
        }]
    }
}

fn pivot_indices(input: &PatternInput) -> Vec<usize> {
    let (highs, lows) = input.window_pivots();
    highs.iter().chain(lows.iter()).map(|p| p.index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::detect_pivots;
    use crate::config::AnalysisConfig;
    use crate::testing::{trending_series, waypoint_series};

    /// 160 candles: quiet ramp, then a converging rising channel in the
    /// back half (lows gaining 0.2/candle, highs only 0.125).
    fn rising_wedge_series() -> crate::domain::CandleSeries {
        waypoint_series(&[
            (0, 95.0),
            (80, 105.0),
            (92, 100.0),
            (104, 110.0),
            (116, 104.8),
            (128, 113.0),
            (140, 109.6),
            (152, 116.0),
            (159, 115.0),
        ])
    }

    /// Mirror image: a converging falling channel in the back half.
    fn falling_wedge_series() -> crate::domain::CandleSeries {
        waypoint_series(&[
            (0, 120.0),
            (80, 110.0),
            (92, 115.0),
            (104, 105.0),
            (116, 110.2),
            (128, 102.0),
            (140, 105.4),
            (152, 99.0),
            (159, 100.0),
        ])
    }

    fn check_rising(current_price: f64) -> Vec<Pattern> {
        let config = AnalysisConfig::default();
        let series = rising_wedge_series();
        let pivots = detect_pivots(&series, &config.pivots);
        RisingWedgeChecker.check(&PatternInput {
            series: &series,
            pivots: &pivots,
            current_price,
            trend: None,
            settings: &config.patterns,
        })
    }

    fn check_falling(current_price: f64) -> Vec<Pattern> {
        let config = AnalysisConfig::default();
        let series = falling_wedge_series();
        let pivots = detect_pivots(&series, &config.pivots);
        FallingWedgeChecker.check(&PatternInput {
            series: &series,
            pivots: &pivots,
            current_price,
            trend: None,
            settings: &config.patterns,
        })
    }

    #[test]
    fn test_rising_wedge_forming_inside_channel() {
        let patterns = check_rising(115.0);
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.kind, PatternKind::RisingWedge);
        assert_eq!(p.status, PatternStatus::Forming);
        assert!(p.target1 < p.activation_level);
        assert!(p.invalidation_level > p.activation_level);
    }

    #[test]
    fn test_rising_wedge_activates_on_breakdown() {
        let patterns = check_rising(110.0);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].status, PatternStatus::Active);
    }

    #[test]
    fn test_rising_wedge_voided_by_upward_escape() {
        assert!(check_rising(120.0).is_empty());
    }

    #[test]
    fn test_falling_wedge_forming_inside_channel() {
        let patterns = check_falling(100.0);
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.kind, PatternKind::FallingWedge);
        assert_eq!(p.status, PatternStatus::Forming);
        assert!(p.target1 > p.activation_level);
        assert!(p.target2.unwrap() > p.target1);
    }

    #[test]
    fn test_falling_wedge_activates_on_breakout() {
        let patterns = check_falling(103.0);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].status, PatternStatus::Active);
    }

    #[test]
    fn test_falling_wedge_voided_by_breakdown() {
        assert!(check_falling(96.0).is_empty());
    }

    #[test]
    fn test_parallel_channel_is_not_a_wedge() {
        // Straight trend: pivot lines are parallel (or there are no
        // pivots at all), so neither wedge may fire.
        let config = AnalysisConfig::default();
        let series = trending_series(160, 100.0, 0.3);
        let pivots = detect_pivots(&series, &config.pivots);
        let input = PatternInput {
            series: &series,
            pivots: &pivots,
            current_price: series.last_close().unwrap(),
            trend: None,
            settings: &config.patterns,
        };
        assert!(RisingWedgeChecker.check(&input).is_empty());
        assert!(FallingWedgeChecker.check(&input).is_empty());
    }
}
