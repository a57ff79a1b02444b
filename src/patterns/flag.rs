//! Bull and bear flag checkers: a steep pole followed by a shallow,
//! near-parallel counter-trend channel.

use crate::analysis::trend_line::{TrendLine, fit_trend_line};
use crate::patterns::context::{
    ConfidenceFactors, PatternInput, analyze_volume, pattern_strength, score_confidence,
};
use crate::patterns::{Pattern, PatternChecker, PatternKind, PatternStatus};

pub struct BullFlagChecker;
pub struct BearFlagChecker;

/// The two channel lines must run near-parallel, judged relative to the
/// flag's own slope so steep and shallow flags get the same treatment.
fn near_parallel(upper: &TrendLine, lower: &TrendLine, tolerance: f64) -> bool {
    let scale = upper.slope.abs().max(lower.slope.abs());
    if scale <= 0.0 {
        // Both flat counts as parallel.
        return true;
    }
    (upper.slope - lower.slope).abs() <= tolerance * scale
}

/// Shallow retracements make better flags; a few extra points for staying
/// well inside the allowed pullback.
fn retracement_bonus(retracement: f64, ceiling: f64) -> f64 {
    ((ceiling - retracement) * 10.0).clamp(0.0, 5.0)
}

impl PatternChecker for BullFlagChecker {
    fn name(&self) -> &'static str {
        "bull_flag"
    }

    fn check(&self, input: &PatternInput) -> Vec<Pattern> {
        let highs = &input.pivots.highs;
        let lows = &input.pivots.lows;
        if highs.len() < 2 || lows.len() < 2 {
            return Vec::new();
        }
        let settings = input.settings;
        let mean_close = input.series.mean_close();
        if mean_close <= 0.0 {
            return Vec::new();
        }

        // Most recent viable pole wins.
        for pole_start in lows.iter().rev() {
            let pole_end = highs
                .iter()
                .filter(|h| h.index > pole_start.index)
                .max_by(|a, b| a.price.total_cmp(&b.price));
            let Some(pole_end) = pole_end else {
                continue;
            };

            let height = pole_end.price - pole_start.price;
            if height <= 0.0 || height < settings.min_pole_height_pct * mean_close {
                continue;
            }
            let duration = pole_end.index - pole_start.index;
            if duration == 0
                || height / (duration as f64) < settings.min_pole_speed_pct * mean_close
            {
                continue;
            }

            let flag_highs: Vec<_> = highs
                .iter()
                .filter(|h| h.index > pole_end.index)
                .copied()
                .collect();
            let flag_lows: Vec<_> = lows
                .iter()
                .filter(|l| l.index > pole_end.index)
                .copied()
                .collect();
            if flag_highs.len() < 2 || flag_lows.len() < 2 {
                continue;
            }

            let deepest_low = flag_lows
                .iter()
                .map(|l| l.price)
                .fold(f64::INFINITY, f64::min);
            let retracement = (pole_end.price - deepest_low) / height;
            if retracement > settings.max_flag_retracement {
                continue;
            }

            let upper_points: Vec<(usize, f64)> =
                flag_highs.iter().map(|p| (p.index, p.price)).collect();
            let lower_points: Vec<(usize, f64)> =
                flag_lows.iter().map(|p| (p.index, p.price)).collect();
            let upper = fit_trend_line(&upper_points);
            let lower = fit_trend_line(&lower_points);

            // The flag must drift against or sideways to the pole.
            if upper.slope > 0.0 || lower.slope > 0.0 {
                continue;
            }
            if !near_parallel(&upper, &lower, settings.flag_parallel_tolerance) {
                continue;
            }

            let last = input.last_index();
            let resistance_now = upper.value_at(last);
            let support_now = lower.value_at(last);

            // A close below the channel against the pole direction kills
            // the setup outright.
            if input.current_price < support_now {
                continue;
            }
            let status = if input.current_price > resistance_now {
                PatternStatus::Active
            } else {
                PatternStatus::Forming
            };

            let pivot_indices: Vec<usize> = flag_highs
                .iter()
                .chain(flag_lows.iter())
                .map(|p| p.index)
                .collect();
            let volume = analyze_volume(input.series, &pivot_indices, pole_end.index);
            let volume_confirms = volume.declining
                || (status == PatternStatus::Active
                    && volume.breakout_ratio > 1.5);

            let fit = upper.fit_quality.min(lower.fit_quality);
            let factors = ConfidenceFactors {
                fit_quality: fit,
                extra_touches: (flag_highs.len() + flag_lows.len()).saturating_sub(4),
                volume_confirms,
                trend_agrees: input.trend_agrees(true),
                quality_bonus: retracement_bonus(retracement, settings.max_flag_retracement),
            };

            return vec![Pattern {
                kind: PatternKind::BullFlag,
                status,
                activation_level: resistance_now,
                invalidation_level: deepest_low * (1.0 - settings.invalidation_buffer),
                target1: resistance_now + height,
                target2: Some(resistance_now + height * 1.618),
                target3: None,
                confidence: score_confidence(settings.base_confidence, &factors),
                strength: pattern_strength(fit, flag_highs.len() + flag_lows.len()),
            }];
        }

        Vec::new()
    }
}

impl PatternChecker for BearFlagChecker {
    fn name(&self) -> &'static str {
        "bear_flag"
    }

    fn check(&self, input: &PatternInput) -> Vec<Pattern> {
        let highs = &input.pivots.highs;
        let lows = &input.pivots.lows;
        if highs.len() < 2 || lows.len() < 2 {
            return Vec::new();
        }
        let settings = input.settings;
        let mean_close = input.series.mean_close();
        if mean_close <= 0.0 {
            return Vec::new();
        }

        for pole_start in highs.iter().rev() {
            let pole_end = lows
                .iter()
                .filter(|l| l.index > pole_start.index)
                .min_by(|a, b| a.price.total_cmp(&b.price));
            let Some(pole_end) = pole_end else {
                continue;
            };

            let height = pole_start.price - pole_end.price;
            if height <= 0.0 || height < settings.min_pole_height_pct * mean_close {
                continue;
            }
            let duration = pole_end.index - pole_start.index;
            if duration == 0
                || height / (duration as f64) < settings.min_pole_speed_pct * mean_close
            {
                continue;
            }

            let flag_highs: Vec<_> = highs
                .iter()
                .filter(|h| h.index > pole_end.index)
                .copied()
                .collect();
            let flag_lows: Vec<_> = lows
                .iter()
                .filter(|l| l.index > pole_end.index)
                .copied()
                .collect();
            if flag_highs.len() < 2 || flag_lows.len() < 2 {
                continue;
            }

            let highest_high = flag_highs
                .iter()
                .map(|h| h.price)
                .fold(f64::NEG_INFINITY, f64::max);
            let retracement = (highest_high - pole_end.price) / height;
            if retracement > settings.max_flag_retracement {
                continue;
            }

            let upper_points: Vec<(usize, f64)> =
                flag_highs.iter().map(|p| (p.index, p.price)).collect();
            let lower_points: Vec<(usize, f64)> =
                flag_lows.iter().map(|p| (p.index, p.price)).collect();
            let upper = fit_trend_line(&upper_points);
            let lower = fit_trend_line(&lower_points);

            if upper.slope < 0.0 || lower.slope < 0.0 {
                continue;
            }
            if !near_parallel(&upper, &lower, settings.flag_parallel_tolerance) {
                continue;
            }

            let last = input.last_index();
            let resistance_now = upper.value_at(last);
            let support_now = lower.value_at(last);

            if input.current_price > resistance_now {
                continue;
            }
            let status = if input.current_price < support_now {
                PatternStatus::Active
            } else {
                PatternStatus::Forming
            };

            let target1 = support_now - height;
            if target1 <= 0.0 {
                continue;
            }
            let target2 = support_now - height * 1.618;

            let pivot_indices: Vec<usize> = flag_highs
                .iter()
                .chain(flag_lows.iter())
                .map(|p| p.index)
                .collect();
            let volume = analyze_volume(input.series, &pivot_indices, pole_end.index);
            let volume_confirms = volume.declining
                || (status == PatternStatus::Active
                    && volume.breakout_ratio > 1.5);

            let fit = upper.fit_quality.min(lower.fit_quality);
            let factors = ConfidenceFactors {
                fit_quality: fit,
                extra_touches: (flag_highs.len() + flag_lows.len()).saturating_sub(4),
                volume_confirms,
                trend_agrees: input.trend_agrees(false),
                quality_bonus: retracement_bonus(retracement, settings.max_flag_retracement),
            };

            return vec![Pattern {
                kind: PatternKind::BearFlag,
                status,
                activation_level: support_now,
                invalidation_level: highest_high * (1.0 + settings.invalidation_buffer),
                target1,
                target2: (target2 > 0.0).then_some(target2),
                target3: None,
                confidence: score_confidence(settings.base_confidence, &factors),
                strength: pattern_strength(fit, flag_highs.len() + flag_lows.len()),
            }];
        }

        Vec::new()
    }
}
