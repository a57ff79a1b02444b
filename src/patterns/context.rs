//! Shared checker inputs and the common confidence scorer.

use crate::analysis::pivots::{PivotPoint, PivotSet};
use crate::config::PatternSettings;
use crate::domain::{CandleSeries, TrendContext};

/// Read-only view every checker consumes. Built once per analysis run.
pub struct PatternInput<'a> {
    pub series: &'a CandleSeries,
    pub pivots: &'a PivotSet,
    pub current_price: f64,
    /// Broader trend supplied by the caller, for confidence alignment.
    pub trend: Option<&'a TrendContext>,
    pub settings: &'a PatternSettings,
}

impl PatternInput<'_> {
    /// Pivots inside the recent search window. The window is the
    /// configured lookback, capped to half the series so a short history
    /// never degenerates into "everything is recent".
    pub fn window_pivots(&self) -> (Vec<PivotPoint>, Vec<PivotPoint>) {
        let window = self.settings.lookback.min(self.series.len() / 2);
        let start = self.series.tail_start(window);
        let highs = self
            .pivots
            .highs
            .iter()
            .filter(|p| p.index >= start)
            .copied()
            .collect();
        let lows = self
            .pivots
            .lows
            .iter()
            .filter(|p| p.index >= start)
            .copied()
            .collect();
        (highs, lows)
    }

    pub fn last_index(&self) -> usize {
        self.series.last_index()
    }

    /// Does the supplied trend context agree with a breakout in the given
    /// direction? None when no context was provided.
    pub fn trend_agrees(&self, bullish: bool) -> Option<bool> {
        self.trend.map(|t| t.agrees_with(bullish))
    }
}

/// Volume behaviour around a pattern's pivots, all relative to the slice's
/// average volume so the numbers are comparable across instruments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VolumeAnalysis {
    pub early_strength: f64,
    pub late_strength: f64,
    /// Volume drying up through the consolidation (early > 1.2x late).
    pub declining: bool,
    /// Last candle's volume versus the average.
    pub breakout_ratio: f64,
}

/// Mean volume at the pattern's pivot candles, split into an early group
/// (near the pattern start) and a late group (near the last candle).
pub fn analyze_volume(
    series: &CandleSeries,
    pivot_indices: &[usize],
    start_index: usize,
) -> VolumeAnalysis {
    let avg = series.mean_volume();
    if avg <= 0.0 || series.is_empty() {
        return VolumeAnalysis {
            early_strength: 1.0,
            late_strength: 1.0,
            declining: false,
            breakout_ratio: 1.0,
        };
    }

    let last_index = series.last_index();
    let mean_at = |pred: &dyn Fn(usize) -> bool| -> f64 {
        let picked: Vec<f64> = pivot_indices
            .iter()
            .filter(|&&i| i < series.len() && pred(i))
            .map(|&i| series.volumes[i])
            .collect();
        if picked.is_empty() {
            0.0
        } else {
            picked.iter().sum::<f64>() / picked.len() as f64
        }
    };

    let early = mean_at(&|i| i <= start_index + 10);
    let late = mean_at(&|i| i + 10 >= last_index);

    VolumeAnalysis {
        early_strength: early / avg,
        late_strength: late / avg,
        declining: early > 0.0 && late > 0.0 && early > late * 1.2,
        breakout_ratio: series.volumes[last_index] / avg,
    }
}

/// Inputs to the shared confidence scorer. Each checker fills in what it
/// actually measured; unknown factors stay at their neutral default.
#[derive(Clone, Debug, Default)]
pub struct ConfidenceFactors {
    /// Best trend-line fit backing the geometry, 0..1.
    pub fit_quality: f64,
    /// Confirming touch points beyond the geometric minimum.
    pub extra_touches: usize,
    /// Volume corroborates the pattern (drying consolidation or a
    /// breakout spike).
    pub volume_confirms: bool,
    /// Alignment with the caller-supplied trend context.
    pub trend_agrees: Option<bool>,
    /// Pattern-specific quality measure (retracement depth, compression).
    pub quality_bonus: f64,
}

/// Shared confidence contract: a base score plus weighted contributions,
/// clamped so no pattern is ever reported as certain or worthless.
pub fn score_confidence(base: f64, factors: &ConfidenceFactors) -> f64 {
    let mut confidence = base;
    confidence += factors.fit_quality * 15.0;
    confidence += (factors.extra_touches as f64 * 2.5).min(10.0);
    if factors.volume_confirms {
        confidence += 10.0;
    }
    match factors.trend_agrees {
        Some(true) => confidence += 7.5,
        Some(false) => confidence -= 10.0,
        None => {}
    }
    confidence += factors.quality_bonus;
    confidence.clamp(30.0, 95.0)
}

/// Geometry-quality strength score used as the secondary sort key.
pub fn pattern_strength(fit_quality: f64, touches: usize) -> f64 {
    (fit_quality * 60.0 + touches as f64 * 8.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::double_bottom_series;

    #[test]
    fn test_confidence_clamped_low() {
        let factors = ConfidenceFactors {
            trend_agrees: Some(false),
            ..Default::default()
        };
        assert_eq!(score_confidence(10.0, &factors), 30.0);
    }

    #[test]
    fn test_confidence_clamped_high() {
        let factors = ConfidenceFactors {
            fit_quality: 1.0,
            extra_touches: 10,
            volume_confirms: true,
            trend_agrees: Some(true),
            quality_bonus: 20.0,
        };
        assert_eq!(score_confidence(90.0, &factors), 95.0);
    }

    #[test]
    fn test_extra_touch_contribution_is_capped() {
        let few = ConfidenceFactors {
            extra_touches: 4,
            ..Default::default()
        };
        let many = ConfidenceFactors {
            extra_touches: 40,
            ..Default::default()
        };
        assert_eq!(score_confidence(55.0, &few), 65.0);
        assert_eq!(score_confidence(55.0, &many), 65.0);
    }

    #[test]
    fn test_breakout_volume_visible_in_ratio() {
        let series = double_bottom_series();
        // The fixture spikes its last candles to 150 against a 50 base.
        let analysis = analyze_volume(&series, &[15, 30, 45], 15);
        assert!(analysis.breakout_ratio > 2.0);
    }
}
