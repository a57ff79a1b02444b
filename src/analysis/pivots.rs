use find_peaks::PeakFinder;
use serde::Serialize;

use crate::config::{MIN_CANDLES_FOR_ANALYSIS, PivotSettings};
use crate::domain::CandleSeries;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum PivotSide {
    High,
    Low,
}

/// A local price extremum used as a geometric anchor by every pattern
/// checker and by the trend-line S/R module.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct PivotPoint {
    /// Position in the candle slice this run analyzed.
    pub index: usize,
    pub price: f64,
    /// Prominence: how far the extremum stands out from its flanks.
    pub strength: f64,
    pub side: PivotSide,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PivotSet {
    /// Sorted ascending by index, unique per index.
    pub highs: Vec<PivotPoint>,
    /// Sorted ascending by index, unique per index.
    pub lows: Vec<PivotPoint>,
}

impl PivotSet {
    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }
}

/// Extract swing highs and lows from the candle slice.
///
/// Prominence is derived from recent volatility (mean true range over a
/// trailing window, times a multiplier) so sensitivity adapts to the
/// instrument and timeframe. When that degenerates to zero (flat series,
/// too little data) we fall back to the standard deviation of the highs,
/// and give up entirely rather than divide by zero.
pub fn detect_pivots(series: &CandleSeries, settings: &PivotSettings) -> PivotSet {
    if series.len() < MIN_CANDLES_FOR_ANALYSIS {
        log::debug!(
            "pivot detection skipped for {} {}: {} candles (need {})",
            series.symbol,
            series.timeframe,
            series.len(),
            MIN_CANDLES_FOR_ANALYSIS
        );
        return PivotSet::default();
    }

    let mut prominence = series
        .mean_true_range(settings.atr_window)
        .unwrap_or(0.0)
        * settings.prominence_multiplier;
    if prominence <= 0.0 {
        prominence = series.high_std_dev();
    }
    if prominence <= 0.0 {
        // Degenerate (flat) series: no meaningful extrema exist.
        log::debug!(
            "pivot detection skipped for {} {}: zero volatility",
            series.symbol,
            series.timeframe
        );
        return PivotSet::default();
    }

    let mut highs =
        find_extrema_spaced(&series.highs, prominence, settings.distance, PivotSide::High);

    // Lows are peaks of the negated low series; restore the price afterwards.
    let negated: Vec<f64> = series.lows.iter().map(|&low| -low).collect();
    let mut lows = find_extrema_spaced(&negated, prominence, settings.distance, PivotSide::Low);
    for pivot in &mut lows {
        pivot.price = series.lows[pivot.index];
    }

    // A pivot high and pivot low may not share an index; keep the stronger.
    lows.retain(|low| {
        match highs.iter().find(|high| high.index == low.index) {
            Some(high) => low.strength > high.strength,
            None => true,
        }
    });
    highs.retain(|high| !lows.iter().any(|low| low.index == high.index));

    PivotSet { highs, lows }
}

/// Peak detection on one price column: prominence filter from the crate,
/// then greedy spacing enforcement (strongest first) so every returned
/// pivot is the extreme value within `distance` candles on both sides.
/// Also used by the classic S/R extractor with its own prominence scale.
pub(crate) fn find_extrema_spaced(
    values: &[f64],
    prominence: f64,
    distance: usize,
    side: PivotSide,
) -> Vec<PivotPoint> {
    let mut finder = PeakFinder::new(values);
    finder.with_min_prominence(prominence);
    let peaks = finder.find_peaks();

    let mut candidates: Vec<PivotPoint> = peaks
        .iter()
        .map(|peak| {
            let index = peak.middle_position();
            PivotPoint {
                index,
                price: values[index],
                strength: peak.prominence.unwrap_or(0.0),
                side,
            }
        })
        .collect();

    // Strongest candidates claim their neighbourhood first. Index is the
    // tie-break so reruns on the same slice stay byte-identical.
    candidates.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| a.index.cmp(&b.index))
    });

    let mut accepted: Vec<PivotPoint> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let blocked = accepted
            .iter()
            .any(|p| candidate.index.abs_diff(p.index) < distance.max(1));
        if !blocked {
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|p| p.index);
    accepted.dedup_by_key(|p| p.index);
    accepted
}
