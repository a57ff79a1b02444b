//! Hand-built candle fixtures shared across unit tests.

use crate::domain::{Candle, CandleSeries, Timeframe};

const HOUR_MS: i64 = Timeframe::H1.interval_ms();

/// Build an hourly series straight from a close path. Highs/lows hug the
/// close by half a point and volume is constant unless overridden later.
pub fn series_from_closes(closes: &[f64]) -> CandleSeries {
    let rows: Vec<Candle> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle::new(
                i as i64 * HOUR_MS,
                open,
                close.max(open) + 0.5,
                close.min(open) - 0.5,
                close,
                10.0,
            )
        })
        .collect();
    CandleSeries::from_candles("TEST", Timeframe::H1, &rows)
        .expect("fixture timestamps are increasing")
}

/// Every candle at the same price. No structure at all.
pub fn flat_series(n: usize, price: f64) -> CandleSeries {
    let rows: Vec<Candle> = (0..n)
        .map(|i| Candle::new(i as i64 * HOUR_MS, price, price, price, price, 10.0))
        .collect();
    CandleSeries::from_candles("TEST", Timeframe::H1, &rows)
        .expect("fixture timestamps are increasing")
}

/// Triangle wave between 100 and 110, period 20 candles. Gives clean,
/// well-spaced peaks and troughs for pivot and S/R tests.
pub fn zigzag_series(n: usize) -> CandleSeries {
    let closes: Vec<f64> = (0..n)
        .map(|i| {
            let phase = i % 20;
            if phase <= 10 {
                100.0 + phase as f64
            } else {
                100.0 + (20 - phase) as f64
            }
        })
        .collect();
    series_from_closes(&closes)
}

/// Monotonic drift: close = start + i * step.
pub fn trending_series(n: usize, start: f64, step: f64) -> CandleSeries {
    let closes: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
    series_from_closes(&closes)
}

/// Piecewise-linear close path through `(index, price)` waypoints.
/// Indices must be increasing and the last one names the series length - 1.
pub fn waypoint_series(waypoints: &[(usize, f64)]) -> CandleSeries {
    let mut closes = Vec::new();
    for pair in waypoints.windows(2) {
        let (i0, p0) = pair[0];
        let (i1, p1) = pair[1];
        let span = (i1 - i0) as f64;
        for i in i0..i1 {
            let t = (i - i0) as f64 / span;
            closes.push(p0 + (p1 - p0) * t);
        }
    }
    if let Some(&(_, last)) = waypoints.last() {
        closes.push(last);
    }
    series_from_closes(&closes)
}

/// A textbook 60-candle double bottom: troughs at 100 (index 15) and
/// 100.5 (index 45), a neckline peak at 110 (index 30), and a close above
/// the neckline on elevated volume at the end. Wickless candles keep the
/// pivot prices exactly on the waypoint values.
pub fn double_bottom_series() -> CandleSeries {
    let mut series = waypoint_series(&[
        (0, 108.0),
        (15, 100.0),
        (30, 110.0),
        (45, 100.5),
        (55, 108.0),
        (59, 112.0),
    ]);
    series.highs = series.closes.clone();
    series.lows = series.closes.clone();
    series.opens = series.closes.clone();
    // Volume dries up through the base, then spikes on the breakout.
    let n = series.len();
    for (i, volume) in series.volumes.iter_mut().enumerate() {
        *volume = if i >= n - 2 { 150.0 } else { 50.0 };
    }
    series
}
