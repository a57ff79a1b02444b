use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::domain::timeframe::Timeframe;

/// A single OHLCV candle. Immutable once ingested.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Candle {
            timestamp_ms,
            open,
            high,
            low,
            close,
            volume,
        }
    }

}

/// Column-vector OHLCV series for one (symbol, timeframe).
/// Stored as parallel vectors so per-column scans (peak detection,
/// min/max, volume binning) stay cache-friendly.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub timeframe: Timeframe,

    pub timestamps_ms: Vec<i64>,

    // Prices
    pub opens: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,

    // Volumes
    pub volumes: Vec<f64>,
}

impl CandleSeries {
    /// Build a series from row candles, validating the ordering contract:
    /// strictly increasing timestamps, no duplicates.
    pub fn from_candles(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<Self> {
        let symbol = symbol.into();
        for pair in candles.windows(2) {
            if pair[1].timestamp_ms <= pair[0].timestamp_ms {
                bail!(
                    "candle timestamps for {} {} must be strictly increasing ({} then {})",
                    symbol,
                    timeframe,
                    pair[0].timestamp_ms,
                    pair[1].timestamp_ms
                );
            }
        }

        Ok(CandleSeries {
            symbol,
            timeframe,
            timestamps_ms: candles.iter().map(|c| c.timestamp_ms).collect(),
            opens: candles.iter().map(|c| c.open).collect(),
            highs: candles.iter().map(|c| c.high).collect(),
            lows: candles.iter().map(|c| c.low).collect(),
            closes: candles.iter().map(|c| c.close).collect(),
            volumes: candles.iter().map(|c| c.volume).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.len().saturating_sub(1)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    /// First index of the most recent `n` candles (the whole series if shorter).
    pub fn tail_start(&self, n: usize) -> usize {
        self.len().saturating_sub(n)
    }

    /// True range per candle: max(high-low, |high-prev_close|, |low-prev_close|).
    /// The first candle falls back to high-low.
    pub fn true_ranges(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| {
                let hl = self.highs[i] - self.lows[i];
                if i == 0 {
                    hl
                } else {
                    let prev_close = self.closes[i - 1];
                    hl.max((self.highs[i] - prev_close).abs())
                        .max((self.lows[i] - prev_close).abs())
                }
            })
            .collect()
    }

    /// Mean true range over the trailing `window` candles.
    /// Returns None when there is nothing to average.
    pub fn mean_true_range(&self, window: usize) -> Option<f64> {
        if self.is_empty() || window == 0 {
            return None;
        }
        let ranges = self.true_ranges();
        let start = ranges.len().saturating_sub(window);
        let tail = &ranges[start..];
        if tail.is_empty() {
            return None;
        }
        Some(tail.iter().mean())
    }

    /// Sample standard deviation of the high series. Used as the pivot
    /// prominence fallback when true range degenerates to zero.
    pub fn high_std_dev(&self) -> f64 {
        if self.len() < 2 {
            return 0.0;
        }
        self.highs.iter().std_dev()
    }

    pub fn mean_close(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.closes.iter().mean()
    }

    pub fn mean_volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.volumes.iter().mean()
    }

    /// Mean volume over the trailing `window` candles.
    pub fn trailing_mean_volume(&self, window: usize) -> f64 {
        if self.is_empty() || window == 0 {
            return 0.0;
        }
        let start = self.len().saturating_sub(window);
        self.volumes[start..].iter().mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(t: i64, c: f64) -> Candle {
        Candle::new(t, c, c + 1.0, c - 1.0, c, 10.0)
    }

    #[test]
    fn test_from_candles_rejects_duplicate_timestamps() {
        let rows = vec![candle(0, 100.0), candle(0, 101.0)];
        assert!(CandleSeries::from_candles("BTCUSDT", Timeframe::H1, &rows).is_err());
    }

    #[test]
    fn test_from_candles_rejects_out_of_order() {
        let rows = vec![candle(1000, 100.0), candle(500, 101.0)];
        assert!(CandleSeries::from_candles("BTCUSDT", Timeframe::H1, &rows).is_err());
    }

    #[test]
    fn test_true_range_uses_gaps() {
        // Second candle gaps above the previous close, so its true range
        // must stretch down to that close.
        let rows = vec![
            Candle::new(0, 100.0, 101.0, 99.0, 100.0, 1.0),
            Candle::new(1, 105.0, 106.0, 104.0, 105.0, 1.0),
        ];
        let series = CandleSeries::from_candles("X", Timeframe::H1, &rows).unwrap();
        let ranges = series.true_ranges();
        assert_eq!(ranges[0], 2.0);
        assert_eq!(ranges[1], 6.0); // 106 - prev close 100
    }

    #[test]
    fn test_mean_true_range_empty() {
        let series = CandleSeries::default();
        assert!(series.mean_true_range(14).is_none());
    }
}
