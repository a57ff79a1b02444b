//! Candle file loading for the CLI. Market-data retrieval itself lives
//! outside this crate; the binary just reads what a fetch collaborator
//! already wrote to disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use itertools::Itertools;
use serde::Deserialize;

use crate::domain::{Candle, CandleSeries, Timeframe, TrendContext};
use crate::engine::AnalysisRequest;

/// On-disk input: one symbol, one entry per timeframe.
#[derive(Debug, Deserialize)]
pub struct CandleFile {
    pub symbol: String,
    pub frames: Vec<FrameData>,
}

#[derive(Debug, Deserialize)]
pub struct FrameData {
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
    #[serde(default)]
    pub trend: Option<TrendContext>,
}

/// Parse a candle JSON file into per-timeframe analysis requests.
pub fn load_candle_file(path: &Path) -> Result<(String, Vec<AnalysisRequest>)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading candle file {}", path.display()))?;
    let file: CandleFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing candle file {}", path.display()))?;

    let duplicated: Vec<Timeframe> = file
        .frames
        .iter()
        .map(|f| f.timeframe)
        .duplicates()
        .collect();
    if !duplicated.is_empty() {
        bail!(
            "candle file {} lists timeframe(s) {} more than once",
            path.display(),
            duplicated.iter().join(", ")
        );
    }

    let mut requests = Vec::with_capacity(file.frames.len());
    for frame in file.frames {
        let series = CandleSeries::from_candles(file.symbol.clone(), frame.timeframe, &frame.candles)?;
        requests.push(AnalysisRequest {
            series,
            trend: frame.trend,
        });
    }

    Ok((file.symbol, requests))
}
