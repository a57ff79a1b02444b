//! Per-timeframe analysis pipeline and the parallel per-symbol driver.

use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::{Result, bail};
use rayon::prelude::*;

use crate::analysis::levels::{Level, LevelSide, LevelSource, LevelTier};
use crate::analysis::{aggregate_levels, detect_pivots};
use crate::analysis::{fibonacci, trend_projection, volume_profile};
use crate::config::{AnalysisConfig, MIN_CANDLES_FOR_ANALYSIS};
use crate::domain::{CandleSeries, TrendContext};
use crate::engine::decision::DecisionEngine;
use crate::engine::ranker;
use crate::models::{AnalysisReport, TimeframeReport};
use crate::patterns::{Pattern, PatternInput, run_all_checkers};
use crate::utils::time_utils;

/// One timeframe's worth of input: the candle slice plus the optional
/// trend context a collaborator computed for it.
pub struct AnalysisRequest {
    pub series: CandleSeries,
    pub trend: Option<TrendContext>,
}

/// Run the full pipeline over one candle slice: pivots, pattern
/// checkers, every level sub-analysis, the confluence merge, and the
/// decision. Pure function of its inputs; rerunning on the same slice
/// and config reproduces the output byte for byte.
pub fn analyze_timeframe(
    series: &CandleSeries,
    trend: Option<&TrendContext>,
    config: &AnalysisConfig,
) -> TimeframeReport {
    let current_price = series.last_close().unwrap_or(0.0);
    if series.len() < MIN_CANDLES_FOR_ANALYSIS {
        log::info!(
            "{} {}: {} candles, not enough to analyze",
            series.symbol,
            series.timeframe,
            series.len()
        );
        return TimeframeReport::insufficient(series.timeframe, current_price, &config.decision);
    }

    let pivots = detect_pivots(series, &config.pivots);
    let input = PatternInput {
        series,
        pivots: &pivots,
        current_price,
        trend,
        settings: &config.patterns,
    };
    let patterns = run_all_checkers(&input);

    let mut raw_levels = crate::analysis::levels::classic_support_resistance(
        series,
        &config.levels,
        current_price,
    );
    raw_levels.extend(fibonacci::fibonacci_levels(
        series,
        &config.fibonacci,
        current_price,
    ));
    raw_levels.extend(volume_profile::volume_profile_levels(
        series,
        &config.volume_profile,
        current_price,
    ));
    raw_levels.extend(trend_projection::trend_line_levels(
        series,
        &pivots,
        &config.trend_projection,
        current_price,
    ));
    raw_levels.extend(pattern_target_levels(&patterns, current_price));

    let levels = aggregate_levels(raw_levels, current_price, config.levels.merge_tolerance);

    let engine = DecisionEngine::new(&config.decision);
    let recommendation = engine.decide(series, &patterns, &levels, trend);

    let last_candle_at = series.timestamps_ms.last().copied().unwrap_or(0);
    log::debug!(
        "{} {} (through {}): {} patterns, {} supports, {} resistances, action {}",
        series.symbol,
        series.timeframe,
        time_utils::epoch_ms_to_utc(last_candle_at),
        patterns.len(),
        levels.supports.len(),
        levels.resistances.len(),
        recommendation.action
    );

    TimeframeReport {
        timeframe: series.timeframe,
        current_price,
        insufficient_data: false,
        error: None,
        patterns,
        supports: levels.supports,
        resistances: levels.resistances,
        recommendation,
        rank_score: 0.0,
    }
}

/// Pattern price targets become target-tier levels so the aggregator can
/// catch confluence between a measured move and, say, a Fibonacci
/// extension.
fn pattern_target_levels(patterns: &[Pattern], current_price: f64) -> Vec<Level> {
    let mut levels = Vec::new();
    for pattern in patterns {
        for target in [Some(pattern.target1), pattern.target2, pattern.target3]
            .into_iter()
            .flatten()
        {
            if target <= 0.0 {
                continue;
            }
            let side = if target < current_price {
                LevelSide::Support
            } else {
                LevelSide::Resistance
            };
            levels.push(Level {
                name: format!("{} target", pattern.kind),
                price: target,
                side,
                tier: LevelTier::Target,
                source: LevelSource::PatternTarget,
                zone: None,
                strength: pattern.confidence,
                touches: 1,
                confluence: false,
            });
        }
    }
    levels
}

/// Analyze every requested timeframe for one symbol in parallel, then
/// rank the reports best-first. Only a total absence of usable candle
/// data is an error; individual timeframe failures are contained in
/// their report.
pub fn analyze_symbol(symbol: &str, requests: &[AnalysisRequest]) -> Result<AnalysisReport> {
    if requests.iter().all(|r| r.series.is_empty()) {
        bail!("no candle data supplied for {symbol}");
    }

    let config_for = |request: &AnalysisRequest| AnalysisConfig::for_timeframe(request.series.timeframe);

    let mut reports: Vec<TimeframeReport> = requests
        .par_iter()
        .map(|request| {
            let config = config_for(request);
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                analyze_timeframe(&request.series, request.trend.as_ref(), &config)
            }));
            match outcome {
                Ok(report) => report,
                Err(_) => {
                    log::error!(
                        "analysis panicked for {} {}",
                        request.series.symbol,
                        request.series.timeframe
                    );
                    TimeframeReport::failed(
                        request.series.timeframe,
                        "analysis panicked".to_string(),
                        &config.decision,
                    )
                }
            }
        })
        .collect();

    ranker::rank_reports(&mut reports, &AnalysisConfig::default().decision);

    Ok(AnalysisReport {
        symbol: symbol.to_string(),
        generated_at_ms: time_utils::utc_now_as_timestamp_ms(),
        timeframes: reports,
    })
}
