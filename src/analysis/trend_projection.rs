use crate::analysis::levels::{Level, LevelSide, LevelSource, LevelTier};
use crate::analysis::pivots::PivotSet;
use crate::analysis::trend_line::fit_trend_line;
use crate::config::TrendProjectionSettings;
use crate::domain::CandleSeries;

/// Dynamic S/R from trend lines: a line through the last two pivot lows
/// projected to the current candle is support (when it sits below price),
/// and the line through the last two pivot highs is resistance. Stale
/// projections on the wrong side of price are dropped rather than reported.
pub fn trend_line_levels(
    series: &CandleSeries,
    pivots: &PivotSet,
    settings: &TrendProjectionSettings,
    current_price: f64,
) -> Vec<Level> {
    if series.is_empty() {
        return Vec::new();
    }

    let window_start = series.tail_start(settings.lookback);
    let current_index = series.last_index();
    let mut levels = Vec::new();

    let recent_lows: Vec<_> = pivots
        .lows
        .iter()
        .filter(|p| p.index >= window_start)
        .collect();
    if let [.., a, b] = recent_lows[..] {
        let line = fit_trend_line(&[(a.index, a.price), (b.index, b.price)]);
        let projected = line.value_at(current_index);
        if !line.is_neutral() && projected < current_price && projected > 0.0 {
            levels.push(Level {
                name: "Trendline support".to_string(),
                price: projected,
                side: LevelSide::Support,
                tier: LevelTier::Secondary,
                source: LevelSource::TrendLine,
                zone: None,
                strength: 60.0,
                touches: 2,
                confluence: false,
            });
        }
    }

    let recent_highs: Vec<_> = pivots
        .highs
        .iter()
        .filter(|p| p.index >= window_start)
        .collect();
    if let [.., a, b] = recent_highs[..] {
        let line = fit_trend_line(&[(a.index, a.price), (b.index, b.price)]);
        let projected = line.value_at(current_index);
        if !line.is_neutral() && projected > current_price {
            levels.push(Level {
                name: "Trendline resistance".to_string(),
                price: projected,
                side: LevelSide::Resistance,
                tier: LevelTier::Secondary,
                source: LevelSource::TrendLine,
                zone: None,
                strength: 60.0,
                touches: 2,
                confluence: false,
            });
        }
    }

    levels
}
