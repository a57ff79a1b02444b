use serde::Serialize;

use crate::analysis::{AggregatedLevels, Level};
use crate::config::DecisionSettings;
use crate::domain::{CandleSeries, TrendContext};
use crate::patterns::{Pattern, PatternStatus};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum Action {
    Buy,
    Sell,
    Wait,
}

/// One recommendation per (symbol, timeframe) per run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub action: Action,
    pub confidence: f64,
    /// Positive for buy, negative for sell, zero for wait; scaled by
    /// confidence for cross-timeframe ranking.
    pub total_score: f64,
    pub entry: Option<f64>,
    pub stop_loss: Option<f64>,
    pub targets: Vec<f64>,
    /// Human-readable explanation when a pattern/trend disagreement
    /// forced the action down to wait.
    pub conflict_note: Option<String>,
    /// Conditions to watch before acting; never empty for an actionable
    /// recommendation.
    pub confirmations: Vec<String>,
    pub pattern: Option<Pattern>,
    pub supporting_levels: Vec<Level>,
}

impl Recommendation {
    /// The stand-aside recommendation used when there is nothing to act
    /// on (no pattern, not enough data, or a failed run).
    pub fn neutral_wait(settings: &DecisionSettings) -> Self {
        Recommendation::wait(settings.neutral_confidence)
    }

    fn wait(confidence: f64) -> Self {
        Recommendation {
            action: Action::Wait,
            confidence,
            total_score: 0.0,
            entry: None,
            stop_loss: None,
            targets: Vec::new(),
            conflict_note: None,
            confirmations: Vec::new(),
            pattern: None,
            supporting_levels: Vec::new(),
        }
    }
}

pub struct DecisionEngine<'a> {
    settings: &'a DecisionSettings,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(settings: &'a DecisionSettings) -> Self {
        DecisionEngine { settings }
    }

    /// Turn the best pattern plus aggregated levels and trend context
    /// into one recommendation.
    ///
    /// The resolution order is fixed: no pattern means wait at the
    /// neutral confidence; a forming or low-confidence pattern is
    /// reported but downgraded to wait; a pattern fighting the broader
    /// trend is downgraded to wait with a conflict note.
    pub fn decide(
        &self,
        series: &CandleSeries,
        patterns: &[Pattern],
        levels: &AggregatedLevels,
        trend: Option<&TrendContext>,
    ) -> Recommendation {
        let Some(best) = patterns.first() else {
            return Recommendation::wait(self.settings.neutral_confidence);
        };

        let bullish = best.kind.is_bullish();
        let candidate = if bullish { Action::Buy } else { Action::Sell };

        let mut action = candidate;
        let mut conflict_note = None;

        if best.status == PatternStatus::Forming
            || best.confidence < self.settings.actionable_confidence
        {
            // Still worth monitoring, not worth entering.
            action = Action::Wait;
        } else if let Some(trend) = trend {
            if !trend.agrees_with(bullish) {
                action = Action::Wait;
                conflict_note = Some(format!(
                    "{} {} suggests {}, but the broader trend is {}; waiting for alignment",
                    best.status, best.kind, candidate, trend.direction
                ));
            }
        }

        let mut recommendation = Recommendation {
            action,
            confidence: best.confidence,
            total_score: 0.0,
            entry: None,
            stop_loss: None,
            targets: Vec::new(),
            conflict_note,
            confirmations: Vec::new(),
            pattern: Some(best.clone()),
            supporting_levels: supporting_levels(levels),
        };

        if action != Action::Wait {
            recommendation.entry = Some(best.activation_level);
            recommendation.stop_loss = Some(best.invalidation_level);
            recommendation.targets = [Some(best.target1), best.target2, best.target3]
                .into_iter()
                .flatten()
                .collect();
            recommendation.confirmations =
                self.confirmations(series, best, levels, trend, bullish);
            recommendation.total_score = if action == Action::Buy {
                best.confidence / 10.0
            } else {
                -best.confidence / 10.0
            };
        }

        recommendation
    }

    /// The price-breach condition always leads; secondary corroborations
    /// follow, and their absence is flagged explicitly instead of
    /// returning a bare list.
    fn confirmations(
        &self,
        series: &CandleSeries,
        pattern: &Pattern,
        levels: &AggregatedLevels,
        trend: Option<&TrendContext>,
        bullish: bool,
    ) -> Vec<String> {
        let direction = if bullish { "above" } else { "below" };
        let mut confirmations = vec![format!(
            "requires a close {} {:.4} to confirm the {}",
            direction, pattern.activation_level, pattern.kind
        )];

        let avg_volume = series.trailing_mean_volume(self.settings.volume_avg_window);
        if avg_volume > 0.0 {
            if let Some(last) = series.volumes.last() {
                if *last > avg_volume * self.settings.breakout_volume_factor {
                    confirmations.push(format!(
                        "breakout volume running {:.1}x the {}-candle average",
                        last / avg_volume,
                        self.settings.volume_avg_window
                    ));
                }
            }
        }

        if let Some(trend) = trend {
            let directional = trend.direction.is_bullish() || trend.direction.is_bearish();
            if directional && trend.agrees_with(bullish) {
                confirmations.push(format!("aligned with the broader {}", trend.direction));
            }
        }

        let backing = if bullish {
            levels.nearest_support()
        } else {
            levels.nearest_resistance()
        };
        if let Some(level) = backing {
            confirmations.push(format!("backed by {} at {:.4}", level.name, level.price));
        }

        if confirmations.len() == 1 {
            confirmations.push("no strong secondary confirmation; proceed with caution".to_string());
        }

        confirmations
    }
}

/// The handful of nearest zones on each side, for the report.
fn supporting_levels(levels: &AggregatedLevels) -> Vec<Level> {
    levels
        .supports
        .iter()
        .take(3)
        .chain(levels.resistances.iter().take(3))
        .cloned()
        .collect()
}
