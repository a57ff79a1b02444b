use serde::{Deserialize, Serialize};

/// Broad trend direction supplied by an external trend-analysis collaborator.
/// The decision engine only reads this; it never computes it.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
pub enum TrendDirection {
    Uptrend,
    Downtrend,
    #[default]
    Sideways,
}

impl TrendDirection {
    pub fn is_bullish(&self) -> bool {
        matches!(self, TrendDirection::Uptrend)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, TrendDirection::Downtrend)
    }
}

/// Read-only trend context for one (symbol, timeframe).
/// `strength` is the collaborator's own scale (e.g. ADX); we only compare
/// direction, but the strength is carried through to reports.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendContext {
    pub direction: TrendDirection,
    pub strength: f64,
}

impl TrendContext {
    pub fn new(direction: TrendDirection, strength: f64) -> Self {
        Self {
            direction,
            strength,
        }
    }

    /// Does this trend agree with a bullish (true) or bearish (false) signal?
    /// Sideways never conflicts.
    pub fn agrees_with(&self, bullish: bool) -> bool {
        match self.direction {
            TrendDirection::Uptrend => bullish,
            TrendDirection::Downtrend => !bullish,
            TrendDirection::Sideways => true,
        }
    }
}
