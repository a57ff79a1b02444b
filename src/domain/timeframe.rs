use serde::{Deserialize, Serialize};

use crate::utils::time_utils::TimeUtils;

/// The candle interval a series was sampled at.
/// Analyses run independently per timeframe; the enum is mostly a label
/// plus the interval width used for timestamp arithmetic.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
    strum_macros::EnumString,
)]
pub enum Timeframe {
    #[strum(serialize = "15m")]
    #[serde(rename = "15m")]
    M15,
    #[default]
    #[strum(serialize = "1h")]
    #[serde(rename = "1h")]
    H1,
    #[strum(serialize = "4h")]
    #[serde(rename = "4h")]
    H4,
    #[strum(serialize = "1d")]
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub const fn interval_ms(&self) -> i64 {
        match self {
            Timeframe::M15 => TimeUtils::MS_IN_15_MIN,
            Timeframe::H1 => TimeUtils::MS_IN_H,
            Timeframe::H4 => TimeUtils::MS_IN_4_H,
            Timeframe::D1 => TimeUtils::MS_IN_D,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_display_round_trip() {
        for tf in Timeframe::iter() {
            let shown = tf.to_string();
            assert_eq!(Timeframe::from_str(&shown).unwrap(), tf);
        }
    }

    #[test]
    fn test_interval_widths() {
        assert_eq!(Timeframe::H1.interval_ms(), 3_600_000);
        assert_eq!(Timeframe::D1.interval_ms(), 86_400_000);
    }
}
