use crate::analysis::levels::{Level, LevelSide, LevelSource, LevelTier};
use crate::config::FibonacciSettings;
use crate::domain::CandleSeries;
use crate::utils::maths_utils::{get_max, get_min};

const RETRACEMENT_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];
const EXTENSION_RATIOS: [f64; 2] = [1.618, 2.618];

/// Fibonacci retracement and extension levels over the lookback swing.
///
/// The swing direction decides the anchor: retracements hang off the high
/// in an uptrend and off the low in a downtrend. Extensions project beyond
/// the swing and are reported as target-tier levels.
pub fn fibonacci_levels(
    series: &CandleSeries,
    settings: &FibonacciSettings,
    current_price: f64,
) -> Vec<Level> {
    if series.len() < settings.lookback.min(crate::config::MIN_CANDLES_FOR_ANALYSIS) {
        return Vec::new();
    }

    let start = series.tail_start(settings.lookback);
    let highs = &series.highs[start..];
    let lows = &series.lows[start..];
    let closes = &series.closes[start..];

    let highest_high = get_max(highs);
    let lowest_low = get_min(lows);
    let price_range = highest_high - lowest_low;
    if price_range <= 0.0 {
        return Vec::new();
    }

    let is_uptrend = closes[closes.len() - 1] > closes[0];

    let mut levels = Vec::new();
    for ratio in RETRACEMENT_RATIOS {
        let value = if is_uptrend {
            highest_high - price_range * ratio
        } else {
            lowest_low + price_range * ratio
        };
        let side = side_of(value, current_price);
        // The golden-ratio retracement is where reversals are watched for.
        let tier = if ratio == 0.618 {
            LevelTier::Strong
        } else {
            LevelTier::Secondary
        };
        levels.push(fib_level(
            format!("Fib {ratio} {}", side_label(side)),
            value,
            side,
            tier,
        ));
    }

    for ratio in EXTENSION_RATIOS {
        let value = if is_uptrend {
            highest_high + price_range * (ratio - 1.0)
        } else {
            lowest_low - price_range * (ratio - 1.0)
        };
        if value <= 0.0 {
            continue;
        }
        let side = side_of(value, current_price);
        levels.push(fib_level(
            format!("Fib extension {ratio}"),
            value,
            side,
            LevelTier::Target,
        ));
    }

    levels
}

fn side_of(value: f64, current_price: f64) -> LevelSide {
    if value < current_price {
        LevelSide::Support
    } else {
        LevelSide::Resistance
    }
}

fn side_label(side: LevelSide) -> &'static str {
    match side {
        LevelSide::Support => "support",
        LevelSide::Resistance => "resistance",
    }
}

fn fib_level(name: String, price: f64, side: LevelSide, tier: LevelTier) -> Level {
    let strength = match tier {
        LevelTier::Strong => 75.0,
        LevelTier::Target => 60.0,
        _ => 55.0,
    };
    Level {
        name,
        price,
        side,
        tier,
        source: LevelSource::Fibonacci,
        zone: None,
        strength,
        touches: 1,
        confluence: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::trending_series;

    fn settings() -> FibonacciSettings {
        FibonacciSettings { lookback: 90 }
    }

    #[test]
    fn test_uptrend_retracements_below_high() {
        // Rising series: retracements anchor to the swing high.
        let series = trending_series(100, 100.0, 0.5);
        let current = series.last_close().unwrap();
        let levels = fibonacci_levels(&series, &settings(), current);
        assert!(!levels.is_empty());

        let fib618 = levels
            .iter()
            .find(|l| l.name.starts_with("Fib 0.618"))
            .unwrap();
        assert_eq!(fib618.tier, LevelTier::Strong);
        assert!(fib618.price < current);
        assert_eq!(fib618.side, LevelSide::Support);
    }

    #[test]
    fn test_extensions_are_targets_above_price_in_uptrend() {
        let series = trending_series(100, 100.0, 0.5);
        let current = series.last_close().unwrap();
        let levels = fibonacci_levels(&series, &settings(), current);
        let ext = levels
            .iter()
            .find(|l| l.name.starts_with("Fib extension"))
            .unwrap();
        assert_eq!(ext.tier, LevelTier::Target);
        assert!(ext.price > current);
    }

    #[test]
    fn test_flat_range_returns_empty() {
        let series = crate::testing::flat_series(100, 50.0);
        assert!(fibonacci_levels(&series, &settings(), 50.0).is_empty());
    }
}
