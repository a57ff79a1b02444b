use serde::Serialize;

use crate::analysis::pivots::{PivotSide, find_extrema_spaced};
use crate::config::{LevelSettings, MIN_CANDLES_FOR_ANALYSIS};
use crate::domain::CandleSeries;
use crate::utils::maths_utils::{get_min_max, normalize_to_100, relative_diff};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum LevelSide {
    Support,
    Resistance,
}

/// Quality tier of a level, best first. The ordering doubles as merge
/// precedence when confluent levels collapse into one zone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum LevelTier {
    Critical,
    Strong,
    Secondary,
    Historical,
    Target,
}

impl LevelTier {
    /// Lower rank wins a merge.
    pub fn rank(&self) -> u8 {
        match self {
            LevelTier::Critical => 0,
            LevelTier::Strong => 1,
            LevelTier::Secondary => 2,
            LevelTier::Historical => 3,
            LevelTier::Target => 4,
        }
    }
}

/// Which sub-analysis produced a level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum LevelSource {
    ClassicSr,
    TrendLine,
    Fibonacci,
    VolumeProfile,
    PatternTarget,
}

/// A support or resistance price zone.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Level {
    pub name: String,
    pub price: f64,
    pub side: LevelSide,
    pub tier: LevelTier,
    pub source: LevelSource,
    /// Present when this is a merged/confluent zone: the value range the
    /// zone was built from.
    pub zone: Option<(f64, f64)>,
    /// 0-100 strength proxy, normalized within the producing run.
    pub strength: f64,
    pub touches: usize,
    /// True when independent sources landed inside the same zone.
    pub confluence: bool,
}

/// A raw candidate price level fed into the clusterer, with the traded
/// volume observed at the candle that produced it (0 when unknown).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RawLevel {
    pub price: f64,
    pub volume: f64,
}

/// Group raw price levels into zones: sort by price and merge anything
/// within `tolerance` of the running cluster mean. Touch count and traded
/// volume act as the strength proxy, normalized 0-100 across the run's
/// zones. Each zone is classified against the current price.
pub fn cluster_levels(candidates: &[RawLevel], current_price: f64, tolerance: f64) -> Vec<Level> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<RawLevel> = candidates.to_vec();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price));

    struct Cluster {
        members: Vec<RawLevel>,
        mean: f64,
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    for raw in sorted {
        match clusters.last_mut() {
            Some(cluster) if relative_diff(raw.price, cluster.mean) <= tolerance => {
                cluster.members.push(raw);
                cluster.mean = cluster.members.iter().map(|m| m.price).sum::<f64>()
                    / cluster.members.len() as f64;
            }
            _ => clusters.push(Cluster {
                mean: raw.price,
                members: vec![raw],
            }),
        }
    }

    let volume_masses: Vec<f64> = clusters
        .iter()
        .map(|c| c.members.iter().map(|m| m.volume).sum::<f64>())
        .collect();
    let has_volume = volume_masses.iter().any(|&v| v > 0.0);
    let strengths = if has_volume {
        normalize_to_100(&volume_masses)
    } else {
        let touches: Vec<f64> = clusters.iter().map(|c| c.members.len() as f64).collect();
        normalize_to_100(&touches)
    };

    clusters
        .iter()
        .zip(strengths)
        .map(|(cluster, strength)| {
            let touches = cluster.members.len();
            let side = if cluster.mean < current_price {
                LevelSide::Support
            } else {
                LevelSide::Resistance
            };
            let tier = if touches >= 3 {
                LevelTier::Strong
            } else {
                LevelTier::Secondary
            };
            let name = match (tier, side) {
                (LevelTier::Strong, LevelSide::Support) => "Major support",
                (LevelTier::Strong, LevelSide::Resistance) => "Major resistance",
                (_, LevelSide::Support) => "Support",
                (_, LevelSide::Resistance) => "Resistance",
            };
            let zone = (touches > 1).then(|| {
                let prices: Vec<f64> = cluster.members.iter().map(|m| m.price).collect();
                get_min_max(&prices)
            });
            Level {
                name: name.to_string(),
                price: cluster.mean,
                side,
                tier,
                source: LevelSource::ClassicSr,
                zone,
                strength,
                touches,
                confluence: false,
            }
        })
        .collect()
}

/// Classic support/resistance from historical price structure: prominent
/// peaks in the high series and troughs in the low series, plus the slice's
/// absolute extremes, clustered into zones and trimmed to the nearest few
/// per side.
pub fn classic_support_resistance(
    series: &CandleSeries,
    settings: &LevelSettings,
    current_price: f64,
) -> Vec<Level> {
    if series.len() < MIN_CANDLES_FOR_ANALYSIS {
        return Vec::new();
    }

    let (low, high) = (
        crate::utils::maths_utils::get_min(&series.lows),
        crate::utils::maths_utils::get_max(&series.highs),
    );
    let price_range = high - low;
    if price_range <= 0.0 {
        // Flat slice: every candle at one price carries no S/R structure.
        return Vec::new();
    }

    let prominence = price_range * settings.peak_prominence_pct;

    let mut candidates: Vec<RawLevel> = Vec::new();
    for peak in find_extrema_spaced(
        &series.highs,
        prominence,
        settings.peak_distance,
        PivotSide::High,
    ) {
        candidates.push(RawLevel {
            price: peak.price,
            volume: series.volumes[peak.index],
        });
    }
    let negated: Vec<f64> = series.lows.iter().map(|&l| -l).collect();
    for trough in find_extrema_spaced(
        &negated,
        prominence,
        settings.peak_distance,
        PivotSide::Low,
    ) {
        candidates.push(RawLevel {
            price: series.lows[trough.index],
            volume: series.volumes[trough.index],
        });
    }

    let mut levels = cluster_levels(&candidates, current_price, settings.cluster_tolerance);

    // The slice extremes are levels in their own right even when no
    // interior peak touched them.
    let historical = [
        (high, LevelSide::Resistance, "Historical high"),
        (low, LevelSide::Support, "Historical low"),
    ];
    for (price, natural_side, name) in historical {
        let side = if price < current_price {
            LevelSide::Support
        } else {
            LevelSide::Resistance
        };
        // Only report the extreme on its natural side of price; an
        // all-time high below current price is stale information here.
        if side != natural_side {
            continue;
        }
        levels.push(Level {
            name: name.to_string(),
            price,
            side,
            tier: LevelTier::Historical,
            source: LevelSource::ClassicSr,
            zone: None,
            strength: 50.0,
            touches: 1,
            confluence: false,
        });
    }

    trim_to_nearest(levels, current_price, settings.max_levels_per_side)
}

/// Keep only the `max_per_side` zones nearest to the current price on each
/// side, preserving the sorted-by-price invariant within each side.
fn trim_to_nearest(levels: Vec<Level>, current_price: f64, max_per_side: usize) -> Vec<Level> {
    let (mut supports, mut resistances): (Vec<Level>, Vec<Level>) = levels
        .into_iter()
        .partition(|l| l.side == LevelSide::Support);

    supports.sort_by(|a, b| b.price.total_cmp(&a.price)); // nearest first
    supports.truncate(max_per_side);
    supports.sort_by(|a, b| a.price.total_cmp(&b.price));

    resistances.sort_by(|a, b| a.price.total_cmp(&b.price)); // nearest first
    resistances.truncate(max_per_side);

    let mut out = supports;
    out.extend(resistances);
    out
}
