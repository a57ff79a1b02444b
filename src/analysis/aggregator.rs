use serde::Serialize;

use crate::analysis::levels::{Level, LevelSide};
use crate::utils::maths_utils::relative_diff;

/// The merged, deduplicated level view handed to the decision engine and
/// the reporting collaborator.
///
/// Contract: supports are ordered nearest-to-price first, resistances
/// ascending by price (also nearest first), and no two zones on the same
/// side overlap.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AggregatedLevels {
    pub supports: Vec<Level>,
    pub resistances: Vec<Level>,
}

impl AggregatedLevels {
    pub fn nearest_support(&self) -> Option<&Level> {
        self.supports.first()
    }

    pub fn nearest_resistance(&self) -> Option<&Level> {
        self.resistances.first()
    }

    pub fn is_empty(&self) -> bool {
        self.supports.is_empty() && self.resistances.is_empty()
    }
}

/// Second merge pass across every level-producing sub-analysis (classic
/// S/R, trend lines, Fibonacci, volume profile, pattern targets). Levels
/// landing within `merge_tolerance` of one another collapse into a single
/// zone that keeps the best tier/name and is tagged as a confluence zone
/// when more than one source contributed.
pub fn aggregate_levels(
    levels: Vec<Level>,
    current_price: f64,
    merge_tolerance: f64,
) -> AggregatedLevels {
    let (supports, resistances): (Vec<Level>, Vec<Level>) = levels
        .into_iter()
        .partition(|l| l.side == LevelSide::Support);

    let mut supports = merge_side(supports, merge_tolerance);
    let resistances = merge_side(resistances, merge_tolerance);

    // Nearest support first = descending price, since all supports sit
    // below the current price.
    supports.sort_by(|a, b| {
        (a.price - current_price)
            .abs()
            .total_cmp(&(b.price - current_price).abs())
    });

    AggregatedLevels {
        supports,
        resistances,
    }
}

fn merge_side(mut levels: Vec<Level>, tolerance: f64) -> Vec<Level> {
    if levels.is_empty() {
        return levels;
    }
    levels.sort_by(|a, b| a.price.total_cmp(&b.price));

    let mut clusters: Vec<Vec<Level>> = Vec::new();
    for level in levels {
        match clusters.last_mut() {
            Some(cluster) => {
                let mean =
                    cluster.iter().map(|l| l.price).sum::<f64>() / cluster.len() as f64;
                if relative_diff(level.price, mean) <= tolerance {
                    cluster.push(level);
                } else {
                    clusters.push(vec![level]);
                }
            }
            None => clusters.push(vec![level]),
        }
    }

    let mut merged: Vec<Level> = clusters.into_iter().filter_map(merge_cluster).collect();
    enforce_disjoint_zones(&mut merged);
    merged
}

fn merge_cluster(cluster: Vec<Level>) -> Option<Level> {
    if cluster.len() <= 1 {
        return cluster.into_iter().next();
    }

    // Highest-quality member names the merged zone.
    let best = cluster
        .iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| {
            a.tier
                .rank()
                .cmp(&b.tier.rank())
                .then(b.strength.total_cmp(&a.strength))
                .then(ia.cmp(ib))
        })
        .map(|(_, l)| l.clone())?;

    let price = cluster.iter().map(|l| l.price).sum::<f64>() / cluster.len() as f64;
    let zone_min = cluster
        .iter()
        .map(|l| l.zone.map_or(l.price, |(lo, _)| lo))
        .fold(f64::INFINITY, f64::min);
    let zone_max = cluster
        .iter()
        .map(|l| l.zone.map_or(l.price, |(_, hi)| hi))
        .fold(f64::NEG_INFINITY, f64::max);
    let touches = cluster.iter().map(|l| l.touches).sum();
    let strength = cluster
        .iter()
        .map(|l| l.strength)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut sources: Vec<_> = cluster.iter().map(|l| l.source).collect();
    sources.sort_by_key(|s| *s as u8);
    sources.dedup();
    let confluence = sources.len() >= 2;

    Some(Level {
        name: if confluence {
            format!("Confluence: {}", best.name)
        } else {
            best.name.clone()
        },
        price,
        side: best.side,
        tier: best.tier,
        source: best.source,
        zone: Some((zone_min, zone_max)),
        strength,
        touches,
        confluence,
    })
}

/// Zones inherited from member levels can still brush against a
/// neighbouring cluster; clamp boundaries so the non-overlap contract
/// holds. Expects `merged` sorted ascending by price.
fn enforce_disjoint_zones(merged: &mut [Level]) {
    for i in 1..merged.len() {
        let prev_top = match merged[i - 1].zone {
            Some((_, top)) => top,
            None => merged[i - 1].price,
        };
        if let Some((lo, hi)) = merged[i].zone {
            if lo < prev_top {
                merged[i].zone = if prev_top < hi {
                    Some((prev_top, hi))
                } else {
                    None
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::levels::{LevelSource, LevelTier};

    fn level(name: &str, price: f64, side: LevelSide, tier: LevelTier, source: LevelSource) -> Level {
        Level {
            name: name.to_string(),
            price,
            side,
            tier,
            source,
            zone: None,
            strength: 50.0,
            touches: 1,
            confluence: false,
        }
    }

    #[test]
    fn test_confluent_sources_merge_and_tag() {
        let levels = vec![
            level(
                "Major support",
                100.0,
                LevelSide::Support,
                LevelTier::Strong,
                LevelSource::ClassicSr,
            ),
            level(
                "Fib 0.618 support",
                100.3,
                LevelSide::Support,
                LevelTier::Strong,
                LevelSource::Fibonacci,
            ),
        ];
        let agg = aggregate_levels(levels, 110.0, 0.005);
        assert_eq!(agg.supports.len(), 1);
        let merged = &agg.supports[0];
        assert!(merged.confluence);
        assert!(merged.name.starts_with("Confluence:"));
        assert_eq!(merged.touches, 2);
        assert_eq!(merged.zone, Some((100.0, 100.3)));
    }

    #[test]
    fn test_best_tier_wins_merge() {
        let levels = vec![
            level(
                "Support",
                100.0,
                LevelSide::Support,
                LevelTier::Secondary,
                LevelSource::ClassicSr,
            ),
            level(
                "Volume POC",
                100.2,
                LevelSide::Support,
                LevelTier::Critical,
                LevelSource::VolumeProfile,
            ),
        ];
        let agg = aggregate_levels(levels, 110.0, 0.005);
        assert_eq!(agg.supports[0].tier, LevelTier::Critical);
        assert!(agg.supports[0].name.contains("Volume POC"));
    }

    #[test]
    fn test_no_overlapping_zones_per_side() {
        let mut levels = Vec::new();
        for price in [100.0, 100.2, 101.0, 101.1, 104.0] {
            let mut l = level(
                "Resistance",
                price,
                LevelSide::Resistance,
                LevelTier::Secondary,
                LevelSource::ClassicSr,
            );
            l.zone = Some((price - 0.3, price + 0.3));
            levels.push(l);
        }
        let agg = aggregate_levels(levels, 90.0, 0.005);
        let zones: Vec<(f64, f64)> = agg
            .resistances
            .iter()
            .filter_map(|l| l.zone)
            .collect();
        for pair in zones.windows(2) {
            assert!(
                pair[0].1 <= pair[1].0,
                "zones {:?} and {:?} overlap",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_supports_ordered_by_distance_from_price() {
        let levels = vec![
            level(
                "far",
                80.0,
                LevelSide::Support,
                LevelTier::Secondary,
                LevelSource::ClassicSr,
            ),
            level(
                "near",
                105.0,
                LevelSide::Support,
                LevelTier::Secondary,
                LevelSource::ClassicSr,
            ),
        ];
        let agg = aggregate_levels(levels, 110.0, 0.005);
        assert_eq!(agg.supports[0].name, "near");
        assert_eq!(agg.supports[1].name, "far");
    }

    #[test]
    fn test_resistances_ascending_by_price() {
        let levels = vec![
            level(
                "high",
                130.0,
                LevelSide::Resistance,
                LevelTier::Secondary,
                LevelSource::ClassicSr,
            ),
            level(
                "low",
                115.0,
                LevelSide::Resistance,
                LevelTier::Secondary,
                LevelSource::ClassicSr,
            ),
        ];
        let agg = aggregate_levels(levels, 110.0, 0.005);
        assert_eq!(agg.resistances[0].name, "low");
        assert_eq!(agg.resistances[1].name, "high");
    }
}
