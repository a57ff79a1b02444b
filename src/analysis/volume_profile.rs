use crate::analysis::levels::{Level, LevelSide, LevelSource, LevelTier};
use crate::config::VolumeProfileSettings;
use crate::domain::CandleSeries;
use crate::utils::maths_utils::{get_max, get_min};

/// Volume-by-price levels: bin the slice's closes into a fixed histogram,
/// then report the point of control (highest-volume bin) and any
/// high-volume nodes as levels. The POC is where the market transacted the
/// most and tends to act as a magnet; HVNs are secondary shelves.
pub fn volume_profile_levels(
    series: &CandleSeries,
    settings: &VolumeProfileSettings,
    current_price: f64,
) -> Vec<Level> {
    if series.is_empty() || settings.bins == 0 {
        return Vec::new();
    }

    let min_price = get_min(&series.lows);
    let max_price = get_max(&series.highs);
    let span = max_price - min_price;
    if span <= 0.0 {
        return Vec::new();
    }

    let bin_width = span / settings.bins as f64;
    let mut volume_by_bin = vec![0.0_f64; settings.bins];
    for i in 0..series.len() {
        let offset = ((series.closes[i] - min_price) / bin_width) as usize;
        let bin = offset.min(settings.bins - 1);
        volume_by_bin[bin] += series.volumes[i];
    }

    let total: f64 = volume_by_bin.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let poc_bin = volume_by_bin
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let poc_volume = volume_by_bin[poc_bin];
    let mean_volume = total / settings.bins as f64;

    let bin_center = |bin: usize| min_price + (bin as f64 + 0.5) * bin_width;
    let side_of = |price: f64| {
        if price < current_price {
            LevelSide::Support
        } else {
            LevelSide::Resistance
        }
    };

    let mut levels = vec![Level {
        name: "Volume POC".to_string(),
        price: bin_center(poc_bin),
        side: side_of(bin_center(poc_bin)),
        tier: LevelTier::Critical,
        source: LevelSource::VolumeProfile,
        zone: Some((
            min_price + poc_bin as f64 * bin_width,
            min_price + (poc_bin + 1) as f64 * bin_width,
        )),
        strength: 100.0,
        touches: 1,
        confluence: false,
    }];

    for (bin, &volume) in volume_by_bin.iter().enumerate() {
        if bin == poc_bin || volume <= mean_volume * settings.hvn_factor {
            continue;
        }
        let price = bin_center(bin);
        levels.push(Level {
            name: "High-volume node".to_string(),
            price,
            side: side_of(price),
            tier: LevelTier::Strong,
            source: LevelSource::VolumeProfile,
            zone: Some((
                min_price + bin as f64 * bin_width,
                min_price + (bin + 1) as f64 * bin_width,
            )),
            strength: volume / poc_volume * 100.0,
            touches: 1,
            confluence: false,
        });
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candle, CandleSeries, Timeframe};

    fn settings() -> VolumeProfileSettings {
        VolumeProfileSettings {
            bins: 50,
            hvn_factor: 2.0,
        }
    }

    /// Series spending most volume near 100, with one excursion to 110.
    fn profiled_series() -> CandleSeries {
        let mut rows = Vec::new();
        for i in 0..60_i64 {
            let close = if (20..25).contains(&i) { 110.0 } else { 100.0 };
            let volume = if close == 100.0 { 50.0 } else { 5.0 };
            rows.push(Candle::new(
                i * 3_600_000,
                close,
                close + 0.5,
                close - 0.5,
                close,
                volume,
            ));
        }
        CandleSeries::from_candles("TEST", Timeframe::H1, &rows).unwrap()
    }

    #[test]
    fn test_poc_sits_at_dominant_price() {
        let levels = volume_profile_levels(&profiled_series(), &settings(), 105.0);
        let poc = levels.iter().find(|l| l.name == "Volume POC").unwrap();
        assert!((poc.price - 100.0).abs() < 1.0);
        assert_eq!(poc.tier, LevelTier::Critical);
        assert_eq!(poc.side, LevelSide::Support);
        assert_eq!(poc.strength, 100.0);
    }

    #[test]
    fn test_zero_volume_returns_empty() {
        let mut series = profiled_series();
        series.volumes.iter_mut().for_each(|v| *v = 0.0);
        assert!(volume_profile_levels(&series, &settings(), 105.0).is_empty());
    }

    #[test]
    fn test_flat_price_returns_empty() {
        let series = crate::testing::flat_series(40, 100.0);
        assert!(volume_profile_levels(&series, &settings(), 100.0).is_empty());
    }
}
