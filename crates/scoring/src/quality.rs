use std::collections::BTreeMap;

use common::{PriceTrend, Timeframe, TrendDirection};

use crate::fusion::TimeframeSnapshot;
use crate::indicators::VolatilityLevel;

/// Conservative starting confidence: "no signal" is the common case.
const BASE_QUALITY: f64 = 40.0;

const OVERSOLD: f64 = 30.0;
const DEEP_OVERSOLD: f64 = 20.0;
const OVERBOUGHT: f64 = 70.0;
const DEEP_OVERBOUGHT: f64 = 80.0;

/// Estimate how trustworthy a composite score is, independent of its sign
/// and magnitude semantics: cross-timeframe agreement, oscillator
/// extremity, score strength, then rescaling by the independent price
/// trend and the optional volatility bucket.
///
/// Result is clamped to [0, 100] and truncated to an integer.
pub fn assess_quality(
    readings: &BTreeMap<Timeframe, TimeframeSnapshot>,
    score: f64,
    price_trend: Option<PriceTrend>,
    volatility: Option<VolatilityLevel>,
) -> i64 {
    let mut quality = BASE_QUALITY;

    // More frames telling the same directional story.
    let up = directional_count(readings, TrendDirection::Up);
    let down = directional_count(readings, TrendDirection::Down);
    quality += match up.max(down) {
        0 | 1 => 0.0,
        2 => 10.0,
        3 => 18.0,
        4 => 26.0,
        _ => 35.0,
    };

    // Oscillator extremity in the direction the score leans.
    if score > 0.0 {
        for snap in readings.values() {
            if snap.rsi < OVERSOLD {
                quality += 5.0;
                if snap.rsi < DEEP_OVERSOLD {
                    quality += 5.0;
                }
            }
        }
    } else if score < 0.0 {
        for snap in readings.values() {
            if snap.rsi > OVERBOUGHT {
                quality += 5.0;
                if snap.rsi > DEEP_OVERBOUGHT {
                    quality += 5.0;
                }
            }
        }
    }

    // Raw score strength.
    if score.abs() > 50.0 {
        quality += 5.0;
    }
    if score.abs() > 70.0 {
        quality += 10.0;
    }

    if let Some(vol) = volatility {
        quality *= vol.quality_factor();
    }

    // Agreement with the independent price trend is the strongest lever:
    // conflict halves the confidence.
    if let Some(pt) = price_trend {
        let agrees = (pt == PriceTrend::Up && score > 0.0)
            || (pt == PriceTrend::Down && score < 0.0);
        let opposes = (pt == PriceTrend::Up && score < 0.0)
            || (pt == PriceTrend::Down && score > 0.0);
        if agrees {
            quality *= 1.2;
        } else if opposes {
            quality *= 0.5;
        }
    }

    quality.clamp(0.0, 100.0) as i64
}

fn directional_count(
    readings: &BTreeMap<Timeframe, TimeframeSnapshot>,
    direction: TrendDirection,
) -> usize {
    readings
        .values()
        .filter(|s| s.trend.direction == direction)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TrendAnnotation;

    fn snap(rsi: f64, direction: TrendDirection) -> TimeframeSnapshot {
        TimeframeSnapshot {
            rsi,
            trend: TrendAnnotation { direction, change: 0.0 },
        }
    }

    fn all_frames(rsi: f64, direction: TrendDirection) -> BTreeMap<Timeframe, TimeframeSnapshot> {
        Timeframe::ALL
            .into_iter()
            .map(|tf| (tf, snap(rsi, direction)))
            .collect()
    }

    #[test]
    fn empty_readings_yield_baseline() {
        let readings = BTreeMap::new();
        assert_eq!(assess_quality(&readings, 0.0, None, None), 40);
    }

    #[test]
    fn full_agreement_with_deep_extremes_maxes_out() {
        // 5 frames up, all deep oversold, strong buy score, trend agrees:
        // (40 + 35 + 50 + 15) * 1.2 clamps to 100.
        let readings = all_frames(15.0, TrendDirection::Up);
        let q = assess_quality(&readings, 85.0, Some(PriceTrend::Up), None);
        assert_eq!(q, 100);
    }

    #[test]
    fn price_trend_conflict_halves_quality() {
        let readings = all_frames(25.0, TrendDirection::Up);
        let with = assess_quality(&readings, 60.0, Some(PriceTrend::Up), None);
        let against = assess_quality(&readings, 60.0, Some(PriceTrend::Down), None);
        assert!(against < with);
        // (40 + 35 + 25 + 5) = 105 before rescale; conflict halves it.
        assert_eq!(against, 52);
    }

    #[test]
    fn extremity_bonus_follows_score_direction() {
        // Overbought frames only help a sell-leaning score.
        let readings = all_frames(85.0, TrendDirection::Down);
        let sell = assess_quality(&readings, -60.0, None, None);
        let buy_same_frames = assess_quality(&readings, 60.0, None, None);
        assert!(sell > buy_same_frames);
    }

    #[test]
    fn volatility_dampens_quality() {
        let readings = all_frames(25.0, TrendDirection::Up);
        let calm = assess_quality(&readings, 60.0, None, Some(VolatilityLevel::Low));
        let wild = assess_quality(&readings, 60.0, None, Some(VolatilityLevel::VeryHigh));
        assert!(wild < calm);
    }

    #[test]
    fn result_is_always_in_range() {
        let readings = all_frames(15.0, TrendDirection::Up);
        let q = assess_quality(&readings, 100.0, Some(PriceTrend::Up), Some(VolatilityLevel::Low));
        assert!((0..=100).contains(&q));
    }
}
