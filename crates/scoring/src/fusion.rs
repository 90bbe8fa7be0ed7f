use std::collections::BTreeMap;

use common::{PriceTrend, Timeframe, TrendAnnotation, TrendDirection};

use crate::method::MethodConfig;

/// Oscillator state for one timeframe at evaluation time.
#[derive(Debug, Clone, Copy)]
pub struct TimeframeSnapshot {
    /// Oscillator value, 0–100.
    pub rsi: f64,
    pub trend: TrendAnnotation,
}

/// The three per-timeframe component scores, kept for provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeframeScores {
    pub rsi: f64,
    pub trend: f64,
    pub momentum: f64,
}

/// Output of oscillator fusion, before any indicator enrichment.
#[derive(Debug, Clone)]
pub struct FusionResult {
    /// Weighted total before convergence/price-trend rescaling.
    pub raw_score: f64,
    /// Final fused score, clamped to [-100, 100].
    pub score: f64,
    /// Cross-timeframe convergence component, [-100, 100].
    pub convergence: f64,
    /// Size of the largest group of agreeing directional trends.
    pub convergence_count: i64,
    pub per_timeframe: BTreeMap<Timeframe, TimeframeScores>,
}

/// Piecewise-linear score from the oscillator value alone: +100 deep in
/// oversold territory, 0 at the neutral midpoint, -100 deep overbought.
/// Monotonically non-increasing in the input.
pub fn rsi_component_score(rsi: f64) -> f64 {
    if rsi < 20.0 {
        100.0
    } else if rsi < 30.0 {
        70.0 + (30.0 - rsi) * 3.0
    } else if rsi < 40.0 {
        30.0 + (40.0 - rsi) * 4.0
    } else if rsi < 50.0 {
        (50.0 - rsi) * 3.0
    } else if rsi == 50.0 {
        0.0
    } else if rsi < 60.0 {
        -(rsi - 50.0) * 3.0
    } else if rsi < 70.0 {
        -30.0 - (rsi - 60.0) * 4.0
    } else if rsi < 80.0 {
        -70.0 - (rsi - 70.0) * 3.0
    } else {
        -100.0
    }
}

/// Trend score, stronger when the trend confirms an extreme oscillator
/// reading and negative when it fights one.
pub fn trend_component_score(rsi: f64, trend: TrendDirection) -> f64 {
    match trend {
        TrendDirection::Up => {
            if rsi < 40.0 {
                80.0
            } else if rsi < 50.0 {
                50.0
            } else if rsi > 70.0 {
                -30.0
            } else {
                20.0
            }
        }
        TrendDirection::Down => {
            if rsi > 60.0 {
                -80.0
            } else if rsi > 50.0 {
                -50.0
            } else if rsi < 30.0 {
                30.0
            } else {
                -20.0
            }
        }
        TrendDirection::Flat | TrendDirection::Unknown => 0.0,
    }
}

/// Momentum score from the magnitude of the oscillator change, sign
/// modulated by whether the oscillator is already at an extreme.
pub fn momentum_component_score(rsi: f64, change: f64) -> f64 {
    let abs_change = change.abs();

    let strength = if abs_change > 10.0 {
        100.0
    } else if abs_change > 5.0 {
        70.0
    } else if abs_change > 3.0 {
        40.0
    } else if abs_change > 1.5 {
        20.0
    } else {
        0.0
    };

    if change > 0.0 {
        if rsi < 40.0 {
            strength
        } else if rsi > 70.0 {
            -strength * 0.5
        } else {
            strength * 0.7
        }
    } else if rsi > 60.0 {
        -strength
    } else if rsi < 30.0 {
        strength * 0.5
    } else {
        -strength * 0.7
    }
}

/// Convergence component: rewards a clear directional majority across
/// timeframes. Only `up`/`down` labels participate.
pub fn convergence_component_score(trends: &[TrendDirection]) -> f64 {
    let directional: Vec<TrendDirection> =
        trends.iter().copied().filter(|t| t.is_directional()).collect();

    if directional.len() < 3 {
        return 0.0;
    }

    let up = directional.iter().filter(|t| **t == TrendDirection::Up).count();
    let down = directional.iter().filter(|t| **t == TrendDirection::Down).count();

    if up >= 4 {
        100.0
    } else if up >= 3 {
        50.0
    } else if down >= 4 {
        -100.0
    } else if down >= 3 {
        -50.0
    } else {
        0.0
    }
}

/// Fuse per-timeframe oscillator state into one composite score.
///
/// Timeframes absent from `readings` are skipped; their weight is not
/// redistributed. Deterministic for identical inputs.
pub fn fuse(
    readings: &BTreeMap<Timeframe, TimeframeSnapshot>,
    price_trend: Option<PriceTrend>,
    cfg: &MethodConfig,
) -> FusionResult {
    let w = &cfg.factor_weights;
    let mut total = 0.0;
    let mut per_timeframe = BTreeMap::new();

    for tf in Timeframe::ALL {
        let Some(snap) = readings.get(&tf) else {
            continue;
        };

        let scores = TimeframeScores {
            rsi: rsi_component_score(snap.rsi),
            trend: trend_component_score(snap.rsi, snap.trend.direction),
            momentum: momentum_component_score(snap.rsi, snap.trend.change),
        };

        total +=
            (scores.rsi * w.rsi + scores.trend * w.trend + scores.momentum * w.momentum)
                * tf.weight();
        per_timeframe.insert(tf, scores);
    }

    let trends: Vec<TrendDirection> =
        readings.values().map(|s| s.trend.direction).collect();
    let convergence = convergence_component_score(&trends);
    total += convergence * w.convergence;

    let raw_score = total;
    let convergence_count = majority_count(&trends);

    // Weak agreement across frames shrinks the score rather than zeroing it.
    let mut score = raw_score;
    if convergence_count < 2 {
        score *= cfg.no_convergence_penalty;
    } else if convergence_count < 3 {
        score *= cfg.weak_convergence_penalty;
    }

    // Independent price trend as a cross-check on the oscillator story.
    if let Some(pt) = price_trend {
        let agrees = matches!(
            (pt, score > 0.0, score < 0.0),
            (PriceTrend::Up, true, _) | (PriceTrend::Down, _, true)
        );
        let opposes = matches!(
            (pt, score > 0.0, score < 0.0),
            (PriceTrend::Down, true, _) | (PriceTrend::Up, _, true)
        );
        if agrees {
            score *= cfg.with_trend_boost;
        } else if opposes {
            score *= cfg.counter_trend_penalty;
        }
    }

    FusionResult {
        raw_score,
        score: score.clamp(-100.0, 100.0),
        convergence,
        convergence_count,
        per_timeframe,
    }
}

/// Largest count of directional trends agreeing on one side.
fn majority_count(trends: &[TrendDirection]) -> i64 {
    let up = trends.iter().filter(|t| **t == TrendDirection::Up).count();
    let down = trends.iter().filter(|t| **t == TrendDirection::Down).count();
    up.max(down) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(rsi: f64, direction: TrendDirection, change: f64) -> TimeframeSnapshot {
        TimeframeSnapshot {
            rsi,
            trend: TrendAnnotation { direction, change },
        }
    }

    #[test]
    fn rsi_component_zero_at_midpoint() {
        assert_eq!(rsi_component_score(50.0), 0.0);
    }

    #[test]
    fn rsi_component_extremes() {
        assert_eq!(rsi_component_score(10.0), 100.0);
        assert_eq!(rsi_component_score(90.0), -100.0);
        // Continuity at the piecewise breakpoints.
        assert!((rsi_component_score(20.0) - 100.0).abs() < 1e-9);
        assert!((rsi_component_score(30.0) - 70.0).abs() < 1e-9);
        assert!((rsi_component_score(40.0) - 30.0).abs() < 1e-9);
        assert!((rsi_component_score(70.0) + 70.0).abs() < 1e-9);
    }

    #[test]
    fn trend_confirming_extreme_scores_high() {
        assert_eq!(trend_component_score(25.0, TrendDirection::Up), 80.0);
        assert_eq!(trend_component_score(75.0, TrendDirection::Down), -80.0);
        // Trend fighting an extreme is penalized.
        assert_eq!(trend_component_score(75.0, TrendDirection::Up), -30.0);
        assert_eq!(trend_component_score(25.0, TrendDirection::Down), 30.0);
        // Flat and unknown contribute nothing.
        assert_eq!(trend_component_score(25.0, TrendDirection::Flat), 0.0);
        assert_eq!(trend_component_score(25.0, TrendDirection::Unknown), 0.0);
    }

    #[test]
    fn momentum_strength_tiers() {
        assert_eq!(momentum_component_score(30.0, 12.0), 100.0);
        assert_eq!(momentum_component_score(30.0, 6.0), 70.0);
        assert_eq!(momentum_component_score(30.0, 4.0), 40.0);
        assert_eq!(momentum_component_score(30.0, 2.0), 20.0);
        assert_eq!(momentum_component_score(30.0, 1.0), 0.0);
        // Falling oscillator already oversold: dampened positive score.
        assert_eq!(momentum_component_score(25.0, -4.0), 20.0);
        // Falling from overbought: full negative strength.
        assert_eq!(momentum_component_score(65.0, -4.0), -40.0);
    }

    #[test]
    fn convergence_requires_three_directional_labels() {
        use TrendDirection::*;
        assert_eq!(convergence_component_score(&[Up, Up]), 0.0);
        assert_eq!(convergence_component_score(&[Up, Up, Flat, Unknown]), 0.0);
        assert_eq!(convergence_component_score(&[Up, Up, Up]), 50.0);
        assert_eq!(convergence_component_score(&[Up, Up, Up, Up]), 100.0);
        assert_eq!(convergence_component_score(&[Down, Down, Down, Flat]), -50.0);
        assert_eq!(convergence_component_score(&[Down, Down, Down, Down, Up]), -100.0);
    }

    #[test]
    fn unknown_trends_are_excluded_from_convergence() {
        use TrendDirection::*;
        // Three unknowns plus two ups: only 2 directional labels, no score.
        assert_eq!(
            convergence_component_score(&[Up, Up, Unknown, Unknown, Unknown]),
            0.0
        );
    }

    #[test]
    fn missing_timeframes_are_skipped() {
        let cfg = MethodConfig::default();
        let mut readings = BTreeMap::new();
        readings.insert(Timeframe::M1, snap(50.0, TrendDirection::Flat, 0.0));

        let result = fuse(&readings, None, &cfg);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.per_timeframe.len(), 1);
        assert!(!result.per_timeframe.contains_key(&Timeframe::H4));
    }

    #[test]
    fn oversold_uptrending_snapshot_scores_bullish() {
        let cfg = MethodConfig::default();
        let mut readings = BTreeMap::new();
        for tf in Timeframe::ALL {
            readings.insert(tf, snap(25.0, TrendDirection::Up, 4.0));
        }

        let result = fuse(&readings, Some(PriceTrend::Up), &cfg);
        assert!(result.score > 50.0, "expected strong buy, got {}", result.score);
        assert_eq!(result.convergence_count, 5);
        assert_eq!(result.convergence, 100.0);
    }

    #[test]
    fn counter_price_trend_shrinks_the_score() {
        let cfg = MethodConfig::default();
        let mut readings = BTreeMap::new();
        for tf in Timeframe::ALL {
            readings.insert(tf, snap(25.0, TrendDirection::Up, 4.0));
        }

        let with = fuse(&readings, Some(PriceTrend::Up), &cfg);
        let against = fuse(&readings, Some(PriceTrend::Down), &cfg);
        let neutral = fuse(&readings, Some(PriceTrend::Neutral), &cfg);
        assert!(against.score < neutral.score);
        assert!(neutral.score <= with.score);
    }

    #[test]
    fn weak_agreement_is_penalized() {
        let cfg = MethodConfig::default();
        // Only one directional trend among the five.
        let mut readings = BTreeMap::new();
        readings.insert(Timeframe::M1, snap(25.0, TrendDirection::Up, 4.0));
        for tf in [Timeframe::M5, Timeframe::M15, Timeframe::H1, Timeframe::H4] {
            readings.insert(tf, snap(25.0, TrendDirection::Flat, 0.0));
        }

        let result = fuse(&readings, None, &cfg);
        assert_eq!(result.convergence_count, 1);
        assert!(
            (result.score - result.raw_score * cfg.no_convergence_penalty).abs() < 1e-9
        );
    }
}
