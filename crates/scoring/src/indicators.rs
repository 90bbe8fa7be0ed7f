//! Typed forms of the externally computed supplementary indicators and
//! their mappings onto the [-100, 100] score scale.
//!
//! The indicator math itself (ADX, EMA, Bollinger, ATR, pattern detection)
//! happens outside this crate; callers hand in the already reduced
//! categorical/numeric readings.

use serde::{Deserialize, Serialize};

use crate::method::MethodConfig;

/// ADX-style trend strength classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl TrendStrength {
    pub fn multiplier(&self) -> f64 {
        match self {
            TrendStrength::Weak => 0.3,
            TrendStrength::Moderate => 0.6,
            TrendStrength::Strong => 0.9,
            TrendStrength::VeryStrong => 1.2,
        }
    }
}

/// Direction reported by the trend-strength indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStrengthDirection {
    Up,
    Down,
    Sideways,
}

/// Trend-strength/direction reading (ADX-like).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendStrengthReading {
    pub strength: TrendStrength,
    pub direction: TrendStrengthDirection,
}

impl TrendStrengthReading {
    /// Directional sign times strength, clamped to the score scale.
    pub fn score(&self) -> f64 {
        let sign = match self.direction {
            TrendStrengthDirection::Up => 1.0,
            TrendStrengthDirection::Down => -1.0,
            TrendStrengthDirection::Sideways => return 0.0,
        };
        (sign * 60.0 * self.strength.multiplier()).clamp(-100.0, 100.0)
    }
}

/// Moving-average momentum classification (EMA spread + slope, reduced
/// upstream to a label).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaMomentum {
    StrongUp,
    WeakUp,
    Neutral,
    WeakDown,
    StrongDown,
}

impl MaMomentum {
    pub fn score(&self) -> f64 {
        match self {
            MaMomentum::StrongUp => 80.0,
            MaMomentum::WeakUp => 40.0,
            MaMomentum::Neutral => 0.0,
            MaMomentum::WeakDown => -40.0,
            MaMomentum::StrongDown => -80.0,
        }
    }
}

/// Position inside the volatility bands, 0 = lower band, 100 = upper band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPosition(pub f64);

impl BandPosition {
    /// Low positions lean bullish, high positions bearish.
    pub fn score(&self) -> f64 {
        let p = self.0;
        if p < 10.0 {
            80.0
        } else if p < 20.0 {
            50.0
        } else if p < 30.0 {
            20.0
        } else if p > 90.0 {
            -80.0
        } else if p > 80.0 {
            -50.0
        } else if p > 70.0 {
            -20.0
        } else {
            0.0
        }
    }
}

/// Realized volatility bucket from the ATR-derived risk indicator.
/// Feeds quality, not the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityLevel {
    VeryLow,
    Low,
    Normal,
    High,
    VeryHigh,
}

impl VolatilityLevel {
    /// Multiplier applied to quality: calm markets slightly raise
    /// confidence, turbulent ones cut it.
    pub fn quality_factor(&self) -> f64 {
        match self {
            VolatilityLevel::VeryLow | VolatilityLevel::Low => 1.05,
            VolatilityLevel::Normal => 1.0,
            VolatilityLevel::High | VolatilityLevel::VeryHigh => 0.85,
        }
    }

    pub fn risk_level(&self) -> i64 {
        match self {
            VolatilityLevel::VeryLow => 20,
            VolatilityLevel::Low => 35,
            VolatilityLevel::Normal => 50,
            VolatilityLevel::High => 75,
            VolatilityLevel::VeryHigh => 95,
        }
    }
}

/// Candlestick / support-resistance pattern signal, already scored
/// upstream on the [-100, 100] scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternSignal(pub f64);

impl PatternSignal {
    pub fn score(&self) -> f64 {
        self.0.clamp(-100.0, 100.0)
    }
}

/// Optional supplementary indicator inputs for one evaluation. Any subset
/// may be present; absent indicators simply drop out of the blend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IndicatorBundle {
    pub trend_strength: Option<TrendStrengthReading>,
    pub ma_momentum: Option<MaMomentum>,
    pub band_position: Option<BandPosition>,
    pub volatility: Option<VolatilityLevel>,
    pub pattern: Option<PatternSignal>,
}

/// Per-indicator contributions to the enriched score, for provenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorScores {
    pub trend_strength: Option<f64>,
    pub ma_momentum: Option<f64>,
    pub bands: Option<f64>,
    pub pattern: Option<f64>,
}

/// Blend the base fused score with whatever supplementary indicators are
/// available. Weights of missing indicators are dropped, not
/// redistributed, so coverage differences stay visible in the magnitude.
///
/// After blending, indicator agreement with the combined sign amplifies
/// the score and an outnumbering conflict dampens it.
pub fn combine_with_indicators(
    base_score: f64,
    bundle: &IndicatorBundle,
    cfg: &MethodConfig,
) -> (f64, IndicatorScores) {
    let w = &cfg.indicator_weights;

    let scores = IndicatorScores {
        trend_strength: bundle.trend_strength.map(|r| r.score()),
        ma_momentum: bundle.ma_momentum.map(|m| m.score()),
        bands: bundle.band_position.map(|b| b.score()),
        pattern: bundle.pattern.map(|p| p.score()),
    };

    let mut combined = base_score * w.base;
    if let Some(s) = scores.trend_strength {
        combined += s * w.trend_strength;
    }
    if let Some(s) = scores.ma_momentum {
        combined += s * w.ma_momentum;
    }
    if let Some(s) = scores.bands {
        combined += s * w.bands;
    }
    if let Some(s) = scores.pattern {
        combined += s * w.pattern;
    }

    let contributions = [
        scores.trend_strength,
        scores.ma_momentum,
        scores.bands,
        scores.pattern,
    ];
    let agreeing = contributions
        .iter()
        .flatten()
        .filter(|s| s.abs() > 10.0 && s.signum() == combined.signum())
        .count();
    let conflicting = contributions
        .iter()
        .flatten()
        .filter(|s| s.abs() > 10.0 && combined != 0.0 && s.signum() == -combined.signum())
        .count();

    if conflicting > agreeing {
        combined *= cfg.conflict_penalty;
    } else if agreeing >= 2 {
        combined *= cfg.agreement_boost;
    }

    (combined.clamp(-100.0, 100.0), scores)
}
