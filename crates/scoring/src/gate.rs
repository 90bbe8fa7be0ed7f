use common::PriceTrend;

/// Counter-trend signals must clear this quality bar before the magnitude
/// rules even apply.
const COUNTER_TREND_QUALITY: i64 = 75;

/// Below this quality nothing passes, whatever the score.
const QUALITY_FLOOR: i64 = 50;

/// Whether a scored event becomes a persisted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accept,
    Reject(RejectReason),
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateDecision::Accept)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Score sign opposes the independent price trend without very high
    /// quality backing it.
    CounterTrend,
    /// Quality below the hard floor.
    LowQuality,
    /// Score magnitude below the minimum for this quality band.
    WeakScore,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::CounterTrend => write!(f, "counter-trend without high quality"),
            RejectReason::LowQuality => write!(f, "quality below floor"),
            RejectReason::WeakScore => write!(f, "score too weak for quality band"),
        }
    }
}

/// Regime-aware acceptance: high-quality signals may be weak in magnitude,
/// low-quality ones must be strong, and below the floor nothing passes.
/// Monotonic in quality for a fixed score.
pub fn evaluate_gate(score: f64, quality: i64, price_trend: Option<PriceTrend>) -> GateDecision {
    let counter_trend = match price_trend {
        Some(PriceTrend::Up) => score < 0.0,
        Some(PriceTrend::Down) => score > 0.0,
        Some(PriceTrend::Neutral) | None => false,
    };
    if counter_trend && quality < COUNTER_TREND_QUALITY {
        return GateDecision::Reject(RejectReason::CounterTrend);
    }

    if quality < QUALITY_FLOOR {
        return GateDecision::Reject(RejectReason::LowQuality);
    }

    let min_score = if quality >= 75 {
        10.0
    } else if quality >= 60 {
        15.0
    } else {
        25.0
    };

    if score.abs() >= min_score {
        GateDecision::Accept
    } else {
        GateDecision::Reject(RejectReason::WeakScore)
    }
}
