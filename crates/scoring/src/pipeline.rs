use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{PriceTrend, SignalRecord, Timeframe};

use crate::fusion::{fuse, TimeframeScores, TimeframeSnapshot};
use crate::gate::{evaluate_gate, GateDecision};
use crate::indicators::{combine_with_indicators, IndicatorBundle, IndicatorScores};
use crate::method::MethodConfig;
use crate::quality::assess_quality;

/// Everything the caller knows about one symbol at evaluation time.
/// Assembled outside this crate (from the time-series store and the
/// external indicator collaborators) so evaluation stays pure.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub price: f64,
    pub readings: BTreeMap<Timeframe, TimeframeSnapshot>,
    pub price_trend: Option<PriceTrend>,
    pub indicators: Option<IndicatorBundle>,
}

/// Composite score with full sub-score provenance. Ephemeral: only the
/// gate turns one of these into a persisted `SignalRecord`.
#[derive(Debug, Clone)]
pub struct CompositeScoreResult {
    pub score: f64,
    pub quality: i64,
    pub convergence_count: i64,
    pub convergence: f64,
    pub per_timeframe: BTreeMap<Timeframe, TimeframeScores>,
    pub indicator_scores: Option<IndicatorScores>,
    /// Name of the method configuration that produced this result.
    pub method: String,
}

/// Score plus the gate's verdict on it.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub result: CompositeScoreResult,
    pub decision: GateDecision,
}

/// Run the full scoring path for one snapshot under one method
/// configuration: fuse, optionally enrich with indicators, assess
/// quality, gate.
pub fn evaluate(snapshot: &MarketSnapshot, cfg: &MethodConfig) -> Evaluation {
    let fused = fuse(&snapshot.readings, snapshot.price_trend, cfg);

    let (score, indicator_scores) = match (&snapshot.indicators, cfg.use_indicators) {
        (Some(bundle), true) => {
            let (score, parts) = combine_with_indicators(fused.score, bundle, cfg);
            (score, Some(parts))
        }
        _ => (fused.score, None),
    };

    let volatility = if cfg.use_indicators {
        snapshot.indicators.as_ref().and_then(|b| b.volatility)
    } else {
        None
    };

    let quality = assess_quality(&snapshot.readings, score, snapshot.price_trend, volatility);
    let decision = evaluate_gate(score, quality, snapshot.price_trend);

    Evaluation {
        result: CompositeScoreResult {
            score,
            quality,
            convergence_count: fused.convergence_count,
            convergence: fused.convergence,
            per_timeframe: fused.per_timeframe,
            indicator_scores,
            method: cfg.name.clone(),
        },
        decision,
    }
}

/// Build the persisted record for an accepted evaluation.
pub fn to_signal(
    snapshot: &MarketSnapshot,
    result: &CompositeScoreResult,
    now: DateTime<Utc>,
) -> SignalRecord {
    let rsi_values = snapshot
        .readings
        .iter()
        .map(|(tf, snap)| (*tf, snap.rsi))
        .collect();

    SignalRecord {
        id: uuid::Uuid::new_v4().to_string(),
        symbol: snapshot.symbol.clone(),
        price: snapshot.price,
        score: result.score,
        quality: result.quality,
        convergence_count: result.convergence_count,
        price_trend: snapshot.price_trend,
        rsi_values,
        method: result.method.clone(),
        created_at: now,
    }
}
