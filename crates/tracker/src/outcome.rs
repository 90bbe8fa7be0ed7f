use chrono::{DateTime, Duration, Utc};

use common::{
    Horizon, HorizonOutcome, PricePoint, PriceSource, Result, SignalDirection, SignalOutcome,
    SignalRecord,
};

/// Turn one horizon's price sample (or lack of one) into an outcome cell.
///
/// Profitability is direction-aware: a buy profits when price rose, a sell
/// when it fell. Exactly-unchanged price counts as not profitable either
/// way.
pub fn horizon_outcome(
    entry_price: f64,
    direction: SignalDirection,
    sample: Option<PricePoint>,
) -> HorizonOutcome {
    let Some(point) = sample else {
        return HorizonOutcome::default();
    };
    if entry_price == 0.0 {
        return HorizonOutcome::default();
    }

    let pct_change = (point.price - entry_price) / entry_price * 100.0;
    let profitable = match direction {
        SignalDirection::Buy => pct_change > 0.0,
        SignalDirection::Sell => pct_change < 0.0,
    };

    HorizonOutcome {
        price: Some(point.price),
        pct_change: Some(pct_change),
        profitable: Some(profitable),
    }
}

/// Resolve every horizon of one signal against the price history.
///
/// Horizons with no sample inside `tolerance` of the target time stay
/// null; the outcome row is still recorded so the signal is never
/// revisited.
pub async fn resolve_outcome(
    source: &dyn PriceSource,
    signal: &SignalRecord,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<SignalOutcome> {
    let direction = signal.direction();
    let mut horizons = [HorizonOutcome::default(); 5];

    for horizon in Horizon::ALL {
        let target = signal.created_at + horizon.offset();
        let sample = source.price_near(&signal.symbol, target, tolerance).await?;
        horizons[horizon.idx()] = horizon_outcome(signal.price, direction, sample);
    }

    Ok(SignalOutcome {
        signal_id: signal.id.clone(),
        symbol: signal.symbol.clone(),
        entry_price: signal.price,
        entry_time: signal.created_at,
        direction,
        score: signal.score,
        quality: signal.quality,
        horizons,
        method: signal.method.clone(),
        tracked_at: now,
    })
}
