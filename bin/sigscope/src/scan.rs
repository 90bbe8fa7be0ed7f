use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use common::{Result, Timeframe};
use scoring::{
    classify_trend, estimate_price_trend, evaluate, to_signal, GateDecision, MarketSnapshot,
    MethodFileConfig, TimeframeSnapshot,
};
use store::Store;

/// Prior prices fetched for the price-trend estimate: the widest
/// estimator window plus the current sample.
const PRICE_HISTORY_LIMIT: u32 = 31;

/// What one scan pass did across all symbols.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanReport {
    pub symbols: usize,
    pub evaluated: usize,
    pub emitted: usize,
}

/// Evaluate every symbol with readings against every configured method and
/// persist whatever passes the gate. A failure on one symbol is logged and
/// skipped.
pub async fn run_scan(db: &Store, methods: &MethodFileConfig, now: DateTime<Utc>) -> Result<ScanReport> {
    let symbols = db.symbols_with_readings().await?;
    let mut report = ScanReport {
        symbols: symbols.len(),
        ..Default::default()
    };

    for symbol in &symbols {
        match scan_symbol(db, methods, symbol, now).await {
            Ok((evaluated, emitted)) => {
                report.evaluated += evaluated;
                report.emitted += emitted;
            }
            Err(e) => {
                warn!(%symbol, error = %e, "Scan failed for symbol, skipping");
            }
        }
    }

    info!(
        symbols = report.symbols,
        evaluated = report.evaluated,
        emitted = report.emitted,
        "Scan pass complete"
    );
    Ok(report)
}

async fn scan_symbol(
    db: &Store,
    methods: &MethodFileConfig,
    symbol: &str,
    now: DateTime<Utc>,
) -> Result<(usize, usize)> {
    let Some(snapshot) = build_snapshot(db, symbol).await? else {
        return Ok((0, 0));
    };

    let mut evaluated = 0;
    let mut emitted = 0;
    for method in &methods.methods {
        evaluated += 1;
        let eval = evaluate(&snapshot, method);
        match eval.decision {
            GateDecision::Accept => {
                let signal = to_signal(&snapshot, &eval.result, now);
                db.insert_signal(&signal).await?;
                emitted += 1;
                info!(
                    %symbol,
                    method = %signal.method,
                    score = signal.score,
                    quality = signal.quality,
                    direction = %signal.direction(),
                    "Signal emitted"
                );
            }
            GateDecision::Reject(reason) => {
                debug!(
                    %symbol,
                    method = %method.name,
                    score = eval.result.score,
                    quality = eval.result.quality,
                    %reason,
                    "Rejected"
                );
            }
        }
    }
    Ok((evaluated, emitted))
}

/// Assemble the evaluation input for one symbol from the latest stored
/// readings. Returns `None` when the symbol has no readings at all;
/// timeframes without data are simply absent from the snapshot.
async fn build_snapshot(db: &Store, symbol: &str) -> Result<Option<MarketSnapshot>> {
    let mut readings = BTreeMap::new();
    let mut latest: Option<(DateTime<Utc>, f64)> = None;
    let mut m1_timestamp = None;

    for tf in Timeframe::ALL {
        let Some(current) = db.latest_reading(symbol, tf).await? else {
            continue;
        };
        let previous = db.previous_reading(symbol, tf, current.timestamp).await?;
        let trend = classify_trend(
            current.value,
            previous.map(|p| p.value),
            scoring::trend::DEFAULT_TREND_THRESHOLD,
        );
        readings.insert(tf, TimeframeSnapshot { rsi: current.value, trend });

        if tf == Timeframe::M1 {
            m1_timestamp = Some(current.timestamp);
        }
        if latest.map_or(true, |(ts, _)| current.timestamp > ts) {
            latest = Some((current.timestamp, current.price));
        }
    }

    let Some((latest_ts, price)) = latest else {
        return Ok(None);
    };

    // 1m prices drive the price-trend estimate. The newest 1m row is the
    // current sample only when it is the newest reading overall; a newer
    // reading on another timeframe makes every 1m row prior history.
    let prices = db.recent_prices(symbol, Timeframe::M1, PRICE_HISTORY_LIMIT).await?;
    let history = if m1_timestamp == Some(latest_ts) && !prices.is_empty() {
        &prices[1..]
    } else {
        &prices[..]
    };
    let price_trend = estimate_price_trend(price, history, readings.len());

    Ok(Some(MarketSnapshot {
        symbol: symbol.to_string(),
        price,
        readings,
        price_trend: Some(price_trend),
        indicators: None,
    }))
}
