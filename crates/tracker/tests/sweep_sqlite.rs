use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use common::{Horizon, IndicatorReading, SignalRecord, Timeframe};
use store::Store;
use tracker::{run_sweep, SweepConfig};

fn entry_time() -> DateTime<Utc> {
    "2026-08-01T12:00:00Z".parse().unwrap()
}

fn signal(id: &str, created_at: DateTime<Utc>, score: f64) -> SignalRecord {
    SignalRecord {
        id: id.into(),
        symbol: "BTC".into(),
        price: 100.0,
        score,
        quality: 80,
        convergence_count: 4,
        price_trend: None,
        rsi_values: BTreeMap::new(),
        method: "base_v1".into(),
        created_at,
    }
}

async fn seed_price(store: &Store, at: DateTime<Utc>, price: f64) {
    store
        .insert_reading(&IndicatorReading {
            symbol: "BTC".into(),
            timeframe: Timeframe::M1,
            value: 50.0,
            price,
            timestamp: at,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn sweep_records_matured_signals_once() {
    let store = Store::open_in_memory().await.unwrap();
    let t0 = entry_time();
    let now = t0 + Duration::hours(30);

    // Price history around the 15m and 1h horizons only.
    seed_price(&store, t0 + Duration::minutes(15), 102.0).await;
    seed_price(&store, t0 + Duration::hours(1) + Duration::minutes(2), 99.0).await;

    // One matured signal and one too recent for the cutoff.
    store.insert_signal(&signal("old", t0, 40.0)).await.unwrap();
    store
        .insert_signal(&signal("fresh", now - Duration::hours(1), 40.0))
        .await
        .unwrap();

    let cfg = SweepConfig::default();
    let report = run_sweep(&store, &store, &cfg, now).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.recorded, 1);
    assert_eq!(report.skipped, 0);

    let outcomes = store.all_outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.signal_id, "old");
    assert_eq!(outcome.horizon(Horizon::M15).pct_change, Some(2.0));
    assert_eq!(outcome.horizon(Horizon::M15).profitable, Some(true));
    assert_eq!(outcome.horizon(Horizon::H1).profitable, Some(false));
    // No samples near the remaining horizons.
    assert_eq!(outcome.horizon(Horizon::M30).price, None);
    assert_eq!(outcome.horizon(Horizon::H4).price, None);
    assert_eq!(outcome.horizon(Horizon::H24).price, None);

    // A second sweep finds nothing left to do.
    let report = run_sweep(&store, &store, &cfg, now).await.unwrap();
    assert_eq!(report.examined, 0);
    assert_eq!(report.recorded, 0);
}

#[tokio::test]
async fn sweep_continues_past_failed_outcome_writes() {
    let store = Store::open_in_memory().await.unwrap();
    let t0 = entry_time();
    let now = t0 + Duration::hours(30);

    store.insert_signal(&signal("a", t0, 40.0)).await.unwrap();
    store
        .insert_signal(&signal("b", t0 + Duration::hours(1), 40.0))
        .await
        .unwrap();

    // Make every outcome write fail at the database level.
    sqlx::query(
        r#"
        CREATE TRIGGER outcomes_unwritable
        BEFORE INSERT ON signal_outcomes
        BEGIN SELECT RAISE(ABORT, 'disk full'); END
        "#,
    )
    .execute(store.pool())
    .await
    .unwrap();

    // Both signals are examined; each failed write is counted and
    // skipped, and the sweep still returns Ok.
    let cfg = SweepConfig::default();
    let report = run_sweep(&store, &store, &cfg, now).await.unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.recorded, 0);
    assert_eq!(report.skipped, 2);
    assert!(store.all_outcomes().await.unwrap().is_empty());

    // Once writes succeed again, the skipped signals are picked up.
    sqlx::query("DROP TRIGGER outcomes_unwritable")
        .execute(store.pool())
        .await
        .unwrap();
    let report = run_sweep(&store, &store, &cfg, now).await.unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.recorded, 2);
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn sweep_respects_batch_bound_oldest_first() {
    let store = Store::open_in_memory().await.unwrap();
    let t0 = entry_time();
    let now = t0 + Duration::hours(40);

    store.insert_signal(&signal("a", t0, 40.0)).await.unwrap();
    store
        .insert_signal(&signal("b", t0 + Duration::hours(1), 40.0))
        .await
        .unwrap();
    store
        .insert_signal(&signal("c", t0 + Duration::hours(2), 40.0))
        .await
        .unwrap();

    let cfg = SweepConfig {
        batch_size: 2,
        ..Default::default()
    };
    let report = run_sweep(&store, &store, &cfg, now).await.unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.recorded, 2);

    let tracked: Vec<String> = store
        .all_outcomes()
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.signal_id)
        .collect();
    assert_eq!(tracked, vec!["a".to_string(), "b".to_string()]);

    // The remainder lands in the next pass.
    let report = run_sweep(&store, &store, &cfg, now).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.recorded, 1);
}
