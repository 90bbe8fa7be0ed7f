//! SQLite persistence for readings, signals, and outcome records.
//!
//! All timestamps are stored as RFC 3339 UTC text. Proximity lookups use
//! `julianday()` so "closest sample to T" is a single indexed query.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use common::{
    Error, HorizonOutcome, IndicatorReading, PricePoint, PriceSource, PriceTrend, Result,
    SignalDirection, SignalOutcome, SignalRecord, Timeframe,
};

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database at `database_url` and run
    /// pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(Error::Database)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Fresh in-memory database for tests. A single connection keeps the
    /// database alive for the pool's lifetime.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(Error::Database)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ── Readings ─────────────────────────────────────────────────────────

    pub async fn insert_reading(&self, reading: &IndicatorReading) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO readings (symbol, timeframe, value, price, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&reading.symbol)
        .bind(reading.timeframe.as_str())
        .bind(reading.value)
        .bind(reading.price)
        .bind(reading.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent reading for a symbol/timeframe, if any.
    pub async fn latest_reading(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Option<IndicatorReading>> {
        let row = sqlx::query(
            r#"
            SELECT symbol, timeframe, value, price, timestamp
            FROM readings
            WHERE symbol = ?1 AND timeframe = ?2
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(symbol)
        .bind(timeframe.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(reading_from_row).transpose()
    }

    /// Reading roughly one sampling step before `at`: the sample closest to
    /// `at - lookback_offset` within the timeframe's tolerance window, or
    /// failing that the newest sample strictly older than `at`.
    pub async fn previous_reading(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        at: DateTime<Utc>,
    ) -> Result<Option<IndicatorReading>> {
        let target = at - timeframe.lookback_offset();
        let tolerance = timeframe.lookback_tolerance();
        let lo = (target - tolerance).to_rfc3339();
        let hi = (target + tolerance).to_rfc3339();

        let row = sqlx::query(
            r#"
            SELECT symbol, timeframe, value, price, timestamp
            FROM readings
            WHERE symbol = ?1 AND timeframe = ?2
              AND timestamp BETWEEN ?3 AND ?4
            ORDER BY ABS(julianday(timestamp) - julianday(?5))
            LIMIT 1
            "#,
        )
        .bind(symbol)
        .bind(timeframe.as_str())
        .bind(&lo)
        .bind(&hi)
        .bind(target.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(Some(reading_from_row(row)?));
        }

        // No sample in the window. Fall back to whichever earlier sample is
        // closest to the target, however far away, so sparse histories
        // still produce a trend label.
        let row = sqlx::query(
            r#"
            SELECT symbol, timeframe, value, price, timestamp
            FROM readings
            WHERE symbol = ?1 AND timeframe = ?2 AND timestamp < ?3
            ORDER BY ABS(julianday(timestamp) - julianday(?4))
            LIMIT 1
            "#,
        )
        .bind(symbol)
        .bind(timeframe.as_str())
        .bind(at.to_rfc3339())
        .bind(target.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;
        row.map(reading_from_row).transpose()
    }

    /// Last `limit` prices for a symbol/timeframe, newest first.
    pub async fn recent_prices(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<f64>> {
        let rows = sqlx::query(
            r#"
            SELECT price
            FROM readings
            WHERE symbol = ?1 AND timeframe = ?2
            ORDER BY timestamp DESC
            LIMIT ?3
            "#,
        )
        .bind(symbol)
        .bind(timeframe.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| r.get::<f64, _>("price")).collect())
    }

    /// Distinct symbols that have at least one reading.
    pub async fn symbols_with_readings(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT symbol FROM readings ORDER BY symbol")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get::<String, _>("symbol")).collect())
    }

    // ── Signals ──────────────────────────────────────────────────────────

    pub async fn insert_signal(&self, signal: &SignalRecord) -> Result<()> {
        let rsi_values = serde_json::to_string(&signal.rsi_values)?;
        sqlx::query(
            r#"
            INSERT INTO signals
                (id, symbol, price, score, quality, convergence_count,
                 price_trend, rsi_values, method, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&signal.id)
        .bind(&signal.symbol)
        .bind(signal.price)
        .bind(signal.score)
        .bind(signal.quality)
        .bind(signal.convergence_count)
        .bind(signal.price_trend.map(|t| t.as_str()))
        .bind(rsi_values)
        .bind(&signal.method)
        .bind(signal.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Signals created at or before `cutoff` with no outcome row yet,
    /// oldest first, at most `limit` rows.
    pub async fn untracked_signals(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<SignalRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.symbol, s.price, s.score, s.quality,
                   s.convergence_count, s.price_trend, s.rsi_values,
                   s.method, s.created_at
            FROM signals s
            LEFT JOIN signal_outcomes o ON o.signal_id = s.id
            WHERE o.signal_id IS NULL AND s.created_at <= ?1
            ORDER BY s.created_at ASC
            LIMIT ?2
            "#,
        )
        .bind(cutoff.to_rfc3339())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(signal_from_row).collect()
    }

    // ── Outcomes ─────────────────────────────────────────────────────────

    /// Insert an outcome row. Returns false when the signal already has
    /// one; outcome rows are write-once.
    pub async fn insert_outcome(&self, outcome: &SignalOutcome) -> Result<bool> {
        let mut query = String::from(
            "INSERT INTO signal_outcomes \
             (signal_id, symbol, entry_price, entry_time, direction, score, quality, ",
        );
        for label in ["15m", "30m", "1h", "4h", "24h"] {
            query.push_str(&format!(
                "price_{label}, pct_change_{label}, profitable_{label}, "
            ));
        }
        query.push_str(
            "method, tracked_at) VALUES \
             (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(signal_id) DO NOTHING",
        );

        let mut q = sqlx::query(&query)
            .bind(&outcome.signal_id)
            .bind(&outcome.symbol)
            .bind(outcome.entry_price)
            .bind(outcome.entry_time.to_rfc3339())
            .bind(outcome.direction.as_str())
            .bind(outcome.score)
            .bind(outcome.quality);
        for horizon in &outcome.horizons {
            q = q
                .bind(horizon.price)
                .bind(horizon.pct_change)
                .bind(horizon.profitable);
        }
        let result = q
            .bind(&outcome.method)
            .bind(outcome.tracked_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn all_outcomes(&self) -> Result<Vec<SignalOutcome>> {
        let rows = sqlx::query("SELECT * FROM signal_outcomes ORDER BY entry_time ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(outcome_from_row).collect()
    }
}

#[async_trait]
impl PriceSource for Store {
    async fn price_near(
        &self,
        symbol: &str,
        target: DateTime<Utc>,
        tolerance: Duration,
    ) -> Result<Option<PricePoint>> {
        let lo = (target - tolerance).to_rfc3339();
        let hi = (target + tolerance).to_rfc3339();
        let row = sqlx::query(
            r#"
            SELECT price, timestamp
            FROM readings
            WHERE symbol = ?1 AND timestamp BETWEEN ?2 AND ?3
            ORDER BY ABS(julianday(timestamp) - julianday(?4))
            LIMIT 1
            "#,
        )
        .bind(symbol)
        .bind(&lo)
        .bind(&hi)
        .bind(target.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(PricePoint {
                price: r.get("price"),
                timestamp: parse_timestamp(&r.get::<String, _>("timestamp"))?,
            })
        })
        .transpose()
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("bad timestamp '{s}': {e}")))
}

fn reading_from_row(row: sqlx::sqlite::SqliteRow) -> Result<IndicatorReading> {
    let timeframe: String = row.get("timeframe");
    Ok(IndicatorReading {
        symbol: row.get("symbol"),
        timeframe: timeframe.parse().map_err(Error::Other)?,
        value: row.get("value"),
        price: row.get("price"),
        timestamp: parse_timestamp(&row.get::<String, _>("timestamp"))?,
    })
}

fn signal_from_row(row: sqlx::sqlite::SqliteRow) -> Result<SignalRecord> {
    let price_trend: Option<String> = row.get("price_trend");
    let price_trend = price_trend
        .map(|s| PriceTrend::from_str(&s).map_err(Error::Other))
        .transpose()?;
    Ok(SignalRecord {
        id: row.get("id"),
        symbol: row.get("symbol"),
        price: row.get("price"),
        score: row.get("score"),
        quality: row.get("quality"),
        convergence_count: row.get("convergence_count"),
        price_trend,
        rsi_values: serde_json::from_str(&row.get::<String, _>("rsi_values"))?,
        method: row.get("method"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

fn outcome_from_row(row: sqlx::sqlite::SqliteRow) -> Result<SignalOutcome> {
    let direction: String = row.get("direction");
    let mut horizons = [HorizonOutcome::default(); 5];
    for (i, label) in ["15m", "30m", "1h", "4h", "24h"].iter().enumerate() {
        horizons[i] = HorizonOutcome {
            price: row.get::<Option<f64>, _>(format!("price_{label}").as_str()),
            pct_change: row.get::<Option<f64>, _>(format!("pct_change_{label}").as_str()),
            profitable: row.get::<Option<bool>, _>(format!("profitable_{label}").as_str()),
        };
    }
    Ok(SignalOutcome {
        signal_id: row.get("signal_id"),
        symbol: row.get("symbol"),
        entry_price: row.get("entry_price"),
        entry_time: parse_timestamp(&row.get::<String, _>("entry_time"))?,
        direction: SignalDirection::from_str(&direction).map_err(Error::Other)?,
        score: row.get("score"),
        quality: row.get("quality"),
        horizons,
        method: row.get("method"),
        tracked_at: parse_timestamp(&row.get::<String, _>("tracked_at"))?,
    })
}
