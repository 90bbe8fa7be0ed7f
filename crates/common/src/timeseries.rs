use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::Result;

/// A price sample resolved from the time-series store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Read seam over the time-series store used by outcome resolution.
///
/// `Store` implements this for SQLite; tests substitute an in-memory fake
/// so resolution logic runs without a database.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Return the reading closest to `target` within `± tolerance` for the
    /// symbol, across all timeframes, or `None` if no sample qualifies.
    async fn price_near(
        &self,
        symbol: &str,
        target: DateTime<Utc>,
        tolerance: Duration,
    ) -> Result<Option<PricePoint>>;
}
