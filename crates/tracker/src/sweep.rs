use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use common::{PriceSource, Result};
use store::Store;

use crate::outcome::resolve_outcome;

/// Sweep tuning. All values have sensible defaults; the binary overrides
/// them from the environment.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    /// Only signals at least this old are eligible, so the 24h horizon has
    /// had a chance to play out.
    pub cutoff_hours: i64,
    /// Upper bound on signals examined per sweep.
    pub batch_size: u32,
    /// Sampling tolerance around each horizon target.
    pub tolerance_minutes: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            cutoff_hours: 24,
            batch_size: 500,
            tolerance_minutes: 5,
        }
    }
}

/// What one sweep pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub recorded: usize,
    pub skipped: usize,
}

/// Resolve and record outcomes for one batch of matured, untracked
/// signals, oldest first. A failure on one signal is logged and skipped;
/// the rest of the batch still runs. Signals whose outcome row already
/// exists are left untouched, so concurrent or repeated sweeps are safe.
pub async fn run_sweep(
    db: &Store,
    source: &dyn PriceSource,
    cfg: &SweepConfig,
    now: DateTime<Utc>,
) -> Result<SweepReport> {
    let cutoff = now - Duration::hours(cfg.cutoff_hours);
    let batch = db.untracked_signals(cutoff, cfg.batch_size).await?;

    let mut report = SweepReport {
        examined: batch.len(),
        ..Default::default()
    };

    for signal in &batch {
        let tolerance = Duration::minutes(cfg.tolerance_minutes);
        match resolve_outcome(source, signal, tolerance, now).await {
            Ok(outcome) => match db.insert_outcome(&outcome).await {
                Ok(true) => report.recorded += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(signal_id = %signal.id, symbol = %signal.symbol, error = %e,
                          "Failed to record outcome, skipping");
                    report.skipped += 1;
                }
            },
            Err(e) => {
                warn!(signal_id = %signal.id, symbol = %signal.symbol, error = %e,
                      "Failed to resolve outcome, skipping");
                report.skipped += 1;
            }
        }
    }

    info!(
        examined = report.examined,
        recorded = report.recorded,
        skipped = report.skipped,
        "Tracking sweep complete"
    );
    Ok(report)
}
