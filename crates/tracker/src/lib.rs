//! Signal performance tracking: outcome resolution against the price
//! history, the periodic sweep that records outcomes, and per-method
//! statistics over the recorded rows.

pub mod outcome;
pub mod stats;
pub mod sweep;

pub use outcome::{horizon_outcome, resolve_outcome};
pub use stats::{aggregate, best_method, format_report};
pub use sweep::{run_sweep, SweepConfig, SweepReport};
