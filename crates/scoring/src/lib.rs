pub mod fusion;
pub mod gate;
pub mod indicators;
pub mod method;
pub mod pipeline;
pub mod price_trend;
pub mod quality;
pub mod trend;

pub use fusion::{fuse, FusionResult, TimeframeSnapshot};
pub use gate::{evaluate_gate, GateDecision, RejectReason};
pub use indicators::IndicatorBundle;
pub use method::{MethodConfig, MethodFileConfig};
pub use pipeline::{evaluate, to_signal, CompositeScoreResult, Evaluation, MarketSnapshot};
pub use price_trend::estimate_price_trend;
pub use trend::classify_trend;
