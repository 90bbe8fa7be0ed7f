use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Sampling granularity bucket, tracked independently per symbol.
///
/// The set is fixed and ordered shortest-first; fusion weights lean on the
/// short end (scalping bias).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
        }
    }

    /// Relative weight in the composite score. Sums to 1 across `ALL`.
    pub fn weight(&self) -> f64 {
        match self {
            Timeframe::M1 => 0.35,
            Timeframe::M5 => 0.30,
            Timeframe::M15 => 0.20,
            Timeframe::H1 => 0.10,
            Timeframe::H4 => 0.05,
        }
    }

    /// Target offset when looking up the previous reading for trend
    /// classification: one sampling step back.
    pub fn lookback_offset(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::seconds(60),
            Timeframe::M5 => Duration::seconds(300),
            Timeframe::M15 => Duration::seconds(900),
            Timeframe::H1 => Duration::seconds(3600),
            Timeframe::H4 => Duration::seconds(14_400),
        }
    }

    /// Allowed timestamp drift around `lookback_offset` before falling back
    /// to the closest reading on record.
    pub fn lookback_tolerance(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::seconds(30),
            Timeframe::M5 => Duration::seconds(90),
            Timeframe::M15 => Duration::seconds(300),
            Timeframe::H1 => Duration::seconds(900),
            Timeframe::H4 => Duration::seconds(3600),
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            other => Err(format!("unknown timeframe '{other}'")),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Oscillator trend label relative to the previous reading.
///
/// `Unknown` means no previous reading existed; it is excluded from
/// convergence counting, unlike `Flat` which is a valid non-trending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
    Unknown,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Flat => "flat",
            TrendDirection::Unknown => "unknown",
        }
    }

    /// True for labels that participate in convergence counts.
    pub fn is_directional(&self) -> bool {
        matches!(self, TrendDirection::Up | TrendDirection::Down)
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trend label plus the signed oscillator change that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendAnnotation {
    pub direction: TrendDirection,
    pub change: f64,
}

impl TrendAnnotation {
    pub fn unknown() -> Self {
        Self {
            direction: TrendDirection::Unknown,
            change: 0.0,
        }
    }
}

/// Direction of raw price movement, estimated independently of the
/// oscillator and used as a cross-check in gating and quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Up,
    Down,
    Neutral,
}

impl PriceTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTrend::Up => "up",
            PriceTrend::Down => "down",
            PriceTrend::Neutral => "neutral",
        }
    }
}

impl FromStr for PriceTrend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(PriceTrend::Up),
            "down" => Ok(PriceTrend::Down),
            "neutral" => Ok(PriceTrend::Neutral),
            other => Err(format!("unknown price trend '{other}'")),
        }
    }
}

impl std::fmt::Display for PriceTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Implied direction of a persisted signal, derived from the score sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl SignalDirection {
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            SignalDirection::Buy
        } else {
            SignalDirection::Sell
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::Buy => "buy",
            SignalDirection::Sell => "sell",
        }
    }
}

impl FromStr for SignalDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(SignalDirection::Buy),
            "sell" => Ok(SignalDirection::Sell),
            other => Err(format!("unknown signal direction '{other}'")),
        }
    }
}

impl std::fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Forward offset at which a signal's outcome is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "24h")]
    H24,
}

impl Horizon {
    pub const ALL: [Horizon; 5] = [
        Horizon::M15,
        Horizon::M30,
        Horizon::H1,
        Horizon::H4,
        Horizon::H24,
    ];

    pub fn offset(&self) -> Duration {
        match self {
            Horizon::M15 => Duration::minutes(15),
            Horizon::M30 => Duration::minutes(30),
            Horizon::H1 => Duration::hours(1),
            Horizon::H4 => Duration::hours(4),
            Horizon::H24 => Duration::hours(24),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::M15 => "15m",
            Horizon::M30 => "30m",
            Horizon::H1 => "1h",
            Horizon::H4 => "4h",
            Horizon::H24 => "24h",
        }
    }

    /// Position in `ALL`, used to index per-horizon arrays.
    pub fn idx(&self) -> usize {
        match self {
            Horizon::M15 => 0,
            Horizon::M30 => 1,
            Horizon::H1 => 2,
            Horizon::H4 => 3,
            Horizon::H24 => 4,
        }
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One oscillator/price sample for a symbol/timeframe. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Oscillator value on the 0–100 scale.
    pub value: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// A gated, persisted decision event. Immutable once created; outcome data
/// lives in the separate `SignalOutcome` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub id: String,
    pub symbol: String,
    /// Price at signal time, used as the entry price for outcome evaluation.
    pub price: f64,
    pub score: f64,
    pub quality: i64,
    pub convergence_count: i64,
    pub price_trend: Option<PriceTrend>,
    /// Per-timeframe oscillator values at signal time.
    pub rsi_values: BTreeMap<Timeframe, f64>,
    /// Named fusion configuration that produced this signal.
    pub method: String,
    pub created_at: DateTime<Utc>,
}

impl SignalRecord {
    pub fn direction(&self) -> SignalDirection {
        SignalDirection::from_score(self.score)
    }
}

/// Resolved outcome for a single horizon. All fields null when no reading
/// fell inside the sampling tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HorizonOutcome {
    pub price: Option<f64>,
    pub pct_change: Option<f64>,
    pub profitable: Option<bool>,
}

/// One-per-signal performance record, created lazily by the tracking sweep
/// and never revisited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalOutcome {
    pub signal_id: String,
    pub symbol: String,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub direction: SignalDirection,
    pub score: f64,
    pub quality: i64,
    /// Indexed by `Horizon::idx`.
    pub horizons: [HorizonOutcome; 5],
    pub method: String,
    pub tracked_at: DateTime<Utc>,
}

impl SignalOutcome {
    pub fn horizon(&self, h: Horizon) -> &HorizonOutcome {
        &self.horizons[h.idx()]
    }
}

/// Per-horizon aggregate over one method's outcomes.
///
/// `win_rate` counts unresolved horizons as losses; `avg_return` averages
/// resolved horizons only and is 0 when none resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HorizonStats {
    pub win_rate: f64,
    pub avg_return: f64,
}

/// Derived comparison row for one method version. Always recomputed from
/// outcome rows, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodStatistics {
    pub method: String,
    pub signal_count: u64,
    pub avg_quality: f64,
    pub avg_score: f64,
    /// Indexed by `Horizon::idx`.
    pub horizons: [HorizonStats; 5],
}

impl MethodStatistics {
    pub fn horizon(&self, h: Horizon) -> &HorizonStats {
        &self.horizons[h.idx()]
    }
}
