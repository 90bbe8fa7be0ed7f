use serde::{Deserialize, Serialize};

/// Top-level method config file (TOML).
///
/// Each `[[method]]` table names one fusion parameter set; the name becomes
/// the `method` label stored on signals, so the tracker can compare
/// configurations against each other.
///
/// Example `config/methods.toml`:
/// ```toml
/// [[method]]
/// name = "base_v1"
///
/// [[method]]
/// name = "indicators_v1"
/// use_indicators = true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MethodFileConfig {
    #[serde(rename = "method")]
    pub methods: Vec<MethodConfig>,
}

impl MethodFileConfig {
    /// Load from a TOML file. Exits process on error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read method config at '{path}': {e}"));
        toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse method config at '{path}': {e}"))
    }
}

/// One named fusion configuration. The historical scoring "versions" differ
/// only in these knobs, so a method is data, not a code path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MethodConfig {
    pub name: String,

    /// Blend in the supplementary indicator scores when the caller supplies
    /// them (trend strength, MA momentum, band position, patterns).
    #[serde(default)]
    pub use_indicators: bool,

    #[serde(default)]
    pub factor_weights: FactorWeights,

    #[serde(default)]
    pub indicator_weights: IndicatorWeights,

    /// Scale-down when fewer than 2 observed trends agree.
    #[serde(default = "default_no_convergence_penalty")]
    pub no_convergence_penalty: f64,

    /// Scale-down when fewer than 3 observed trends agree.
    #[serde(default = "default_weak_convergence_penalty")]
    pub weak_convergence_penalty: f64,

    /// Scale-down when the price trend opposes the score sign.
    #[serde(default = "default_counter_trend_penalty")]
    pub counter_trend_penalty: f64,

    /// Scale-up when the price trend agrees with the score sign.
    #[serde(default = "default_with_trend_boost")]
    pub with_trend_boost: f64,

    /// Scale-up when supplementary indicators agree with the score.
    #[serde(default = "default_agreement_boost")]
    pub agreement_boost: f64,

    /// Scale-down when supplementary indicators conflict with the score.
    #[serde(default = "default_conflict_penalty")]
    pub conflict_penalty: f64,
}

impl Default for MethodConfig {
    fn default() -> Self {
        Self {
            name: "base_v1".to_string(),
            use_indicators: false,
            factor_weights: FactorWeights::default(),
            indicator_weights: IndicatorWeights::default(),
            no_convergence_penalty: default_no_convergence_penalty(),
            weak_convergence_penalty: default_weak_convergence_penalty(),
            counter_trend_penalty: default_counter_trend_penalty(),
            with_trend_boost: default_with_trend_boost(),
            agreement_boost: default_agreement_boost(),
            conflict_penalty: default_conflict_penalty(),
        }
    }
}

/// Per-timeframe factor mix. The convergence weight applies once, to the
/// cross-timeframe convergence component.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct FactorWeights {
    pub rsi: f64,
    pub trend: f64,
    pub momentum: f64,
    pub convergence: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            rsi: 0.40,
            trend: 0.30,
            momentum: 0.20,
            convergence: 0.10,
        }
    }
}

/// Weights for the indicator-enriched recombination. They sum to 1; the
/// weight of a missing indicator is dropped, not redistributed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct IndicatorWeights {
    pub base: f64,
    pub trend_strength: f64,
    pub ma_momentum: f64,
    pub bands: f64,
    pub pattern: f64,
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            base: 0.45,
            trend_strength: 0.15,
            ma_momentum: 0.10,
            bands: 0.15,
            pattern: 0.15,
        }
    }
}

fn default_no_convergence_penalty() -> f64 {
    0.75
}

fn default_weak_convergence_penalty() -> f64 {
    0.85
}

fn default_counter_trend_penalty() -> f64 {
    0.70
}

fn default_with_trend_boost() -> f64 {
    1.10
}

fn default_agreement_boost() -> f64 {
    1.15
}

fn default_conflict_penalty() -> f64 {
    0.75
}
