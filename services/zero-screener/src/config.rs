//! Screening configuration.
//!
//! Every numeric threshold the stages use, the gate requirements, and the
//! composite weights. All fields have serde defaults so a partial JSON
//! object (or none at all) yields a usable configuration.

use serde::{Deserialize, Serialize};
use zero_common::config::Config;
use zero_common::validation::{Validate, ValidationError, ValidationResult};

use crate::coverage::GateRequirement;
use crate::error::Result;

// ============================================================================
// Main Screening Configuration
// ============================================================================

/// Thresholds, gates and weights for one screening run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningConfig {
    #[serde(default)]
    pub fundamental: FundamentalThresholds,

    #[serde(default)]
    pub technical: TechnicalThresholds,

    #[serde(default)]
    pub options: OptionsThresholds,

    #[serde(default)]
    pub momentum: MomentumThresholds,

    #[serde(default)]
    pub gates: GateConfig,

    #[serde(default)]
    pub weights: CompositeWeightsConfig,

    /// Force the sector criterion to PASS
    #[serde(default)]
    pub bypass_sector: bool,

    /// Use the five-component weighting that includes sentiment
    #[serde(default)]
    pub sentiment_weighting: bool,

    /// Size of the evaluation worker pool
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            fundamental: FundamentalThresholds::default(),
            technical: TechnicalThresholds::default(),
            options: OptionsThresholds::default(),
            momentum: MomentumThresholds::default(),
            gates: GateConfig::default(),
            weights: CompositeWeightsConfig::default(),
            bypass_sector: false,
            sentiment_weighting: false,
            workers: default_workers(),
        }
    }
}

impl ScreeningConfig {
    /// Build from the shared service configuration.
    ///
    /// `screener.thresholds` is parsed here; run-level settings
    /// (`workers`, `sentiment_weighting`) come from the `screener` section.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut screening: Self = if config.screener.thresholds.is_null() {
            Self::default()
        } else {
            serde_json::from_value(config.screener.thresholds.clone())?
        };

        screening.workers = config.screener.workers;
        screening.sentiment_weighting = config.screener.sentiment_weighting;
        screening.validate()?;

        Ok(screening)
    }

    /// One-line summary for logs and reports.
    pub fn summary(&self) -> String {
        format!(
            "cap {:.0e}-{:.0e}, price {}-{}, growth>={}, D/E<={}, bars>={}, IV {}-{}, gates F{}/{} T{}/{} O{}/{}",
            self.fundamental.min_market_cap,
            self.fundamental.max_market_cap,
            self.fundamental.min_price,
            self.fundamental.max_price,
            self.fundamental.min_revenue_growth,
            self.fundamental.max_leverage,
            self.technical.min_history_bars,
            self.options.iv_min,
            self.options.iv_max,
            self.gates.fundamental.min_pass,
            self.gates.fundamental.min_known,
            self.gates.technical.min_pass,
            self.gates.technical.min_known,
            self.gates.options.min_pass,
            self.gates.options.min_known,
        )
    }
}

fn default_workers() -> usize {
    4
}

// ============================================================================
// Fundamental Thresholds
// ============================================================================

/// Fundamental stage thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalThresholds {
    /// Market cap floor (USD)
    pub min_market_cap: f64,
    /// Market cap ceiling (USD)
    pub max_market_cap: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Minimum year-over-year revenue growth (fraction)
    pub min_revenue_growth: f64,
    /// Minimum year-over-year earnings growth (fraction)
    pub min_earnings_growth: f64,
    /// Minimum net margin when earnings growth is unavailable (fraction)
    pub min_profit_margin: f64,
    /// Maximum debt to equity (%)
    pub max_leverage: f64,
    /// Minimum current ratio
    pub min_liquidity: f64,
    /// Sectors allowed (empty = any)
    pub allowed_sectors: Vec<String>,
    /// Sectors always rejected
    pub excluded_sectors: Vec<String>,
}

impl Default for FundamentalThresholds {
    fn default() -> Self {
        Self {
            min_market_cap: 2.0e9,
            max_market_cap: 2.0e12,
            min_price: 5.0,
            max_price: 1000.0,
            min_revenue_growth: 0.10,
            min_earnings_growth: 0.10,
            min_profit_margin: 0.10,
            max_leverage: 100.0,
            min_liquidity: 1.0,
            allowed_sectors: Vec::new(),
            excluded_sectors: Vec::new(),
        }
    }
}

// ============================================================================
// Technical Thresholds
// ============================================================================

/// Technical stage thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalThresholds {
    /// Bars needed for the longest moving average
    pub min_history_bars: usize,
    pub rsi_min: f64,
    pub rsi_max: f64,
    /// Minimum volume / average volume
    pub min_volume_ratio: f64,
    /// Maximum ATR / price
    pub max_volatility_ratio: f64,
    pub min_adx: f64,
}

impl Default for TechnicalThresholds {
    fn default() -> Self {
        Self {
            min_history_bars: 200,
            rsi_min: 40.0,
            rsi_max: 70.0,
            min_volume_ratio: 1.0,
            max_volatility_ratio: 0.04,
            min_adx: 20.0,
        }
    }
}

// ============================================================================
// Options Thresholds
// ============================================================================

/// Options stage thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsThresholds {
    /// Target duration window (days to expiry)
    pub min_days_to_expiry: u32,
    pub max_days_to_expiry: u32,
    /// Implied volatility band (fraction)
    pub iv_min: f64,
    pub iv_max: f64,
    pub min_open_interest: f64,
    pub min_volume: f64,
    /// Maximum (ask - bid) / mid
    pub max_spread_fraction: f64,
    /// Maximum mid / underlying price
    pub max_premium_fraction: f64,
    /// IV percentile at or below which the bonus applies
    pub low_iv_percentile: f64,
    /// IV percentile at or above which the penalty applies
    pub high_iv_percentile: f64,
    pub iv_percentile_bonus: f64,
    pub iv_percentile_penalty: f64,
}

impl Default for OptionsThresholds {
    fn default() -> Self {
        Self {
            min_days_to_expiry: 20,
            max_days_to_expiry: 60,
            iv_min: 0.20,
            iv_max: 0.80,
            min_open_interest: 100.0,
            min_volume: 10.0,
            max_spread_fraction: 0.10,
            max_premium_fraction: 0.08,
            low_iv_percentile: 20.0,
            high_iv_percentile: 80.0,
            iv_percentile_bonus: 10.0,
            iv_percentile_penalty: 10.0,
        }
    }
}

// ============================================================================
// Momentum Thresholds
// ============================================================================

/// Thresholds for one return horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonThresholds {
    /// Criterion passes at or above this return
    pub min_return: f64,
    /// Full points at or above this return
    pub strong_return: f64,
    /// Two thirds of the points at or above this return
    pub moderate_return: f64,
    /// Drawdown penalty at or below this return
    pub severe_drawdown: f64,
}

impl HorizonThresholds {
    const fn new(strong_return: f64, moderate_return: f64, severe_drawdown: f64) -> Self {
        Self {
            min_return: 0.0,
            strong_return,
            moderate_return,
            severe_drawdown,
        }
    }
}

/// Momentum stage thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumThresholds {
    pub one_month: HorizonThresholds,
    pub three_month: HorizonThresholds,
    pub six_month: HorizonThresholds,
    /// Points subtracted per horizon in severe drawdown
    pub drawdown_penalty: f64,
}

impl Default for MomentumThresholds {
    fn default() -> Self {
        Self {
            one_month: HorizonThresholds::new(0.10, 0.05, -0.10),
            three_month: HorizonThresholds::new(0.20, 0.10, -0.20),
            six_month: HorizonThresholds::new(0.30, 0.15, -0.30),
            drawdown_penalty: 10.0,
        }
    }
}

// ============================================================================
// Gates
// ============================================================================

/// Minimum pass/known counts for one gated stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateThresholds {
    pub min_pass: usize,
    pub min_known: usize,
}

impl GateThresholds {
    pub const fn new(min_pass: usize, min_known: usize) -> Self {
        Self {
            min_pass,
            min_known,
        }
    }

    /// Bind to a stage with `total` criteria.
    pub fn requirement(&self, total: usize) -> GateRequirement {
        GateRequirement::new(self.min_pass, self.min_known, total)
    }
}

/// Gate requirements per gated stage. Momentum is ungated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub fundamental: GateThresholds,
    pub technical: GateThresholds,
    pub options: GateThresholds,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            fundamental: GateThresholds::new(3, 4),
            technical: GateThresholds::new(4, 5),
            options: GateThresholds::new(2, 3),
        }
    }
}

// ============================================================================
// Composite Weights
// ============================================================================

/// Weights for one composite scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    pub fundamental: f64,
    pub technical: f64,
    pub options: f64,
    pub momentum: f64,
    #[serde(default)]
    pub sentiment: f64,
}

impl CompositeWeights {
    /// Named weights, with sentiment only when the scheme includes it.
    fn components(&self, with_sentiment: bool) -> Vec<(&'static str, f64)> {
        let mut weights = vec![
            ("fundamental", self.fundamental),
            ("technical", self.technical),
            ("options", self.options),
            ("momentum", self.momentum),
        ];
        if with_sentiment {
            weights.push(("sentiment", self.sentiment));
        }
        weights
    }
}

/// The two weighting schemes. The standard scheme ignores `sentiment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeightsConfig {
    pub standard: CompositeWeights,
    pub with_sentiment: CompositeWeights,
}

impl Default for CompositeWeightsConfig {
    fn default() -> Self {
        Self {
            standard: CompositeWeights {
                fundamental: 0.30,
                technical: 0.25,
                options: 0.25,
                momentum: 0.20,
                sentiment: 0.0,
            },
            with_sentiment: CompositeWeights {
                fundamental: 0.25,
                technical: 0.20,
                options: 0.20,
                momentum: 0.15,
                sentiment: 0.20,
            },
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

fn check_range(errors: &mut Vec<ValidationError>, field: &str, min: f64, max: f64) {
    if !(min.is_finite() && max.is_finite()) {
        errors.push(ValidationError::invalid(field, "bounds must be finite"));
    } else if min > max {
        errors.push(ValidationError::invalid(
            field,
            format!("minimum {} exceeds maximum {}", min, max),
        ));
    }
}

fn check_gate(errors: &mut Vec<ValidationError>, field: &str, gate: &GateThresholds, total: usize) {
    if !gate.requirement(total).is_satisfiable() {
        errors.push(ValidationError::invalid(
            field,
            format!(
                "min_pass {} / min_known {} cannot be met by {} criteria",
                gate.min_pass, gate.min_known, total
            ),
        ));
    }
}

fn check_weights(
    errors: &mut Vec<ValidationError>,
    field: &str,
    weights: &CompositeWeights,
    with_sentiment: bool,
) {
    let components = weights.components(with_sentiment);
    for &(name, weight) in &components {
        if !weight.is_finite() || weight < 0.0 {
            errors.push(ValidationError::invalid(
                format!("{}.{}", field, name),
                "weight must be a non-negative number",
            ));
        }
    }
    let sum: f64 = components.iter().map(|(_, w)| w).sum();
    if sum <= 0.0 {
        errors.push(ValidationError::invalid(field, "weights must not all be zero"));
    }
}

impl Validate for ScreeningConfig {
    fn validate(&self) -> ValidationResult<()> {
        use crate::stages::{fundamental, options, technical};

        let mut errors = Vec::new();
        let f = &self.fundamental;
        let t = &self.technical;
        let o = &self.options;

        check_range(&mut errors, "fundamental.market_cap", f.min_market_cap, f.max_market_cap);
        check_range(&mut errors, "fundamental.price", f.min_price, f.max_price);
        check_range(&mut errors, "technical.rsi", t.rsi_min, t.rsi_max);
        check_range(&mut errors, "options.iv", o.iv_min, o.iv_max);
        check_range(
            &mut errors,
            "options.days_to_expiry",
            f64::from(o.min_days_to_expiry),
            f64::from(o.max_days_to_expiry),
        );
        check_range(
            &mut errors,
            "options.iv_percentile",
            o.low_iv_percentile,
            o.high_iv_percentile,
        );

        if t.min_history_bars == 0 {
            errors.push(ValidationError::invalid(
                "technical.min_history_bars",
                "must be greater than 0",
            ));
        }

        check_gate(&mut errors, "gates.fundamental", &self.gates.fundamental, fundamental::CRITERIA.len());
        check_gate(&mut errors, "gates.technical", &self.gates.technical, technical::CRITERIA.len());
        check_gate(&mut errors, "gates.options", &self.gates.options, options::CRITERIA.len());

        check_weights(&mut errors, "weights.standard", &self.weights.standard, false);
        check_weights(&mut errors, "weights.with_sentiment", &self.weights.with_sentiment, true);

        if self.momentum.drawdown_penalty < 0.0 {
            errors.push(ValidationError::invalid(
                "momentum.drawdown_penalty",
                "must not be negative",
            ));
        }

        if self.workers == 0 {
            errors.push(ValidationError::invalid("workers", "must be greater than 0"));
        }

        ValidationError::collect(errors)
    }
}
