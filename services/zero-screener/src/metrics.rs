//! Per-security input metrics.
//!
//! Every metric is supplied by upstream collaborators before a screen
//! runs. Each one is independently optional: an absent value makes the
//! criteria that depend on it UNKNOWN.

use serde::{Deserialize, Serialize};

/// Everything the screener needs to know about one security.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityMetrics {
    /// Ticker symbol (e.g., "AAPL")
    pub symbol: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Sector classification
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub fundamentals: FundamentalMetrics,
    #[serde(default)]
    pub technical: TechnicalMetrics,
    #[serde(default)]
    pub options: OptionsSnapshot,
    #[serde(default)]
    pub momentum: MomentumMetrics,
    /// External sentiment signal (0-100)
    #[serde(default)]
    pub sentiment: Option<f64>,
}

impl SecurityMetrics {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }
}

/// Valuation, size and balance-sheet metrics.
///
/// Growth rates, margins and returns are fractions (0.25 = 25%);
/// `debt_to_equity` is a percentage (40.0 = 40%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalMetrics {
    pub market_cap: Option<f64>,
    pub price: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub profit_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub return_on_equity: Option<f64>,
    // accepted for provider compatibility; not scored or reported
    pub beta: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub pe_ratio: Option<f64>,
}

/// Pre-derived technical indicators over a daily price window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalMetrics {
    /// Number of daily bars the indicators were derived from
    pub bars_available: usize,
    pub price: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub volume: Option<f64>,
    pub avg_volume: Option<f64>,
    /// Price closed above the recent range high
    pub breakout: bool,
    pub atr: Option<f64>,
    pub adx: Option<f64>,
}

/// The options view of a security.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsSnapshot {
    /// Whether any option chain was returned for the underlying
    pub chain_available: bool,
    /// Nearest-the-money contract in the target duration window, if found
    pub contract: Option<OptionContract>,
    pub underlying_price: Option<f64>,
    /// Externally sourced implied-volatility percentile (0-100)
    pub iv_percentile: Option<f64>,
}

/// One option contract quote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionContract {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
    pub open_interest: Option<f64>,
    pub volume: Option<f64>,
    /// Annualized implied volatility as a fraction (0.35 = 35%)
    pub implied_volatility: Option<f64>,
    pub days_to_expiry: Option<u32>,
}

impl OptionContract {
    /// Bid/ask midpoint when both sides are positive, else the last trade.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) if bid > 0.0 && ask > 0.0 => Some((bid + ask) / 2.0),
            _ => self.last.filter(|last| *last > 0.0),
        }
    }

    /// Quoted spread as a fraction of the midpoint. A crossed quote has none.
    pub fn spread_fraction(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) if bid > 0.0 && ask >= bid => {
                let mid = (bid + ask) / 2.0;
                Some((ask - bid) / mid)
            }
            _ => None,
        }
    }

    /// Premium as a fraction of the underlying price.
    pub fn premium_fraction(&self, underlying_price: Option<f64>) -> Option<f64> {
        let price = underlying_price.filter(|p| *p > 0.0)?;
        self.mid_price().map(|mid| mid / price)
    }
}

/// Trailing total returns as fractions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumMetrics {
    pub return_1m: Option<f64>,
    pub return_3m: Option<f64>,
    pub return_6m: Option<f64>,
}
