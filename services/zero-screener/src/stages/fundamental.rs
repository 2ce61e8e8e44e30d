//! Fundamental stage.
//!
//! Two mandatory pre-gates (market cap, then price) must both PASS before
//! anything else is looked at. After that five tri-state criteria are
//! recorded and four point buckets are scored:
//!
//! | bucket          | max | inputs                          |
//! |-----------------|-----|---------------------------------|
//! | revenue growth  | 30  | revenue_growth                  |
//! | earnings growth | 30  | earnings_growth, else margin    |
//! | balance sheet   | 20  | debt_to_equity AND current_ratio|
//! | return on equity| 20  | return_on_equity                |
//!
//! The sector criterion only feeds the gate.

use tracing::debug;

use crate::config::{FundamentalThresholds, GateThresholds, ScreeningConfig};
use crate::coverage::GateRequirement;
use crate::criteria::{CriteriaSet, CriterionOutcome, Threshold};
use crate::error::{finite, Result};
use crate::metrics::SecurityMetrics;
use crate::scoring::{banded, ScoreCard};
use crate::stage::{HardFail, HardFailReason, StageId, StageOutcome, StageResult};

use super::StageEvaluator;

/// Gate criteria, in the order they are reported.
pub const CRITERIA: [&str; 5] = [
    "revenue_growth",
    "earnings_growth",
    "leverage",
    "liquidity",
    "sector",
];

const MARKET_CAP_GATE: &str = "market_cap_in_range";
const PRICE_GATE: &str = "price_in_range";

const GROWTH_MAX: f64 = 30.0;
const BALANCE_SHEET_MAX: f64 = 20.0;
const ROE_MAX: f64 = 20.0;

/// Fundamental stage evaluator.
pub struct FundamentalStage<'a> {
    thresholds: &'a FundamentalThresholds,
    gate: GateThresholds,
    bypass_sector: bool,
}

impl<'a> FundamentalStage<'a> {
    pub fn new(thresholds: &'a FundamentalThresholds, gate: GateThresholds, bypass_sector: bool) -> Self {
        Self {
            thresholds,
            gate,
            bypass_sector,
        }
    }

    pub fn from_config(config: &'a ScreeningConfig) -> Self {
        Self::new(&config.fundamental, config.gates.fundamental, config.bypass_sector)
    }

    fn sector_allowed(&self, sector: &str) -> bool {
        let matches = |list: &[String]| list.iter().any(|s| s.eq_ignore_ascii_case(sector));
        let t = self.thresholds;
        !matches(&t.excluded_sectors) && (t.allowed_sectors.is_empty() || matches(&t.allowed_sectors))
    }

    fn sector_outcome(&self, sector: Option<&str>) -> CriterionOutcome {
        if self.bypass_sector {
            return CriterionOutcome::Pass;
        }
        CriterionOutcome::from_option(sector.map(|s| self.sector_allowed(s.trim())))
    }
}

/// Map a pre-gate outcome to the hard fail it causes, if any.
fn pre_gate_failure(
    outcome: CriterionOutcome,
    failed: HardFailReason,
    unknown: HardFailReason,
) -> Option<HardFailReason> {
    match outcome {
        CriterionOutcome::Pass => None,
        CriterionOutcome::Fail => Some(failed),
        CriterionOutcome::Unknown => Some(unknown),
    }
}

/// Upper bands never sit below the configured minimum.
fn growth_points(growth: f64, min_growth: f64) -> f64 {
    banded(&[
        (growth >= 0.50_f64.max(min_growth), 30.0),
        (growth >= 0.25_f64.max(min_growth), 22.0),
        (growth >= min_growth, 15.0),
        (growth > 0.0, 6.0),
    ])
}

fn margin_points(margin: f64, min_margin: f64) -> f64 {
    banded(&[
        (margin >= 0.20_f64.max(min_margin), 24.0),
        (margin >= min_margin, 15.0),
        (margin > 0.0, 6.0),
    ])
}

fn roe_points(roe: f64) -> f64 {
    banded(&[
        (roe >= 0.20, 20.0),
        (roe >= 0.15, 14.0),
        (roe >= 0.10, 8.0),
        (roe > 0.0, 3.0),
    ])
}

impl StageEvaluator for FundamentalStage<'_> {
    fn stage(&self) -> StageId {
        StageId::Fundamental
    }

    fn gate(&self) -> Option<GateRequirement> {
        Some(self.gate.requirement(CRITERIA.len()))
    }

    fn evaluate(&self, metrics: &SecurityMetrics) -> Result<StageOutcome> {
        let f = &metrics.fundamentals;
        let t = self.thresholds;

        let market_cap = finite("market_cap", f.market_cap)?;
        let price = finite("price", f.price)?;
        let revenue_growth = finite("revenue_growth", f.revenue_growth)?;
        let earnings_growth = finite("earnings_growth", f.earnings_growth)?;
        let profit_margin = finite("profit_margin", f.profit_margin)?;
        let debt_to_equity = finite("debt_to_equity", f.debt_to_equity)?;
        let current_ratio = finite("current_ratio", f.current_ratio)?;
        let return_on_equity = finite("return_on_equity", f.return_on_equity)?;

        // Pre-gates: market cap first, then price
        let mut pre_gates = CriteriaSet::new();
        let pre_gate_checks = [
            (
                MARKET_CAP_GATE,
                Threshold::Within { min: t.min_market_cap, max: t.max_market_cap },
                market_cap,
                HardFailReason::MarketCapGateFailed,
                HardFailReason::MarketCapGateUnknown,
            ),
            (
                PRICE_GATE,
                Threshold::Within { min: t.min_price, max: t.max_price },
                price,
                HardFailReason::PriceGateFailed,
                HardFailReason::PriceGateUnknown,
            ),
        ];
        for (name, threshold, value, failed, unknown) in pre_gate_checks {
            let outcome = pre_gates.record(name, threshold.check(value));
            if let Some(reason) = pre_gate_failure(outcome, failed, unknown) {
                debug!(symbol = %metrics.symbol, gate = name, %reason, "Fundamental pre-gate rejected");
                return Ok(StageOutcome::HardFail(HardFail::new(
                    StageId::Fundamental,
                    reason,
                    pre_gates,
                )));
            }
        }

        // Criteria
        let mut criteria = CriteriaSet::new();
        criteria.record(
            "revenue_growth",
            Threshold::AtLeast(t.min_revenue_growth).check(revenue_growth),
        );
        let earnings = match earnings_growth {
            Some(growth) => CriterionOutcome::from_bool(growth >= t.min_earnings_growth),
            None => Threshold::AtLeast(t.min_profit_margin).check(profit_margin),
        };
        criteria.record("earnings_growth", earnings);
        let leverage = criteria.record("leverage", Threshold::AtMost(t.max_leverage).check(debt_to_equity));
        let liquidity = criteria.record("liquidity", Threshold::AtLeast(t.min_liquidity).check(current_ratio));
        criteria.record("sector", self.sector_outcome(metrics.sector.as_deref()));

        // Scoring
        let mut card = ScoreCard::new();
        card.add(
            GROWTH_MAX,
            revenue_growth.map(|g| growth_points(g, t.min_revenue_growth)),
        );

        let earnings_bucket = match (earnings_growth, profit_margin) {
            (Some(growth), _) => Some(growth_points(growth, t.min_earnings_growth)),
            (None, Some(margin)) => Some(margin_points(margin, t.min_profit_margin)),
            (None, None) => None,
        };
        card.add(GROWTH_MAX, earnings_bucket);

        let balance_sheet = match (debt_to_equity, current_ratio) {
            (Some(de), Some(cr)) => {
                let strong = de <= t.max_leverage / 2.0 && cr >= t.min_liquidity * 2.0;
                let passes = [leverage, liquidity].iter().filter(|o| o.is_pass()).count();
                Some(banded(&[(strong, 20.0), (passes == 2, 14.0), (passes == 1, 6.0)]))
            }
            _ => None,
        };
        card.add(BALANCE_SHEET_MAX, balance_sheet);
        card.add(ROE_MAX, return_on_equity.map(roe_points));

        let (raw, score) = card.finish();
        let result = StageResult::new(StageId::Fundamental, criteria, raw, score);

        debug!(
            symbol = %metrics.symbol,
            coverage = %result.coverage,
            percentage = ?result.percentage(),
            "Fundamental stage evaluated"
        );

        Ok(StageOutcome::Scored(result))
    }
}
