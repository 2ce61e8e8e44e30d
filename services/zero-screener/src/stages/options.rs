//! Options stage.
//!
//! A missing chain or a missing qualifying contract is a hard fail, never
//! a neutral UNKNOWN score: an underlying without tradable options cannot
//! be expressed in the strategy at all.

use tracing::debug;

use crate::config::{GateThresholds, OptionsThresholds, ScreeningConfig};
use crate::coverage::GateRequirement;
use crate::criteria::{CriteriaSet, Threshold};
use crate::error::{finite, Result};
use crate::metrics::{OptionContract, SecurityMetrics};
use crate::scoring::{banded, ScoreCard};
use crate::stage::{HardFail, HardFailReason, StageId, StageOutcome, StageResult};

use super::StageEvaluator;

pub const CRITERIA: [&str; 4] = ["implied_volatility", "contract_liquidity", "spread", "premium"];

const BUCKET_MAX: f64 = 25.0;
/// IV still earns partial points this far outside the band
const IV_NEAR_BAND: f64 = 0.10;
/// Liquidity multiple of the floors that earns full points
const DEEP_LIQUIDITY_MULTIPLE: f64 = 5.0;

/// Options stage evaluator.
pub struct OptionsStage<'a> {
    thresholds: &'a OptionsThresholds,
    gate: GateThresholds,
}

impl<'a> OptionsStage<'a> {
    pub fn new(thresholds: &'a OptionsThresholds, gate: GateThresholds) -> Self {
        Self { thresholds, gate }
    }

    pub fn from_config(config: &'a ScreeningConfig) -> Self {
        Self::new(&config.options, config.gates.options)
    }

    fn hard_fail(&self, reason: HardFailReason) -> StageOutcome {
        StageOutcome::HardFail(HardFail::new(StageId::Options, reason, CriteriaSet::new()))
    }

    /// The contract, if one exists inside the target duration window.
    fn qualifying_contract<'m>(&self, metrics: &'m SecurityMetrics) -> Option<&'m OptionContract> {
        let t = self.thresholds;
        metrics.options.contract.as_ref().filter(|contract| {
            contract
                .days_to_expiry
                .map_or(true, |dte| dte >= t.min_days_to_expiry && dte <= t.max_days_to_expiry)
        })
    }

    fn iv_percentile_adjustment(&self, percentile: f64) -> f64 {
        let t = self.thresholds;
        if percentile <= t.low_iv_percentile {
            t.iv_percentile_bonus
        } else if percentile >= t.high_iv_percentile {
            -t.iv_percentile_penalty
        } else {
            0.0
        }
    }
}

impl StageEvaluator for OptionsStage<'_> {
    fn stage(&self) -> StageId {
        StageId::Options
    }

    fn gate(&self) -> Option<GateRequirement> {
        Some(self.gate.requirement(CRITERIA.len()))
    }

    fn evaluate(&self, metrics: &SecurityMetrics) -> Result<StageOutcome> {
        let t = self.thresholds;

        if !metrics.options.chain_available {
            debug!(symbol = %metrics.symbol, "No options chain");
            return Ok(self.hard_fail(HardFailReason::NoOptionsData));
        }
        let Some(contract) = self.qualifying_contract(metrics) else {
            debug!(symbol = %metrics.symbol, "No contract in target window");
            return Ok(self.hard_fail(HardFailReason::NoQualifyingContract));
        };

        finite("bid", contract.bid)?;
        finite("ask", contract.ask)?;
        finite("last", contract.last)?;
        let open_interest = finite("open_interest", contract.open_interest)?;
        let volume = finite("volume", contract.volume)?;
        let iv = finite("implied_volatility", contract.implied_volatility)?;
        let underlying = finite("underlying_price", metrics.options.underlying_price)?;
        let iv_percentile = finite("iv_percentile", metrics.options.iv_percentile)?;

        let spread = contract.spread_fraction();
        let premium = contract.premium_fraction(underlying);

        let mut criteria = CriteriaSet::new();
        criteria.record(
            "implied_volatility",
            Threshold::Within { min: t.iv_min, max: t.iv_max }.check(iv),
        );
        let oi_ok = Threshold::AtLeast(t.min_open_interest).check(open_interest);
        let volume_ok = Threshold::AtLeast(t.min_volume).check(volume);
        criteria.record("contract_liquidity", oi_ok.and(volume_ok));
        criteria.record("spread", Threshold::AtMost(t.max_spread_fraction).check(spread));
        criteria.record("premium", Threshold::AtMost(t.max_premium_fraction).check(premium));

        let mut card = ScoreCard::new();
        card.add(
            BUCKET_MAX,
            iv.map(|v| {
                banded(&[
                    (v >= t.iv_min && v <= t.iv_max, 25.0),
                    (v >= t.iv_min - IV_NEAR_BAND && v <= t.iv_max + IV_NEAR_BAND, 10.0),
                ])
            }),
        );

        let liquidity = open_interest.zip(volume).map(|(oi, vol)| {
            let deep = oi >= t.min_open_interest * DEEP_LIQUIDITY_MULTIPLE
                && vol >= t.min_volume * DEEP_LIQUIDITY_MULTIPLE;
            let passes = [oi_ok, volume_ok].iter().filter(|o| o.is_pass()).count();
            banded(&[(deep, 25.0), (passes == 2, 18.0), (passes == 1, 6.0)])
        });
        card.add(BUCKET_MAX, liquidity);

        let max_spread = t.max_spread_fraction;
        card.add(
            BUCKET_MAX,
            spread.map(|s| {
                banded(&[(s <= max_spread / 2.0, 25.0), (s <= max_spread, 18.0), (s <= max_spread * 2.0, 6.0)])
            }),
        );
        let max_premium = t.max_premium_fraction;
        card.add(
            BUCKET_MAX,
            premium.map(|p| {
                banded(&[(p <= max_premium / 2.0, 25.0), (p <= max_premium, 18.0), (p <= max_premium * 1.5, 6.0)])
            }),
        );

        if card.known_max() > 0.0 {
            if let Some(percentile) = iv_percentile {
                card.adjust(self.iv_percentile_adjustment(percentile));
            }
            let ceiling = card.known_max();
            card.clamp_earned(0.0, ceiling);
        }

        let (raw, score) = card.finish();
        let result = StageResult::new(StageId::Options, criteria, raw, score);

        debug!(
            symbol = %metrics.symbol,
            coverage = %result.coverage,
            percentage = ?result.percentage(),
            iv_percentile = ?iv_percentile,
            "Options stage evaluated"
        );

        Ok(StageOutcome::Scored(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::CriterionOutcome;
    use crate::metrics::OptionsSnapshot;

    fn good_contract() -> OptionContract {
        OptionContract {
            bid: Some(0.98),
            ask: Some(1.02),
            last: Some(1.0),
            open_interest: Some(2500.0),
            volume: Some(400.0),
            implied_volatility: Some(0.35),
            days_to_expiry: Some(45),
        }
    }

    fn metrics_with(snapshot: OptionsSnapshot) -> SecurityMetrics {
        let mut metrics = SecurityMetrics::new("OPT");
        metrics.options = snapshot;
        metrics
    }

    fn good_snapshot() -> OptionsSnapshot {
        OptionsSnapshot {
            chain_available: true,
            contract: Some(good_contract()),
            underlying_price: Some(50.0),
            iv_percentile: None,
        }
    }

    fn evaluate(metrics: &SecurityMetrics) -> StageOutcome {
        let config = ScreeningConfig::default();
        OptionsStage::from_config(&config).evaluate(metrics).unwrap()
    }

    #[test]
    fn test_no_chain_records_nothing() {
        // a contract on its own does not count without a chain
        let mut snapshot = good_snapshot();
        snapshot.chain_available = false;
        let outcome = evaluate(&metrics_with(snapshot));

        assert_eq!(outcome.hard_fail_reason(), Some(&HardFailReason::NoOptionsData));
        assert!(outcome.criteria().is_empty());
        assert_eq!(outcome.coverage().total_count(), 0);
    }

    #[test]
    fn test_missing_contract_is_hard_fail() {
        let mut snapshot = good_snapshot();
        snapshot.contract = None;
        let outcome = evaluate(&metrics_with(snapshot));
        assert_eq!(outcome.hard_fail_reason(), Some(&HardFailReason::NoQualifyingContract));
    }

    #[test]
    fn test_contract_outside_window_is_hard_fail() {
        let mut snapshot = good_snapshot();
        if let Some(contract) = snapshot.contract.as_mut() {
            contract.days_to_expiry = Some(90);
        }
        let outcome = evaluate(&metrics_with(snapshot));
        assert_eq!(outcome.hard_fail_reason(), Some(&HardFailReason::NoQualifyingContract));
    }

    #[test]
    fn test_unknown_expiry_is_not_hard_fail() {
        let mut snapshot = good_snapshot();
        if let Some(contract) = snapshot.contract.as_mut() {
            contract.days_to_expiry = None;
        }
        let outcome = evaluate(&metrics_with(snapshot));
        assert!(outcome.hard_fail_reason().is_none());
        assert_eq!(outcome.as_scored().unwrap().percentage(), Some(100.0));
    }

    #[test]
    fn test_good_contract_scores_full() {
        let outcome = evaluate(&metrics_with(good_snapshot()));
        let result = outcome.as_scored().unwrap();

        assert_eq!(result.coverage.pass_count(), 4);
        assert_eq!(result.percentage(), Some(100.0));
        assert_eq!(result.points(), Some(100.0));
    }

    #[test]
    fn test_iv_percentile_adjusts_and_reclamps() {
        let mut snapshot = good_snapshot();
        snapshot.iv_percentile = Some(10.0);
        let outcome = evaluate(&metrics_with(snapshot));
        // bonus on a perfect score is clamped back to the ceiling
        assert_eq!(outcome.as_scored().unwrap().raw.earned, 100.0);

        let mut snapshot = good_snapshot();
        snapshot.iv_percentile = Some(95.0);
        let outcome = evaluate(&metrics_with(snapshot));
        assert_eq!(outcome.as_scored().unwrap().raw.earned, 90.0);

        let mut snapshot = good_snapshot();
        snapshot.iv_percentile = Some(50.0);
        let outcome = evaluate(&metrics_with(snapshot));
        assert_eq!(outcome.as_scored().unwrap().raw.earned, 100.0);
    }

    #[test]
    fn test_liquidity_is_three_valued() {
        let mut snapshot = good_snapshot();
        if let Some(contract) = snapshot.contract.as_mut() {
            contract.open_interest = Some(50.0);
            contract.volume = None;
        }
        let outcome = evaluate(&metrics_with(snapshot));
        assert_eq!(outcome.criteria().get("contract_liquidity"), Some(CriterionOutcome::Fail));
        // bucket needs both inputs
        assert_eq!(outcome.as_scored().unwrap().raw.known_max, 75.0);
    }

    #[test]
    fn test_liquidity_above_floors_but_not_deep() {
        let mut snapshot = good_snapshot();
        if let Some(contract) = snapshot.contract.as_mut() {
            contract.open_interest = Some(200.0);
            contract.volume = Some(20.0);
        }
        let outcome = evaluate(&metrics_with(snapshot));
        assert_eq!(outcome.criteria().get("contract_liquidity"), Some(CriterionOutcome::Pass));
        assert_eq!(outcome.as_scored().unwrap().raw.earned, 93.0);
    }

    #[test]
    fn test_wide_spread_earns_partial_points() {
        let mut snapshot = good_snapshot();
        if let Some(contract) = snapshot.contract.as_mut() {
            contract.bid = Some(0.92);
            contract.ask = Some(1.08);
        }
        let outcome = evaluate(&metrics_with(snapshot));
        // 16% spread: over the 10% limit, inside twice the limit
        assert_eq!(outcome.criteria().get("spread"), Some(CriterionOutcome::Fail));
        assert_eq!(outcome.as_scored().unwrap().raw.earned, 81.0);
    }

    #[test]
    fn test_crossed_quote_spread_is_unknown() {
        let mut snapshot = good_snapshot();
        if let Some(contract) = snapshot.contract.as_mut() {
            contract.bid = Some(1.50);
            contract.ask = Some(0.50);
        }
        let outcome = evaluate(&metrics_with(snapshot));
        let result = outcome.as_scored().unwrap();

        assert_eq!(result.criteria.get("spread"), Some(CriterionOutcome::Unknown));
        assert_eq!(result.raw.known_max, 75.0);
        let percentage = result.percentage().unwrap();
        assert!(percentage < 100.0);
        assert!((percentage - 96.25).abs() < 1e-9);
    }

    #[test]
    fn test_mid_falls_back_to_last_trade() {
        let mut snapshot = good_snapshot();
        if let Some(contract) = snapshot.contract.as_mut() {
            contract.bid = Some(0.0);
            contract.ask = None;
            contract.last = Some(2.0);
        }
        let outcome = evaluate(&metrics_with(snapshot));
        let criteria = outcome.criteria();
        assert_eq!(criteria.get("spread"), Some(CriterionOutcome::Unknown));
        // 2.0 / 50.0 = 4% premium
        assert_eq!(criteria.get("premium"), Some(CriterionOutcome::Pass));
    }

    #[test]
    fn test_adjustment_skipped_without_known_buckets() {
        let snapshot = OptionsSnapshot {
            chain_available: true,
            contract: Some(OptionContract::default()),
            underlying_price: None,
            iv_percentile: Some(5.0),
        };
        let outcome = evaluate(&metrics_with(snapshot));
        let result = outcome.as_scored().unwrap();
        assert_eq!(result.raw.earned, 0.0);
        assert!(result.score.is_none());
        assert_eq!(result.coverage.known_count(), 0);
    }
}
