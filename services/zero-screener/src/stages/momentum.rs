//! Momentum stage. Ungated: it only feeds the composite.

use tracing::debug;

use crate::config::{HorizonThresholds, MomentumThresholds, ScreeningConfig};
use crate::coverage::GateRequirement;
use crate::criteria::{CriteriaSet, Threshold};
use crate::error::{finite, Result};
use crate::metrics::SecurityMetrics;
use crate::scoring::{banded, ScoreCard};
use crate::stage::{StageId, StageOutcome, StageResult};

use super::StageEvaluator;

pub const CRITERIA: [&str; 3] = ["return_1m", "return_3m", "return_6m"];

/// Momentum stage evaluator.
pub struct MomentumStage<'a> {
    thresholds: &'a MomentumThresholds,
}

impl<'a> MomentumStage<'a> {
    pub fn new(thresholds: &'a MomentumThresholds) -> Self {
        Self { thresholds }
    }

    pub fn from_config(config: &'a ScreeningConfig) -> Self {
        Self::new(&config.momentum)
    }
}

fn horizon_points(ret: f64, horizon: &HorizonThresholds, max: f64) -> f64 {
    banded(&[
        (ret >= horizon.strong_return, max),
        (ret >= horizon.moderate_return, max * 2.0 / 3.0),
        (ret > 0.0, max / 3.0),
    ])
}

impl StageEvaluator for MomentumStage<'_> {
    fn stage(&self) -> StageId {
        StageId::Momentum
    }

    fn gate(&self) -> Option<GateRequirement> {
        None
    }

    fn evaluate(&self, metrics: &SecurityMetrics) -> Result<StageOutcome> {
        let m = &metrics.momentum;
        let t = self.thresholds;

        let horizons = [
            ("return_1m", finite("return_1m", m.return_1m)?, &t.one_month, 30.0),
            ("return_3m", finite("return_3m", m.return_3m)?, &t.three_month, 35.0),
            ("return_6m", finite("return_6m", m.return_6m)?, &t.six_month, 35.0),
        ];

        let mut criteria = CriteriaSet::new();
        let mut card = ScoreCard::new();
        let mut drawdowns = 0usize;

        for (name, ret, horizon, max) in horizons {
            criteria.record(name, Threshold::AtLeast(horizon.min_return).check(ret));
            card.add(max, ret.map(|r| horizon_points(r, horizon, max)));

            if ret.is_some_and(|r| r <= horizon.severe_drawdown) {
                card.adjust(-t.drawdown_penalty);
                drawdowns += 1;
            }
        }

        let ceiling = card.known_max();
        card.clamp_earned(0.0, ceiling);

        let (raw, score) = card.finish();
        let result = StageResult::new(StageId::Momentum, criteria, raw, score);

        debug!(
            symbol = %metrics.symbol,
            drawdowns,
            percentage = ?result.percentage(),
            "Momentum stage evaluated"
        );

        Ok(StageOutcome::Scored(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::CriterionOutcome;
    use crate::metrics::MomentumMetrics;

    fn evaluate(momentum: MomentumMetrics) -> StageResult {
        let config = ScreeningConfig::default();
        let mut metrics = SecurityMetrics::new("MOMO");
        metrics.momentum = momentum;
        match MomentumStage::from_config(&config).evaluate(&metrics).unwrap() {
            StageOutcome::Scored(result) => result,
            StageOutcome::HardFail(fail) => panic!("unexpected hard fail: {}", fail.reason),
        }
    }

    #[test]
    fn test_single_drawdown_clamps_to_zero() {
        let result = evaluate(MomentumMetrics {
            return_1m: Some(-0.12),
            ..MomentumMetrics::default()
        });

        assert_eq!(result.raw.earned, 0.0);
        assert_eq!(result.raw.known_max, 30.0);
        assert_eq!(result.percentage(), Some(0.0));
        assert_eq!(result.criteria.get("return_1m"), Some(CriterionOutcome::Fail));
        assert_eq!(result.criteria.get("return_6m"), Some(CriterionOutcome::Unknown));
    }

    #[test]
    fn test_strong_returns_score_full() {
        let result = evaluate(MomentumMetrics {
            return_1m: Some(0.12),
            return_3m: Some(0.25),
            return_6m: Some(0.40),
        });
        assert_eq!(result.percentage(), Some(100.0));
        assert_eq!(result.coverage.pass_count(), 3);
    }

    #[test]
    fn test_penalty_offsets_other_horizons() {
        // 6m strong (35), 1m severe drawdown (0 - 10)
        let result = evaluate(MomentumMetrics {
            return_1m: Some(-0.15),
            return_3m: None,
            return_6m: Some(0.35),
        });
        assert_eq!(result.raw.earned, 25.0);
        assert_eq!(result.raw.known_max, 65.0);
    }

    #[test]
    fn test_penalties_combine() {
        let result = evaluate(MomentumMetrics {
            return_1m: Some(-0.20),
            return_3m: Some(-0.25),
            return_6m: Some(0.35),
        });
        // 35 - 10 - 10
        assert_eq!(result.raw.earned, 15.0);
    }

    #[test]
    fn test_moderate_and_small_bands() {
        let result = evaluate(MomentumMetrics {
            return_1m: Some(0.06),
            return_3m: Some(0.01),
            return_6m: None,
        });
        // 20 + 35/3
        assert!((result.raw.earned - (20.0 + 35.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_no_returns_has_no_score() {
        let result = evaluate(MomentumMetrics::default());
        assert!(result.score.is_none());
        assert_eq!(result.coverage.total_count(), 3);
    }
}
