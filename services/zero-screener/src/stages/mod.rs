//! Stage evaluators.
//!
//! Each evaluator is a plain struct borrowing its thresholds from a
//! [`ScreeningConfig`], built per call and dropped afterwards. Evaluation is
//! pure: the same metrics always produce the same outcome.

pub mod fundamental;
pub mod momentum;
pub mod options;
pub mod technical;

pub use fundamental::FundamentalStage;
pub use momentum::MomentumStage;
pub use options::OptionsStage;
pub use technical::TechnicalStage;

use crate::config::ScreeningConfig;
use crate::coverage::GateRequirement;
use crate::error::Result;
use crate::metrics::SecurityMetrics;
use crate::stage::{StageId, StageOutcome};

/// A single pipeline stage.
pub trait StageEvaluator: Send + Sync {
    /// Which stage this is.
    fn stage(&self) -> StageId;

    /// Gate applied to a scored outcome, `None` for ungated stages.
    fn gate(&self) -> Option<GateRequirement>;

    /// Evaluate one security.
    ///
    /// Missing metrics become UNKNOWN criteria; structural problems become a
    /// hard fail. `Err` is reserved for malformed input such as NaN values.
    fn evaluate(&self, metrics: &SecurityMetrics) -> Result<StageOutcome>;
}

/// Build the evaluator for `stage` from the run configuration.
pub fn evaluator_for(stage: StageId, config: &ScreeningConfig) -> Box<dyn StageEvaluator + '_> {
    match stage {
        StageId::Fundamental => Box::new(FundamentalStage::from_config(config)),
        StageId::Technical => Box::new(TechnicalStage::from_config(config)),
        StageId::Options => Box::new(OptionsStage::from_config(config)),
        StageId::Momentum => Box::new(MomentumStage::from_config(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluator_for_each_stage() {
        let config = ScreeningConfig::default();
        for stage in StageId::PIPELINE {
            let evaluator = evaluator_for(stage, &config);
            assert_eq!(evaluator.stage(), stage);
            assert_eq!(evaluator.gate().is_some(), stage.is_gated());
        }
    }
}
