//! Funnel statistics: where in the pipeline securities were eliminated.

use serde::{Deserialize, Serialize};

use crate::engine::{ScreeningRecord, Verdict};
use crate::stage::StageId;

/// Counts for one stage of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFunnel {
    pub stage: StageId,
    /// Securities that reached the stage
    pub entered: usize,
    /// Securities that continued past it
    pub passed: usize,
    /// Securities eliminated at it
    pub eliminated: usize,
    /// Elimination rate (%)
    pub elimination_rate: f64,
}

impl StageFunnel {
    pub fn new(stage: StageId, entered: usize, passed: usize) -> Self {
        let eliminated = entered.saturating_sub(passed);
        let elimination_rate = if entered > 0 {
            (eliminated as f64 / entered as f64) * 100.0
        } else {
            0.0
        };

        Self {
            stage,
            entered,
            passed: passed.min(entered),
            eliminated,
            elimination_rate,
        }
    }
}

/// Build the per-stage funnel, in pipeline order, from finished records.
pub fn build_funnel(records: &[ScreeningRecord]) -> Vec<StageFunnel> {
    StageId::PIPELINE
        .iter()
        .map(|&stage| {
            let entered = records.iter().filter(|r| r.stage(stage).is_some()).count();
            let eliminated = records
                .iter()
                .filter(|r| matches!(&r.verdict, Verdict::Failed { stage: s, .. } if *s == stage))
                .count();
            StageFunnel::new(stage, entered, entered.saturating_sub(eliminated))
        })
        .collect()
}
