//! Screening orchestrator.
//!
//! Runs the pipeline for each security (fundamental → technical → options →
//! momentum), stopping at the first hard fail or unmet gate, and fans the
//! securities out over a bounded worker pool.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::composite::{
    CompositeAggregator, CompositeInput, CompositeResult, WeightingScheme, SENTIMENT_MAX,
};
use crate::config::ScreeningConfig;
use crate::coverage::{Coverage, GateRequirement};
use crate::criteria::CriteriaSet;
use crate::error::{Result, ScreenerError};
use crate::funnel::{build_funnel, StageFunnel};
use crate::metrics::SecurityMetrics;
use crate::stage::{HardFail, HardFailReason, StageId, StageOutcome};
use crate::stages::{evaluator_for, StageEvaluator};

// ============================================================================
// Screening Record
// ============================================================================

/// Why a security left the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The stage aborted on a structural precondition
    HardFail { reason: HardFailReason },
    /// The stage scored but did not meet its gate
    GateNotMet {
        coverage: Coverage,
        requirement: GateRequirement,
    },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HardFail { reason } => write!(f, "{}", reason),
            Self::GateNotMet {
                coverage,
                requirement,
            } => write!(f, "gate not met: {} (requires {})", coverage, requirement),
        }
    }
}

/// Terminal marker for one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Passed { composite: CompositeResult },
    Failed { stage: StageId, reason: FailureReason },
}

/// Pipeline outcome for one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    /// Stages actually evaluated, in pipeline order
    pub stages: Vec<StageOutcome>,
    pub verdict: Verdict,
}

impl ScreeningRecord {
    fn new(metrics: &SecurityMetrics, stages: Vec<StageOutcome>, verdict: Verdict) -> Self {
        Self {
            symbol: metrics.symbol.clone(),
            name: metrics.name.clone(),
            sector: metrics.sector.clone(),
            stages,
            verdict,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.verdict, Verdict::Passed { .. })
    }

    pub fn composite(&self) -> Option<&CompositeResult> {
        match &self.verdict {
            Verdict::Passed { composite } => Some(composite),
            Verdict::Failed { .. } => None,
        }
    }

    pub fn composite_score(&self) -> Option<f64> {
        self.composite().map(|c| c.score)
    }

    /// The stage and reason that eliminated this security.
    pub fn failure(&self) -> Option<(StageId, &FailureReason)> {
        match &self.verdict {
            Verdict::Passed { .. } => None,
            Verdict::Failed { stage, reason } => Some((*stage, reason)),
        }
    }

    /// Outcome of `stage`, if the pipeline reached it.
    pub fn stage(&self, stage: StageId) -> Option<&StageOutcome> {
        self.stages.iter().find(|outcome| outcome.stage() == stage)
    }
}

/// Sort passing records by composite score (descending), ties by symbol.
pub fn rank(records: &mut [ScreeningRecord]) {
    records.sort_by(|a, b| {
        let a_score = a.composite_score().unwrap_or(f64::NEG_INFINITY);
        let b_score = b.composite_score().unwrap_or(f64::NEG_INFINITY);
        b_score
            .total_cmp(&a_score)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

// ============================================================================
// Screening Run
// ============================================================================

/// Result of screening a universe of securities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningRun {
    /// Run ID (timestamp-based)
    pub id: String,
    /// Securities that passed every stage, best first
    pub ranked: Vec<ScreeningRecord>,
    /// Securities eliminated along the way, by symbol
    pub rejected: Vec<ScreeningRecord>,
    /// Per-stage elimination counts
    pub funnel: Vec<StageFunnel>,
    pub total_screened: usize,
    pub scheme: WeightingScheme,
    /// Thresholds used
    pub config_summary: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_secs: f64,
}

impl ScreeningRun {
    /// The best `n` securities.
    pub fn top(&self, n: usize) -> &[ScreeningRecord] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    /// Summary string for logging.
    pub fn summary(&self) -> String {
        format!(
            "Screened {} securities in {:.1}s: {} passed ({:.1}%)",
            self.total_screened,
            self.duration_secs,
            self.ranked.len(),
            if self.total_screened > 0 {
                (self.ranked.len() as f64 / self.total_screened as f64) * 100.0
            } else {
                0.0
            }
        )
    }
}

// ============================================================================
// Screener
// ============================================================================

/// Runs the screening pipeline.
///
/// Holds only the configuration; evaluators are built per stage call.
pub struct Screener {
    config: ScreeningConfig,
}

impl Screener {
    pub fn new(config: ScreeningConfig) -> Self {
        Self { config }
    }

    /// Create with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(ScreeningConfig::default())
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    pub fn scheme(&self) -> WeightingScheme {
        if self.config.sentiment_weighting {
            WeightingScheme::SentimentAware
        } else {
            WeightingScheme::Standard
        }
    }

    /// Run the pipeline for one security.
    ///
    /// Stages after the first failure are never evaluated.
    pub fn screen_security(&self, metrics: &SecurityMetrics) -> ScreeningRecord {
        let mut stages = Vec::with_capacity(StageId::PIPELINE.len());

        for stage in StageId::PIPELINE {
            let evaluator = evaluator_for(stage, &self.config);
            let outcome = run_guarded(evaluator.as_ref(), metrics);

            let failure = match &outcome {
                StageOutcome::HardFail(fail) => Some(FailureReason::HardFail {
                    reason: fail.reason.clone(),
                }),
                StageOutcome::Scored(result) => evaluator
                    .gate()
                    .filter(|gate| !gate.is_met(&result.coverage))
                    .map(|requirement| FailureReason::GateNotMet {
                        coverage: result.coverage,
                        requirement,
                    }),
            };
            stages.push(outcome);

            if let Some(reason) = failure {
                debug!(symbol = %metrics.symbol, %stage, %reason, "Security eliminated");
                return ScreeningRecord::new(metrics, stages, Verdict::Failed { stage, reason });
            }
        }

        let composite = self.composite(metrics, &stages);
        debug!(symbol = %metrics.symbol, score = composite.score, "Security passed all stages");
        ScreeningRecord::new(metrics, stages, Verdict::Passed { composite })
    }

    fn composite(&self, metrics: &SecurityMetrics, stages: &[StageOutcome]) -> CompositeResult {
        let mut input = CompositeInput {
            sentiment: metrics
                .sentiment
                .filter(|s| s.is_finite())
                .map(|s| s.clamp(0.0, SENTIMENT_MAX)),
            ..CompositeInput::default()
        };
        for outcome in stages {
            input.set_stage(outcome.stage(), outcome.points());
        }
        CompositeAggregator::new(&self.config.weights).aggregate(&input, self.scheme())
    }

    /// Screen a universe on a pool of `workers` threads and rank the result.
    pub fn screen_all(&self, securities: &[SecurityMetrics]) -> Result<ScreeningRun> {
        let started_at = Utc::now();
        let id = format!("screen_{}", started_at.format("%Y%m%d_%H%M%S"));

        info!(
            run_id = %id,
            securities = securities.len(),
            workers = self.config.workers,
            scheme = %self.scheme(),
            "Starting screening run"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("zero-screener-{}", i))
            .build()?;

        let records: Vec<ScreeningRecord> = pool.install(|| {
            securities
                .par_iter()
                .map(|metrics| self.screen_security(metrics))
                .collect()
        });

        let funnel = build_funnel(&records);
        let (mut ranked, mut rejected): (Vec<_>, Vec<_>) =
            records.into_iter().partition(ScreeningRecord::is_passed);
        rank(&mut ranked);
        rejected.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let completed_at = Utc::now();
        let duration_secs = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

        let run = ScreeningRun {
            id,
            ranked,
            rejected,
            funnel,
            total_screened: securities.len(),
            scheme: self.scheme(),
            config_summary: self.config.summary(),
            started_at,
            completed_at,
            duration_secs,
        };

        info!(
            run_id = %run.id,
            passed = run.ranked.len(),
            rejected = run.rejected.len(),
            duration = format!("{:.1}s", duration_secs),
            "Screening run complete"
        );

        Ok(run)
    }
}

// ============================================================================
// Stage Boundary
// ============================================================================

/// Evaluate one stage, turning errors and panics into a hard fail.
pub(crate) fn run_guarded(evaluator: &dyn StageEvaluator, metrics: &SecurityMetrics) -> StageOutcome {
    let stage = evaluator.stage();
    let error = match panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(metrics))) {
        Ok(Ok(outcome)) => return outcome,
        Ok(Err(err)) => err,
        Err(payload) => ScreenerError::Computation {
            stage,
            message: panic_message(payload.as_ref()),
        },
    };

    warn!(symbol = %metrics.symbol, %stage, error = %error, "Stage computation failed");
    StageOutcome::HardFail(HardFail::new(
        stage,
        HardFailReason::ComputationFailed(error.to_string()),
        CriteriaSet::new(),
    ))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
