//! Stage identifiers and per-stage results.
//!
//! A stage either produces a scored result (possibly with every criterion
//! UNKNOWN and no score) or hard-fails on a structural precondition. The
//! two are separate variants so a caller cannot read a score off a stage
//! that aborted.

use serde::{Deserialize, Serialize};

use crate::coverage::Coverage;
use crate::criteria::CriteriaSet;
use crate::scoring::{RawPoints, StageScore};

// ============================================================================
// Stage Id
// ============================================================================

/// Pipeline stages, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Fundamental,
    Technical,
    Options,
    Momentum,
}

impl StageId {
    /// Gated stages first, momentum last.
    pub const PIPELINE: [StageId; 4] = [
        StageId::Fundamental,
        StageId::Technical,
        StageId::Options,
        StageId::Momentum,
    ];

    /// Maximum absolute points the stage can award.
    pub fn max_points(self) -> f64 {
        match self {
            Self::Fundamental => 100.0,
            Self::Technical => 80.0,
            Self::Options => 100.0,
            Self::Momentum => 100.0,
        }
    }

    /// Whether a gate decision follows this stage.
    pub fn is_gated(self) -> bool {
        !matches!(self, Self::Momentum)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fundamental => "fundamental",
            Self::Technical => "technical",
            Self::Options => "options",
            Self::Momentum => "momentum",
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Hard Fail
// ============================================================================

/// Structural reasons a stage aborts without a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum HardFailReason {
    MarketCapGateFailed,
    MarketCapGateUnknown,
    PriceGateFailed,
    PriceGateUnknown,
    InsufficientPriceHistory,
    NoOptionsData,
    NoQualifyingContract,
    ComputationFailed(String),
}

impl HardFailReason {
    /// Stable snake_case code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MarketCapGateFailed => "market_cap_gate_failed",
            Self::MarketCapGateUnknown => "market_cap_gate_unknown",
            Self::PriceGateFailed => "price_gate_failed",
            Self::PriceGateUnknown => "price_gate_unknown",
            Self::InsufficientPriceHistory => "insufficient_price_history",
            Self::NoOptionsData => "no_options_data",
            Self::NoQualifyingContract => "no_qualifying_contract",
            Self::ComputationFailed(_) => "computation_failed",
        }
    }
}

impl std::fmt::Display for HardFailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ComputationFailed(message) => write!(f, "computation_failed: {}", message),
            other => f.write_str(other.code()),
        }
    }
}

/// A stage that aborted on a structural precondition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardFail {
    pub stage: StageId,
    pub reason: HardFailReason,
    /// Criteria recorded before the abort (may be empty)
    pub criteria: CriteriaSet,
    pub coverage: Coverage,
}

impl HardFail {
    pub fn new(stage: StageId, reason: HardFailReason, criteria: CriteriaSet) -> Self {
        let coverage = criteria.coverage();
        Self {
            stage,
            reason,
            criteria,
            coverage,
        }
    }
}

// ============================================================================
// Stage Result
// ============================================================================

/// A fully evaluated stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: StageId,
    pub criteria: CriteriaSet,
    pub coverage: Coverage,
    /// Absent when no scoring input was known
    pub score: Option<StageScore>,
    pub raw: RawPoints,
}

impl StageResult {
    pub fn new(
        stage: StageId,
        criteria: CriteriaSet,
        raw: RawPoints,
        score: Option<StageScore>,
    ) -> Self {
        let coverage = criteria.coverage();
        Self {
            stage,
            criteria,
            coverage,
            score,
            raw,
        }
    }

    pub fn percentage(&self) -> Option<f64> {
        self.score.map(|s| s.percentage)
    }

    pub fn points(&self) -> Option<f64> {
        self.score.map(|s| s.points)
    }
}

/// What a stage evaluator returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Scored(StageResult),
    HardFail(HardFail),
}

impl StageOutcome {
    pub fn stage(&self) -> StageId {
        match self {
            Self::Scored(result) => result.stage,
            Self::HardFail(fail) => fail.stage,
        }
    }

    pub fn criteria(&self) -> &CriteriaSet {
        match self {
            Self::Scored(result) => &result.criteria,
            Self::HardFail(fail) => &fail.criteria,
        }
    }

    pub fn coverage(&self) -> Coverage {
        match self {
            Self::Scored(result) => result.coverage,
            Self::HardFail(fail) => fail.coverage,
        }
    }

    pub fn as_scored(&self) -> Option<&StageResult> {
        match self {
            Self::Scored(result) => Some(result),
            Self::HardFail(_) => None,
        }
    }

    pub fn hard_fail_reason(&self) -> Option<&HardFailReason> {
        match self {
            Self::Scored(_) => None,
            Self::HardFail(fail) => Some(&fail.reason),
        }
    }

    /// Absolute points, if the stage produced a score.
    pub fn points(&self) -> Option<f64> {
        self.as_scored().and_then(StageResult::points)
    }
}
