//! Zero Screener Library
//!
//! Multi-stage security screening with tri-state criteria, coverage-aware
//! gates and a rescaled composite score.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      zero-screener (Rust Library)                    │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  SecurityMetrics ──▶ Fundamental ──▶ Technical ──▶ Options ──▶ Momentum
//! │                       (gate)         (gate)        (gate)     (no gate)
//! │                          │              │             │           │
//! │                          └──── hard fail / gate not met ─▶ rejected
//! │                                                                   │
//! │                                          CompositeAggregator ◀────┘
//! │                                                  │                  │
//! │                                     ranked ScreeningRun ──▶ report  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! ## Criteria
//! - Every check resolves to PASS, FAIL or UNKNOWN
//! - UNKNOWN means the input was absent and is never folded into PASS/FAIL
//!
//! ## Gates
//! - A gated stage continues only if enough criteria passed AND enough were known
//! - Structural problems (no options chain, short price history) hard-fail instead
//!
//! ## Scores
//! - Points come only from buckets with known inputs
//! - Partial coverage discounts the percentage by at most 15%
//! - The composite rescales weighted stage points so a perfect run is exactly 100

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod composite;
pub mod config;
pub mod coverage;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod funnel;
pub mod metrics;
pub mod report;
pub mod scoring;
pub mod stage;
pub mod stages;

pub use composite::{CompositeAggregator, CompositeInput, CompositeResult, WeightingScheme};
pub use config::ScreeningConfig;
pub use coverage::{Coverage, GateRequirement};
pub use criteria::{CriteriaSet, CriterionOutcome, Threshold};
pub use engine::{FailureReason, Screener, ScreeningRecord, ScreeningRun, Verdict};
pub use error::{Result, ScreenerError};
pub use funnel::StageFunnel;
pub use metrics::SecurityMetrics;
pub use report::{ReportFormat, ScreeningReport};
pub use scoring::{coverage_adjusted_score, StageScore};
pub use stage::{HardFail, HardFailReason, StageId, StageOutcome, StageResult};
pub use stages::StageEvaluator;
