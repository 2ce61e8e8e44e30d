//! Tri-state criterion model.
//!
//! A criterion compares one (possibly missing) metric against a configured
//! threshold and resolves to PASS, FAIL or UNKNOWN. UNKNOWN always means
//! the input was absent; it is never folded into PASS or FAIL.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::coverage::Coverage;

// ============================================================================
// Criterion Outcome
// ============================================================================

/// Outcome of a single criterion check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionOutcome {
    Pass,
    Fail,
    Unknown,
}

impl CriterionOutcome {
    /// Resolve a known boolean.
    pub fn from_bool(passed: bool) -> Self {
        if passed {
            Self::Pass
        } else {
            Self::Fail
        }
    }

    /// Resolve an optional boolean; `None` is UNKNOWN.
    pub fn from_option(passed: Option<bool>) -> Self {
        passed.map_or(Self::Unknown, Self::from_bool)
    }

    /// Three-valued conjunction.
    ///
    /// A known FAIL decides the result even if the other side is unknown.
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Fail, _) | (_, Self::Fail) => Self::Fail,
            (Self::Unknown, _) | (_, Self::Unknown) => Self::Unknown,
            (Self::Pass, Self::Pass) => Self::Pass,
        }
    }

    /// Conjunction over any number of outcomes. Empty input is PASS.
    pub fn all<I: IntoIterator<Item = Self>>(outcomes: I) -> Self {
        outcomes.into_iter().fold(Self::Pass, Self::and)
    }

    pub fn is_pass(self) -> bool {
        self == Self::Pass
    }
}

impl std::fmt::Display for CriterionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ============================================================================
// Threshold
// ============================================================================

/// A configurable comparison applied to one metric. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    AtLeast(f64),
    AtMost(f64),
    Within { min: f64, max: f64 },
}

impl Threshold {
    /// Check a metric; an absent metric is UNKNOWN.
    pub fn check(&self, value: Option<f64>) -> CriterionOutcome {
        match value {
            Some(v) => CriterionOutcome::from_bool(self.contains(v)),
            None => CriterionOutcome::Unknown,
        }
    }

    /// Whether a known value satisfies the threshold.
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Self::AtLeast(min) => value >= min,
            Self::AtMost(max) => value <= max,
            Self::Within { min, max } => value >= min && value <= max,
        }
    }
}

// ============================================================================
// Criteria Set
// ============================================================================

/// Named criterion outcomes recorded by one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaSet {
    outcomes: BTreeMap<String, CriterionOutcome>,
}

impl CriteriaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) a criterion outcome.
    pub fn record(&mut self, name: &str, outcome: CriterionOutcome) -> CriterionOutcome {
        self.outcomes.insert(name.to_string(), outcome);
        outcome
    }

    /// Record every name as UNKNOWN.
    pub fn all_unknown(names: &[&str]) -> Self {
        let mut set = Self::new();
        for name in names {
            set.record(name, CriterionOutcome::Unknown);
        }
        set
    }

    pub fn get(&self, name: &str) -> Option<CriterionOutcome> {
        self.outcomes.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CriterionOutcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Aggregate the recorded outcomes.
    pub fn coverage(&self) -> Coverage {
        Coverage::from_outcomes(self.outcomes.values().copied())
    }
}
