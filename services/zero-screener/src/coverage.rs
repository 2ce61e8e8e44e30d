//! Coverage counts and gate requirements.
//!
//! Coverage records how many of a stage's criteria had usable input and how
//! many of those passed. A gate decides pass/fail from both counts.

use serde::{Deserialize, Serialize};

use crate::criteria::CriterionOutcome;

// ============================================================================
// Coverage
// ============================================================================

/// Pass/known/total counts for one stage.
///
/// Invariant: `pass_count <= known_count <= total_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CoverageCounts", into = "CoverageCounts")]
pub struct Coverage {
    known_count: usize,
    pass_count: usize,
    total_count: usize,
}

/// Serialized form of [`Coverage`], checked on the way back in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CoverageCounts {
    known_count: usize,
    pass_count: usize,
    total_count: usize,
}

impl Coverage {
    /// Build coverage from raw counts, rejecting impossible combinations.
    pub fn new(known_count: usize, pass_count: usize, total_count: usize) -> Result<Self, String> {
        if pass_count > known_count || known_count > total_count {
            return Err(format!(
                "invalid coverage: pass {} / known {} / total {}",
                pass_count, known_count, total_count
            ));
        }
        Ok(Self {
            known_count,
            pass_count,
            total_count,
        })
    }

    /// Aggregate a sequence of outcomes.
    pub fn from_outcomes<I: IntoIterator<Item = CriterionOutcome>>(outcomes: I) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut acc, outcome| {
                acc.total_count += 1;
                match outcome {
                    CriterionOutcome::Pass => {
                        acc.known_count += 1;
                        acc.pass_count += 1;
                    }
                    CriterionOutcome::Fail => acc.known_count += 1,
                    CriterionOutcome::Unknown => {}
                }
                acc
            })
    }

    pub fn known_count(&self) -> usize {
        self.known_count
    }

    pub fn pass_count(&self) -> usize {
        self.pass_count
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn fail_count(&self) -> usize {
        self.known_count - self.pass_count
    }

    pub fn unknown_count(&self) -> usize {
        self.total_count - self.known_count
    }
}

impl TryFrom<CoverageCounts> for Coverage {
    type Error = String;

    fn try_from(counts: CoverageCounts) -> Result<Self, Self::Error> {
        Self::new(counts.known_count, counts.pass_count, counts.total_count)
    }
}

impl From<Coverage> for CoverageCounts {
    fn from(coverage: Coverage) -> Self {
        Self {
            known_count: coverage.known_count,
            pass_count: coverage.pass_count,
            total_count: coverage.total_count,
        }
    }
}

impl std::fmt::Display for Coverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pass / {} known / {} total",
            self.pass_count, self.known_count, self.total_count
        )
    }
}

// ============================================================================
// Gate Requirement
// ============================================================================

/// Minimum pass and known counts a stage must reach to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRequirement {
    pub min_pass: usize,
    pub min_known: usize,
    pub total: usize,
}

impl GateRequirement {
    pub const fn new(min_pass: usize, min_known: usize, total: usize) -> Self {
        Self {
            min_pass,
            min_known,
            total,
        }
    }

    /// A gate passes iff both minimums are met.
    pub fn is_met(&self, coverage: &Coverage) -> bool {
        coverage.pass_count() >= self.min_pass && coverage.known_count() >= self.min_known
    }

    /// Whether the gate can ever pass for a stage of this size.
    pub fn is_satisfiable(&self) -> bool {
        self.min_pass <= self.total && self.min_known <= self.total
    }
}

impl std::fmt::Display for GateRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pass >= {} and known >= {} of {}",
            self.min_pass, self.min_known, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::criteria::CriterionOutcome::{Fail, Pass, Unknown};

    fn outcome_strategy() -> impl Strategy<Value = CriterionOutcome> {
        prop_oneof![Just(Pass), Just(Fail), Just(Unknown)]
    }

    proptest! {
        #[test]
        fn prop_coverage_counts_are_consistent(outcomes in prop::collection::vec(outcome_strategy(), 0..20)) {
            let coverage = Coverage::from_outcomes(outcomes.iter().copied());
            prop_assert_eq!(coverage.known_count() + coverage.unknown_count(), coverage.total_count());
            prop_assert!(coverage.pass_count() <= coverage.known_count());
            prop_assert_eq!(coverage.pass_count() + coverage.fail_count(), coverage.known_count());
            prop_assert_eq!(coverage.total_count(), outcomes.len());
        }
    }

    #[test]
    fn test_checked_constructor() {
        assert!(Coverage::new(3, 2, 5).is_ok());
        assert!(Coverage::new(3, 4, 5).is_err());
        assert!(Coverage::new(6, 2, 5).is_err());
    }

    #[test]
    fn test_deserialize_rejects_invalid_counts() {
        let bad = r#"{"known_count": 2, "pass_count": 3, "total_count": 5}"#;
        assert!(serde_json::from_str::<Coverage>(bad).is_err());

        let good = r#"{"known_count": 3, "pass_count": 2, "total_count": 5}"#;
        let coverage: Coverage = serde_json::from_str(good).unwrap();
        assert_eq!(coverage.unknown_count(), 2);
    }

    #[test]
    fn test_gate_requires_both_counts() {
        let gate = GateRequirement::new(3, 4, 5);

        // enough passes but too little known
        let coverage = Coverage::from_outcomes([Pass, Pass, Pass, Unknown, Unknown]);
        assert!(!gate.is_met(&coverage));

        // enough known but too few passes
        let coverage = Coverage::from_outcomes([Pass, Pass, Fail, Fail, Unknown]);
        assert!(!gate.is_met(&coverage));

        let coverage = Coverage::from_outcomes([Pass, Pass, Pass, Fail, Unknown]);
        assert!(gate.is_met(&coverage));
    }

    #[test]
    fn test_gate_satisfiable() {
        assert!(GateRequirement::new(4, 5, 7).is_satisfiable());
        assert!(!GateRequirement::new(4, 8, 7).is_satisfiable());
    }
}
