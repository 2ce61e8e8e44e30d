//! Coverage-adjusted scoring.
//!
//! A stage earns points only from criteria whose inputs are present. The
//! raw percentage over those known points is then discounted by at most 15%
//! according to how much of the stage's full budget was observable, so
//! partial data stays informative without outranking complete data of the
//! same quality.
//!
//! ```text
//! raw_pct    = earned / known_max * 100
//! coverage   = known_max / total_max
//! percentage = clamp(0, 100, raw_pct * (0.85 + 0.15 * coverage))
//! points     = percentage / 100 * total_max
//! ```

use serde::{Deserialize, Serialize};

/// Multiplier applied at zero coverage.
pub const COVERAGE_FLOOR: f64 = 0.85;

/// Score of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageScore {
    /// Coverage-adjusted percentage (0-100), comparable across stages
    pub percentage: f64,
    /// Absolute points on the stage's own maximum
    pub points: f64,
    /// Percentage over known criteria only, before the coverage discount
    pub raw_percentage: f64,
}

/// Raw point totals behind a stage score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPoints {
    pub earned: f64,
    pub known_max: f64,
    pub total_max: f64,
}

/// Apply the coverage adjustment.
///
/// Returns `None` when nothing was known (`known_max == 0`): absent data
/// must not present as a zero score.
pub fn coverage_adjusted_score(earned: f64, known_max: f64, total_max: f64) -> Option<StageScore> {
    if known_max <= 0.0 || total_max <= 0.0 {
        return None;
    }

    let earned = earned.clamp(0.0, known_max);
    let raw_percentage = earned / known_max * 100.0;
    let coverage = (known_max / total_max).clamp(0.0, 1.0);
    let multiplier = COVERAGE_FLOOR + (1.0 - COVERAGE_FLOOR) * coverage;
    let percentage = (raw_percentage * multiplier).clamp(0.0, 100.0);

    Some(StageScore {
        percentage,
        points: percentage / 100.0 * total_max,
        raw_percentage,
    })
}

/// Accumulates scoring buckets for one stage.
///
/// Every bucket counts toward `total_max`; only buckets whose inputs are
/// present count toward `known_max` and `earned`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreCard {
    earned: f64,
    known_max: f64,
    total_max: f64,
}

impl ScoreCard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bucket. `points` is `None` when the bucket's inputs are missing.
    pub fn add(&mut self, bucket_max: f64, points: Option<f64>) -> &mut Self {
        self.total_max += bucket_max;
        if let Some(p) = points {
            self.known_max += bucket_max;
            self.earned += p.clamp(0.0, bucket_max);
        }
        self
    }

    /// Add signed points outside any bucket (penalties, external signals).
    pub fn adjust(&mut self, delta: f64) -> &mut Self {
        self.earned += delta;
        self
    }

    /// Clamp earned points into `[floor, ceiling]`.
    pub fn clamp_earned(&mut self, floor: f64, ceiling: f64) -> &mut Self {
        self.earned = self.earned.clamp(floor, ceiling.max(floor));
        self
    }

    pub fn earned(&self) -> f64 {
        self.earned
    }

    pub fn known_max(&self) -> f64 {
        self.known_max
    }

    pub fn total_max(&self) -> f64 {
        self.total_max
    }

    /// Finalize into raw totals and the coverage-adjusted score.
    pub fn finish(&self) -> (RawPoints, Option<StageScore>) {
        let raw = RawPoints {
            earned: self.earned,
            known_max: self.known_max,
            total_max: self.total_max,
        };
        (raw, coverage_adjusted_score(self.earned, self.known_max, self.total_max))
    }
}

/// Pick the points of the first band whose predicate holds, else zero.
///
/// Bands are checked in order, so list them from best to worst.
pub(crate) fn banded(bands: &[(bool, f64)]) -> f64 {
    bands
        .iter()
        .find(|(hit, _)| *hit)
        .map_or(0.0, |(_, points)| *points)
}
