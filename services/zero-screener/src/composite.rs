//! Composite score.
//!
//! Stage points live on different maxima (technical tops out at 80), so the
//! weighted sum is rescaled by the best achievable weighted sum:
//!
//! ```text
//! weighted_sum = Σ wᵢ · pointsᵢ        (unavailable ⇒ maxᵢ / 2)
//! weighted_max = Σ wᵢ · maxᵢ
//! composite    = clamp(0, 100, weighted_sum / weighted_max · 100)
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{CompositeWeights, CompositeWeightsConfig};
use crate::stage::StageId;

/// Maximum of the external sentiment signal.
pub const SENTIMENT_MAX: f64 = 100.0;

/// Which set of weights to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingScheme {
    /// Four stage components
    Standard,
    /// Four stage components plus sentiment
    SentimentAware,
}

impl std::fmt::Display for WeightingScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::SentimentAware => write!(f, "sentiment_aware"),
        }
    }
}

/// Absolute points per component; `None` is unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeInput {
    pub fundamental: Option<f64>,
    pub technical: Option<f64>,
    pub options: Option<f64>,
    pub momentum: Option<f64>,
    pub sentiment: Option<f64>,
}

impl CompositeInput {
    /// Points for one pipeline stage.
    pub fn stage(&self, stage: StageId) -> Option<f64> {
        match stage {
            StageId::Fundamental => self.fundamental,
            StageId::Technical => self.technical,
            StageId::Options => self.options,
            StageId::Momentum => self.momentum,
        }
    }

    pub fn set_stage(&mut self, stage: StageId, points: Option<f64>) {
        let slot = match stage {
            StageId::Fundamental => &mut self.fundamental,
            StageId::Technical => &mut self.technical,
            StageId::Options => &mut self.options,
            StageId::Momentum => &mut self.momentum,
        };
        *slot = points;
    }
}

/// Final ranking score for one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    /// Rescaled score (0-100)
    pub score: f64,
    pub scheme: WeightingScheme,
    pub fundamental_available: bool,
    pub technical_available: bool,
    pub options_available: bool,
    pub momentum_available: bool,
    /// Always false under the standard scheme
    pub sentiment_available: bool,
    pub weighted_sum: f64,
    pub weighted_max: f64,
}

/// Combines stage points into one composite score.
pub struct CompositeAggregator<'a> {
    weights: &'a CompositeWeightsConfig,
}

impl<'a> CompositeAggregator<'a> {
    pub fn new(weights: &'a CompositeWeightsConfig) -> Self {
        Self { weights }
    }

    fn weights_for(&self, scheme: WeightingScheme) -> &CompositeWeights {
        match scheme {
            WeightingScheme::Standard => &self.weights.standard,
            WeightingScheme::SentimentAware => &self.weights.with_sentiment,
        }
    }

    /// Aggregate under `scheme`.
    ///
    /// The sentiment-aware scheme keeps its weights when sentiment is
    /// missing and treats it as an unavailable component.
    pub fn aggregate(&self, input: &CompositeInput, scheme: WeightingScheme) -> CompositeResult {
        let w = self.weights_for(scheme);

        let mut components = vec![
            (w.fundamental, StageId::Fundamental.max_points(), input.fundamental),
            (w.technical, StageId::Technical.max_points(), input.technical),
            (w.options, StageId::Options.max_points(), input.options),
            (w.momentum, StageId::Momentum.max_points(), input.momentum),
        ];
        if scheme == WeightingScheme::SentimentAware {
            components.push((w.sentiment, SENTIMENT_MAX, input.sentiment));
        }

        let (weighted_sum, weighted_max) = components.iter().fold(
            (0.0, 0.0),
            |(sum, max), &(weight, stage_max, points)| {
                // scale-aware neutral for a missing component
                let points = points.map_or(stage_max / 2.0, |p| p.clamp(0.0, stage_max));
                (sum + weight * points, max + weight * stage_max)
            },
        );

        let score = if weighted_max > 0.0 {
            (weighted_sum / weighted_max * 100.0).clamp(0.0, 100.0)
        } else {
            50.0
        };

        CompositeResult {
            score,
            scheme,
            fundamental_available: input.fundamental.is_some(),
            technical_available: input.technical.is_some(),
            options_available: input.options.is_some(),
            momentum_available: input.momentum.is_some(),
            sentiment_available: scheme == WeightingScheme::SentimentAware
                && input.sentiment.is_some(),
            weighted_sum,
            weighted_max,
        }
    }
}
