//! Error types for the screener.

use thiserror::Error;

use crate::stage::StageId;

/// Result type alias using the screener error type.
pub type Result<T> = std::result::Result<T, ScreenerError>;

/// Errors raised while configuring or running a screen.
///
/// Stage-level errors never escape the orchestrator: they are converted
/// into a `computation_failed` hard fail for the affected security.
#[derive(Error, Debug)]
pub enum ScreenerError {
    /// A metric was supplied but is NaN or infinite
    #[error("Non-finite value for {field}: {value}")]
    NonFiniteMetric { field: &'static str, value: f64 },

    /// Evaluation failed inside a stage
    #[error("{stage} stage computation failed: {message}")]
    Computation { stage: StageId, message: String },

    /// Screening configuration is invalid
    #[error("Invalid screening configuration: {0}")]
    Config(#[from] zero_common::ValidationError),

    /// Screening configuration could not be parsed
    #[error("Failed to parse screening configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The evaluation worker pool could not be built
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Reject NaN/infinite metric values, passing absent values through.
pub(crate) fn finite(field: &'static str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Err(ScreenerError::NonFiniteMetric { field, value: v }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_passes_absent_and_finite() {
        assert_eq!(finite("price", None).unwrap(), None);
        assert_eq!(finite("price", Some(12.5)).unwrap(), Some(12.5));
    }

    #[test]
    fn test_finite_rejects_nan() {
        let err = finite("price", Some(f64::NAN)).unwrap_err();
        assert!(matches!(err, ScreenerError::NonFiniteMetric { field: "price", .. }));
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_computation_error_display() {
        let err = ScreenerError::Computation {
            stage: StageId::Options,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "options stage computation failed: boom");
    }
}
