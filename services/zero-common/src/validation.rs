//! Configuration validation for Zero services.
//!
//! Provides validation logic for configuration fields to ensure
//! all required values are present and within valid ranges.

use thiserror::Error;

use crate::config::{Config, ObservabilityConfig, ScreenerServiceConfig};

/// Log levels accepted by the logging layer.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration conflict: {reason}")]
    Conflict { reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Shorthand for an `InvalidValue` error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Collapse a list of errors into one result.
    pub fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        if let Err(e) = self.screener.validate() {
            errors.push(e);
        }

        ValidationError::collect(errors)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::invalid(
                "observability.log_level",
                format!("must be one of {}", LOG_LEVELS.join(", ")),
            ));
        }

        if self.log_format != "json" && self.log_format != "pretty" {
            return Err(ValidationError::invalid(
                "observability.log_format",
                "must be \"json\" or \"pretty\"",
            ));
        }

        Ok(())
    }
}

impl Validate for ScreenerServiceConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.workers == 0 {
            errors.push(ValidationError::invalid(
                "screener.workers",
                "must be greater than 0",
            ));
        }

        if self.report_dir.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "screener.report_dir".into(),
            });
        }

        if !self.thresholds.is_null() && !self.thresholds.is_object() {
            errors.push(ValidationError::invalid(
                "screener.thresholds",
                "must be a JSON object",
            ));
        }

        ValidationError::collect(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default();
        config.screener.workers = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("screener.workers"));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = ObservabilityConfig::default();
        config.log_level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut config = Config::default();
        config.screener.workers = 0;
        config.screener.thresholds = serde_json::json!([1, 2]);

        match config.validate() {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {:?}", other),
        }
    }
}
