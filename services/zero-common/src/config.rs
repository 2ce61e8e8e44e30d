//! Configuration management for Zero services.
//!
//! Zero services share one configuration directory at `~/.codecoder/`.
//! `config.json` holds the core settings and `screener.json` (if present)
//! is deep-merged into the `screener` section.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (ZERO_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `ZERO_LOG_LEVEL` → observability.log_level
//! - `ZERO_LOG_FORMAT` → observability.log_format
//! - `ZERO_SCREENER_WORKERS` → screener.workers
//! - `ZERO_SCREENER_REPORT_DIR` → screener.report_dir

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config_loader::load_modular_config;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new()
        .map_or_else(
            || PathBuf::from(".codecoder"),
            |dirs| dirs.home_dir().join(".codecoder"),
        )
}

/// Root configuration structure for Zero services.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON Schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Screener service configuration
    #[serde(default)]
    pub screener: ScreenerServiceConfig,
}

impl Config {
    /// Load configuration from the default directory.
    pub fn load() -> Result<Self> {
        Self::load_from_dir(&config_dir())
    }

    /// Load configuration from a specific directory.
    ///
    /// Missing files fall back to defaults.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let value = load_modular_config(Some(dir.to_path_buf()))?;
        if value.as_object().map_or(true, |obj| obj.is_empty()) {
            tracing::info!(dir = %dir.display(), "Config files not found, using defaults");
        }

        serde_json::from_value(value)
            .with_context(|| format!("Failed to parse config from {}", dir.display()))
    }

    /// Load configuration with environment variable overrides applied.
    pub fn load_with_env(dir: Option<&Path>) -> Result<Self> {
        let mut config = match dir {
            Some(dir) => Self::load_from_dir(dir)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Unparseable values are ignored and logged.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("ZERO_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("ZERO_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(workers) = lookup("ZERO_SCREENER_WORKERS") {
            match workers.parse() {
                Ok(n) => self.screener.workers = n,
                Err(_) => tracing::warn!(value = %workers, "Ignoring invalid ZERO_SCREENER_WORKERS"),
            }
        }
        if let Some(dir) = lookup("ZERO_SCREENER_REPORT_DIR") {
            self.screener.report_dir = dir;
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Additional module targets to set to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

// ============================================================================
// Screener Service Configuration
// ============================================================================

/// Run-level settings for the screener service.
///
/// Stage thresholds live in `thresholds` as free-form JSON and are parsed
/// by the screener crate itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerServiceConfig {
    /// Size of the evaluation worker pool
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Use the five-component weighting that includes sentiment
    #[serde(default)]
    pub sentiment_weighting: bool,

    /// Directory for saved reports (supports `~`)
    #[serde(default = "default_report_dir")]
    pub report_dir: String,

    /// Report formats to write
    #[serde(default = "default_report_formats")]
    pub report_formats: Vec<String>,

    /// Maximum number of ranked securities to include in reports
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Stage thresholds, gates and composite weights
    #[serde(default)]
    pub thresholds: serde_json::Value,
}

impl Default for ScreenerServiceConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            sentiment_weighting: false,
            report_dir: default_report_dir(),
            report_formats: default_report_formats(),
            top_n: default_top_n(),
            thresholds: serde_json::Value::Null,
        }
    }
}

impl ScreenerServiceConfig {
    /// Report directory with `~` and environment variables expanded.
    pub fn report_dir_path(&self) -> PathBuf {
        match shellexpand::full(&self.report_dir) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => PathBuf::from(shellexpand::tilde(&self.report_dir).as_ref()),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
fn default_workers() -> usize {
    4
}
fn default_report_dir() -> String {
    "~/.codecoder/reports/screener".into()
}
fn default_report_formats() -> Vec<String> {
    vec!["markdown".into(), "json".into()]
}
fn default_top_n() -> usize {
    50
}
