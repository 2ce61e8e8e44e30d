//! Report generation for screening runs.
//!
//! Generates reports in two formats:
//! - Markdown (for humans)
//! - JSON (for programmatic use)

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::{ScreeningRecord, ScreeningRun};
use crate::stage::StageId;

/// Default number of ranked rows in the Markdown table.
pub const DEFAULT_TOP_N: usize = 50;

// ============================================================================
// Report Format
// ============================================================================

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown format (human-readable)
    Markdown,
    /// JSON format (machine-readable)
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

// ============================================================================
// Screening Report
// ============================================================================

/// Report generator for a screening run.
pub struct ScreeningReport {
    run: ScreeningRun,
    top_n: usize,
}

impl ScreeningReport {
    pub fn new(run: ScreeningRun) -> Self {
        Self {
            run,
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Limit the ranked table to the best `top_n` rows.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Generate report in the specified format.
    pub fn generate(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Markdown => self.to_markdown(),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Save report to file, adding the format's extension when missing.
    pub fn save_to_file(&self, path: &Path, format: ReportFormat) -> Result<PathBuf> {
        let content = self.generate(format);

        let file_path = if path.extension().is_none() {
            path.with_extension(format.extension())
        } else {
            path.to_path_buf()
        };

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
        }

        std::fs::write(&file_path, content)
            .with_context(|| format!("Failed to write report file {}", file_path.display()))?;

        Ok(file_path)
    }

    /// Generate markdown report.
    pub fn to_markdown(&self) -> String {
        let run = &self.run;
        let mut md = String::new();

        md.push_str(&format!(
            "# Screening Report\n\n**Run ID**: {}\n**Completed**: {}\n**Duration**: {:.1}s\n**Weighting**: {}\n\n",
            run.id,
            run.completed_at.format("%Y-%m-%d %H:%M:%S"),
            run.duration_secs,
            run.scheme
        ));

        // Summary
        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Screened**: {}\n", run.total_screened));
        md.push_str(&format!("- **Passed**: {}\n", run.ranked.len()));
        md.push_str(&format!("- **Rejected**: {}\n", run.rejected.len()));
        md.push_str(&format!("- **Thresholds**: {}\n\n", run.config_summary));

        // Funnel
        md.push_str("### Funnel\n\n");
        md.push_str("| Stage | Entered | Passed | Eliminated | Rate |\n");
        md.push_str("|-------|---------|--------|------------|------|\n");
        for stage in &run.funnel {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {:.1}% |\n",
                stage.stage, stage.entered, stage.passed, stage.eliminated, stage.elimination_rate
            ));
        }
        md.push('\n');

        // Ranked
        md.push_str("## Ranked\n\n");
        if run.ranked.is_empty() {
            md.push_str("_No security passed every stage._\n\n");
        } else {
            md.push_str("| # | Symbol | Name | Sector | Composite | Fundamental | Technical | Options | Momentum |\n");
            md.push_str("|---|--------|------|--------|-----------|-------------|-----------|---------|----------|\n");
            for (i, record) in run.top(self.top_n).iter().enumerate() {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {:.1} | {} | {} | {} | {} |\n",
                    i + 1,
                    record.symbol,
                    record.name.as_deref().unwrap_or("-"),
                    record.sector.as_deref().unwrap_or("-"),
                    record.composite_score().unwrap_or(0.0),
                    stage_percentage(record, StageId::Fundamental),
                    stage_percentage(record, StageId::Technical),
                    stage_percentage(record, StageId::Options),
                    stage_percentage(record, StageId::Momentum),
                ));
            }
            md.push('\n');
        }

        // Rejected
        if !run.rejected.is_empty() {
            md.push_str("## Rejected\n\n");
            md.push_str("| Symbol | Stage | Reason |\n");
            md.push_str("|--------|-------|--------|\n");
            for record in &run.rejected {
                if let Some((stage, reason)) = record.failure() {
                    md.push_str(&format!("| {} | {} | {} |\n", record.symbol, stage, reason));
                }
            }
            md.push('\n');
        }

        md.push_str("---\n\n");
        md.push_str(&format!(
            "*Report generated at {} UTC*\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        ));

        md
    }

    /// Generate JSON report.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.run).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the underlying run.
    pub fn run(&self) -> &ScreeningRun {
        &self.run
    }
}

/// Stage percentage as a table cell; `-` when not reached or unscored.
fn stage_percentage(record: &ScreeningRecord, stage: StageId) -> String {
    record
        .stage(stage)
        .and_then(|outcome| outcome.as_scored())
        .and_then(|result| result.percentage())
        .map_or_else(|| "-".to_string(), |pct| format!("{:.1}", pct))
}

// ============================================================================
// Tests
// ============================================================================
