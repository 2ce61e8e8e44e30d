//! Zero Screener - screens pre-fetched security metrics and prints a ranked report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use zero_common::config::Config;
use zero_common::logging::init_logging_with_exclusions;
use zero_screener::{ReportFormat, Screener, ScreeningConfig, ScreeningReport, SecurityMetrics};

/// Multi-stage security screener with coverage-adjusted scoring.
#[derive(Parser, Debug)]
#[command(name = "zero-screener")]
#[command(author = "theonlyhennygod")]
#[command(version)]
#[command(about = "Screen securities and rank the survivors by composite score", long_about = None)]
struct Cli {
    /// JSON file holding an array of per-security metrics
    input: PathBuf,

    /// Directory with config.json / screener.json (default: ~/.codecoder)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Report format printed to stdout
    #[arg(long, default_value = "markdown")]
    format: ReportFormat,

    /// Also write the report to this path (extension added when missing)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Use the sentiment-aware weighting
    #[arg(long)]
    sentiment: bool,

    /// Worker threads (overrides configuration)
    #[arg(long)]
    workers: Option<usize>,

    /// Save every configured report format under the report directory
    #[arg(long)]
    save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load_with_env(cli.config_dir.as_deref())?;
    if let Some(workers) = cli.workers {
        config.screener.workers = workers;
    }
    if cli.sentiment {
        config.screener.sentiment_weighting = true;
    }
    config.validate().context("Invalid configuration")?;

    // Initialize logging
    init_logging_with_exclusions(
        &config.observability.log_level,
        &config.observability.log_format,
        &config.observability.excluded_targets,
    );

    info!("Zero Screener v{}", env!("CARGO_PKG_VERSION"));

    let screening = ScreeningConfig::from_config(&config).context("Invalid screening thresholds")?;

    let content = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("Failed to read metrics from {}", cli.input.display()))?;
    let securities: Vec<SecurityMetrics> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse metrics from {}", cli.input.display()))?;

    // CPU-bound pool runs off the async runtime
    let screener = Screener::new(screening);
    let run = tokio::task::spawn_blocking(move || screener.screen_all(&securities))
        .await
        .context("Screening task failed")??;

    info!("{}", run.summary());

    let report = ScreeningReport::new(run).with_top_n(config.screener.top_n);
    println!("{}", report.generate(cli.format));

    if let Some(path) = &cli.output {
        let saved = report.save_to_file(path, cli.format)?;
        info!(path = %saved.display(), "Report saved");
    }

    if cli.save {
        let base = config.screener.report_dir_path().join(&report.run().id);
        for name in &config.screener.report_formats {
            let format: ReportFormat = name.parse().map_err(anyhow::Error::msg)?;
            let saved = report.save_to_file(&base, format)?;
            info!(path = %saved.display(), %format, "Report saved");
        }
    }

    Ok(())
}
