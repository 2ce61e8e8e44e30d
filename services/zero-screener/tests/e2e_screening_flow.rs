//! End-to-end integration tests for the screening pipeline.
//!
//! Tests the complete flow:
//! Metrics → Stage evaluation → Gates → Composite → Ranked run → Report
//!
//! These tests use synthetic metrics shaped like real provider output.

use zero_screener::metrics::{
    FundamentalMetrics, MomentumMetrics, OptionContract, OptionsSnapshot, TechnicalMetrics,
};
use zero_screener::{
    FailureReason, HardFailReason, ReportFormat, Screener, ScreeningConfig, ScreeningReport,
    SecurityMetrics, StageId, Verdict,
};

// ============================================================================
// Test Data Generators
// ============================================================================

/// A security that clears every stage with full marks.
fn quality_grower(symbol: &str) -> SecurityMetrics {
    SecurityMetrics {
        symbol: symbol.to_string(),
        name: Some(format!("{} Holdings", symbol)),
        sector: Some("Industrials".to_string()),
        fundamentals: FundamentalMetrics {
            market_cap: Some(25.0e9),
            price: Some(85.0),
            revenue_growth: Some(0.55),
            earnings_growth: Some(0.55),
            profit_margin: Some(0.25),
            debt_to_equity: Some(40.0),
            current_ratio: Some(2.5),
            return_on_equity: Some(0.25),
            beta: Some(1.1),
            dividend_yield: Some(0.012),
            pe_ratio: Some(24.0),
        },
        technical: TechnicalMetrics {
            bars_available: 252,
            price: Some(85.0),
            sma_20: Some(82.0),
            sma_50: Some(78.0),
            sma_200: Some(70.0),
            rsi: Some(61.0),
            macd: Some(1.4),
            macd_signal: Some(0.9),
            volume: Some(4.0e6),
            avg_volume: Some(2.5e6),
            breakout: true,
            atr: Some(1.2),
            adx: Some(31.0),
        },
        options: OptionsSnapshot {
            chain_available: true,
            contract: Some(OptionContract {
                bid: Some(1.68),
                ask: Some(1.72),
                last: Some(1.70),
                open_interest: Some(3200.0),
                volume: Some(450.0),
                implied_volatility: Some(0.32),
                days_to_expiry: Some(42),
            }),
            underlying_price: Some(85.0),
            iv_percentile: Some(45.0),
        },
        momentum: MomentumMetrics {
            return_1m: Some(0.11),
            return_3m: Some(0.22),
            return_6m: Some(0.35),
        },
        sentiment: None,
    }
}

/// Same as `quality_grower` but with weaker momentum, so it ranks lower.
fn slower_grower(symbol: &str) -> SecurityMetrics {
    let mut metrics = quality_grower(symbol);
    metrics.momentum = MomentumMetrics {
        return_1m: Some(0.02),
        return_3m: Some(0.04),
        return_6m: None,
    };
    metrics
}

fn small_cap(symbol: &str) -> SecurityMetrics {
    let mut metrics = quality_grower(symbol);
    metrics.fundamentals.market_cap = Some(4.0e8);
    metrics
}

fn no_options(symbol: &str) -> SecurityMetrics {
    let mut metrics = quality_grower(symbol);
    metrics.options = OptionsSnapshot::default();
    metrics
}

fn new_listing(symbol: &str) -> SecurityMetrics {
    let mut metrics = quality_grower(symbol);
    metrics.technical.bars_available = 90;
    metrics
}

fn corrupted(symbol: &str) -> SecurityMetrics {
    let mut metrics = quality_grower(symbol);
    metrics.options.underlying_price = Some(f64::INFINITY);
    metrics
}

fn universe() -> Vec<SecurityMetrics> {
    vec![
        slower_grower("SLOW"),
        small_cap("TINY"),
        quality_grower("BEST"),
        no_options("NOPT"),
        new_listing("IPO"),
        corrupted("BAD"),
        quality_grower("ALSO"),
    ]
}

fn screener(workers: usize) -> Screener {
    let mut config = ScreeningConfig::default();
    config.workers = workers;
    Screener::new(config)
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_universe_is_partitioned_and_ranked() {
    let run = screener(4).screen_all(&universe()).unwrap();

    assert_eq!(run.total_screened, 7);
    assert_eq!(run.ranked.len() + run.rejected.len(), 7);

    let ranked: Vec<&str> = run.ranked.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(ranked, vec!["ALSO", "BEST", "SLOW"]);
    assert_eq!(run.ranked[0].composite_score(), Some(100.0));
    assert!(run.ranked[2].composite_score().unwrap() < 100.0);

    let rejected: Vec<&str> = run.rejected.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(rejected, vec!["BAD", "IPO", "NOPT", "TINY"]);
    assert!(run.id.starts_with("screen_"));
}

#[test]
fn test_rejections_carry_stage_and_reason() {
    let run = screener(2).screen_all(&universe()).unwrap();
    let failure = |symbol: &str| {
        let record = run.rejected.iter().find(|r| r.symbol == symbol).unwrap();
        match &record.verdict {
            Verdict::Failed { stage, reason } => (*stage, reason.clone(), record.stages.len()),
            Verdict::Passed { .. } => panic!("{} should have been rejected", symbol),
        }
    };

    let (stage, reason, evaluated) = failure("TINY");
    assert_eq!(stage, StageId::Fundamental);
    assert_eq!(reason, FailureReason::HardFail { reason: HardFailReason::MarketCapGateFailed });
    assert_eq!(evaluated, 1);

    let (stage, reason, evaluated) = failure("IPO");
    assert_eq!(stage, StageId::Technical);
    assert_eq!(reason, FailureReason::HardFail { reason: HardFailReason::InsufficientPriceHistory });
    assert_eq!(evaluated, 2);

    let (stage, reason, evaluated) = failure("NOPT");
    assert_eq!(stage, StageId::Options);
    assert_eq!(reason, FailureReason::HardFail { reason: HardFailReason::NoOptionsData });
    assert_eq!(evaluated, 3);

    let (stage, reason, _) = failure("BAD");
    assert_eq!(stage, StageId::Options);
    match reason {
        FailureReason::HardFail { reason: HardFailReason::ComputationFailed(message) } => {
            assert!(message.contains("underlying_price"));
        }
        other => panic!("unexpected reason: {:?}", other),
    }
}

#[test]
fn test_failure_is_isolated_to_one_security() {
    let clean = screener(3).screen_all(&[quality_grower("BEST")]).unwrap();
    let mixed = screener(3)
        .screen_all(&[corrupted("BAD"), quality_grower("BEST")])
        .unwrap();

    assert_eq!(clean.ranked.len(), 1);
    assert_eq!(mixed.ranked.len(), 1);
    assert_eq!(clean.ranked[0].stages, mixed.ranked[0].stages);
    assert_eq!(clean.ranked[0].verdict, mixed.ranked[0].verdict);
}

#[test]
fn test_ranking_independent_of_pool_size() {
    let single = screener(1).screen_all(&universe()).unwrap();
    let wide = screener(8).screen_all(&universe()).unwrap();

    let symbols = |run: &zero_screener::ScreeningRun| -> Vec<String> {
        run.ranked.iter().map(|r| r.symbol.clone()).collect()
    };
    assert_eq!(symbols(&single), symbols(&wide));
    assert_eq!(single.funnel, wide.funnel);
}

#[test]
fn test_funnel_counts_are_consistent() {
    let run = screener(4).screen_all(&universe()).unwrap();
    let funnel = &run.funnel;

    assert_eq!(funnel.len(), 4);
    assert_eq!(funnel[0].stage, StageId::Fundamental);
    assert_eq!(funnel[0].entered, 7);
    assert_eq!(funnel[0].eliminated, 1);
    assert_eq!(funnel[1].entered, 6);
    assert_eq!(funnel[1].eliminated, 1);
    assert_eq!(funnel[2].entered, 5);
    assert_eq!(funnel[2].eliminated, 2);
    assert_eq!(funnel[3].entered, 3);
    assert_eq!(funnel[3].passed, 3);

    for pair in funnel.windows(2) {
        assert_eq!(pair[0].passed, pair[1].entered);
    }
    assert_eq!(funnel[3].passed, run.ranked.len());
}

#[test]
fn test_empty_universe() {
    let run = screener(2).screen_all(&[]).unwrap();
    assert!(run.ranked.is_empty());
    assert!(run.funnel.iter().all(|f| f.entered == 0 && f.elimination_rate == 0.0));
    assert!(run.summary().contains("0 passed"));
}

#[test]
fn test_zero_workers_is_rejected_by_validation() {
    use zero_common::validation::Validate;

    let mut config = ScreeningConfig::default();
    config.workers = 0;
    assert!(config.validate().is_err());
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_report_round_trip_through_disk() {
    let run = screener(2).screen_all(&universe()).unwrap();
    let report = ScreeningReport::new(run).with_top_n(2);

    let dir = tempfile::tempdir().unwrap();
    let md_path = report
        .save_to_file(&dir.path().join("reports/daily"), ReportFormat::Markdown)
        .unwrap();
    let markdown = std::fs::read_to_string(&md_path).unwrap();

    assert!(md_path.ends_with("reports/daily.md"));
    assert!(markdown.contains("| 1 | ALSO |"));
    assert!(markdown.contains("| 2 | BEST |"));
    assert!(!markdown.contains("| 3 | SLOW |"));
    assert!(markdown.contains("| IPO | technical | insufficient_price_history |"));

    let json_path = report
        .save_to_file(&dir.path().join("reports/daily"), ReportFormat::Json)
        .unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(value["total_screened"], 7);
    assert_eq!(value["ranked"][0]["verdict"]["status"], "passed");
    assert_eq!(
        value["rejected"][2]["verdict"]["reason"]["reason"]["code"],
        "no_options_data"
    );
}
