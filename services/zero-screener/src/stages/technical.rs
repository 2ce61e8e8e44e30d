//! Technical stage.
//!
//! Works on indicators derived upstream from daily bars. The stage's own
//! maximum is 80 points; the percentage stays on 0-100 so it compares with
//! the other stages.

use tracing::debug;

use crate::config::{GateThresholds, ScreeningConfig, TechnicalThresholds};
use crate::coverage::GateRequirement;
use crate::criteria::{CriteriaSet, CriterionOutcome, Threshold};
use crate::error::{finite, Result};
use crate::metrics::SecurityMetrics;
use crate::scoring::{banded, ScoreCard};
use crate::stage::{HardFail, HardFailReason, StageId, StageOutcome, StageResult};

use super::StageEvaluator;

pub const CRITERIA: [&str; 7] = [
    "trend_alignment",
    "rsi_band",
    "macd_momentum",
    "volume_confirmation",
    "breakout",
    "volatility",
    "trend_strength",
];

const TREND_MAX: f64 = 20.0;
const SIGNAL_MAX: f64 = 10.0;
/// RSI points still awarded this close outside the band
const RSI_NEAR_BAND: f64 = 5.0;

/// Technical stage evaluator.
pub struct TechnicalStage<'a> {
    thresholds: &'a TechnicalThresholds,
    gate: GateThresholds,
}

impl<'a> TechnicalStage<'a> {
    pub fn new(thresholds: &'a TechnicalThresholds, gate: GateThresholds) -> Self {
        Self { thresholds, gate }
    }

    pub fn from_config(config: &'a ScreeningConfig) -> Self {
        Self::new(&config.technical, config.gates.technical)
    }
}

/// `a > b`, UNKNOWN if either side is absent.
fn above(a: Option<f64>, b: Option<f64>) -> CriterionOutcome {
    match (a, b) {
        (Some(a), Some(b)) => CriterionOutcome::from_bool(a > b),
        _ => CriterionOutcome::Unknown,
    }
}

/// `numerator / denominator` when the denominator is positive.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d),
        _ => None,
    }
}

impl StageEvaluator for TechnicalStage<'_> {
    fn stage(&self) -> StageId {
        StageId::Technical
    }

    fn gate(&self) -> Option<GateRequirement> {
        Some(self.gate.requirement(CRITERIA.len()))
    }

    fn evaluate(&self, metrics: &SecurityMetrics) -> Result<StageOutcome> {
        let m = &metrics.technical;
        let t = self.thresholds;

        if m.bars_available < t.min_history_bars {
            debug!(
                symbol = %metrics.symbol,
                bars = m.bars_available,
                required = t.min_history_bars,
                "Insufficient price history"
            );
            return Ok(StageOutcome::HardFail(HardFail::new(
                StageId::Technical,
                HardFailReason::InsufficientPriceHistory,
                CriteriaSet::all_unknown(&CRITERIA),
            )));
        }

        let price = finite("price", m.price)?;
        let sma_20 = finite("sma_20", m.sma_20)?;
        let sma_50 = finite("sma_50", m.sma_50)?;
        let sma_200 = finite("sma_200", m.sma_200)?;
        let rsi = finite("rsi", m.rsi)?;
        let macd = finite("macd", m.macd)?;
        let macd_signal = finite("macd_signal", m.macd_signal)?;
        let volume = finite("volume", m.volume)?;
        let avg_volume = finite("avg_volume", m.avg_volume)?;
        let atr = finite("atr", m.atr)?;
        let adx = finite("adx", m.adx)?;

        let histogram = macd.zip(macd_signal).map(|(line, signal)| line - signal);
        let volume_ratio = ratio(volume, avg_volume);
        let volatility_ratio = ratio(atr, price);

        let mut criteria = CriteriaSet::new();
        let trend = criteria.record(
            "trend_alignment",
            CriterionOutcome::all([
                above(price, sma_20),
                above(sma_20, sma_50),
                above(sma_50, sma_200),
            ]),
        );
        criteria.record("rsi_band", Threshold::Within { min: t.rsi_min, max: t.rsi_max }.check(rsi));
        criteria.record(
            "macd_momentum",
            CriterionOutcome::from_option(histogram.map(|h| h > 0.0)),
        );
        criteria.record(
            "volume_confirmation",
            Threshold::AtLeast(t.min_volume_ratio).check(volume_ratio),
        );
        criteria.record("breakout", CriterionOutcome::from_bool(m.breakout));
        criteria.record(
            "volatility",
            Threshold::AtMost(t.max_volatility_ratio).check(volatility_ratio),
        );
        criteria.record("trend_strength", Threshold::AtLeast(t.min_adx).check(adx));

        let mut card = ScoreCard::new();

        let trend_points = match trend {
            CriterionOutcome::Pass => Some(TREND_MAX),
            CriterionOutcome::Fail => Some(banded(&[(above(price, sma_200).is_pass(), 8.0)])),
            CriterionOutcome::Unknown => None,
        };
        card.add(TREND_MAX, trend_points);

        card.add(
            SIGNAL_MAX,
            rsi.map(|r| {
                banded(&[
                    (r >= t.rsi_min && r <= t.rsi_max, 10.0),
                    (r >= t.rsi_min - RSI_NEAR_BAND && r <= t.rsi_max + RSI_NEAR_BAND, 4.0),
                ])
            }),
        );
        card.add(SIGNAL_MAX, histogram.map(|h| banded(&[(h > 0.0, 10.0)])));
        card.add(
            SIGNAL_MAX,
            volume_ratio.map(|r| {
                banded(&[
                    (r >= t.min_volume_ratio * 1.5, 10.0),
                    (r >= t.min_volume_ratio, 7.0),
                ])
            }),
        );
        card.add(SIGNAL_MAX, Some(banded(&[(m.breakout, 10.0)])));
        card.add(
            SIGNAL_MAX,
            volatility_ratio.map(|r| {
                let max = t.max_volatility_ratio;
                banded(&[(r <= max / 2.0, 10.0), (r <= max, 7.0), (r <= max * 1.5, 3.0)])
            }),
        );
        card.add(
            SIGNAL_MAX,
            adx.map(|a| banded(&[(a >= t.min_adx * 1.5, 10.0), (a >= t.min_adx, 7.0)])),
        );

        let (raw, score) = card.finish();
        let result = StageResult::new(StageId::Technical, criteria, raw, score);

        debug!(
            symbol = %metrics.symbol,
            coverage = %result.coverage,
            points = ?result.points(),
            "Technical stage evaluated"
        );

        Ok(StageOutcome::Scored(result))
    }
}
