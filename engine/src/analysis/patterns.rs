// Taylor session patterns: fixed match predicates and point rubrics evaluated
// against the aggregated session. A condition that needs a window with no member
// bars, or the latest value of an empty moving-average series, fails with
// InsufficientData instead of scoring zero.

use crate::config::AnalysisConfig;
use crate::error::EngineError;
use shared::models::{PatternKey, PatternResult, SessionMetrics, WindowKey, WindowMetrics};
use std::collections::BTreeMap;

/// Evaluation order of the patterns. Also the tie-break order when choosing a setup.
pub const PATTERN_ORDER: [PatternKey; 3] = [PatternKey::BuyDay, PatternKey::SellDay, PatternKey::ShortSaleDay];

/// Everything a condition may look at.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInputs<'a> {
    pub metrics: &'a SessionMetrics,
    pub windows: &'a BTreeMap<WindowKey, WindowMetrics>,
    pub short_ma: &'a [f64],
    pub long_ma: &'a [f64],
}

impl<'a> ScoringInputs<'a> {
    pub fn window(&self, key: WindowKey) -> Result<&'a WindowMetrics, EngineError> {
        self.windows
            .get(&key)
            .ok_or_else(|| EngineError::InsufficientData(format!("window '{}' has no bars", key)))
    }

    pub fn latest_short_ma(&self) -> Result<f64, EngineError> {
        latest(self.short_ma, "short-term")
    }

    pub fn latest_long_ma(&self) -> Result<f64, EngineError> {
        latest(self.long_ma, "long-term")
    }
}

fn latest(series: &[f64], label: &str) -> Result<f64, EngineError> {
    series.last().copied().ok_or_else(|| {
        EngineError::InsufficientData(format!("{} moving average has no values", label))
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    WindowLowIsSessionLow(WindowKey),
    WindowHighIsSessionHigh(WindowKey),
    CloseAboveOpen,
    CloseBelowOpen,
    /// close > high - range * fraction
    CloseAboveRangeLevel(f64),
    /// close < high - range * fraction
    CloseBelowRangeLevel(f64),
    WindowVolumeExceeds { busier: WindowKey, quieter: WindowKey },
    ShortMaAboveLong,
    ShortMaBelowLong,
}

impl Condition {
    pub fn evaluate(&self, inputs: &ScoringInputs<'_>) -> Result<bool, EngineError> {
        let m = inputs.metrics;
        let held = match *self {
            Condition::WindowLowIsSessionLow(key) => inputs.window(key)?.low == m.low,
            Condition::WindowHighIsSessionHigh(key) => inputs.window(key)?.high == m.high,
            Condition::CloseAboveOpen => m.close > m.open,
            Condition::CloseBelowOpen => m.close < m.open,
            Condition::CloseAboveRangeLevel(fraction) => m.close > m.high - m.range * fraction,
            Condition::CloseBelowRangeLevel(fraction) => m.close < m.high - m.range * fraction,
            Condition::WindowVolumeExceeds { busier, quieter } => {
                inputs.window(busier)?.volume > inputs.window(quieter)?.volume
            }
            Condition::ShortMaAboveLong => inputs.latest_short_ma()? > inputs.latest_long_ma()?,
            Condition::ShortMaBelowLong => inputs.latest_short_ma()? < inputs.latest_long_ma()?,
        };
        Ok(held)
    }

    pub fn describe(&self) -> String {
        match self {
            Condition::WindowLowIsSessionLow(key) => format!("{} low is the session low", key),
            Condition::WindowHighIsSessionHigh(key) => format!("{} high is the session high", key),
            Condition::CloseAboveOpen => "close above open".to_string(),
            Condition::CloseBelowOpen => "close below open".to_string(),
            Condition::CloseAboveRangeLevel(f) => format!("close above high - range x {}", f),
            Condition::CloseBelowRangeLevel(f) => format!("close below high - range x {}", f),
            Condition::WindowVolumeExceeds { busier, quieter } => {
                format!("{} volume exceeds {} volume", busier, quieter)
            }
            Condition::ShortMaAboveLong => "short MA above long MA".to_string(),
            Condition::ShortMaBelowLong => "short MA below long MA".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubricItem {
    pub condition: Condition,
    pub points: u32,
}

/// Outcome of one rubric line.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionOutcome {
    pub label: String,
    pub points: u32,
    pub satisfied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternDefinition {
    pub key: PatternKey,
    pub characteristics: Vec<String>,
    pub match_conditions: Vec<Condition>,
    pub rubric: Vec<RubricItem>,
    pub max_confidence: u32,
}

impl PatternDefinition {
    /// Conditions are checked in order and stop at the first that fails.
    pub fn is_match(&self, inputs: &ScoringInputs<'_>) -> Result<bool, EngineError> {
        for condition in &self.match_conditions {
            if !condition.evaluate(inputs)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn breakdown(&self, inputs: &ScoringInputs<'_>) -> Result<Vec<CriterionOutcome>, EngineError> {
        self.rubric
            .iter()
            .map(|item| {
                Ok(CriterionOutcome {
                    label: item.condition.describe(),
                    points: item.points,
                    satisfied: item.condition.evaluate(inputs)?,
                })
            })
            .collect()
    }

    /// Satisfied points, clamped to `max_confidence`. Below the cap the breakdown
    /// adds up to exactly this value.
    pub fn confidence(&self, inputs: &ScoringInputs<'_>) -> Result<u32, EngineError> {
        let outcomes = self.breakdown(inputs)?;
        let points: u32 = outcomes.iter().filter(|o| o.satisfied).map(|o| o.points).sum();
        Ok(points.min(self.max_confidence))
    }

    pub fn score(&self, inputs: &ScoringInputs<'_>) -> Result<PatternResult, EngineError> {
        let confidence = self.confidence(inputs)?;
        let matched = self.is_match(inputs)?;
        tracing::debug!(pattern = %self.key, matched, confidence, "Scored pattern");
        Ok(PatternResult::new(matched, confidence, self.characteristics.clone()))
    }
}

fn characteristics(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

/// The three Taylor patterns in [`PATTERN_ORDER`], parameterised by the config's
/// weights and range fractions.
pub fn standard_definitions(config: &AnalysisConfig) -> Vec<PatternDefinition> {
    let w = &config.scoring;
    let f = &config.range_fractions;
    vec![
        PatternDefinition {
            key: PatternKey::BuyDay,
            characteristics: characteristics(&[
                "Low typically made in first hour",
                "Rally following the low",
                "Strong close relative to range",
                "Volume increases on rally",
            ]),
            match_conditions: vec![
                Condition::WindowLowIsSessionLow(WindowKey::Opening),
                Condition::CloseAboveRangeLevel(f.buy_day),
            ],
            rubric: vec![
                RubricItem { condition: Condition::WindowLowIsSessionLow(WindowKey::Opening), points: w.extreme_placement },
                RubricItem { condition: Condition::CloseAboveOpen, points: w.open_to_close },
                RubricItem { condition: Condition::CloseAboveRangeLevel(f.buy_day), points: w.close_in_range },
                RubricItem {
                    condition: Condition::WindowVolumeExceeds { busier: WindowKey::Opening, quieter: WindowKey::MidDay },
                    points: w.volume_shift,
                },
                RubricItem { condition: Condition::ShortMaAboveLong, points: w.trend },
            ],
            max_confidence: w.max_confidence,
        },
        PatternDefinition {
            key: PatternKey::SellDay,
            characteristics: characteristics(&[
                "High made mid-session",
                "Decline from high",
                "Weak close",
                "Volume highest on highs",
            ]),
            match_conditions: vec![
                Condition::WindowHighIsSessionHigh(WindowKey::MidDay),
                Condition::CloseBelowRangeLevel(f.sell_day),
            ],
            rubric: vec![
                RubricItem { condition: Condition::WindowHighIsSessionHigh(WindowKey::MidDay), points: w.extreme_placement },
                RubricItem { condition: Condition::CloseBelowOpen, points: w.open_to_close },
                RubricItem { condition: Condition::CloseBelowRangeLevel(f.sell_day), points: w.close_in_range },
                RubricItem {
                    condition: Condition::WindowVolumeExceeds { busier: WindowKey::MidDay, quieter: WindowKey::Closing },
                    points: w.volume_shift,
                },
                RubricItem { condition: Condition::ShortMaBelowLong, points: w.trend },
            ],
            max_confidence: w.max_confidence,
        },
        PatternDefinition {
            key: PatternKey::ShortSaleDay,
            characteristics: characteristics(&[
                "High made in first hour",
                "Steady decline after high",
                "Weak close",
                "Volume decreases after high",
            ]),
            match_conditions: vec![
                Condition::WindowHighIsSessionHigh(WindowKey::Opening),
                Condition::CloseBelowRangeLevel(f.short_sale_day),
            ],
            rubric: vec![
                RubricItem { condition: Condition::WindowHighIsSessionHigh(WindowKey::Opening), points: w.extreme_placement },
                RubricItem { condition: Condition::CloseBelowOpen, points: w.open_to_close },
                RubricItem { condition: Condition::CloseBelowRangeLevel(f.short_sale_day), points: w.close_in_range },
                RubricItem {
                    condition: Condition::WindowVolumeExceeds { busier: WindowKey::Opening, quieter: WindowKey::Closing },
                    points: w.volume_shift,
                },
                RubricItem { condition: Condition::ShortMaBelowLong, points: w.trend },
            ],
            max_confidence: w.max_confidence,
        },
    ]
}

pub fn score_patterns(
    definitions: &[PatternDefinition],
    inputs: &ScoringInputs<'_>,
) -> Result<BTreeMap<PatternKey, PatternResult>, EngineError> {
    definitions
        .iter()
        .map(|definition| Ok((definition.key, definition.score(inputs)?)))
        .collect()
}
