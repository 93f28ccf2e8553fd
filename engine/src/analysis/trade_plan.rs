// Next-session plan derived from the highest-confidence pattern.
use super::patterns::PATTERN_ORDER;
use crate::config::settings::{AnalysisConfig, PlanOffsets};
use crate::error::EngineError;
use shared::models::{
    AnalysisResult, EntryZone, KeyLevels, PatternKey, PatternResult, SessionMetrics, StopLevel, StopSide,
    TradePlan,
};
use shared::utils::format_thousands;
use std::collections::BTreeMap;

const BUY_DAY_INSTRUCTIONS: [&str; 6] = [
    "Watch for early weakness in first hour",
    "Look for support near previous day's low",
    "Enter long positions when price stabilizes in buy zones",
    "Add to position if higher low forms",
    "Take profits at previous day's high",
    "Exit all positions before close if rally fails",
];

const SELL_DAY_INSTRUCTIONS: [&str; 6] = [
    "Watch for early strength",
    "Look for resistance near previous day's high",
    "Exit/reverse longs in sell zones",
    "Protect profits with trailing stops",
    "Be prepared for afternoon weakness",
    "Cover shorts if strong support emerges",
];

const SHORT_SALE_DAY_INSTRUCTIONS: [&str; 6] = [
    "Watch for early strength to fade",
    "Enter shorts in designated zones",
    "Add to shorts if lower highs form",
    "Trail stops as price declines",
    "Take profits at previous day's low",
    "Cover all shorts if strong rally emerges",
];

const VOLUME_NOTES: [&str; 3] = [
    "Watch for volume expansion in entry zones",
    "Heavy volume at extremes may signal reversal",
    "Light volume rallies often fail",
];

pub const RISK_RULES: [&str; 5] = [
    "Respect stop losses absolutely",
    "Size positions according to risk tolerance",
    "Don't average down on losing trades",
    "Exit trades showing adverse volume patterns",
    "Take partial profits when available",
];

/// Highest confidence wins; on a tie the pattern earlier in [`PATTERN_ORDER`] is kept.
pub fn select_setup(patterns: &BTreeMap<PatternKey, PatternResult>) -> Option<PatternKey> {
    PATTERN_ORDER
        .iter()
        .filter_map(|key| patterns.get(key).map(|result| (*key, result.confidence)))
        .fold(None, |best: Option<(PatternKey, u32)>, candidate| match best {
            Some(current) if candidate.1 <= current.1 => Some(current),
            _ => Some(candidate),
        })
        .map(|(key, _)| key)
}

pub fn generate_trade_plan(analysis: &AnalysisResult, config: &AnalysisConfig) -> Result<TradePlan, EngineError> {
    let setup = select_setup(&analysis.patterns)
        .ok_or_else(|| EngineError::InsufficientData("no scored patterns to plan from".to_string()))?;
    let metrics = &analysis.metrics;
    let (entry_zones, stop) = entry_levels(setup, metrics, &config.plan_offsets);

    let instructions = match setup {
        PatternKey::BuyDay => BUY_DAY_INSTRUCTIONS,
        PatternKey::SellDay => SELL_DAY_INSTRUCTIONS,
        PatternKey::ShortSaleDay => SHORT_SALE_DAY_INSTRUCTIONS,
    };

    let mut volume_notes = vec![format!("Previous day volume: {} contracts", format_thousands(metrics.volume))];
    volume_notes.extend(VOLUME_NOTES.iter().map(|note| note.to_string()));

    tracing::info!(
        setup = %setup,
        confidence = analysis.patterns.get(&setup).map(|p| p.confidence).unwrap_or_default(),
        stop = %stop,
        "Derived next-session trade plan"
    );

    Ok(TradePlan {
        setup,
        key_levels: KeyLevels {
            previous_high: metrics.high,
            previous_low: metrics.low,
            previous_close: metrics.close,
        },
        entry_zones,
        stop,
        instructions: instructions.iter().map(|line| line.to_string()).collect(),
        volume_notes,
        risk_rules: RISK_RULES.iter().map(|line| line.to_string()).collect(),
    })
}

fn zone(label: &str, lower: f64, upper: f64) -> EntryZone {
    EntryZone { label: label.to_string(), lower, upper }
}

/// Zones and stop as offsets of the session range from the low (buy) or high (sell, short).
fn entry_levels(setup: PatternKey, m: &SessionMetrics, offsets: &PlanOffsets) -> (Vec<EntryZone>, StopLevel) {
    let r = m.range;
    match setup {
        PatternKey::BuyDay => (
            vec![
                zone("Primary Buy Zone", m.low - r * offsets.near, m.low),
                zone("Secondary Buy Zone", m.low + r * offsets.near, m.low + r * offsets.far),
            ],
            StopLevel { side: StopSide::Below, price: m.low - r * offsets.mid },
        ),
        PatternKey::SellDay => (
            vec![
                zone("Primary Sell Zone", m.high, m.high + r * offsets.near),
                zone("Secondary Sell Zone", m.high - r * offsets.mid, m.high),
            ],
            StopLevel { side: StopSide::Above, price: m.high + r * offsets.mid },
        ),
        PatternKey::ShortSaleDay => (
            vec![
                zone("Primary Short Zone", m.high, m.high + r * offsets.near),
                zone("Secondary Short Zone", m.high - r * offsets.mid, m.high),
            ],
            StopLevel { side: StopSide::Above, price: m.high + r * offsets.mid },
        ),
    }
}
