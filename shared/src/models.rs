use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::format_price;

/// The six columns a bar export carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarField {
    Time,
    Open,
    High,
    Low,
    Last,
    Volume,
}

impl BarField {
    pub const ALL: [BarField; 6] = [
        BarField::Time,
        BarField::Open,
        BarField::High,
        BarField::Low,
        BarField::Last,
        BarField::Volume,
    ];

    /// Column header as it appears in quote exports.
    pub fn header(&self) -> &'static str {
        match self {
            BarField::Time => "Time",
            BarField::Open => "Open",
            BarField::High => "High",
            BarField::Low => "Low",
            BarField::Last => "Last",
            BarField::Volume => "Volume",
        }
    }
}

impl fmt::Display for BarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// A row exactly as handed over by the ingestion layer. Nothing is parsed yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawBarRecord {
    pub time: Option<String>,
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub last: Option<String>,
    pub volume: Option<String>,
}

impl RawBarRecord {
    pub fn new(time: &str, open: &str, high: &str, low: &str, last: &str, volume: &str) -> Self {
        RawBarRecord {
            time: Some(time.to_string()),
            open: Some(open.to_string()),
            high: Some(high.to_string()),
            low: Some(low.to_string()),
            last: Some(last.to_string()),
            volume: Some(volume.to_string()),
        }
    }

    /// Returns the field's text, treating blank values as absent.
    pub fn field(&self, field: BarField) -> Option<&str> {
        let value = match field {
            BarField::Time => &self.time,
            BarField::Open => &self.open,
            BarField::High => &self.high,
            BarField::Low => &self.low,
            BarField::Last => &self.last,
            BarField::Volume => &self.volume,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    pub fn set_field(&mut self, field: BarField, value: Option<String>) {
        let slot = match field {
            BarField::Time => &mut self.time,
            BarField::Open => &mut self.open,
            BarField::High => &mut self.high,
            BarField::Low => &mut self.low,
            BarField::Last => &mut self.last,
            BarField::Volume => &mut self.volume,
        };
        *slot = value;
    }
}

/// A validated five-minute bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub last: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn time_of_day(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// Minutes since midnight, seconds ignored.
    pub fn minute_of_day(&self) -> u32 {
        minute_of_day(self.time_of_day())
    }
}

pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowKey {
    Opening,
    MidDay,
    Closing,
}

impl WindowKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKey::Opening => "opening",
            WindowKey::MidDay => "midDay",
            WindowKey::Closing => "closing",
        }
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named slice of the trading day. Bounds are inclusive at minute resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub key: WindowKey,
    pub name: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(key: WindowKey, name: &str, start: NaiveTime, end: NaiveTime) -> Self {
        TimeWindow { key, name: name.to_string(), start, end }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let minute = minute_of_day(time);
        minute >= minute_of_day(self.start) && minute <= minute_of_day(self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowMetrics {
    pub high: f64,
    pub low: f64,
    pub high_time: NaiveDateTime,
    pub low_time: NaiveDateTime,
    pub volume: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub range: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKey {
    BuyDay,
    SellDay,
    ShortSaleDay,
}

impl PatternKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKey::BuyDay => "buyDay",
            PatternKey::SellDay => "sellDay",
            PatternKey::ShortSaleDay => "shortSaleDay",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PatternKey::BuyDay => "Buy Day",
            PatternKey::SellDay => "Sell Day",
            PatternKey::ShortSaleDay => "Short Sale Day",
        }
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfidenceTier {
    Strong,
    Moderate,
    Weak,
}

impl ConfidenceTier {
    pub fn for_confidence(confidence: u32) -> Self {
        match confidence {
            c if c > 70 => ConfidenceTier::Strong,
            c if c > 40 => ConfidenceTier::Moderate,
            _ => ConfidenceTier::Weak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternResult {
    #[serde(rename = "match")]
    pub matched: bool,
    pub confidence: u32,
    pub tier: ConfidenceTier,
    pub characteristics: Vec<String>,
}

impl PatternResult {
    pub fn new(matched: bool, confidence: u32, characteristics: Vec<String>) -> Self {
        PatternResult { matched, confidence, tier: ConfidenceTier::for_confidence(confidence), characteristics }
    }
}

/// Latest value of each moving-average series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    #[serde(rename = "shortTermMA")]
    pub short_term_ma: f64,
    #[serde(rename = "longTermMA")]
    pub long_term_ma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub metrics: SessionMetrics,
    pub windows: BTreeMap<WindowKey, WindowMetrics>,
    pub patterns: BTreeMap<PatternKey, PatternResult>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyLevels {
    pub previous_high: f64,
    pub previous_low: f64,
    pub previous_close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryZone {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
}

impl fmt::Display for EntryZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} to {}", self.label, format_price(self.lower), format_price(self.upper))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopSide {
    Below,
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLevel {
    pub side: StopSide,
    pub price: f64,
}

impl fmt::Display for StopLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            StopSide::Below => "Below",
            StopSide::Above => "Above",
        };
        write!(f, "Stop Loss: {} {}", side, format_price(self.price))
    }
}

/// Next-session plan derived from the highest-confidence pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePlan {
    pub setup: PatternKey,
    pub key_levels: KeyLevels,
    pub entry_zones: Vec<EntryZone>,
    pub stop: StopLevel,
    pub instructions: Vec<String>,
    pub volume_notes: Vec<String>,
    pub risk_rules: Vec<String>,
}

impl TradePlan {
    /// Plain-text rendering, one line per level, zone and note.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Setup: {}", self.setup.label()),
            format!("Previous High: {}", format_price(self.key_levels.previous_high)),
            format!("Previous Low: {}", format_price(self.key_levels.previous_low)),
            format!("Previous Close: {}", format_price(self.key_levels.previous_close)),
        ];
        lines.extend(self.entry_zones.iter().map(|zone| zone.to_string()));
        lines.push(self.stop.to_string());
        lines.extend(self.instructions.iter().enumerate().map(|(i, line)| format!("{}. {}", i + 1, line)));
        lines.extend(self.volume_notes.iter().cloned());
        lines.extend(self.risk_rules.iter().cloned());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn blank_fields_read_as_missing() {
        let mut record = RawBarRecord::new("2024-01-02 08:30:00", "1", "2", "0.5", "1.5", "100");
        record.set_field(BarField::Open, Some("   ".to_string()));
        assert_eq!(record.field(BarField::Open), None);
        assert_eq!(record.field(BarField::High), Some("2"));
    }

    #[test]
    fn window_bounds_are_inclusive_to_the_minute() {
        let window = TimeWindow::new(WindowKey::Opening, "Opening Hour", at(8, 30), at(9, 30));
        assert!(window.contains(at(8, 30)));
        assert!(window.contains(NaiveTime::from_hms_opt(9, 30, 45).unwrap()));
        assert!(!window.contains(at(8, 29)));
        assert!(!window.contains(at(9, 31)));
    }

    #[test]
    fn confidence_tiers() {
        let result = |confidence| PatternResult::new(false, confidence, vec![]);
        assert_eq!(result(80).tier, ConfidenceTier::Strong);
        assert_eq!(result(70).tier, ConfidenceTier::Moderate);
        assert_eq!(result(50).tier, ConfidenceTier::Moderate);
        assert_eq!(result(40).tier, ConfidenceTier::Weak);
    }

    #[test]
    fn analysis_result_serializes_with_contract_keys() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_time(at(8, 30));
        let mut windows = BTreeMap::new();
        windows.insert(
            WindowKey::MidDay,
            WindowMetrics { high: 2.0, low: 1.0, high_time: ts, low_time: ts, volume: 10 },
        );
        let mut patterns = BTreeMap::new();
        patterns.insert(
            PatternKey::ShortSaleDay,
            PatternResult::new(true, 60, vec!["x".into()]),
        );
        let result = AnalysisResult {
            metrics: SessionMetrics { open: 1.0, high: 2.0, low: 1.0, close: 1.5, range: 1.0, volume: 10 },
            windows,
            patterns,
            indicators: Indicators { short_term_ma: 1.2, long_term_ma: 1.1 },
        };

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["windows"]["midDay"]["highTime"].is_string());
        assert_eq!(json["patterns"]["shortSaleDay"]["match"], true);
        assert_eq!(json["patterns"]["shortSaleDay"]["tier"], "moderate");
        assert_eq!(json["indicators"]["shortTermMA"], 1.2);
        assert_eq!(json["indicators"]["longTermMA"], 1.1);
        assert_eq!(json["metrics"]["range"], 1.0);
    }

    #[test]
    fn plan_parts_render_for_display() {
        let zone = EntryZone { label: "Primary Buy Zone".into(), lower: 9.996, upper: 10.0 };
        assert_eq!(zone.to_string(), "Primary Buy Zone: 10.00 to 10.00");
        let stop = StopLevel { side: StopSide::Above, price: 10.408 };
        assert_eq!(stop.to_string(), "Stop Loss: Above 10.41");
    }

    #[test]
    fn plan_summary_lists_levels_then_notes() {
        let plan = TradePlan {
            setup: PatternKey::SellDay,
            key_levels: KeyLevels { previous_high: 11.0, previous_low: 10.0, previous_close: 10.2 },
            entry_zones: vec![EntryZone { label: "Primary Sell Zone".into(), lower: 11.0, upper: 11.01 }],
            stop: StopLevel { side: StopSide::Above, price: 11.02 },
            instructions: vec!["Watch for early strength".into()],
            volume_notes: vec!["Light volume rallies often fail".into()],
            risk_rules: vec!["Respect stop losses absolutely".into()],
        };
        let lines = plan.summary_lines();
        assert_eq!(lines[1], "Previous High: 11.00");
        assert_eq!(lines[4], "Primary Sell Zone: 11.00 to 11.01");
        assert_eq!(lines[5], "Stop Loss: Above 11.02");
        assert_eq!(lines[6], "1. Watch for early strength");
        assert_eq!(lines.len(), 9);
    }
}
