// Turns raw ingestion rows into validated, time-ordered five-minute bars.

use crate::config::settings::{AnalysisConfig, CadenceSettings};
use crate::error::EngineError;
use chrono::NaiveDateTime;
use shared::models::{BarField, PriceBar, RawBarRecord};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Fields a row must carry to survive the first filter. Open is deliberately absent:
/// a row missing only Open survives and is then rejected outright.
const PRESENCE_FIELDS: [BarField; 5] =
    [BarField::Time, BarField::High, BarField::Low, BarField::Last, BarField::Volume];

const REQUIRED_FIELDS: [BarField; 5] =
    [BarField::Open, BarField::High, BarField::Low, BarField::Last, BarField::Volume];

pub fn validate_records(records: &[RawBarRecord], config: &AnalysisConfig) -> Result<Vec<PriceBar>, EngineError> {
    let surviving: Vec<&RawBarRecord> = records
        .iter()
        .filter(|r| PRESENCE_FIELDS.iter().all(|&f| r.field(f).is_some()))
        .filter(|r| !is_artifact(r, &config.artifact_markers))
        .collect();
    tracing::debug!(
        received = records.len(),
        surviving = surviving.len(),
        "Filtered raw bar records"
    );

    for record in &surviving {
        if let Some(field) = REQUIRED_FIELDS.iter().find(|&&f| record.field(f).is_none()) {
            return Err(EngineError::MissingField(format!(
                "row at '{}' has no {}",
                record.field(BarField::Time).unwrap_or_default(),
                field
            )));
        }
    }

    let mut bars = surviving
        .into_iter()
        .map(parse_bar)
        .collect::<Result<Vec<_>, _>>()?;
    bars.sort_by_key(|bar| bar.timestamp);

    check_cadence(&bars, &config.cadence)?;
    Ok(bars)
}

fn is_artifact(record: &RawBarRecord, markers: &[String]) -> bool {
    record
        .field(BarField::Time)
        .map_or(false, |time| markers.iter().any(|m| time.contains(m.as_str())))
}

/// The single place raw text becomes a `PriceBar`.
pub fn parse_bar(record: &RawBarRecord) -> Result<PriceBar, EngineError> {
    let time = required(record, BarField::Time)?;
    let timestamp = parse_timestamp(time)?;
    let open = parse_price(record, BarField::Open)?;
    let high = parse_price(record, BarField::High)?;
    let low = parse_price(record, BarField::Low)?;
    let last = parse_price(record, BarField::Last)?;
    let volume = parse_volume(required(record, BarField::Volume)?)?;

    if high < open.max(last).max(low) || low > open.min(last).min(high) {
        return Err(EngineError::InvalidBar(format!(
            "bar at {} has open {} high {} low {} last {}",
            timestamp, open, high, low, last
        )));
    }

    Ok(PriceBar { timestamp, open, high, low, last, volume })
}

fn required(record: &RawBarRecord, field: BarField) -> Result<&str, EngineError> {
    record
        .field(field)
        .ok_or_else(|| EngineError::MissingField(format!("{} is required", field)))
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, EngineError> {
    let cleaned = raw.replace('"', "");
    let cleaned = cleaned.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
        .ok_or_else(|| EngineError::Parse(format!("Failed to parse timestamp '{}'", raw)))
}

fn parse_price(record: &RawBarRecord, field: BarField) -> Result<f64, EngineError> {
    let raw = required(record, field)?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| EngineError::Parse(format!("Failed to parse {} '{}': {}", field, raw, e)))?;
    if !value.is_finite() {
        return Err(EngineError::Parse(format!("{} '{}' is not a finite number", field, raw)));
    }
    Ok(value)
}

fn parse_volume(raw: &str) -> Result<u64, EngineError> {
    let trimmed = raw.trim();
    if let Ok(volume) = trimmed.parse::<u64>() {
        return Ok(volume);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64 => Ok(v as u64),
        _ => Err(EngineError::Parse(format!("Failed to parse Volume '{}'", raw))),
    }
}

/// Samples the first bars' time-of-day and requires their mean spacing, rounded,
/// to equal the expected interval. Repeated timestamps are not counted as gaps.
pub fn check_cadence(bars: &[PriceBar], cadence: &CadenceSettings) -> Result<(), EngineError> {
    let minutes: Vec<i64> = bars
        .iter()
        .take(cadence.sample_size)
        .map(|bar| i64::from(bar.minute_of_day()))
        .collect();
    let gaps: Vec<i64> = minutes
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).abs())
        .filter(|&gap| gap > 0)
        .collect();

    if gaps.is_empty() {
        return Err(EngineError::Interval {
            expected: cadence.expected_minutes,
            observed: "none".to_string(),
        });
    }

    let average = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
    let rounded = average.round();
    if rounded != f64::from(cadence.expected_minutes) {
        return Err(EngineError::Interval {
            expected: cadence.expected_minutes,
            observed: format!("{} minutes", rounded),
        });
    }
    Ok(())
}
