// Window and whole-session aggregates over regular-hours bars.
use super::session::SessionPartition;
use crate::error::EngineError;
use shared::models::{PriceBar, SessionMetrics, WindowKey, WindowMetrics};
use std::collections::BTreeMap;

/// Summed volume; a total past `u64::MAX` is an error rather than a wrap.
pub fn total_volume(bars: &[PriceBar]) -> Result<u64, EngineError> {
    bars.iter().try_fold(0u64, |total, bar| {
        total.checked_add(bar.volume).ok_or_else(|| {
            EngineError::Overflow(format!("volume total exceeds {} at {}", u64::MAX, bar.timestamp))
        })
    })
}

/// Extremes, their first occurrence and summed volume. `None` for an empty window.
pub fn window_metrics(bars: &[PriceBar]) -> Result<Option<WindowMetrics>, EngineError> {
    let Some((first, rest)) = bars.split_first() else {
        return Ok(None);
    };
    let mut high_bar = first;
    let mut low_bar = first;
    for bar in rest {
        if bar.high > high_bar.high {
            high_bar = bar;
        }
        if bar.low < low_bar.low {
            low_bar = bar;
        }
    }
    Ok(Some(WindowMetrics {
        high: high_bar.high,
        low: low_bar.low,
        high_time: high_bar.timestamp,
        low_time: low_bar.timestamp,
        volume: total_volume(bars)?,
    }))
}

/// Empty windows are left out of the map rather than filled with placeholders.
pub fn collect_window_metrics(partition: &SessionPartition) -> Result<BTreeMap<WindowKey, WindowMetrics>, EngineError> {
    let mut windows = BTreeMap::new();
    for (window, members) in &partition.windows {
        if let Some(metrics) = window_metrics(members)? {
            windows.insert(window.key, metrics);
        }
    }
    Ok(windows)
}

pub fn session_metrics(regular: &[PriceBar]) -> Result<SessionMetrics, EngineError> {
    let (first, last) = match (regular.first(), regular.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(EngineError::InsufficientData(
                "no bars fall within regular trading hours".to_string(),
            ))
        }
    };
    let high = regular.iter().map(|bar| bar.high).fold(f64::NEG_INFINITY, f64::max);
    let low = regular.iter().map(|bar| bar.low).fold(f64::INFINITY, f64::min);
    Ok(SessionMetrics {
        open: first.open,
        high,
        low,
        close: last.last,
        range: high - low,
        volume: total_volume(regular)?,
    })
}
