// Analysis pipeline: validated bars are windowed, aggregated, averaged and scored
// into an AnalysisResult. Each call returns a complete result or a single error.

pub mod metrics;
pub mod patterns;
pub mod session;
pub mod trade_plan;

use crate::config::AnalysisConfig;
use crate::data::validator;
use crate::error::EngineError;
use crate::indicators::{IndicatorCalculator, Sma};
use patterns::ScoringInputs;
use shared::models::{AnalysisResult, Indicators, PriceBar, RawBarRecord};

pub fn analyze_records(records: &[RawBarRecord], config: &AnalysisConfig) -> Result<AnalysisResult, EngineError> {
    let bars = validator::validate_records(records, config)?;
    analyze_bars(&bars, config)
}

/// Expects bars already validated and in timestamp order.
pub fn analyze_bars(bars: &[PriceBar], config: &AnalysisConfig) -> Result<AnalysisResult, EngineError> {
    if bars.len() < config.min_bars {
        return Err(EngineError::InsufficientData(format!(
            "{} bars supplied, at least {} required",
            bars.len(),
            config.min_bars
        )));
    }

    let partition = session::partition(bars, config);
    let metrics = metrics::session_metrics(&partition.regular)?;
    let windows = metrics::collect_window_metrics(&partition)?;

    let short_sma = Sma::new(config.moving_averages.short_period)?;
    let long_sma = Sma::new(config.moving_averages.long_period)?;
    let short_ma = short_sma.calculate(&partition.regular);
    let long_ma = long_sma.calculate(&partition.regular);
    for (indicator, values) in [(&short_sma, &short_ma), (&long_sma, &long_ma)] {
        tracing::debug!(
            indicator = indicator.name(),
            parameters = %indicator.parameters(),
            values = values.len(),
            "Calculated moving average"
        );
    }

    let inputs = ScoringInputs {
        metrics: &metrics,
        windows: &windows,
        short_ma: &short_ma,
        long_ma: &long_ma,
    };
    let definitions = patterns::standard_definitions(config);
    let patterns = patterns::score_patterns(&definitions, &inputs)?;
    let indicators = Indicators {
        short_term_ma: inputs.latest_short_ma()?,
        long_term_ma: inputs.latest_long_ma()?,
    };

    tracing::info!(
        bars = bars.len(),
        regular = partition.regular.len(),
        windows = windows.len(),
        high = metrics.high,
        low = metrics.low,
        close = metrics.close,
        "Session analyzed"
    );

    Ok(AnalysisResult { metrics, windows, patterns, indicators })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use shared::models::{PatternKey, WindowKey};

    fn start(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn record(ts: NaiveDateTime, open: f64, high: f64, low: f64, last: f64, volume: u64) -> RawBarRecord {
        RawBarRecord::new(
            &format!("\"{}\"", ts.format("%Y-%m-%d %H:%M:%S")),
            &format!("{:.2}", open),
            &format!("{:.2}", high),
            &format!("{:.2}", low),
            &format!("{:.2}", last),
            &volume.to_string(),
        )
    }

    /// Pre-market noise, then a full regular session that dips to its low at 08:40
    /// on heavy opening volume and grinds higher into the close.
    fn buy_day_session() -> Vec<RawBarRecord> {
        let mut rows = Vec::new();
        for k in 0..6 {
            rows.push(record(start(8, 0) + Duration::minutes(5 * k), 6.0, 20.0, 5.0, 6.0, 50_000));
        }
        for i in 0..79i64 {
            let last = 10.10 + 0.01 * i as f64;
            let open = last - 0.01;
            let low = if i == 2 { 10.00 } else { open - 0.02 };
            let volume = if i <= 12 { 1000 } else { 100 };
            rows.push(record(start(8, 30) + Duration::minutes(5 * i), open, last + 0.02, low, last, volume));
        }
        rows.push(record(start(15, 5), 10.9, 30.0, 1.0, 10.9, 70_000));
        rows
    }

    #[test]
    fn test_full_session_reads_as_buy_day() {
        let result = analyze_records(&buy_day_session(), &AnalysisConfig::default()).unwrap();

        assert!((result.metrics.low - 10.00).abs() < 1e-9);
        assert!((result.metrics.high - 10.90).abs() < 1e-9);
        assert!((result.metrics.close - 10.88).abs() < 1e-9);
        assert_eq!(result.metrics.volume, 13 * 1000 + 66 * 100);
        assert_eq!(result.windows[&WindowKey::Opening].low_time, start(8, 40));
        assert_eq!(result.windows[&WindowKey::Opening].volume, 13_000);
        assert_eq!(result.windows[&WindowKey::MidDay].volume, 1000 + 48 * 100);
        assert_eq!(result.windows[&WindowKey::Closing].volume, 19 * 100);

        let buy = &result.patterns[&PatternKey::BuyDay];
        assert!(buy.matched);
        assert_eq!(buy.confidence, 100);
        assert_eq!(result.patterns[&PatternKey::SellDay].confidence, 20);
        assert_eq!(result.patterns[&PatternKey::ShortSaleDay].confidence, 20);
        assert!(result.indicators.short_term_ma > result.indicators.long_term_ma);

        let plan = trade_plan::generate_trade_plan(&result, &AnalysisConfig::default()).unwrap();
        assert_eq!(plan.setup, PatternKey::BuyDay);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let rows = buy_day_session();
        let first = analyze_records(&rows, &AnalysisConfig::default()).unwrap();
        let second = analyze_records(&rows, &AnalysisConfig::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_confidence_is_a_multiple_of_ten() {
        let result = analyze_records(&buy_day_session(), &AnalysisConfig::default()).unwrap();
        assert_eq!(result.patterns.len(), 3);
        for pattern in result.patterns.values() {
            assert!(pattern.confidence <= 100 && pattern.confidence % 10 == 0);
        }
    }

    /// Eight bars from 08:30 to 09:05 with the low on the first bar.
    fn opening_only_session() -> Vec<RawBarRecord> {
        let lasts = [10.05, 10.12, 10.20, 10.25, 10.31, 10.36, 10.30, 10.32];
        lasts
            .iter()
            .enumerate()
            .map(|(i, &last)| {
                let ts = start(8, 30) + Duration::minutes(5 * i as i64);
                let low = if i == 0 { 10.00 } else { last - 0.04 };
                let high = if i == 5 { 10.40 } else { last + 0.02 };
                record(ts, last - 0.03, high, low, last, 500)
            })
            .collect()
    }

    #[test]
    fn test_opening_only_session_matches_buy_day_conditions() {
        let config = AnalysisConfig::default();
        let bars = validator::validate_records(&opening_only_session(), &config).unwrap();
        assert_eq!(bars.len(), 8);

        let partition = session::partition(&bars, &config);
        let metrics = metrics::session_metrics(&partition.regular).unwrap();
        let windows = metrics::collect_window_metrics(&partition).unwrap();
        assert!((metrics.range - 0.40).abs() < 1e-9);
        assert_eq!(windows[&WindowKey::Opening].low_time, start(8, 30));

        let inputs = ScoringInputs { metrics: &metrics, windows: &windows, short_ma: &[], long_ma: &[] };
        let buy = patterns::standard_definitions(&config).remove(0);
        let outcomes: Vec<bool> = buy.rubric[..3]
            .iter()
            .map(|item| item.condition.evaluate(&inputs).unwrap())
            .collect();
        assert_eq!(outcomes, vec![true, true, true]);
        assert!(buy.is_match(&inputs).unwrap());
    }

    #[test]
    fn test_opening_only_session_cannot_be_fully_scored() {
        let result = analyze_records(&opening_only_session(), &AnalysisConfig::default());
        assert!(matches!(result, Err(EngineError::InsufficientData(msg)) if msg.contains("midDay")));
    }

    #[test]
    fn test_missing_mid_day_window_fails_scoring() {
        let mut rows = Vec::new();
        for i in 0..12 {
            rows.push(record(start(8, 30) + Duration::minutes(5 * i), 10.0, 10.5, 9.5, 10.2, 100));
        }
        for i in 0..18 {
            rows.push(record(start(13, 35) + Duration::minutes(5 * i), 10.0, 10.5, 9.5, 10.2, 100));
        }
        let result = analyze_records(&rows, &AnalysisConfig::default());
        assert!(matches!(result, Err(EngineError::InsufficientData(msg)) if msg.contains("midDay")));
    }

    #[test]
    fn test_too_few_bars() {
        let rows: Vec<RawBarRecord> = opening_only_session().into_iter().take(7).collect();
        let result = analyze_records(&rows, &AnalysisConfig::default());
        assert!(matches!(result, Err(EngineError::InsufficientData(msg)) if msg.contains("7 bars")));
    }

    #[test]
    fn test_no_regular_hours_bars() {
        let rows: Vec<RawBarRecord> = (0..10)
            .map(|i| record(start(16, 0) + Duration::minutes(5 * i), 10.0, 10.5, 9.5, 10.2, 100))
            .collect();
        let result = analyze_records(&rows, &AnalysisConfig::default());
        assert!(matches!(result, Err(EngineError::InsufficientData(_))));
    }

    #[test]
    fn test_volume_total_overflow_is_reported() {
        let rows: Vec<RawBarRecord> = (0..12)
            .map(|i| {
                let ts = start(8, 30) + Duration::minutes(5 * i);
                RawBarRecord::new(
                    &ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                    "10.0",
                    "10.5",
                    "9.5",
                    "10.2",
                    "18446744073709551615",
                )
            })
            .collect();
        let result = analyze_records(&rows, &AnalysisConfig::default());
        assert!(matches!(result, Err(EngineError::Overflow(msg)) if msg.contains("volume")));
    }

    #[test]
    fn test_short_session_without_long_average_fails() {
        // Every window populated but only 16 regular bars, so the 20-bar average is empty.
        let mut rows = Vec::new();
        for i in 0..10 {
            rows.push(record(start(8, 30) + Duration::minutes(5 * i), 10.0, 10.5, 9.5, 10.2, 100));
        }
        for i in 0..3 {
            rows.push(record(start(11, 0) + Duration::minutes(5 * i), 10.0, 10.5, 9.5, 10.2, 100));
            rows.push(record(start(14, 0) + Duration::minutes(5 * i), 10.0, 10.5, 9.5, 10.2, 100));
        }
        let result = analyze_records(&rows, &AnalysisConfig::default());
        assert!(matches!(result, Err(EngineError::InsufficientData(msg)) if msg.contains("long-term")));
    }
}
