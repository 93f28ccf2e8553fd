// Analysis settings: every constant the pipeline depends on, loadable from JSON.
use crate::error::EngineError;
use chrono::NaiveTime;
use serde::Deserialize;
use shared::models::{TimeWindow, WindowKey};
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub regular_hours: SessionHours,
    pub windows: Vec<TimeWindow>,
    pub cadence: CadenceSettings,
    /// Fewest validated bars an analysis will run on.
    pub min_bars: usize,
    /// Time-column substrings that mark export header/footer lines.
    pub artifact_markers: Vec<String>,
    pub moving_averages: MovingAverageSettings,
    pub scoring: ScoringWeights,
    pub range_fractions: RangeFractions,
    pub plan_offsets: PlanOffsets,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SessionHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CadenceSettings {
    pub expected_minutes: u32,
    pub sample_size: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct MovingAverageSettings {
    pub short_period: usize,
    pub long_period: usize,
}

/// Points awarded per satisfied rubric condition. The rubric lines can add up to
/// more than `max_confidence`; the reported confidence is clamped to it.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub extreme_placement: u32,
    pub open_to_close: u32,
    pub close_in_range: u32,
    pub volume_shift: u32,
    pub trend: u32,
    #[serde(default = "default_max_confidence")]
    pub max_confidence: u32,
}

const CONFIDENCE_STEP: u32 = 10;

fn default_max_confidence() -> u32 {
    100
}

impl ScoringWeights {
    pub fn points(&self) -> [u32; 5] {
        [self.extreme_placement, self.open_to_close, self.close_in_range, self.volume_shift, self.trend]
    }

    /// Confidence stays a multiple of ten within 0..=100 and the cap can be reached.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_confidence == 0 || self.max_confidence > 100 || self.max_confidence % CONFIDENCE_STEP != 0 {
            return Err(EngineError::ConfigError(format!(
                "max_confidence must be a multiple of {} between {} and 100, got {}",
                CONFIDENCE_STEP, CONFIDENCE_STEP, self.max_confidence
            )));
        }
        if let Some(points) = self.points().into_iter().find(|p| p % CONFIDENCE_STEP != 0) {
            return Err(EngineError::ConfigError(format!(
                "rubric weights must be multiples of {}, got {}",
                CONFIDENCE_STEP, points
            )));
        }
        let total: u32 = self.points().iter().sum();
        if total < self.max_confidence {
            return Err(EngineError::ConfigError(format!(
                "rubric weights total {} and can never reach max_confidence {}",
                total, self.max_confidence
            )));
        }
        Ok(())
    }
}

/// Fraction of the session range below the high that a close is measured against.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RangeFractions {
    pub buy_day: f64,
    pub sell_day: f64,
    pub short_sale_day: f64,
}

/// Range multipliers used to place entry zones and stops.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct PlanOffsets {
    pub near: f64,
    pub mid: f64,
    pub far: f64,
}

fn clock(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            regular_hours: SessionHours { start: clock(8, 30), end: clock(15, 0) },
            windows: vec![
                TimeWindow::new(WindowKey::Opening, "Opening Hour", clock(8, 30), clock(9, 30)),
                TimeWindow::new(WindowKey::MidDay, "Mid-Day", clock(9, 30), clock(13, 30)),
                TimeWindow::new(WindowKey::Closing, "Closing Hour", clock(13, 30), clock(15, 0)),
            ],
            cadence: CadenceSettings { expected_minutes: 5, sample_size: 10 },
            min_bars: 8,
            artifact_markers: vec!["Downloaded from".to_string()],
            moving_averages: MovingAverageSettings { short_period: 5, long_period: 20 },
            scoring: ScoringWeights {
                extreme_placement: 40,
                open_to_close: 20,
                close_in_range: 20,
                volume_shift: 20,
                trend: 10,
                max_confidence: default_max_confidence(),
            },
            range_fractions: RangeFractions { buy_day: 0.3, sell_day: 0.5, short_sale_day: 0.7 },
            plan_offsets: PlanOffsets { near: 0.01, mid: 0.02, far: 0.03 },
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: AnalysisConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::ConfigError(format!("Invalid analysis config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.as_ref().display(), "Loaded analysis config");
        Ok(config)
    }

    pub fn window(&self, key: WindowKey) -> Option<&TimeWindow> {
        self.windows.iter().find(|w| w.key == key)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.regular_hours.start > self.regular_hours.end {
            return Err(EngineError::ConfigError("regular hours start after they end".to_string()));
        }
        for key in [WindowKey::Opening, WindowKey::MidDay, WindowKey::Closing] {
            let count = self.windows.iter().filter(|w| w.key == key).count();
            if count != 1 {
                return Err(EngineError::ConfigError(format!(
                    "window '{}' must be defined exactly once, found {}",
                    key, count
                )));
            }
        }
        if let Some(w) = self.windows.iter().find(|w| w.start > w.end) {
            return Err(EngineError::ConfigError(format!("window '{}' starts after it ends", w.key)));
        }
        if self.cadence.expected_minutes == 0 || self.cadence.sample_size < 2 {
            return Err(EngineError::ConfigError(
                "cadence needs a positive interval and a sample of at least two bars".to_string(),
            ));
        }
        if self.moving_averages.short_period == 0 || self.moving_averages.long_period == 0 {
            return Err(EngineError::ConfigError("moving average periods must be greater than 0".to_string()));
        }
        self.scoring.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window(WindowKey::MidDay).unwrap().name, "Mid-Day");
        assert_eq!(config.moving_averages.long_period, 20);
    }

    #[test]
    fn test_partial_json_overrides_defaults() {
        let config = AnalysisConfig::from_json_str(
            r#"{ "moving_averages": { "short_period": 3, "long_period": 8 }, "min_bars": 4 }"#,
        )
        .unwrap();
        assert_eq!(config.moving_averages.short_period, 3);
        assert_eq!(config.min_bars, 4);
        assert_eq!(config.scoring.extreme_placement, 40);
        assert_eq!(config.windows.len(), 3);
    }

    #[test]
    fn test_zero_period_rejected() {
        let result = AnalysisConfig::from_json_str(
            r#"{ "moving_averages": { "short_period": 0, "long_period": 20 } }"#,
        );
        assert!(matches!(result, Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_default_weights_exceed_cap() {
        let scoring = AnalysisConfig::default().scoring;
        assert_eq!(scoring.points().iter().sum::<u32>(), 110);
        assert_eq!(scoring.max_confidence, 100);
    }

    #[test]
    fn test_scoring_override_keeps_default_cap() {
        let config = AnalysisConfig::from_json_str(
            r#"{ "scoring": { "extreme_placement": 50, "open_to_close": 20, "close_in_range": 20,
                 "volume_shift": 10, "trend": 0 } }"#,
        )
        .unwrap();
        assert_eq!(config.scoring.max_confidence, 100);
    }

    #[test]
    fn test_unreachable_or_off_grid_weights_rejected() {
        let mut config = AnalysisConfig::default();
        config.scoring.trend = 5;
        assert!(matches!(config.validate(), Err(EngineError::ConfigError(msg)) if msg.contains("multiples")));

        let mut config = AnalysisConfig::default();
        config.scoring.extreme_placement = 20;
        config.scoring.trend = 0;
        assert!(matches!(config.validate(), Err(EngineError::ConfigError(msg)) if msg.contains("never reach")));

        for cap in [0, 95, 110] {
            let mut config = AnalysisConfig::default();
            config.scoring.max_confidence = cap;
            assert!(matches!(config.validate(), Err(EngineError::ConfigError(_))));
        }
    }

    #[test]
    fn test_duplicate_window_rejected() {
        let mut config = AnalysisConfig::default();
        config.windows[2].key = WindowKey::Opening;
        assert!(matches!(config.validate(), Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "cadence": {{ "expected_minutes": 1, "sample_size": 10 }} }}"#).unwrap();
        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.cadence.expected_minutes, 1);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = AnalysisConfig::load("definitely/not/here.json");
        assert!(matches!(result, Err(EngineError::IoError { .. })));
    }
}
