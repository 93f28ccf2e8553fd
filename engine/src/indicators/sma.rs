// Simple Moving Average (SMA) over the bars' last price
use super::IndicatorCalculator;
use crate::error::EngineError;
use serde_json::Value;
use shared::models::PriceBar;

#[derive(Debug, Clone)]
pub struct Sma {
    name: String,
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, EngineError> {
        if period == 0 {
            return Err(EngineError::ConfigError("SMA period must be greater than 0".to_string()));
        }
        Ok(Self {
            name: format!("SMA({})", period),
            period,
        })
    }
}

impl IndicatorCalculator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    /// One mean per full window, sliding one bar at a time: `len - period + 1` values,
    /// or none when there are fewer bars than the period.
    fn calculate(&self, data: &[PriceBar]) -> Vec<f64> {
        data.windows(self.period)
            .map(|window| window.iter().map(|bar| bar.last).sum::<f64>() / self.period as f64)
            .collect()
    }
}
