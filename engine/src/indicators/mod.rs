// Technical indicators module
pub mod sma;

pub use sma::Sma;

use serde_json::Value;
use shared::models::PriceBar;

// Common trait for indicators computed over a batch of bars
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this indicator instance
    fn calculate(&self, data: &[PriceBar]) -> Vec<f64>; // Only positions with a full window produce a value
}
