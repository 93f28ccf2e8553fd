// Engine library root
// Taylor session pattern analysis: ingestion, validation, windowing, scoring and planning.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod services;

pub use analysis::{analyze_bars, analyze_records};
pub use config::AnalysisConfig;
pub use error::EngineError;
