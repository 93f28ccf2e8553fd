pub mod settings;

pub use settings::AnalysisConfig;
