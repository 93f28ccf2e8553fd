// Service layer: owns the live analysis report and feeds uploaded batches to the engine.
pub mod analysis_service;

pub use analysis_service::AnalysisService;
