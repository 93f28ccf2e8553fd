// engine/src/services/analysis_service/mod.rs
// AnalysisService owns the live report and dispatches uploads to the handlers below.

use crate::config::AnalysisConfig;
use crate::data::analysis_store::{AnalysisStore, SessionReport};
use crate::error::EngineError;
use shared::models::RawBarRecord;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub mod analyze_batch;
pub mod analyze_csv;

pub struct AnalysisService {
    config: AnalysisConfig,
    store: Arc<RwLock<AnalysisStore>>,
}

impl AnalysisService {
    pub fn new(config: AnalysisConfig, store: Arc<RwLock<AnalysisStore>>) -> Self {
        AnalysisService { config, store }
    }

    pub async fn analyze_records(&self, records: Vec<RawBarRecord>) -> Result<SessionReport, EngineError> {
        let batch_id = Uuid::new_v4();
        tracing::info!(batch_id = %batch_id, rows = records.len(), "Received record batch");
        analyze_batch::handle_analyze_batch(batch_id, &records, &self.config, self.store.clone()).await
    }

    pub async fn analyze_csv<P: AsRef<Path>>(&self, file_path: P) -> Result<SessionReport, EngineError> {
        let batch_id = Uuid::new_v4();
        tracing::info!(batch_id = %batch_id, path = %file_path.as_ref().display(), "Received CSV upload");
        analyze_csv::handle_analyze_csv(batch_id, file_path.as_ref(), &self.config, self.store.clone()).await
    }

    /// The report from the most recent successful batch, if any.
    pub async fn current_report(&self) -> Option<SessionReport> {
        self.store.read().await.current().cloned()
    }
}
