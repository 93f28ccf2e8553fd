// Handler for analyzing a quote CSV file on disk
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::analyze_batch::handle_analyze_batch;
use crate::config::AnalysisConfig;
use crate::data::analysis_store::{AnalysisStore, SessionReport};
use crate::data::csv_parser::QuoteCsvParser;
use crate::error::EngineError;

pub async fn handle_analyze_csv(
    batch_id: Uuid,
    file_path: &Path,
    config: &AnalysisConfig,
    store: Arc<RwLock<AnalysisStore>>,
) -> Result<SessionReport, EngineError> {
    let owned_path = file_path.to_path_buf();
    let records = tokio::task::spawn_blocking(move || QuoteCsvParser::load_records_from_csv(owned_path))
        .await
        .map_err(|e| EngineError::IoError {
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?;

    let records = match records {
        Ok(records) => records,
        Err(e) => {
            store.write().await.record_rejection();
            tracing::error!(batch_id = %batch_id, path = %file_path.display(), error = %e, "Failed to read quote CSV");
            return Err(e);
        }
    };
    handle_analyze_batch(batch_id, &records, config, store).await
}
