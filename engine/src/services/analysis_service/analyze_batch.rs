// Handler for one uploaded batch of raw records
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::analysis::{self, trade_plan};
use crate::config::AnalysisConfig;
use crate::data::analysis_store::{AnalysisStore, SessionReport};
use crate::error::EngineError;
use shared::models::RawBarRecord;

/// Runs the engine over `records`. Only a complete report reaches the store;
/// on failure the previous report stays live and the error is returned.
pub async fn handle_analyze_batch(
    batch_id: Uuid,
    records: &[RawBarRecord],
    config: &AnalysisConfig,
    store: Arc<RwLock<AnalysisStore>>,
) -> Result<SessionReport, EngineError> {
    let outcome = analysis::analyze_records(records, config).and_then(|analysis| {
        let trade_plan = trade_plan::generate_trade_plan(&analysis, config)?;
        Ok(SessionReport { batch_id, analysis, trade_plan })
    });

    let mut store = store.write().await;
    match outcome {
        Ok(report) => {
            let previous = store.replace(report.clone());
            tracing::info!(
                batch_id = %batch_id,
                setup = %report.trade_plan.setup,
                replaced = ?previous.map(|p| p.batch_id),
                "Batch analyzed, report is now live"
            );
            Ok(report)
        }
        Err(e) => {
            store.record_rejection();
            tracing::warn!(
                batch_id = %batch_id,
                kind = e.kind(),
                error = %e,
                kept = ?store.current().map(|r| r.batch_id),
                "Batch rejected, keeping previous report"
            );
            Err(e)
        }
    }
}
