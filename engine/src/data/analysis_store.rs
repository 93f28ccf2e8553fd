// Holds the one live analysis report; a new report replaces it wholesale.
use serde::Serialize;
use shared::models::{AnalysisResult, TradePlan};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub batch_id: Uuid,
    pub analysis: AnalysisResult,
    pub trade_plan: TradePlan,
}

#[derive(Debug, Default)]
pub struct AnalysisStore {
    current: Option<SessionReport>,
    batches_accepted: u64,
    batches_rejected: u64,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `report` as the live one and hands back whatever it displaced.
    pub fn replace(&mut self, report: SessionReport) -> Option<SessionReport> {
        self.batches_accepted += 1;
        self.current.replace(report)
    }

    /// A rejected batch is counted but leaves the live report untouched.
    pub fn record_rejection(&mut self) {
        self.batches_rejected += 1;
    }

    pub fn current(&self) -> Option<&SessionReport> {
        self.current.as_ref()
    }

    pub fn batches_accepted(&self) -> u64 {
        self.batches_accepted
    }

    pub fn batches_rejected(&self) -> u64 {
        self.batches_rejected
    }
}
