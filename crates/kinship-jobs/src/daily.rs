//! The daily run orchestrator: reconcile, select, batch-process, summarize.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::info;

use kinship_core::{processing_date, Result};
use kinship_inference::SuggestionBackend;

use crate::batch::{BatchProcessor, BatchResult};
use crate::config::BatchConfig;
use crate::reconcile::{reconcile_missed, ReconcileSummary};
use crate::selector::select_due_soon;
use crate::store::PipelineStore;

/// Structured summary of one pipeline invocation, for logging and the
/// scheduler's exit report.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub message: String,
    /// Contacts due within the 24-hour window.
    pub contacts_found: usize,
    /// Contacts left after the ledger's idempotency filter.
    pub unprocessed: usize,
    pub batches_processed: usize,
    pub total_processed: usize,
    pub total_success: usize,
    pub total_errors: usize,
    pub reconcile: ReconcileSummary,
    pub results: Vec<BatchResult>,
}

impl RunSummary {
    fn nothing_to_do(message: &str, contacts_found: usize, reconcile: ReconcileSummary) -> Self {
        Self {
            message: message.to_string(),
            contacts_found,
            unprocessed: 0,
            batches_processed: 0,
            total_processed: 0,
            total_success: 0,
            total_errors: 0,
            reconcile,
            results: Vec::new(),
        }
    }
}

/// The whole daily pipeline, wired once and triggered by the scheduler.
pub struct DailyCheck {
    store: PipelineStore,
    backend: Arc<dyn SuggestionBackend>,
    config: BatchConfig,
}

impl DailyCheck {
    /// Create a new daily check over the given store and backend.
    pub fn new(
        store: PipelineStore,
        backend: Arc<dyn SuggestionBackend>,
        config: BatchConfig,
    ) -> Self {
        Self {
            store,
            backend,
            config,
        }
    }

    /// Run the pipeline once, anchored at `reference`.
    ///
    /// Reconciliation mutates contact state first, so the selector reads a
    /// consistent contact set. An empty work list is a normal outcome, not
    /// an error.
    pub async fn run(&self, reference: DateTime<Utc>) -> Result<RunSummary> {
        let started = Instant::now();
        let date = processing_date(reference, Tz::UTC);

        info!(
            subsystem = "jobs",
            component = "daily",
            op = "run",
            run_date = %date,
            "Starting daily check"
        );

        let reconcile = reconcile_missed(&self.store, reference).await?;

        let selection = select_due_soon(&self.store, reference, date).await?;
        if selection.candidates == 0 {
            return Ok(RunSummary::nothing_to_do(
                "No contacts need attention",
                0,
                reconcile,
            ));
        }
        if selection.is_empty() {
            return Ok(RunSummary::nothing_to_do(
                "No unprocessed contacts need attention",
                selection.candidates,
                reconcile,
            ));
        }

        let unprocessed = selection.eligible.len();
        let processor = BatchProcessor::new(
            self.store.clone(),
            self.backend.clone(),
            self.config.clone(),
        );
        let results = processor.run(selection.eligible, date, reference).await;

        let summary = RunSummary {
            message: "Daily check completed".to_string(),
            contacts_found: selection.candidates,
            unprocessed,
            batches_processed: results.len(),
            total_processed: results.iter().map(|r| r.processed_count).sum(),
            total_success: results.iter().map(|r| r.success_count).sum(),
            total_errors: results.iter().map(|r| r.error_count).sum(),
            reconcile,
            results,
        };

        info!(
            subsystem = "jobs",
            component = "daily",
            op = "run",
            run_date = %date,
            duration_ms = started.elapsed().as_millis() as u64,
            contacts_found = summary.contacts_found,
            total_success = summary.total_success,
            total_errors = summary.total_errors,
            "Daily check complete"
        );
        Ok(summary)
    }
}
