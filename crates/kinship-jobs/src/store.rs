//! Repository bundle the pipeline runs against.

use std::sync::Arc;

use kinship_core::{
    ContactRepository, InteractionRepository, ProcessingLogRepository, ReconciliationRepository,
    SettingsRepository,
};
use kinship_db::Database;

/// The store surface consumed by every pipeline stage.
///
/// Trait objects so tests can substitute the in-memory fixtures for the
/// Postgres repositories without touching pipeline code.
#[derive(Clone)]
pub struct PipelineStore {
    pub contacts: Arc<dyn ContactRepository>,
    pub interactions: Arc<dyn InteractionRepository>,
    pub reconciliation: Arc<dyn ReconciliationRepository>,
    pub processing_log: Arc<dyn ProcessingLogRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl PipelineStore {
    /// Wire the store from a connected database.
    pub fn from_database(db: &Database) -> Self {
        Self {
            contacts: Arc::new(db.contacts.clone()),
            interactions: Arc::new(db.interactions.clone()),
            reconciliation: Arc::new(db.reconciliation.clone()),
            processing_log: Arc::new(db.processing_log.clone()),
            settings: Arc::new(db.settings.clone()),
        }
    }
}
