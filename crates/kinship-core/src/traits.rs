//! Core traits for kinship store abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. The Postgres
//! implementations live in `kinship-db`; the in-memory test doubles live in
//! `kinship-jobs::test_fixtures`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CONTACT REPOSITORY
// =============================================================================

/// Read and update access to the contacts table.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Fetch a contact by ID.
    async fn fetch(&self, id: Uuid) -> Result<Contact>;

    /// Contacts whose `next_contact_due` falls in the half-open `[start, end)`.
    async fn due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Contact>>;

    /// Overwrite the AI suggestion fields after a successful batch attempt.
    ///
    /// A plain overwrite, not an increment, so racing runs stay idempotent.
    async fn set_suggestion(
        &self,
        id: Uuid,
        suggestion: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<()>;
}

// =============================================================================
// INTERACTION REPOSITORY
// =============================================================================

/// Read-only access to the interaction log.
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// The single most recent interaction for a contact, if any.
    async fn latest_for_contact(&self, contact_id: Uuid) -> Result<Option<Interaction>>;

    /// Up to `limit` most recent interactions, newest first.
    async fn recent_for_contact(&self, contact_id: Uuid, limit: i64) -> Result<Vec<Interaction>>;
}

// =============================================================================
// RECONCILIATION REPOSITORY
// =============================================================================

/// The writes applied to a contact that genuinely missed its due date.
#[derive(Debug, Clone)]
pub struct ApplyMissRequest {
    pub contact_id: Uuid,
    /// The already-incremented miss counter.
    pub missed_interactions: i32,
    /// The recomputed due date; also the new reminder's due date.
    pub next_contact_due: DateTime<Utc>,
    pub reminder: NewReminder,
}

/// Applies the miss outcome as one logical unit.
///
/// Contact update, reminder delete, and reminder insert either all land or
/// none do; a failure leaves the contact in its prior state for this run.
#[async_trait]
pub trait ReconciliationRepository: Send + Sync {
    async fn apply_miss(&self, req: ApplyMissRequest) -> Result<()>;
}

// =============================================================================
// PROCESSING LEDGER REPOSITORY
// =============================================================================

/// The per-contact-per-day idempotency and retry ledger.
///
/// Uniqueness of `(contact_id, processing_date)` is enforced at the store
/// level, which is what makes accidentally overlapping runs safe.
#[async_trait]
pub trait ProcessingLogRepository: Send + Sync {
    /// Fetch the row for a contact-day, creating it as `pending` when absent.
    async fn get_or_create(&self, contact_id: Uuid, date: NaiveDate)
        -> Result<ProcessingLogEntry>;

    /// Claim the row for an attempt: status `pending`, the given batch and
    /// retry count (bumped by the caller on a re-attempt).
    async fn mark_pending(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
        batch_id: Uuid,
        retry_count: i32,
    ) -> Result<()>;

    /// Terminal success for this contact-day.
    async fn mark_success(&self, contact_id: Uuid, date: NaiveDate) -> Result<()>;

    /// Record a failed attempt with its message.
    async fn mark_error(&self, contact_id: Uuid, date: NaiveDate, message: &str) -> Result<()>;

    /// Terminal exhaustion: the contact-day hit the ledger ceiling.
    async fn mark_exhausted(&self, contact_id: Uuid, date: NaiveDate, message: &str)
        -> Result<()>;

    /// All ledger statuses for one processing date, for the selector's
    /// already-handled filter.
    async fn statuses_for_date(&self, date: NaiveDate)
        -> Result<HashMap<Uuid, ProcessingStatus>>;
}

// =============================================================================
// SETTINGS REPOSITORY
// =============================================================================

/// Per-user preferences and billing state consumed by the pipeline.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// AI preferences for a user; defaults apply when the user has no row.
    async fn ai_preferences(&self, user_id: Uuid) -> Result<AiPreferences>;

    /// The user's subscription, if any.
    async fn subscription(&self, user_id: Uuid) -> Result<Option<Subscription>>;

    /// Configured timezones for all users, keyed by user ID.
    ///
    /// Pre-fetched once per run so reconciliation does not issue a settings
    /// query per contact.
    async fn timezones(&self) -> Result<HashMap<Uuid, String>>;
}
