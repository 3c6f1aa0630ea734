//! Batch processor: rate-limited, retryable, idempotent suggestion runs.
//!
//! Batches are strictly sequential; contacts within a batch run
//! concurrently, each staggered by a fixed offset so outbound calls are
//! paced rather than bursted. The processing ledger gates every contact:
//! read before dispatch, written before and after each attempt.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use kinship_core::defaults::{LEDGER_MAX_ATTEMPTS, RECENT_INTERACTIONS_LIMIT, RETRY_JITTER_MAX_MS};
use kinship_core::{
    Contact, ContactRepository, InteractionRepository, ProcessingLogRepository, ProcessingStatus,
    Result, SettingsRepository,
};
use kinship_inference::{build_suggestion_prompt, SuggestionBackend, UPSELL_SUGGESTION};

use crate::config::BatchConfig;
use crate::store::PipelineStore;

/// One contact's failure inside a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    /// `None` for a batch-level failure with no single contact to blame.
    pub contact_id: Option<Uuid>,
    pub error: String,
}

/// Outcome of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub processed_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<BatchError>,
}

/// Per-contact outcome, internal to the processor.
struct ContactOutcome {
    contact_id: Uuid,
    error: Option<String>,
    /// True when any attempt for this contact saw a rate-limit status,
    /// including attempts that later succeeded on retry.
    rate_limited: bool,
}

impl ContactOutcome {
    fn success(contact_id: Uuid, rate_limited: bool) -> Self {
        Self {
            contact_id,
            error: None,
            rate_limited,
        }
    }

    fn failure(contact_id: Uuid, error: String, rate_limited: bool) -> Self {
        Self {
            contact_id,
            error: Some(error),
            rate_limited,
        }
    }
}

/// Drives the day's suggestion batches.
pub struct BatchProcessor {
    store: PipelineStore,
    backend: Arc<dyn SuggestionBackend>,
    config: BatchConfig,
}

impl BatchProcessor {
    /// Create a new batch processor.
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

    /// Process the work list in fixed-size batches.
    ///
    /// Truncates the input to the per-run ceiling first, then runs batches
    /// strictly in order. Between batches the standard pause always applies;
    /// a batch that observed a rate-limit response earns one extra cooldown
    /// on top.
    pub async fn run(
        &self,
        mut contacts: Vec<Contact>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Vec<BatchResult> {
        if contacts.len() > self.config.max_contacts_per_run {
            info!(
                subsystem = "jobs",
                component = "batch",
                limit = self.config.max_contacts_per_run,
                dropped = contacts.len() - self.config.max_contacts_per_run,
                "Work list exceeds per-run ceiling, truncating"
            );
            contacts.truncate(self.config.max_contacts_per_run);
        }

        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<Vec<Contact>> =
            contacts.chunks(batch_size).map(|c| c.to_vec()).collect();
        let total = batches.len();
        let mut results = Vec::with_capacity(total);

        for (index, batch) in batches.into_iter().enumerate() {
            let batch_id = Uuid::new_v4();
            info!(
                subsystem = "jobs",
                component = "batch",
                op = "run",
                batch_id = %batch_id,
                result_count = batch.len(),
                "Processing batch {}/{}",
                index + 1,
                total
            );

            let (result, rate_limited) = self.process_batch(batch_id, &batch, date, now).await;
            results.push(result);

            if index + 1 < total {
                if rate_limited {
                    let cooldown = self.config.cooldown_delay();
                    warn!(
                        subsystem = "jobs",
                        component = "batch",
                        batch_id = %batch_id,
                        duration_ms = cooldown.as_millis() as u64,
                        "Rate limit observed in batch, cooling down before the next one"
                    );
                    sleep(cooldown).await;
                }
                sleep(self.config.delay_between_batches).await;
            }
        }

        results
    }

    /// Process one batch concurrently; the bool reports whether any attempt
    /// in the batch saw a rate-limit response.
    async fn process_batch(
        &self,
        batch_id: Uuid,
        batch: &[Contact],
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> (BatchResult, bool) {
        let tasks = batch.iter().enumerate().map(|(index, contact)| {
            let stagger = self.config.delay_between_contacts * index as u32;
            async move {
                if !stagger.is_zero() {
                    sleep(stagger).await;
                }
                self.process_contact(contact, batch_id, date, now).await
            }
        });

        let settled = futures::future::join_all(tasks).await;

        let mut rate_limited = false;
        let mut outcomes = Vec::with_capacity(settled.len());
        let mut batch_failure = None;
        for result in settled {
            match result {
                Ok(outcome) => {
                    rate_limited |= outcome.rate_limited;
                    outcomes.push(outcome);
                }
                Err(e) => batch_failure = Some(e),
            }
        }

        // A store failure while recording outcomes poisons the whole batch:
        // report it as one synthetic error rather than trusting partial counts.
        if let Some(e) = batch_failure {
            error!(
                subsystem = "jobs",
                component = "batch",
                batch_id = %batch_id,
                error = %e,
                "Batch failed wholesale"
            );
            return (
                BatchResult {
                    batch_id,
                    processed_count: 0,
                    success_count: 0,
                    error_count: 1,
                    errors: vec![BatchError {
                        contact_id: None,
                        error: e.to_string(),
                    }],
                },
                rate_limited,
            );
        }

        let errors: Vec<BatchError> = outcomes
            .iter()
            .filter_map(|o| {
                o.error.as_ref().map(|error| BatchError {
                    contact_id: Some(o.contact_id),
                    error: error.clone(),
                })
            })
            .collect();

        (
            BatchResult {
                batch_id,
                processed_count: outcomes.len(),
                success_count: outcomes.len() - errors.len(),
                error_count: errors.len(),
                errors,
            },
            rate_limited,
        )
    }

    /// Handle one contact behind the ledger gate.
    ///
    /// Suggestion failures become error outcomes; only a store failure while
    /// writing the ledger escapes as `Err` (and poisons the batch).
    async fn process_contact(
        &self,
        contact: &Contact,
        batch_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ContactOutcome> {
        let entry = self.store.processing_log.get_or_create(contact.id, date).await?;

        match entry.status {
            ProcessingStatus::Success => {
                debug!(
                    subsystem = "jobs",
                    component = "batch",
                    contact_id = %contact.id,
                    "Already succeeded today, skipping without a model call"
                );
                return Ok(ContactOutcome::success(contact.id, false));
            }
            ProcessingStatus::MaxRetriesExceeded => {
                return Ok(ContactOutcome::failure(
                    contact.id,
                    "max retries exceeded for today".to_string(),
                    false,
                ));
            }
            ProcessingStatus::Error if entry.retry_count >= LEDGER_MAX_ATTEMPTS => {
                self.store
                    .processing_log
                    .mark_exhausted(contact.id, date, "retry ceiling reached")
                    .await?;
                warn!(
                    subsystem = "jobs",
                    component = "batch",
                    contact_id = %contact.id,
                    retry_count = entry.retry_count,
                    "Contact hit the daily retry ceiling, skipping until tomorrow"
                );
                return Ok(ContactOutcome::failure(
                    contact.id,
                    "max retries exceeded for today".to_string(),
                    false,
                ));
            }
            ProcessingStatus::Error | ProcessingStatus::Pending => {
                self.store
                    .processing_log
                    .mark_pending(contact.id, date, batch_id, entry.retry_count + 1)
                    .await?;
            }
        }

        let (attempt, rate_limited) = self.attempt_with_retry(contact, now).await;
        match attempt {
            Ok(Some(suggestion)) => {
                self.store
                    .contacts
                    .set_suggestion(contact.id, &suggestion, now)
                    .await?;
                self.store.processing_log.mark_success(contact.id, date).await?;
                Ok(ContactOutcome::success(contact.id, rate_limited))
            }
            // Preference gate: nothing to write, but a settled contact-day.
            Ok(None) => {
                self.store.processing_log.mark_success(contact.id, date).await?;
                Ok(ContactOutcome::success(contact.id, rate_limited))
            }
            Err(message) => {
                self.store
                    .processing_log
                    .mark_error(contact.id, date, &message)
                    .await?;
                Ok(ContactOutcome::failure(contact.id, message, rate_limited))
            }
        }
    }

    /// One contact's suggestion attempt, with gates and in-run retries.
    ///
    /// `Ok(None)` means the user's preference disabled suggestions; the
    /// contact still settles as success with nothing written.
    async fn attempt_with_retry(
        &self,
        contact: &Contact,
        now: DateTime<Utc>,
    ) -> (std::result::Result<Option<String>, String>, bool) {
        let prefs = match self.store.settings.ai_preferences(contact.user_id).await {
            Ok(prefs) => prefs,
            Err(e) => return (Err(format!("failed to load preferences: {e}")), false),
        };
        if !prefs.ai_suggestions_enabled {
            debug!(
                subsystem = "jobs",
                component = "batch",
                contact_id = %contact.id,
                "AI suggestions disabled for user, skipping model call"
            );
            return (Ok(None), false);
        }

        let premium = match self.store.settings.subscription(contact.user_id).await {
            Ok(subscription) => subscription.map(|s| s.is_premium_at(now)).unwrap_or(false),
            Err(e) => return (Err(format!("failed to load subscription: {e}")), false),
        };
        if !premium {
            return (Ok(Some(UPSELL_SUGGESTION.to_string())), false);
        }

        let recent = match self
            .store
            .interactions
            .recent_for_contact(contact.id, RECENT_INTERACTIONS_LIMIT)
            .await
        {
            Ok(recent) => recent,
            Err(e) => return (Err(format!("failed to load interactions: {e}")), false),
        };
        let prompt = build_suggestion_prompt(contact, &recent, now);

        let mut rate_limited = false;
        let mut attempt = 1u32;
        loop {
            match self.backend.generate(&prompt).await {
                Ok(text) => return (Ok(Some(text)), rate_limited),
                Err(err) => {
                    if self.config.is_rate_limit(err.status) {
                        rate_limited = true;
                    }
                    if !err.is_transient() || attempt >= self.config.retry_attempts {
                        return (Err(err.to_string()), rate_limited);
                    }
                    let delay = self.config.backoff_delay(attempt) + jitter();
                    warn!(
                        subsystem = "jobs",
                        component = "batch",
                        contact_id = %contact.id,
                        attempt,
                        duration_ms = delay.as_millis() as u64,
                        error = %err,
                        "Attempt failed, retrying after backoff"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Random jitter so simultaneous retries do not land together.
fn jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..=RETRY_JITTER_MAX_MS))
}
