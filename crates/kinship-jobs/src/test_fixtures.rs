//! In-memory store fixtures for pipeline tests.
//!
//! Implements every repository trait over plain maps behind one mutex, with
//! inspection helpers the Postgres layer does not need. Always compiled so
//! integration tests (in `tests/`) can use it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use kinship_core::{
    AiPreferences, ApplyMissRequest, Contact, ContactRepository, Error, Interaction,
    InteractionRepository, ProcessingLogEntry, ProcessingLogRepository, ProcessingStatus,
    ReconciliationRepository, Reminder, Result, SettingsRepository, Subscription,
};

use crate::store::PipelineStore;

#[derive(Default)]
struct Tables {
    contacts: HashMap<Uuid, Contact>,
    interactions: Vec<Interaction>,
    reminders: Vec<Reminder>,
    ledger: HashMap<(Uuid, NaiveDate), ProcessingLogEntry>,
    preferences: HashMap<Uuid, AiPreferences>,
    subscriptions: HashMap<Uuid, Subscription>,
}

/// In-memory stand-in for the Postgres store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_ledger_writes: Arc<AtomicBool>,
    fail_reconciliation: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle this store as the pipeline's repository surface.
    pub fn pipeline_store(&self) -> PipelineStore {
        PipelineStore {
            contacts: Arc::new(self.clone()),
            interactions: Arc::new(self.clone()),
            reconciliation: Arc::new(self.clone()),
            processing_log: Arc::new(self.clone()),
            settings: Arc::new(self.clone()),
        }
    }

    /// Make every ledger write fail, to exercise batch-level error paths.
    pub fn fail_ledger_writes(&self, fail: bool) {
        self.fail_ledger_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `apply_miss` fail, to exercise reconciliation error isolation.
    pub fn fail_reconciliation(&self, fail: bool) {
        self.fail_reconciliation.store(fail, Ordering::SeqCst);
    }

    pub fn insert_contact(&self, contact: Contact) {
        self.tables
            .lock()
            .unwrap()
            .contacts
            .insert(contact.id, contact);
    }

    pub fn contact(&self, id: Uuid) -> Option<Contact> {
        self.tables.lock().unwrap().contacts.get(&id).cloned()
    }

    pub fn add_interaction(&self, interaction: Interaction) {
        self.tables.lock().unwrap().interactions.push(interaction);
    }

    pub fn insert_reminder(&self, reminder: Reminder) {
        self.tables.lock().unwrap().reminders.push(reminder);
    }

    pub fn reminders_for(&self, contact_id: Uuid) -> Vec<Reminder> {
        self.tables
            .lock()
            .unwrap()
            .reminders
            .iter()
            .filter(|r| r.contact_id == contact_id)
            .cloned()
            .collect()
    }

    pub fn ledger_entry(&self, contact_id: Uuid, date: NaiveDate) -> Option<ProcessingLogEntry> {
        self.tables
            .lock()
            .unwrap()
            .ledger
            .get(&(contact_id, date))
            .cloned()
    }

    pub fn set_preferences(&self, user_id: Uuid, prefs: AiPreferences) {
        self.tables.lock().unwrap().preferences.insert(user_id, prefs);
    }

    pub fn set_subscription(&self, user_id: Uuid, subscription: Subscription) {
        self.tables
            .lock()
            .unwrap()
            .subscriptions
            .insert(user_id, subscription);
    }

    fn ledger_write_guard(&self) -> Result<()> {
        if self.fail_ledger_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal("ledger writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn fetch(&self, id: Uuid) -> Result<Contact> {
        self.contact(id).ok_or(Error::ContactNotFound(id))
    }

    async fn due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Contact>> {
        let mut due: Vec<Contact> = self
            .tables
            .lock()
            .unwrap()
            .contacts
            .values()
            .filter(|c| c.next_contact_due >= start && c.next_contact_due < end)
            .cloned()
            .collect();
        due.sort_by_key(|c| c.next_contact_due);
        Ok(due)
    }

    async fn set_suggestion(
        &self,
        id: Uuid,
        suggestion: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let contact = tables
            .contacts
            .get_mut(&id)
            .ok_or(Error::ContactNotFound(id))?;
        contact.ai_last_suggestion = Some(suggestion.to_string());
        contact.ai_last_suggestion_date = Some(generated_at);
        Ok(())
    }
}

#[async_trait]
impl InteractionRepository for MemoryStore {
    async fn latest_for_contact(&self, contact_id: Uuid) -> Result<Option<Interaction>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .interactions
            .iter()
            .filter(|i| i.contact_id == contact_id)
            .max_by_key(|i| i.date)
            .cloned())
    }

    async fn recent_for_contact(&self, contact_id: Uuid, limit: i64) -> Result<Vec<Interaction>> {
        let mut recent: Vec<Interaction> = self
            .tables
            .lock()
            .unwrap()
            .interactions
            .iter()
            .filter(|i| i.contact_id == contact_id)
            .cloned()
            .collect();
        recent.sort_by_key(|i| std::cmp::Reverse(i.date));
        recent.truncate(limit.max(0) as usize);
        Ok(recent)
    }
}

#[async_trait]
impl ReconciliationRepository for MemoryStore {
    async fn apply_miss(&self, req: ApplyMissRequest) -> Result<()> {
        if self.fail_reconciliation.load(Ordering::SeqCst) {
            return Err(Error::Internal("reconciliation writes disabled".to_string()));
        }

        let mut tables = self.tables.lock().unwrap();
        let contact = tables
            .contacts
            .get_mut(&req.contact_id)
            .ok_or(Error::ContactNotFound(req.contact_id))?;
        contact.missed_interactions = req.missed_interactions;
        contact.next_contact_due = req.next_contact_due;

        tables.reminders.retain(|r| r.contact_id != req.contact_id);
        tables.reminders.push(Reminder {
            id: Uuid::new_v4(),
            contact_id: req.reminder.contact_id,
            user_id: req.reminder.user_id,
            kind: req.reminder.kind,
            due_date: req.reminder.due_date,
            description: req.reminder.description.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl ProcessingLogRepository for MemoryStore {
    async fn get_or_create(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
    ) -> Result<ProcessingLogEntry> {
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .ledger
            .entry((contact_id, date))
            .or_insert_with(|| ProcessingLogEntry {
                contact_id,
                processing_date: date,
                batch_id: None,
                status: ProcessingStatus::Pending,
                retry_count: 0,
                last_error: None,
            });
        Ok(entry.clone())
    }

    async fn mark_pending(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
        batch_id: Uuid,
        retry_count: i32,
    ) -> Result<()> {
        self.ledger_write_guard()?;
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .ledger
            .get_mut(&(contact_id, date))
            .ok_or_else(|| Error::NotFound(format!("ledger entry for {contact_id}")))?;
        entry.status = ProcessingStatus::Pending;
        entry.batch_id = Some(batch_id);
        entry.retry_count = retry_count;
        Ok(())
    }

    async fn mark_success(&self, contact_id: Uuid, date: NaiveDate) -> Result<()> {
        self.ledger_write_guard()?;
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .ledger
            .get_mut(&(contact_id, date))
            .ok_or_else(|| Error::NotFound(format!("ledger entry for {contact_id}")))?;
        entry.status = ProcessingStatus::Success;
        Ok(())
    }

    async fn mark_error(&self, contact_id: Uuid, date: NaiveDate, message: &str) -> Result<()> {
        self.ledger_write_guard()?;
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .ledger
            .get_mut(&(contact_id, date))
            .ok_or_else(|| Error::NotFound(format!("ledger entry for {contact_id}")))?;
        entry.status = ProcessingStatus::Error;
        entry.last_error = Some(message.to_string());
        Ok(())
    }

    async fn mark_exhausted(
        &self,
        contact_id: Uuid,
        date: NaiveDate,
        message: &str,
    ) -> Result<()> {
        self.ledger_write_guard()?;
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .ledger
            .get_mut(&(contact_id, date))
            .ok_or_else(|| Error::NotFound(format!("ledger entry for {contact_id}")))?;
        entry.status = ProcessingStatus::MaxRetriesExceeded;
        entry.last_error = Some(message.to_string());
        Ok(())
    }

    async fn statuses_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<HashMap<Uuid, ProcessingStatus>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .ledger
            .iter()
            .filter(|((_, d), _)| *d == date)
            .map(|((contact_id, _), entry)| (*contact_id, entry.status))
            .collect())
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn ai_preferences(&self, user_id: Uuid) -> Result<AiPreferences> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .preferences
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn subscription(&self, user_id: Uuid) -> Result<Option<Subscription>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .subscriptions
            .get(&user_id)
            .cloned())
    }

    async fn timezones(&self) -> Result<HashMap<Uuid, String>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .preferences
            .iter()
            .filter_map(|(user_id, prefs)| prefs.timezone.clone().map(|tz| (*user_id, tz)))
            .collect())
    }
}

/// Build a contact with sensible defaults for tests.
pub fn contact_fixture(user_id: Uuid, next_contact_due: DateTime<Utc>) -> Contact {
    Contact {
        id: Uuid::new_v4(),
        user_id,
        name: "Test Contact".to_string(),
        notes: None,
        relationship_level: 3,
        contact_frequency: Some(kinship_core::ContactFrequency::Weekly),
        preferred_contact_method: None,
        missed_interactions: 0,
        last_contacted: None,
        next_contact_due,
        ai_last_suggestion: None,
        ai_last_suggestion_date: None,
    }
}

/// A premium subscription valid for a year past `now`.
pub fn premium_fixture(now: DateTime<Utc>) -> Subscription {
    Subscription {
        plan: kinship_core::PlanTier::Premium,
        valid_until: Some(now + chrono::Duration::days(365)),
    }
}
