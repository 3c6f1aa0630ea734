//! Due-soon selector: the candidate set for today's batch run.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use kinship_core::{next_24h, Contact, ContactRepository, ProcessingLogRepository, Result};

use crate::store::PipelineStore;

/// Outcome of the selection step.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Contacts whose due date fell inside the 24-hour window.
    pub candidates: usize,
    /// Candidates minus those the ledger already settled for `date`.
    pub eligible: Vec<Contact>,
}

impl Selection {
    /// A normal, non-error "nothing to do" outcome.
    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }
}

/// Contacts due within 24 hours of `reference` that the ledger has not
/// already settled (success or exhaustion) for the processing date.
///
/// The window is an absolute half-open interval starting at `reference`,
/// which sidesteps timezone drift around midnight boundaries.
pub async fn select_due_soon(
    store: &PipelineStore,
    reference: DateTime<Utc>,
    date: NaiveDate,
) -> Result<Selection> {
    let (start, end) = next_24h(reference);
    let contacts = store.contacts.due_between(start, end).await?;
    let candidates = contacts.len();

    let statuses = store.processing_log.statuses_for_date(date).await?;
    let eligible: Vec<Contact> = contacts
        .into_iter()
        .filter(|contact| {
            let settled = statuses
                .get(&contact.id)
                .map(|status| status.is_terminal())
                .unwrap_or(false);
            if settled {
                debug!(
                    subsystem = "jobs",
                    component = "selector",
                    contact_id = %contact.id,
                    "Contact already settled for today, dropping"
                );
            }
            !settled
        })
        .collect();

    info!(
        subsystem = "jobs",
        component = "selector",
        op = "select",
        run_date = %date,
        result_count = eligible.len(),
        candidates,
        "Selected contacts due in the next 24h"
    );
    Ok(Selection {
        candidates,
        eligible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{contact_fixture, MemoryStore};
    use chrono::Duration;
    use kinship_core::ProcessingLogRepository;
    use uuid::Uuid;

    fn reference() -> DateTime<Utc> {
        "2026-03-05T08:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn selects_only_contacts_inside_the_window() {
        let memory = MemoryStore::new();
        let user = Uuid::new_v4();
        let now = reference();

        let due_soon = contact_fixture(user, now + Duration::hours(3));
        let due_at_edge = contact_fixture(user, now + Duration::hours(24));
        let due_later = contact_fixture(user, now + Duration::days(3));
        let already_due = contact_fixture(user, now - Duration::hours(1));
        let in_id = due_soon.id;
        for c in [due_soon, due_at_edge, due_later, already_due] {
            memory.insert_contact(c);
        }

        let selection = select_due_soon(&memory.pipeline_store(), now, now.date_naive())
            .await
            .unwrap();

        assert_eq!(selection.candidates, 1);
        assert_eq!(selection.eligible.len(), 1);
        assert_eq!(selection.eligible[0].id, in_id);
    }

    #[tokio::test]
    async fn drops_contacts_settled_in_the_ledger() {
        let memory = MemoryStore::new();
        let store = memory.pipeline_store();
        let user = Uuid::new_v4();
        let now = reference();
        let date = now.date_naive();

        let succeeded = contact_fixture(user, now + Duration::hours(1));
        let exhausted = contact_fixture(user, now + Duration::hours(2));
        let errored = contact_fixture(user, now + Duration::hours(3));
        let fresh = contact_fixture(user, now + Duration::hours(4));

        for c in [&succeeded, &exhausted, &errored, &fresh] {
            memory.insert_contact(c.clone());
        }

        store.processing_log.get_or_create(succeeded.id, date).await.unwrap();
        store.processing_log.mark_success(succeeded.id, date).await.unwrap();
        store.processing_log.get_or_create(exhausted.id, date).await.unwrap();
        store
            .processing_log
            .mark_exhausted(exhausted.id, date, "ceiling")
            .await
            .unwrap();
        store.processing_log.get_or_create(errored.id, date).await.unwrap();
        store
            .processing_log
            .mark_error(errored.id, date, "boom")
            .await
            .unwrap();

        let selection = select_due_soon(&store, now, date).await.unwrap();

        assert_eq!(selection.candidates, 4);
        let ids: Vec<Uuid> = selection.eligible.iter().map(|c| c.id).collect();
        // Errored rows below the ceiling stay eligible for retry.
        assert!(ids.contains(&errored.id));
        assert!(ids.contains(&fresh.id));
        assert!(!ids.contains(&succeeded.id));
        assert!(!ids.contains(&exhausted.id));
    }

    #[tokio::test]
    async fn empty_selection_is_normal() {
        let memory = MemoryStore::new();
        let now = reference();
        let selection = select_due_soon(&memory.pipeline_store(), now, now.date_naive())
            .await
            .unwrap();
        assert!(selection.is_empty());
        assert_eq!(selection.candidates, 0);
    }
}
