//! Reconciliation pass: make miss counts and due dates reflect reality.
//!
//! Runs before any other stage. For every contact whose due date falls on
//! the current calendar day (in the owning user's timezone), checks whether
//! an interaction was actually logged; if not, the miss counter is bumped,
//! the due date recomputed, and the outstanding reminder replaced.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kinship_core::{
    day_bounds, local_date, next_contact_due, parse_timezone, ApplyMissRequest, Contact,
    ContactMethod, ContactRepository, InteractionRepository, NewReminder,
    ReconciliationRepository, Result, SettingsRepository,
};

use crate::store::PipelineStore;

/// Counters from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Contacts whose due date fell inside the widest today window.
    pub checked: usize,
    /// Contacts confirmed missed and rescheduled.
    pub missed: usize,
    /// Contacts left untouched (interaction logged, or not due in their timezone).
    pub skipped: usize,
    /// Contacts whose writes failed; left in their prior state.
    pub errors: usize,
}

/// Run the reconciliation pass anchored at `reference`.
///
/// Per-contact failures are recorded and skipped; they never abort the rest
/// of the pass.
pub async fn reconcile_missed(
    store: &PipelineStore,
    reference: DateTime<Utc>,
) -> Result<ReconcileSummary> {
    let timezones = store.settings.timezones().await?;

    // Fetch on UTC day bounds, then decide per contact in the user's zone.
    let (start, end) = day_bounds(reference, Tz::UTC);
    let due_today = store.contacts.due_between(start, end).await?;

    let mut summary = ReconcileSummary {
        checked: due_today.len(),
        ..Default::default()
    };

    for contact in due_today {
        match reconcile_contact(store, &contact, reference, &timezones).await {
            Ok(true) => summary.missed += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "reconcile",
                    contact_id = %contact.id,
                    error = %e,
                    "Failed to reconcile contact, leaving prior state"
                );
                summary.errors += 1;
            }
        }
    }

    info!(
        subsystem = "jobs",
        component = "reconcile",
        op = "run",
        checked = summary.checked,
        missed = summary.missed,
        skipped = summary.skipped,
        errors = summary.errors,
        "Reconciliation pass complete"
    );
    Ok(summary)
}

/// Returns `Ok(true)` when the contact was confirmed missed and rescheduled.
async fn reconcile_contact(
    store: &PipelineStore,
    contact: &Contact,
    reference: DateTime<Utc>,
    timezones: &HashMap<Uuid, String>,
) -> Result<bool> {
    let tz = timezones
        .get(&contact.user_id)
        .and_then(|name| parse_timezone(name))
        .unwrap_or(Tz::UTC);
    let today = local_date(reference, tz);

    // Genuinely missed only when today is the due date in the user's zone.
    if local_date(contact.next_contact_due, tz) != today {
        debug!(
            subsystem = "jobs",
            component = "reconcile",
            contact_id = %contact.id,
            "Due date is not today in the user's timezone, skipping"
        );
        return Ok(false);
    }

    // An interaction logged today (or later) means the user reached out.
    let latest = store.interactions.latest_for_contact(contact.id).await?;
    if let Some(interaction) = latest {
        if local_date(interaction.date, tz) >= today {
            debug!(
                subsystem = "jobs",
                component = "reconcile",
                contact_id = %contact.id,
                "Interaction already logged today, not a miss"
            );
            return Ok(false);
        }
    }

    let missed = contact.missed_interactions + 1;
    let next_due = next_contact_due(
        contact.relationship_level,
        contact.contact_frequency,
        missed,
        reference,
        reference,
    );

    store
        .reconciliation
        .apply_miss(ApplyMissRequest {
            contact_id: contact.id,
            missed_interactions: missed,
            next_contact_due: next_due,
            reminder: NewReminder {
                contact_id: contact.id,
                user_id: contact.user_id,
                kind: contact
                    .preferred_contact_method
                    .unwrap_or(ContactMethod::Message),
                due_date: next_due,
                description: contact.notes.clone(),
            },
        })
        .await?;

    debug!(
        subsystem = "jobs",
        component = "reconcile",
        op = "apply_miss",
        contact_id = %contact.id,
        missed_interactions = missed,
        next_due = %next_due,
        "Confirmed miss, rescheduled"
    );
    Ok(true)
}
