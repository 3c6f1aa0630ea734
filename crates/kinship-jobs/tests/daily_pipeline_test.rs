//! End-to-end pipeline tests over the in-memory store and mock backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use uuid::Uuid;

use kinship_core::defaults::LEDGER_MAX_ATTEMPTS;
use kinship_core::{ContactFrequency, ContactMethod, ProcessingStatus};
use kinship_inference::{MockSuggestionBackend, SuggestionError};
use kinship_jobs::test_fixtures::{contact_fixture, premium_fixture, MemoryStore};
use kinship_jobs::{BatchConfig, BatchProcessor, DailyCheck};

fn reference() -> DateTime<Utc> {
    "2026-03-05T08:00:00Z".parse().unwrap()
}

fn fast_config() -> BatchConfig {
    BatchConfig::default()
        .with_delay_between_batches(Duration::from_millis(10))
        .with_delay_between_contacts(Duration::from_millis(1))
        .with_retry_delay(Duration::from_millis(5))
}

fn daily(memory: &MemoryStore, mock: &MockSuggestionBackend, config: BatchConfig) -> DailyCheck {
    DailyCheck::new(memory.pipeline_store(), Arc::new(mock.clone()), config)
}

#[tokio::test(start_paused = true)]
async fn second_run_same_day_makes_no_extra_model_calls() {
    let memory = MemoryStore::new();
    let mock = MockSuggestionBackend::new();
    let now = reference();

    let user = Uuid::new_v4();
    memory.set_subscription(user, premium_fixture(now));
    // Due tomorrow: inside the 24h window, outside today's reconciliation.
    for _ in 0..3 {
        memory.insert_contact(contact_fixture(user, now + ChronoDuration::hours(20)));
    }

    let check = daily(&memory, &mock, fast_config());

    let first = check.run(now).await.unwrap();
    assert_eq!(first.total_success, 3);
    assert_eq!(mock.call_count(), 3);

    // Accidentally overlapping schedule trigger: same reference, same day.
    let second = check.run(now).await.unwrap();
    assert_eq!(second.message, "No unprocessed contacts need attention");
    assert_eq!(second.contacts_found, 3);
    assert_eq!(second.total_processed, 0);
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn ledger_ceiling_spans_runs_and_resets_next_day() {
    let memory = MemoryStore::new();
    let mock = MockSuggestionBackend::new();
    let now = reference();
    let date = now.date_naive();

    let user = Uuid::new_v4();
    memory.set_subscription(user, premium_fixture(now));
    let contact = contact_fixture(user, now + ChronoDuration::hours(12));
    memory.insert_contact(contact.clone());

    // Every attempt fails permanently; one attempt per run.
    let config = fast_config().with_retry_attempts(1);
    let processor = BatchProcessor::new(
        memory.pipeline_store(),
        Arc::new(mock.clone()),
        config.clone(),
    );

    for expected_attempts in 1..=LEDGER_MAX_ATTEMPTS {
        mock.push_error(SuggestionError::from_status(500, "server error"));
        let results = processor.run(vec![contact.clone()], date, now).await;
        assert_eq!(results[0].error_count, 1);

        let entry = memory.ledger_entry(contact.id, date).unwrap();
        assert_eq!(entry.status, ProcessingStatus::Error);
        assert_eq!(entry.retry_count, expected_attempts);
    }
    assert_eq!(mock.call_count(), LEDGER_MAX_ATTEMPTS as usize);

    // The next run hits the ceiling: no model call, terminal status.
    let results = processor.run(vec![contact.clone()], date, now).await;
    assert_eq!(results[0].error_count, 1);
    assert!(results[0].errors[0].error.contains("max retries exceeded"));
    assert_eq!(mock.call_count(), LEDGER_MAX_ATTEMPTS as usize);
    assert_eq!(
        memory.ledger_entry(contact.id, date).unwrap().status,
        ProcessingStatus::MaxRetriesExceeded
    );

    // Once terminal, later runs skip it without even counting an attempt.
    let results = processor.run(vec![contact.clone()], date, now).await;
    assert_eq!(results[0].error_count, 1);
    assert_eq!(mock.call_count(), LEDGER_MAX_ATTEMPTS as usize);

    // A new calendar day starts a fresh ledger row.
    let tomorrow = date.succ_opt().unwrap();
    let results = processor.run(vec![contact.clone()], tomorrow, now).await;
    assert_eq!(results[0].success_count, 1);
    assert_eq!(mock.call_count(), LEDGER_MAX_ATTEMPTS as usize + 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_batch_earns_extra_cooldown_before_next_batch() {
    let now = reference();
    let date = now.date_naive();
    let user = Uuid::new_v4();

    // One contact per batch, no stagger, no in-run retries: delays between
    // batches are the only timers left.
    let config = BatchConfig::default()
        .with_batch_size(1)
        .with_delay_between_contacts(Duration::ZERO)
        .with_retry_attempts(1)
        .with_delay_between_batches(Duration::from_secs(5));

    // Control: two clean batches → one standard 5s pause.
    let memory = MemoryStore::new();
    memory.set_subscription(user, premium_fixture(now));
    let contacts = vec![
        contact_fixture(user, now + ChronoDuration::hours(12)),
        contact_fixture(user, now + ChronoDuration::hours(13)),
    ];
    for c in &contacts {
        memory.insert_contact(c.clone());
    }
    let mock = MockSuggestionBackend::new();
    let processor = BatchProcessor::new(
        memory.pipeline_store(),
        Arc::new(mock.clone()),
        config.clone(),
    );
    let started = tokio::time::Instant::now();
    processor.run(contacts.clone(), date, now).await;
    let clean_elapsed = started.elapsed();
    assert!(clean_elapsed >= Duration::from_secs(5));
    assert!(clean_elapsed < Duration::from_secs(6));

    // Same shape, but batch 1 is rate limited → extra cooldown
    // min(30s, 5s × 2.0) = 10s on top of the standard pause.
    let memory = MemoryStore::new();
    memory.set_subscription(user, premium_fixture(now));
    for c in &contacts {
        memory.insert_contact(c.clone());
    }
    let mock = MockSuggestionBackend::new();
    mock.push_error(SuggestionError::from_status(429, "rate limited"));
    let processor = BatchProcessor::new(
        memory.pipeline_store(),
        Arc::new(mock.clone()),
        config.clone(),
    );
    let started = tokio::time::Instant::now();
    let results = processor.run(contacts, date, now).await;
    let limited_elapsed = started.elapsed();

    assert_eq!(results[0].error_count, 1);
    assert_eq!(results[1].success_count, 1);
    assert!(limited_elapsed >= Duration::from_secs(15));
    assert!(limited_elapsed < Duration::from_secs(16));
}

#[tokio::test(start_paused = true)]
async fn contacts_within_a_batch_are_staggered() {
    let now = reference();
    let user = Uuid::new_v4();

    let memory = MemoryStore::new();
    memory.set_subscription(user, premium_fixture(now));
    let mut contacts = Vec::new();
    for _ in 0..3 {
        let c = contact_fixture(user, now + ChronoDuration::hours(12));
        memory.insert_contact(c.clone());
        contacts.push(c);
    }

    let config = BatchConfig::default()
        .with_batch_size(3)
        .with_delay_between_contacts(Duration::from_secs(1));
    let mock = MockSuggestionBackend::new();
    let processor = BatchProcessor::new(memory.pipeline_store(), Arc::new(mock.clone()), config);

    let started = tokio::time::Instant::now();
    processor.run(contacts, now.date_naive(), now).await;
    let elapsed = started.elapsed();

    // Index offsets 0s/1s/2s: the batch settles with the last contact.
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(3));
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn crash_leftover_pending_row_is_reattempted() {
    let memory = MemoryStore::new();
    let mock = MockSuggestionBackend::new();
    let now = reference();
    let date = now.date_naive();

    let user = Uuid::new_v4();
    memory.set_subscription(user, premium_fixture(now));
    let contact = contact_fixture(user, now + ChronoDuration::hours(12));
    memory.insert_contact(contact.clone());

    // A previous run created the row and crashed before settling it.
    use kinship_core::ProcessingLogRepository;
    memory.get_or_create(contact.id, date).await.unwrap();
    assert_eq!(
        memory.ledger_entry(contact.id, date).unwrap().status,
        ProcessingStatus::Pending
    );

    let processor = BatchProcessor::new(
        memory.pipeline_store(),
        Arc::new(mock.clone()),
        fast_config(),
    );
    let results = processor.run(vec![contact.clone()], date, now).await;

    assert_eq!(results[0].success_count, 1);
    assert_eq!(mock.call_count(), 1);
    assert_eq!(
        memory.ledger_entry(contact.id, date).unwrap().status,
        ProcessingStatus::Success
    );
}

#[tokio::test(start_paused = true)]
async fn full_daily_run_reconciles_then_suggests() {
    let memory = MemoryStore::new();
    let mock = MockSuggestionBackend::new().with_default_response("• Send a message");
    let now = reference();

    let user = Uuid::new_v4();
    memory.set_subscription(user, premium_fixture(now));

    // Due today with no interaction: reconciliation should count the miss
    // and push the due date out of the batch window.
    let mut missed = contact_fixture(user, now + ChronoDuration::hours(2));
    missed.contact_frequency = Some(ContactFrequency::Monthly);
    missed.relationship_level = 1;
    missed.preferred_contact_method = Some(ContactMethod::Call);
    let missed_id = missed.id;
    memory.insert_contact(missed);

    // Due tomorrow: the batch should write it a suggestion.
    let due_soon = contact_fixture(user, now + ChronoDuration::hours(20));
    let due_soon_id = due_soon.id;
    memory.insert_contact(due_soon);

    let summary = daily(&memory, &mock, fast_config()).run(now).await.unwrap();

    assert_eq!(summary.message, "Daily check completed");
    assert_eq!(summary.reconcile.missed, 1);
    assert_eq!(summary.contacts_found, 1);
    assert_eq!(summary.total_success, 1);
    assert_eq!(summary.total_errors, 0);

    // monthly × level 1 → 30 days; one miss → round(30 × 0.8) = 24 days.
    let reconciled = memory.contact(missed_id).unwrap();
    assert_eq!(reconciled.missed_interactions, 1);
    assert_eq!(reconciled.next_contact_due, now + ChronoDuration::days(24));
    assert!(reconciled.ai_last_suggestion.is_none());

    let reminders = memory.reminders_for(missed_id);
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].kind, ContactMethod::Call);
    assert_eq!(reminders[0].due_date, reconciled.next_contact_due);

    let suggested = memory.contact(due_soon_id).unwrap();
    assert_eq!(
        suggested.ai_last_suggestion.as_deref(),
        Some("• Send a message")
    );
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_day_reports_nothing_to_do() {
    let memory = MemoryStore::new();
    let mock = MockSuggestionBackend::new();
    let summary = daily(&memory, &mock, fast_config())
        .run(reference())
        .await
        .unwrap();

    assert_eq!(summary.message, "No contacts need attention");
    assert_eq!(summary.contacts_found, 0);
    assert_eq!(summary.batches_processed, 0);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn run_summary_serializes_for_the_scheduler() {
    let memory = MemoryStore::new();
    let mock = MockSuggestionBackend::new();
    let now = reference();
    let user = Uuid::new_v4();
    memory.set_subscription(user, premium_fixture(now));
    memory.insert_contact(contact_fixture(user, now + ChronoDuration::hours(20)));

    let summary = daily(&memory, &mock, fast_config()).run(now).await.unwrap();
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["message"], "Daily check completed");
    assert_eq!(json["total_success"], 1);
    assert!(json["results"].as_array().unwrap().len() == 1);
    assert!(json["reconcile"]["checked"].is_number());
}
