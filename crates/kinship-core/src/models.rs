//! Core data models for kinship.
//!
//! These types are shared across all kinship crates and represent the
//! domain entities: contacts, their interaction history, the reminders
//! derived from it, and the daily processing ledger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// CONTACT TYPES
// =============================================================================

/// How often a user wants to reach out to a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactFrequency {
    EveryThreeDays,
    Weekly,
    Fortnightly,
    Monthly,
    Quarterly,
}

impl ContactFrequency {
    /// Base outreach interval in days, before closeness/urgency adjustment.
    pub fn days(&self) -> i64 {
        match self {
            Self::EveryThreeDays => 3,
            Self::Weekly => 7,
            Self::Fortnightly => 14,
            Self::Monthly => 30,
            Self::Quarterly => 90,
        }
    }

    /// Stable string form used in the database and in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EveryThreeDays => "every_three_days",
            Self::Weekly => "weekly",
            Self::Fortnightly => "fortnightly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }

    /// Parse from the stable string form. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "every_three_days" => Some(Self::EveryThreeDays),
            "weekly" => Some(Self::Weekly),
            "fortnightly" => Some(Self::Fortnightly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContactFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Channel used to reach a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    Call,
    Message,
    Social,
}

impl ContactMethod {
    /// Stable string form used in the database and in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Message => "message",
            Self::Social => "social",
        }
    }

    /// Parse from the stable string form. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "call" => Some(Self::Call),
            "message" => Some(Self::Message),
            "social" => Some(Self::Social),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContactMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A person being tracked.
///
/// Owned exclusively by the store; the pipeline mutates fields through
/// explicit repository calls and never holds a stale copy across steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub notes: Option<String>,
    /// Relationship closeness, 1 (distant) to 5 (close).
    pub relationship_level: i16,
    /// `None` falls back to weekly in the scheduling calculator.
    pub contact_frequency: Option<ContactFrequency>,
    pub preferred_contact_method: Option<ContactMethod>,
    /// Count of due dates that passed with no logged interaction.
    pub missed_interactions: i32,
    pub last_contacted: Option<DateTime<Utc>>,
    /// Invariant: ≥ now immediately after any recomputation.
    pub next_contact_due: DateTime<Utc>,
    pub ai_last_suggestion: Option<String>,
    pub ai_last_suggestion_date: Option<DateTime<Utc>>,
}

// =============================================================================
// INTERACTION TYPES
// =============================================================================

/// User-perceived tone of a logged interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// An immutable log entry recording that the user reached out.
///
/// Created by the user-facing logging flow; read-only for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub contact_id: Uuid,
    /// Free-form interaction type ("call", "message", "social", ...).
    pub kind: String,
    pub date: DateTime<Utc>,
    pub sentiment: Option<Sentiment>,
}

// =============================================================================
// REMINDER TYPES
// =============================================================================

/// A derived, disposable outreach reminder.
///
/// Invariant: at most one live reminder per contact. Reconciliation replaces
/// (delete then insert), never appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub user_id: Uuid,
    pub kind: ContactMethod,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
}

/// Payload for inserting a fresh reminder.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub contact_id: Uuid,
    pub user_id: Uuid,
    pub kind: ContactMethod,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
}

// =============================================================================
// PROCESSING LEDGER TYPES
// =============================================================================

/// Status of one contact-day row in the processing ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Selected for processing; an attempt is about to run (or crashed mid-run).
    Pending,
    /// Terminal: suggestion handled, no further work today.
    Success,
    /// Attempt failed; eligible for retry while under the ledger ceiling.
    Error,
    /// Terminal: failed on too many attempts today, skipped until tomorrow.
    MaxRetriesExceeded,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
            Self::MaxRetriesExceeded => "max_retries_exceeded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "max_retries_exceeded" => Some(Self::MaxRetriesExceeded),
            _ => None,
        }
    }

    /// True when no further work should happen for this contact-day.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::MaxRetriesExceeded)
    }
}

/// The idempotency and retry ledger row, unique per `(contact_id, processing_date)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingLogEntry {
    pub contact_id: Uuid,
    pub processing_date: NaiveDate,
    pub batch_id: Option<Uuid>,
    pub status: ProcessingStatus,
    pub retry_count: i32,
    pub last_error: Option<String>,
}

// =============================================================================
// USER SETTINGS TYPES
// =============================================================================

/// Per-user preferences relevant to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiPreferences {
    /// When false the suggestion call is skipped entirely.
    pub ai_suggestions_enabled: bool,
    /// IANA timezone name, e.g. "Europe/Berlin". `None` means UTC.
    pub timezone: Option<String>,
}

impl Default for AiPreferences {
    fn default() -> Self {
        Self {
            ai_suggestions_enabled: true,
            timezone: None,
        }
    }
}

/// Billing plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Premium,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

/// A user's subscription as seen by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: PlanTier,
    pub valid_until: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Premium entitlement is effective only while the subscription is valid.
    pub fn is_premium_at(&self, now: DateTime<Utc>) -> bool {
        self.plan == PlanTier::Premium && self.valid_until.map(|v| v > now).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn frequency_base_days() {
        assert_eq!(ContactFrequency::EveryThreeDays.days(), 3);
        assert_eq!(ContactFrequency::Weekly.days(), 7);
        assert_eq!(ContactFrequency::Fortnightly.days(), 14);
        assert_eq!(ContactFrequency::Monthly.days(), 30);
        assert_eq!(ContactFrequency::Quarterly.days(), 90);
    }

    #[test]
    fn frequency_round_trips_through_str() {
        for f in [
            ContactFrequency::EveryThreeDays,
            ContactFrequency::Weekly,
            ContactFrequency::Fortnightly,
            ContactFrequency::Monthly,
            ContactFrequency::Quarterly,
        ] {
            assert_eq!(ContactFrequency::parse(f.as_str()), Some(f));
        }
        assert_eq!(ContactFrequency::parse("daily"), None);
    }

    #[test]
    fn method_round_trips_through_str() {
        for m in [
            ContactMethod::Call,
            ContactMethod::Message,
            ContactMethod::Social,
        ] {
            assert_eq!(ContactMethod::parse(m.as_str()), Some(m));
        }
        assert_eq!(ContactMethod::parse("fax"), None);
    }

    #[test]
    fn processing_status_terminality() {
        assert!(ProcessingStatus::Success.is_terminal());
        assert!(ProcessingStatus::MaxRetriesExceeded.is_terminal());
        assert!(!ProcessingStatus::Pending.is_terminal());
        assert!(!ProcessingStatus::Error.is_terminal());
    }

    #[test]
    fn processing_status_round_trips_through_str() {
        for s in [
            ProcessingStatus::Pending,
            ProcessingStatus::Success,
            ProcessingStatus::Error,
            ProcessingStatus::MaxRetriesExceeded,
        ] {
            assert_eq!(ProcessingStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn premium_requires_future_valid_until() {
        let now = Utc::now();
        let sub = Subscription {
            plan: PlanTier::Premium,
            valid_until: Some(now + Duration::days(1)),
        };
        assert!(sub.is_premium_at(now));

        let lapsed = Subscription {
            plan: PlanTier::Premium,
            valid_until: Some(now - Duration::days(1)),
        };
        assert!(!lapsed.is_premium_at(now));

        let open_ended = Subscription {
            plan: PlanTier::Premium,
            valid_until: None,
        };
        assert!(!open_ended.is_premium_at(now));

        let free = Subscription {
            plan: PlanTier::Free,
            valid_until: Some(now + Duration::days(1)),
        };
        assert!(!free.is_premium_at(now));
    }

    #[test]
    fn ai_preferences_default_enabled() {
        let prefs = AiPreferences::default();
        assert!(prefs.ai_suggestions_enabled);
        assert!(prefs.timezone.is_none());
    }
}
