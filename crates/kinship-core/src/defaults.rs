//! Centralized default constants for the kinship pipeline.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates reference these constants instead of defining their own
//! magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// BATCH PROCESSING
// =============================================================================

/// Number of contacts processed together in one batch.
pub const BATCH_SIZE: usize = 20;

/// Pause between consecutive batches in milliseconds.
pub const DELAY_BETWEEN_BATCHES_MS: u64 = 5_000;

/// Stagger offset applied per contact within a batch in milliseconds.
pub const DELAY_BETWEEN_CONTACTS_MS: u64 = 1_000;

/// Hard ceiling on contacts handled in a single invocation.
pub const MAX_CONTACTS_PER_RUN: usize = 100;

/// In-run retry attempts for a transient failure on one contact.
pub const RETRY_ATTEMPTS: u32 = 3;

/// Base retry delay in milliseconds before backoff is applied.
pub const RETRY_DELAY_MS: u64 = 2_000;

/// Upper bound on any single backoff or cooldown delay in milliseconds.
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Exponential backoff multiplier.
pub const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Maximum random jitter added to each backoff delay in milliseconds.
pub const RETRY_JITTER_MAX_MS: u64 = 1_000;

/// HTTP status codes treated as upstream rate-limit signals.
pub const RATE_LIMIT_STATUS_CODES: [u16; 2] = [429, 503];

// =============================================================================
// PROCESSING LEDGER
// =============================================================================

/// Ceiling on failed attempts per contact per calendar day.
///
/// Independent from [`RETRY_ATTEMPTS`]: that one bounds immediate in-run
/// retries, this one bounds re-attempts across multiple runs of the same day.
pub const LEDGER_MAX_ATTEMPTS: i32 = 3;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Fallback timezone when a user has not configured one.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Minimum days between two scheduled outreaches, however urgent.
pub const MIN_INTERVAL_DAYS: i64 = 1;

/// Floor of the urgency multiplier applied for missed interactions.
pub const URGENCY_FLOOR: f64 = 0.3;

// =============================================================================
// SUGGESTIONS
// =============================================================================

/// Default OpenAI-compatible endpoint for suggestion generation.
pub const SUGGESTION_API_URL: &str = "https://api.groq.com/openai/v1";

/// Default suggestion model.
pub const SUGGESTION_MODEL: &str = "llama-3.3-70b-versatile";

/// Timeout for suggestion requests in seconds.
pub const SUGGESTION_TIMEOUT_SECS: u64 = 30;

/// Sampling temperature for suggestion generation.
pub const SUGGESTION_TEMPERATURE: f32 = 0.7;

/// Token budget for one suggestion response.
pub const SUGGESTION_MAX_TOKENS: u32 = 250;

/// Number of recent interactions included as prompt context.
pub const RECENT_INTERACTIONS_LIMIT: i64 = 10;
