//! Structured logging schema and field name constants for kinship.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Run lifecycle events, batch completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-contact iteration detail |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "jobs", "db", "inference", "daily"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "batch", "reconcile", "selector", "pool", "chat_backend"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "run", "apply_miss", "generate", "mark_pending"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Contact UUID being operated on.
pub const CONTACT_ID: &str = "contact_id";

/// Owner UUID of the contact.
pub const USER_ID: &str = "user_id";

/// Batch UUID a contact is processed under.
pub const BATCH_ID: &str = "batch_id";

/// Calendar day key of the processing ledger.
pub const RUN_DATE: &str = "run_date";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of contacts returned by a query or handled by a stage.
pub const RESULT_COUNT: &str = "result_count";

/// Ledger retry counter value.
pub const RETRY_COUNT: &str = "retry_count";

/// In-run attempt number for a single contact.
pub const ATTEMPT: &str = "attempt";

/// Byte length of a prompt sent to the model.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for suggestion generation.
pub const MODEL: &str = "model";

/// HTTP status code returned by the suggestion endpoint.
pub const STATUS_CODE: &str = "status_code";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
