//! # kinship-jobs
//!
//! The daily reconciliation and batch suggestion pipeline.
//!
//! Stage order, per invocation:
//! 1. [`reconcile::reconcile_missed`] brings miss counts, due dates, and
//!    reminders in line with the logged interaction history.
//! 2. [`selector::select_due_soon`] picks the contacts due within 24 hours
//!    and drops those the processing ledger already settled today.
//! 3. [`batch::BatchProcessor`] drives paced, retryable, idempotent
//!    suggestion generation over the remainder.
//!
//! [`daily::DailyCheck`] wires the stages together and produces the
//! structured [`daily::RunSummary`] the scheduler-invoked binary prints.

pub mod batch;
pub mod config;
pub mod daily;
pub mod reconcile;
pub mod selector;
pub mod store;

// In-memory fixtures for integration tests.
// Always compiled so tests/ can use them.
pub mod test_fixtures;

// Re-export core types
pub use kinship_core::*;

pub use batch::{BatchError, BatchProcessor, BatchResult};
pub use config::BatchConfig;
pub use daily::{DailyCheck, RunSummary};
pub use reconcile::{reconcile_missed, ReconcileSummary};
pub use selector::{select_due_soon, Selection};
pub use store::PipelineStore;
