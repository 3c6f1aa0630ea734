//! # kinship-inference
//!
//! LLM suggestion backend abstraction for kinship.
//!
//! This crate provides:
//! - The [`SuggestionBackend`] trait: a stateless `prompt → text` call
//! - The transient/permanent error contract consumed by the batch processor
//! - An OpenAI-compatible chat-completions implementation
//! - The per-contact prompt builder
//! - A scriptable mock backend for tests
//!
//! Retry and backoff live entirely in `kinship-jobs`; a backend reports one
//! attempt's outcome and nothing more.

pub mod backend;
pub mod error;
pub mod mock;
pub mod prompt;
pub mod types;

// Re-export core types
pub use kinship_core::*;

pub use backend::{ChatBackend, ChatConfig, SuggestionBackend};
pub use error::{ErrorKind, SuggestionError};
pub use mock::MockSuggestionBackend;
pub use prompt::{build_suggestion_prompt, SYSTEM_PROMPT, UPSELL_SUGGESTION};
