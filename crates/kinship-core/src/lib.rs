//! # kinship-core
//!
//! Core types, traits, and abstractions for the kinship relationship tracker.
//!
//! This crate provides the foundational data structures, the repository trait
//! definitions the store layer implements, and the pure scheduling calculator
//! that decides when a contact is next due for outreach.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod schedule;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use schedule::{
    day_bounds, interval_days, local_date, next_24h, next_contact_due, parse_timezone,
    processing_date,
};
pub use traits::*;
