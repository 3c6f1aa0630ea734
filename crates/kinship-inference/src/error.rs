//! Suggestion client error taxonomy.
//!
//! The batch processor needs exactly one bit from a failure: will an
//! immediate retry plausibly help? Rate limiting (429), brief upstream
//! unavailability (503), and network timeouts are transient; everything
//! else — other 4xx, malformed bodies, authentication problems — will not
//! resolve on retry within the run.

use thiserror::Error;

/// Retry classification of a suggestion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Worth retrying with backoff within the current run.
    Transient,
    /// Recorded immediately; only re-eligible on a later day's run.
    Permanent,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// A failed suggestion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} suggestion error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
pub struct SuggestionError {
    pub kind: ErrorKind,
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
    pub message: String,
}

impl SuggestionError {
    /// A transient failure without an HTTP status (timeouts, connect errors).
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transient,
            status: None,
            message: message.into(),
        }
    }

    /// A permanent failure without an HTTP status (malformed bodies).
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Permanent,
            status: None,
            message: message.into(),
        }
    }

    /// Classify a non-2xx HTTP response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            429 | 503 => ErrorKind::Transient,
            _ => ErrorKind::Permanent,
        };
        Self {
            kind,
            status: Some(status),
            message: message.into(),
        }
    }

    /// Classify a reqwest transport error: timeouts and connect failures are
    /// transient, anything else is permanent.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        if e.is_timeout() || e.is_connect() {
            Self {
                kind: ErrorKind::Transient,
                status,
                message: format!("request failed: {}", e),
            }
        } else {
            Self {
                kind: ErrorKind::Permanent,
                status,
                message: format!("request failed: {}", e),
            }
        }
    }

    /// True when a retry with backoff is worthwhile within the run.
    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::Transient
    }
}
