//! Mock suggestion backend for deterministic testing.
//!
//! Serves scripted outcomes in order, then a fixed default response, and
//! records every prompt so tests can assert on call counts — the batch
//! processor's idempotency guarantee is exactly "zero additional calls".

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::backend::SuggestionBackend;
use crate::error::SuggestionError;

type ScriptedOutcome = std::result::Result<String, SuggestionError>;

/// Mock suggestion backend for testing.
#[derive(Clone)]
pub struct MockSuggestionBackend {
    default_response: String,
    script: Arc<Mutex<VecDeque<ScriptedOutcome>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockSuggestionBackend {
    /// Create a new mock backend with a generic default response.
    pub fn new() -> Self {
        Self {
            default_response: "• [type: message] Check in and say hello".to_string(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the response returned once the script is exhausted.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Queue a successful response for the next unscripted call.
    pub fn push_response(&self, response: impl Into<String>) {
        self.script.lock().unwrap().push_back(Ok(response.into()));
    }

    /// Queue a failure for the next unscripted call.
    pub fn push_error(&self, error: SuggestionError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Queue the same failure `n` times.
    pub fn push_errors(&self, error: SuggestionError, n: usize) {
        let mut script = self.script.lock().unwrap();
        for _ in 0..n {
            script.push_back(Err(error.clone()));
        }
    }

    /// Number of generate calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All prompts received, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Clear the call log (the script is left untouched).
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Default for MockSuggestionBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuggestionBackend for MockSuggestionBackend {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, SuggestionError> {
        self.calls.lock().unwrap().push(prompt.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(self.default_response.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_response_after_script_runs_out() {
        let mock = MockSuggestionBackend::new().with_default_response("fallback");
        mock.push_response("scripted");

        assert_eq!(mock.generate("a").await.unwrap(), "scripted");
        assert_eq!(mock.generate("b").await.unwrap(), "fallback");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn scripted_errors_surface_in_order() {
        let mock = MockSuggestionBackend::new();
        mock.push_error(SuggestionError::from_status(429, "slow down"));
        mock.push_response("ok now");

        assert!(mock.generate("a").await.unwrap_err().is_transient());
        assert_eq!(mock.generate("b").await.unwrap(), "ok now");
    }

    #[tokio::test]
    async fn prompts_are_recorded() {
        let mock = MockSuggestionBackend::new();
        let _ = mock.generate("first prompt").await;
        let _ = mock.generate("second prompt").await;

        let calls = mock.calls();
        assert_eq!(calls, vec!["first prompt", "second prompt"]);

        mock.clear_calls();
        assert_eq!(mock.call_count(), 0);
    }
}
