//! OpenAI-compatible suggestion backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use kinship_core::defaults;
use kinship_core::{Error, Result};

use crate::error::SuggestionError;
use crate::prompt::SYSTEM_PROMPT;
use crate::types::*;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_API_URL: &str = defaults::SUGGESTION_API_URL;

/// Default suggestion model.
pub const DEFAULT_MODEL: &str = defaults::SUGGESTION_MODEL;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = defaults::SUGGESTION_TIMEOUT_SECS;

/// A stateless text-completion call: prompt in, suggestion text out.
///
/// Implementations hold no retry state; backoff orchestration belongs to the
/// batch processor, which is the only place that can coordinate pacing
/// across contacts and batches.
#[async_trait]
pub trait SuggestionBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, SuggestionError>;
}

/// Configuration for the chat-completions backend.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Token budget per response.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: defaults::SUGGESTION_TEMPERATURE,
            max_tokens: defaults::SUGGESTION_MAX_TOKENS,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI-compatible chat-completions backend.
pub struct ChatBackend {
    client: Client,
    config: ChatConfig,
}

impl ChatBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "chat_backend",
            model = %config.model,
            base_url = %config.base_url,
            "Initializing suggestion backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SUGGESTION_API_URL` | Groq's OpenAI-compatible endpoint |
    /// | `SUGGESTION_API_KEY` | (none) |
    /// | `SUGGESTION_MODEL` | `llama-3.3-70b-versatile` |
    /// | `SUGGESTION_TIMEOUT_SECS` | `30` |
    pub fn from_env() -> Result<Self> {
        let config = ChatConfig {
            base_url: std::env::var("SUGGESTION_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key: std::env::var("SUGGESTION_API_KEY").ok(),
            model: std::env::var("SUGGESTION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            temperature: defaults::SUGGESTION_TEMPERATURE,
            max_tokens: defaults::SUGGESTION_MAX_TOKENS,
            timeout_seconds: std::env::var("SUGGESTION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Self::new(config)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Build a POST request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req.header("Content-Type", "application/json")
    }
}

#[async_trait]
impl SuggestionBackend for ChatBackend {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, SuggestionError> {
        debug!(
            subsystem = "inference",
            component = "chat_backend",
            op = "generate",
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Requesting suggestion"
        );

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            stream: false,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(SuggestionError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("API returned {}", status),
            };
            return Err(SuggestionError::from_status(status.as_u16(), message));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SuggestionError::permanent(format!("Failed to parse response: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SuggestionError::permanent("Response contained no choices"))?;

        debug!(
            subsystem = "inference",
            component = "chat_backend",
            op = "generate",
            response_len = content.len(),
            "Suggestion received"
        );
        Ok(content)
    }
}
