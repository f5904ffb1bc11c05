use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors produced by a reply backend call
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LLMError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Provider returned an empty reply")]
    EmptyResponse,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend call aborted before completing")]
    Aborted,
}

/// Result type for reply backend operations
pub type LLMResult<T> = Result<T, LLMError>;

impl From<reqwest::Error> for LLMError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LLMError::ParseError(e.to_string())
        } else {
            LLMError::NetworkError(e.to_string())
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration shared by all reply backends
#[derive(Debug, Clone)]
pub struct LLMConfig {
    /// Provider identifier ("anthropic", "openai")
    pub provider: String,
    pub api_key: String,
    pub model: String,
    /// Base URL override; the provider's public endpoint is used when `None`
    pub base_url: Option<String>,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// HTTP request timeout applied by the client itself
    pub request_timeout: Duration,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            api_key: String::new(),
            model: String::new(),
            base_url: None,
            system_prompt: String::new(),
            max_tokens: 1000,
            temperature: 0.7,
            request_timeout: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// Reply Backend Trait
// =============================================================================

/// A one-shot "generate reply from prompt" service.
///
/// Implementations are shared across every session and must be reentrant;
/// no per-call locking is expected.
#[async_trait]
pub trait ReplyBackend: Send + Sync {
    /// Display name reported to clients as the reply `source`
    fn name(&self) -> &str;

    /// Generate a reply for a single user utterance
    async fn generate(&self, prompt: &str) -> LLMResult<String>;
}

/// Map a non-success HTTP status to an `LLMError`
pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> LLMError {
    match status.as_u16() {
        401 | 403 => LLMError::AuthenticationFailed(body),
        429 => LLMError::RateLimited,
        code => LLMError::ApiError {
            status: code,
            message: body,
        },
    }
}
