//! Anthropic Messages API reply backend.
//!
//! - Endpoint: `POST {base}/v1/messages`
//! - Auth: `x-api-key` header plus `anthropic-version`
//! - The system prompt travels as a top-level field, not as a message

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::base::{LLMConfig, LLMError, LLMResult, ReplyBackend, status_error};

/// Public Anthropic API endpoint
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";

/// API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Reply backend backed by Claude models
pub struct AnthropicBackend {
    client: reqwest::Client,
    config: LLMConfig,
}

impl AnthropicBackend {
    pub fn new(config: LLMConfig) -> LLMResult<Self> {
        if config.api_key.is_empty() {
            return Err(LLMError::AuthenticationFailed(
                "API key is required for Anthropic".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LLMError::ConfigurationError(format!("Failed to build client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(ANTHROPIC_API_URL)
            .trim_end_matches('/');
        format!("{base}/v1/messages")
    }

    pub(crate) fn build_request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": self.config.system_prompt,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        self.client
            .post(self.endpoint())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
    }

    /// Concatenate every text block of a Messages API response
    fn extract_text(response: MessagesResponse) -> LLMResult<String> {
        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl ReplyBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "Claude"
    }

    async fn generate(&self, prompt: &str) -> LLMResult<String> {
        let response = self.build_request(prompt).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        debug!(model = %self.config.model, "Claude reply received");
        Self::extract_text(parsed)
    }
}
