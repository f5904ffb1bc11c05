//! OpenAI Chat Completions reply backend.
//!
//! - Endpoint: `POST {base}/v1/chat/completions`
//! - Auth: `Authorization: Bearer <key>`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::base::{LLMConfig, LLMError, LLMResult, ReplyBackend, status_error};

/// Public OpenAI API endpoint
pub const OPENAI_API_URL: &str = "https://api.openai.com";

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Reply backend backed by OpenAI chat models
pub struct OpenAIBackend {
    client: reqwest::Client,
    config: LLMConfig,
}

impl OpenAIBackend {
    pub fn new(config: LLMConfig) -> LLMResult<Self> {
        if config.api_key.is_empty() {
            return Err(LLMError::AuthenticationFailed(
                "API key is required for OpenAI".to_string(),
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
            .unwrap_or(OPENAI_API_URL)
            .trim_end_matches('/');
        format!("{base}/v1/chat/completions")
    }

    pub(crate) fn build_request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                { "role": "system", "content": self.config.system_prompt },
                { "role": "user", "content": prompt }
            ],
        });

        self.client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
    }

    fn extract_text(response: ChatCompletionResponse) -> LLMResult<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LLMError::EmptyResponse)
    }
}

#[async_trait]
impl ReplyBackend for OpenAIBackend {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn generate(&self, prompt: &str) -> LLMResult<String> {
        let response = self.build_request(prompt).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        debug!(model = %self.config.model, "OpenAI reply received");
        Self::extract_text(parsed)
    }
}
