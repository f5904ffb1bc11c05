//! Reply backends: one-shot "generate reply from prompt" services.
//!
//! Every backend implements [`ReplyBackend`] so the coordinator can race them
//! without knowing which provider sits behind each one.

pub mod anthropic;
pub mod base;
pub mod openai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use anthropic::AnthropicBackend;
pub use base::{LLMConfig, LLMError, LLMResult, ReplyBackend};
pub use openai::OpenAIBackend;

/// Supported reply backend providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    Anthropic,
    OpenAI,
}

impl fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::OpenAI => write!(f, "openai"),
        }
    }
}

impl FromStr for LLMProvider {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LLMProvider::Anthropic),
            "openai" => Ok(LLMProvider::OpenAI),
            _ => Err(LLMError::ConfigurationError(format!(
                "Unsupported reply provider: {s}. Supported providers: anthropic, openai"
            ))),
        }
    }
}

/// Create a reply backend for the provider named in `config.provider`
pub fn create_reply_backend(config: LLMConfig) -> LLMResult<Arc<dyn ReplyBackend>> {
    let provider: LLMProvider = config.provider.parse()?;
    match provider {
        LLMProvider::Anthropic => Ok(Arc::new(AnthropicBackend::new(config)?)),
        LLMProvider::OpenAI => Ok(Arc::new(OpenAIBackend::new(config)?)),
    }
}
