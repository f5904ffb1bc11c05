use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Configuration for a text-to-speech provider
#[derive(Debug, Clone)]
pub struct TTSConfig {
    /// Provider identifier ("google")
    pub provider: String,
    pub api_key: String,
    /// BCP-47 language code of the voice (e.g. "ja-JP")
    pub language_code: String,
    /// Provider voice name (e.g. "ja-JP-Neural2-B")
    pub voice_name: String,
    /// Requested voice gender ("FEMALE", "MALE", "NEUTRAL")
    pub ssml_gender: String,
    /// Output encoding ("MP3", "OGG_OPUS", "LINEAR16")
    pub audio_encoding: String,
    pub speaking_rate: f32,
    pub pitch: f32,
    /// Endpoint override; the provider's public endpoint is used when `None`
    pub endpoint_url: Option<String>,
}

impl Default for TTSConfig {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            api_key: String::new(),
            language_code: "ja-JP".to_string(),
            voice_name: "ja-JP-Neural2-B".to_string(),
            ssml_gender: "FEMALE".to_string(),
            audio_encoding: "MP3".to_string(),
            speaking_rate: 1.0,
            pitch: 0.0,
            endpoint_url: None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TTSError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Audio decoding error: {0}")]
    AudioDecodingError(String),
}

pub type TTSResult<T> = Result<T, TTSError>;

/// One-shot text-to-audio synthesis.
///
/// Instances are shared by all sessions; calls are independent.
#[async_trait]
pub trait BaseTTS: Send + Sync {
    /// Synthesize `text` into encoded audio bytes
    async fn synthesize(&self, text: &str) -> TTSResult<Bytes>;

    fn get_config(&self) -> &TTSConfig;

    fn get_provider_info(&self) -> &'static str;
}
