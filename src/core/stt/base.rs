use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

// =============================================================================
// Configuration and Results
// =============================================================================

/// Configuration for a streaming speech-to-text provider
#[derive(Debug, Clone)]
pub struct STTConfig {
    /// Provider identifier ("deepgram")
    pub provider: String,
    pub api_key: String,
    /// Recognition language (e.g. "ja", "en-US")
    pub language: String,
    /// Sample rate in Hz; only meaningful for raw PCM encodings
    pub sample_rate: u32,
    pub channels: u16,
    /// Request automatic punctuation
    pub punctuation: bool,
    /// Audio encoding ("webm-opus", "linear16", "mulaw", ...)
    pub encoding: String,
    /// Provider model name
    pub model: String,
    /// Ask the provider to stream interim (non-final) hypotheses
    pub interim_results: bool,
    /// Endpoint override; the provider's public endpoint is used when `None`
    pub endpoint_url: Option<String>,
}

impl Default for STTConfig {
    fn default() -> Self {
        Self {
            provider: "deepgram".to_string(),
            api_key: String::new(),
            language: "ja".to_string(),
            sample_rate: 48000,
            channels: 1,
            punctuation: true,
            encoding: "webm-opus".to_string(),
            model: "nova-2".to_string(),
            interim_results: true,
            endpoint_url: None,
        }
    }
}

/// A single transcript hypothesis
#[derive(Debug, Clone, PartialEq)]
pub struct STTResult {
    pub transcript: String,
    /// The hypothesis will not change anymore
    pub is_final: bool,
    /// The provider detected the end of an utterance
    pub is_speech_final: bool,
    pub confidence: f32,
}

impl STTResult {
    pub fn new(transcript: String, is_final: bool, is_speech_final: bool, confidence: f32) -> Self {
        Self {
            transcript,
            is_final,
            is_speech_final,
            confidence,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum STTError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),
}

// =============================================================================
// Callbacks
// =============================================================================

/// Callback invoked for every transcript hypothesis
pub type STTResultCallback =
    Arc<dyn Fn(STTResult) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback invoked when the stream fails; the stream is terminated afterwards
pub type STTErrorCallback =
    Arc<dyn Fn(STTError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

// =============================================================================
// Traits
// =============================================================================

/// A bidirectional streaming transcription session.
///
/// One instance maps to one upstream stream: `connect` opens it,
/// `send_audio` feeds chunks, results arrive through the registered
/// callbacks, and `disconnect` closes it.
#[async_trait::async_trait]
pub trait BaseSTT: Send + Sync {
    fn new(config: STTConfig) -> Result<Self, STTError>
    where
        Self: Sized;

    async fn connect(&mut self) -> Result<(), STTError>;

    async fn disconnect(&mut self) -> Result<(), STTError>;

    /// The stream is open and accepts audio
    fn is_ready(&self) -> bool;

    async fn send_audio(&mut self, audio_data: Bytes) -> Result<(), STTError>;

    async fn on_result(&mut self, callback: STTResultCallback) -> Result<(), STTError>;

    async fn on_error(&mut self, callback: STTErrorCallback) -> Result<(), STTError>;

    fn get_config(&self) -> Option<&STTConfig>;

    fn get_provider_info(&self) -> &'static str;
}

/// Creates fresh transcription streams, one per voice session (or reopen).
pub trait STTFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn BaseSTT>, STTError>;

    fn provider_name(&self) -> &str;
}
