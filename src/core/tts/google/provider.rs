//! Google Cloud Text-to-Speech provider.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://texttospeech.googleapis.com/v1/text:synthesize?key=<API_KEY>`
//! - Body: `{input: {text}, voice: {languageCode, name, ssmlGender}, audioConfig: {...}}`
//! - Response: `{audioContent: <base64>}`

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::config::{GoogleAudioEncoding, SsmlGender};
use crate::core::tts::base::{BaseTTS, TTSConfig, TTSError, TTSResult};

/// Google Cloud TTS REST endpoint
pub const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

/// Google Cloud TTS provider using API key authentication
pub struct GoogleTTS {
    client: reqwest::Client,
    config: TTSConfig,
    encoding: GoogleAudioEncoding,
    gender: SsmlGender,
}

impl GoogleTTS {
    pub fn new(config: TTSConfig) -> TTSResult<Self> {
        if config.api_key.is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "API key is required for Google TTS".to_string(),
            ));
        }
        if config.voice_name.is_empty() && config.language_code.is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Either a voice name or a language code is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TTSError::InvalidConfiguration(format!("Failed to build client: {e}")))?;

        Ok(Self {
            encoding: GoogleAudioEncoding::from_str_or_default(&config.audio_encoding),
            gender: SsmlGender::from_str_or_default(&config.ssml_gender),
            client,
            config,
        })
    }

    pub fn encoding(&self) -> GoogleAudioEncoding {
        self.encoding
    }

    pub(crate) fn build_http_request(&self, text: &str) -> reqwest::RequestBuilder {
        let mut voice = json!({
            "languageCode": self.config.language_code,
            "ssmlGender": self.gender.as_str(),
        });
        if !self.config.voice_name.is_empty() {
            voice["name"] = json!(self.config.voice_name);
        }

        let body = json!({
            "input": { "text": text },
            "voice": voice,
            "audioConfig": {
                "audioEncoding": self.encoding.as_str(),
                "speakingRate": self.config.speaking_rate,
                "pitch": self.config.pitch,
            },
        });

        let endpoint = self.config.endpoint_url.as_deref().unwrap_or(GOOGLE_TTS_URL);
        self.client
            .post(endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
    }

    fn decode_audio(response: SynthesizeResponse) -> TTSResult<Bytes> {
        if response.audio_content.is_empty() {
            return Err(TTSError::ProviderError(
                "Response did not contain audio content".to_string(),
            ));
        }
        BASE64
            .decode(response.audio_content.as_bytes())
            .map(Bytes::from)
            .map_err(|e| TTSError::AudioDecodingError(e.to_string()))
    }
}

#[async_trait]
impl BaseTTS for GoogleTTS {
    async fn synthesize(&self, text: &str) -> TTSResult<Bytes> {
        if text.trim().is_empty() {
            return Err(TTSError::InvalidConfiguration(
                "Cannot synthesize empty text".to_string(),
            ));
        }

        let response = self
            .build_http_request(text)
            .send()
            .await
            .map_err(|e| TTSError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TTSError::ProviderError(format!(
                "Google TTS returned {status}: {body}"
            )));
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| TTSError::ProviderError(format!("Invalid synthesis response: {e}")))?;

        let audio = Self::decode_audio(parsed)?;
        debug!("Google TTS produced {} bytes of {}", audio.len(), self.encoding);
        Ok(audio)
    }

    fn get_config(&self) -> &TTSConfig {
        &self.config
    }

    fn get_provider_info(&self) -> &'static str {
        "Google Cloud Text-to-Speech"
    }
}
