//! Configuration for the Deepgram live transcription API.

use url::Url;

use crate::core::stt::base::{STTConfig, STTError};

/// Public Deepgram streaming endpoint
pub const DEEPGRAM_STT_URL: &str = "wss://api.deepgram.com/v1/listen";

/// Audio encodings understood by the relay.
///
/// Containerized formats (WebM/Ogg) carry their own codec information, so
/// Deepgram detects them from the stream; raw formats need explicit
/// `encoding` and `sample_rate` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeepgramEncoding {
    /// Opus in a WebM container, as produced by browser MediaRecorder
    #[default]
    WebmOpus,
    /// Opus in an Ogg container
    OggOpus,
    /// Raw 16-bit little-endian PCM
    Linear16,
    /// Raw 8-bit mu-law (telephony)
    Mulaw,
}

impl DeepgramEncoding {
    /// Query parameter value for raw encodings, `None` for containers
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            Self::WebmOpus | Self::OggOpus => None,
            Self::Linear16 => Some("linear16"),
            Self::Mulaw => Some("mulaw"),
        }
    }

    pub fn parse(value: &str) -> Result<Self, STTError> {
        match value.to_lowercase().replace('_', "-").as_str() {
            "webm-opus" | "webm" | "opus" => Ok(Self::WebmOpus),
            "ogg-opus" | "ogg" => Ok(Self::OggOpus),
            "linear16" | "pcm" | "pcm-s16le" => Ok(Self::Linear16),
            "mulaw" | "mu-law" => Ok(Self::Mulaw),
            other => Err(STTError::ConfigurationError(format!(
                "Unsupported audio encoding for Deepgram: {other}"
            ))),
        }
    }
}

/// Deepgram-specific configuration wrapped around the base `STTConfig`
#[derive(Debug, Clone)]
pub struct DeepgramSTTConfig {
    pub base: STTConfig,
    pub encoding: DeepgramEncoding,
    /// Milliseconds of silence before Deepgram finalizes an utterance
    pub endpointing_ms: Option<u32>,
    pub smart_format: bool,
}

impl DeepgramSTTConfig {
    pub fn from_base(base: STTConfig) -> Result<Self, STTError> {
        let encoding = DeepgramEncoding::parse(&base.encoding)?;
        Ok(Self {
            base,
            encoding,
            endpointing_ms: Some(300),
            smart_format: false,
        })
    }

    /// Build the WebSocket URL with all query parameters
    pub fn build_websocket_url(&self) -> Result<String, STTError> {
        let endpoint = self.base.endpoint_url.as_deref().unwrap_or(DEEPGRAM_STT_URL);
        let mut url = Url::parse(endpoint).map_err(|e| {
            STTError::ConfigurationError(format!("Invalid Deepgram URL '{endpoint}': {e}"))
        })?;

        {
            let mut query = url.query_pairs_mut();
            if !self.base.model.is_empty() {
                query.append_pair("model", &self.base.model);
            }
            if !self.base.language.is_empty() {
                query.append_pair("language", &self.base.language);
            }
            query.append_pair("punctuate", bool_str(self.base.punctuation));
            query.append_pair("interim_results", bool_str(self.base.interim_results));
            if let Some(encoding) = self.encoding.query_value() {
                query.append_pair("encoding", encoding);
                query.append_pair("sample_rate", &self.base.sample_rate.to_string());
                query.append_pair("channels", &self.base.channels.to_string());
            }
            if let Some(endpointing) = self.endpointing_ms {
                query.append_pair("endpointing", &endpointing.to_string());
            }
            if self.smart_format {
                query.append_pair("smart_format", "true");
            }
        }

        Ok(url.into())
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
