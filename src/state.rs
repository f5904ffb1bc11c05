//! Application state shared by every connection
//!
//! Built once at startup. Adapter instances are stateless, reentrant clients
//! shared by all sessions; the session registry is the only mutable state.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::coordinator::ResponseCoordinator;
use crate::core::llm::{LLMConfig, ReplyBackend, create_reply_backend};
use crate::core::stt::{ConfiguredSTTFactory, STTConfig, STTFactory};
use crate::core::tts::{BaseTTS, TTSConfig, TTSResult, create_tts_provider};
use crate::errors::GatewayError;
use crate::session::SessionRegistry;

/// HTTP timeout applied by the reply clients themselves
const REPLY_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct AppState {
    pub config: ServerConfig,
    pub coordinator: Arc<ResponseCoordinator>,
    /// `None` when synthesis is unavailable
    pub synthesizer: Option<Arc<dyn BaseTTS>>,
    /// `None` when transcription is unavailable
    pub transcription: Option<Arc<dyn STTFactory>>,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Build shared adapters from configuration.
    ///
    /// Adapters whose credentials are missing or invalid are disabled and the
    /// rest of the system keeps running without them.
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let coordinator = ResponseCoordinator::new(build_reply_backends(&config))
            .with_timeout(config.backend_timeout());
        if !coordinator.has_backends() {
            warn!("No reply backends configured; every turn will fail");
        }

        let synthesizer = build_synthesizer(&config);
        let transcription = build_transcription(&config);

        Arc::new(Self {
            config,
            coordinator: Arc::new(coordinator),
            synthesizer,
            transcription,
            sessions: SessionRegistry::new(),
        })
    }

    /// Assemble state from pre-built parts
    pub fn from_parts(
        config: ServerConfig,
        coordinator: ResponseCoordinator,
        synthesizer: Option<Arc<dyn BaseTTS>>,
        transcription: Option<Arc<dyn STTFactory>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            coordinator: Arc::new(coordinator),
            synthesizer,
            transcription,
            sessions: SessionRegistry::new(),
        })
    }

    /// Synthesize `text`, or `Ok(None)` when synthesis is unavailable
    pub async fn synthesize(&self, text: &str) -> TTSResult<Option<Bytes>> {
        match &self.synthesizer {
            Some(tts) => tts.synthesize(text).await.map(Some),
            None => Ok(None),
        }
    }

    /// Names of the upstream services that are available
    pub fn upstreams(&self) -> Vec<String> {
        let mut upstreams = self.coordinator.backend_names();
        if let Some(tts) = &self.synthesizer {
            upstreams.push(tts.get_provider_info().to_string());
        }
        if let Some(factory) = &self.transcription {
            upstreams.push(factory.provider_name().to_string());
        }
        upstreams
    }
}

fn build_reply_backends(config: &ServerConfig) -> Vec<Arc<dyn ReplyBackend>> {
    let reply = &config.reply;
    let candidates = [
        (
            "anthropic",
            reply.anthropic_model.clone(),
            reply.anthropic_base_url.clone(),
        ),
        (
            "openai",
            reply.openai_model.clone(),
            reply.openai_base_url.clone(),
        ),
    ];

    let mut backends = Vec::new();
    for (provider, model, base_url) in candidates {
        let api_key = match config.get_api_key(provider) {
            Ok(key) => key,
            Err(msg) => {
                warn!("{}", GatewayError::UpstreamUnavailable(msg));
                continue;
            }
        };

        let llm_config = LLMConfig {
            provider: provider.to_string(),
            api_key,
            model,
            base_url,
            system_prompt: reply.system_prompt.clone(),
            max_tokens: reply.max_tokens,
            temperature: reply.temperature,
            request_timeout: REPLY_REQUEST_TIMEOUT,
        };

        match create_reply_backend(llm_config) {
            Ok(backend) => {
                info!("Reply backend enabled: {}", backend.name());
                backends.push(backend);
            }
            Err(e) => warn!(
                "{}",
                GatewayError::UpstreamUnavailable(format!("{provider}: {e}"))
            ),
        }
    }
    backends
}

fn build_synthesizer(config: &ServerConfig) -> Option<Arc<dyn BaseTTS>> {
    let api_key = match config.get_api_key("google") {
        Ok(key) => key,
        Err(msg) => {
            warn!("{}; responses will be text-only", GatewayError::UpstreamUnavailable(msg));
            return None;
        }
    };

    let synthesis = &config.synthesis;
    let tts_config = TTSConfig {
        provider: "google".to_string(),
        api_key,
        language_code: synthesis.language_code.clone(),
        voice_name: synthesis.voice_name.clone(),
        ssml_gender: synthesis.ssml_gender.clone(),
        audio_encoding: synthesis.audio_encoding.clone(),
        speaking_rate: synthesis.speaking_rate,
        pitch: synthesis.pitch,
        endpoint_url: synthesis.endpoint_url.clone(),
    };

    match create_tts_provider("google", tts_config) {
        Ok(tts) => {
            info!("Synthesis enabled: {}", tts.get_provider_info());
            Some(tts)
        }
        Err(e) => {
            warn!("{}", GatewayError::UpstreamUnavailable(e.to_string()));
            None
        }
    }
}

fn build_transcription(config: &ServerConfig) -> Option<Arc<dyn STTFactory>> {
    let api_key = match config.get_api_key("deepgram") {
        Ok(key) => key,
        Err(msg) => {
            warn!("{}; voice audio will be dropped", GatewayError::UpstreamUnavailable(msg));
            return None;
        }
    };

    let transcription = &config.transcription;
    let stt_config = STTConfig {
        provider: "deepgram".to_string(),
        api_key,
        language: transcription.language.clone(),
        sample_rate: transcription.sample_rate,
        channels: 1,
        punctuation: transcription.punctuation,
        encoding: transcription.encoding.clone(),
        model: transcription.model.clone(),
        interim_results: transcription.interim_results,
        endpoint_url: transcription.endpoint_url.clone(),
    };

    match ConfiguredSTTFactory::new(stt_config) {
        Ok(factory) => {
            info!("Transcription enabled: {}", factory.provider_name());
            Some(Arc::new(factory))
        }
        Err(e) => {
            warn!("{}", GatewayError::UpstreamUnavailable(e.to_string()));
            None
        }
    }
}
