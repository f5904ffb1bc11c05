use super::env::load_from_env;
use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig};

/// Merge environment configuration (base) with YAML overrides
///
/// Every field set in the YAML file wins over its environment counterpart;
/// everything else keeps the environment or default value.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = load_from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(static_dir) = server.static_dir {
            config.static_dir = Some(static_dir);
        }
        if let Some(tls) = server.tls {
            config.tls = if tls.enabled {
                let cert_path = tls
                    .cert_path
                    .ok_or("server.tls.enabled is true but cert_path is missing")?;
                let key_path = tls
                    .key_path
                    .ok_or("server.tls.enabled is true but key_path is missing")?;
                Some(TlsConfig {
                    cert_path,
                    key_path,
                })
            } else {
                None
            };
        }
    }

    if let Some(providers) = yaml.providers {
        if providers.anthropic_api_key.is_some() {
            config.anthropic_api_key = providers.anthropic_api_key;
        }
        if providers.openai_api_key.is_some() {
            config.openai_api_key = providers.openai_api_key;
        }
        if providers.deepgram_api_key.is_some() {
            config.deepgram_api_key = providers.deepgram_api_key;
        }
        if providers.google_tts_api_key.is_some() {
            config.google_tts_api_key = providers.google_tts_api_key;
        }
    }

    if let Some(reply) = yaml.reply {
        let target = &mut config.reply;
        if let Some(model) = reply.anthropic_model {
            target.anthropic_model = model;
        }
        if let Some(model) = reply.openai_model {
            target.openai_model = model;
        }
        if reply.anthropic_base_url.is_some() {
            target.anthropic_base_url = reply.anthropic_base_url;
        }
        if reply.openai_base_url.is_some() {
            target.openai_base_url = reply.openai_base_url;
        }
        if let Some(max_tokens) = reply.max_tokens {
            target.max_tokens = max_tokens;
        }
        if let Some(temperature) = reply.temperature {
            target.temperature = temperature;
        }
        if let Some(prompt) = reply.system_prompt {
            target.system_prompt = prompt;
        }
        if let Some(timeout) = reply.backend_timeout_seconds {
            target.backend_timeout_seconds = timeout;
        }
    }

    if let Some(stt) = yaml.transcription {
        let target = &mut config.transcription;
        if let Some(language) = stt.language {
            target.language = language;
        }
        if let Some(model) = stt.model {
            target.model = model;
        }
        if let Some(sample_rate) = stt.sample_rate {
            target.sample_rate = sample_rate;
        }
        if let Some(encoding) = stt.encoding {
            target.encoding = encoding;
        }
        if let Some(punctuation) = stt.punctuation {
            target.punctuation = punctuation;
        }
        if let Some(interim) = stt.interim_results {
            target.interim_results = interim;
        }
        if stt.endpoint_url.is_some() {
            target.endpoint_url = stt.endpoint_url;
        }
    }

    if let Some(tts) = yaml.synthesis {
        let target = &mut config.synthesis;
        if let Some(language) = tts.language_code {
            target.language_code = language;
        }
        if let Some(voice) = tts.voice_name {
            target.voice_name = voice;
        }
        if let Some(gender) = tts.ssml_gender {
            target.ssml_gender = gender;
        }
        if let Some(encoding) = tts.audio_encoding {
            target.audio_encoding = encoding;
        }
        if let Some(rate) = tts.speaking_rate {
            target.speaking_rate = rate;
        }
        if let Some(pitch) = tts.pitch {
            target.pitch = pitch;
        }
        if tts.endpoint_url.is_some() {
            target.endpoint_url = tts.endpoint_url;
        }
    }

    if let Some(security) = yaml.security
        && security.cors_allowed_origins.is_some()
    {
        config.cors_allowed_origins = security.cors_allowed_origins;
    }

    if let Some(session) = yaml.session
        && let Some(idle) = session.idle_timeout_seconds
    {
        config.idle_timeout_seconds = idle;
    }

    Ok(config)
}
