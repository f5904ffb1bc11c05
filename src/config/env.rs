use std::path::PathBuf;

use super::utils::{env_var, parse_env, parse_env_bool};
use super::{ServerConfig, TlsConfig};

/// Build a configuration from environment variables layered over defaults
///
/// `.env` values are already present in the process environment at this
/// point (loaded by `dotenvy` in main), so they are picked up here too.
pub(super) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = ServerConfig::default();

    // Server
    if let Some(host) = env_var("HOST") {
        config.host = host;
    }
    if let Some(port) = parse_env::<u16>("PORT")? {
        config.port = port;
    }
    if parse_env_bool("TLS_ENABLED")?.unwrap_or(false) {
        let cert_path = env_var("TLS_CERT_PATH")
            .ok_or("TLS_ENABLED is set but TLS_CERT_PATH is missing")?;
        let key_path =
            env_var("TLS_KEY_PATH").ok_or("TLS_ENABLED is set but TLS_KEY_PATH is missing")?;
        config.tls = Some(TlsConfig {
            cert_path: PathBuf::from(cert_path),
            key_path: PathBuf::from(key_path),
        });
    }
    if let Some(dir) = env_var("STATIC_DIR") {
        config.static_dir = Some(PathBuf::from(dir));
    }

    // Provider API keys
    config.anthropic_api_key = env_var("ANTHROPIC_API_KEY");
    config.openai_api_key = env_var("OPENAI_API_KEY");
    config.deepgram_api_key = env_var("DEEPGRAM_API_KEY");
    config.google_tts_api_key = env_var("GOOGLE_TTS_API_KEY");

    // Reply backends
    let reply = &mut config.reply;
    if let Some(model) = env_var("ANTHROPIC_MODEL") {
        reply.anthropic_model = model;
    }
    if let Some(model) = env_var("OPENAI_MODEL") {
        reply.openai_model = model;
    }
    reply.anthropic_base_url = env_var("ANTHROPIC_BASE_URL");
    reply.openai_base_url = env_var("OPENAI_BASE_URL");
    if let Some(max_tokens) = parse_env::<u32>("LLM_MAX_TOKENS")? {
        reply.max_tokens = max_tokens;
    }
    if let Some(temperature) = parse_env::<f32>("LLM_TEMPERATURE")? {
        reply.temperature = temperature;
    }
    if let Some(prompt) = env_var("SYSTEM_PROMPT") {
        reply.system_prompt = prompt;
    }
    if let Some(timeout) = parse_env::<u64>("BACKEND_TIMEOUT_SECONDS")? {
        reply.backend_timeout_seconds = timeout;
    }

    // Transcription
    let stt = &mut config.transcription;
    if let Some(language) = env_var("STT_LANGUAGE") {
        stt.language = language;
    }
    if let Some(model) = env_var("STT_MODEL") {
        stt.model = model;
    }
    if let Some(sample_rate) = parse_env::<u32>("STT_SAMPLE_RATE")? {
        stt.sample_rate = sample_rate;
    }
    if let Some(encoding) = env_var("STT_ENCODING") {
        stt.encoding = encoding;
    }
    if let Some(punctuation) = parse_env_bool("STT_PUNCTUATION")? {
        stt.punctuation = punctuation;
    }
    if let Some(interim) = parse_env_bool("STT_INTERIM_RESULTS")? {
        stt.interim_results = interim;
    }
    stt.endpoint_url = env_var("DEEPGRAM_URL");

    // Synthesis
    let tts = &mut config.synthesis;
    if let Some(language) = env_var("TTS_LANGUAGE") {
        tts.language_code = language;
    }
    if let Some(voice) = env_var("TTS_VOICE") {
        tts.voice_name = voice;
    }
    if let Some(gender) = env_var("TTS_GENDER") {
        tts.ssml_gender = gender;
    }
    if let Some(encoding) = env_var("TTS_AUDIO_ENCODING") {
        tts.audio_encoding = encoding;
    }
    if let Some(rate) = parse_env::<f32>("TTS_SPEAKING_RATE")? {
        tts.speaking_rate = rate;
    }
    if let Some(pitch) = parse_env::<f32>("TTS_PITCH")? {
        tts.pitch = pitch;
    }
    tts.endpoint_url = env_var("GOOGLE_TTS_URL");

    // Security and session
    config.cors_allowed_origins = env_var("CORS_ALLOWED_ORIGINS");
    if let Some(idle) = parse_env::<u64>("WS_IDLE_TIMEOUT_SECONDS")? {
        config.idle_timeout_seconds = idle;
    }

    Ok(config)
}
