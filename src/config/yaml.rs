use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3000
///   static_dir: "public"
///   tls:
///     enabled: true
///     cert_path: "/etc/relay/cert.pem"
///     key_path: "/etc/relay/key.pem"
///
/// providers:
///   anthropic_api_key: "your-anthropic-key"
///   openai_api_key: "your-openai-key"
///   deepgram_api_key: "your-deepgram-key"
///   google_tts_api_key: "your-google-key"
///
/// reply:
///   anthropic_model: "claude-3-sonnet-20240229"
///   openai_model: "gpt-4"
///   max_tokens: 1000
///   temperature: 0.7
///   backend_timeout_seconds: 30
///
/// transcription:
///   language: "ja"
///   model: "nova-2"
///   encoding: "webm-opus"
///
/// synthesis:
///   voice_name: "ja-JP-Neural2-B"
///   speaking_rate: 1.0
///
/// security:
///   cors_allowed_origins: "*"
///
/// session:
///   idle_timeout_seconds: 300
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub providers: Option<ProvidersYaml>,
    pub reply: Option<ReplyYaml>,
    pub transcription: Option<TranscriptionYaml>,
    pub synthesis: Option<SynthesisYaml>,
    pub security: Option<SecurityYaml>,
    pub session: Option<SessionYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: bool,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

/// Provider API keys from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub deepgram_api_key: Option<String>,
    pub google_tts_api_key: Option<String>,
}

/// Reply backend settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReplyYaml {
    pub anthropic_model: Option<String>,
    pub openai_model: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub openai_base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    pub backend_timeout_seconds: Option<u64>,
}

/// Transcription settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TranscriptionYaml {
    pub language: Option<String>,
    pub model: Option<String>,
    pub sample_rate: Option<u32>,
    pub encoding: Option<String>,
    pub punctuation: Option<bool>,
    pub interim_results: Option<bool>,
    pub endpoint_url: Option<String>,
}

/// Synthesis settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SynthesisYaml {
    pub language_code: Option<String>,
    pub voice_name: Option<String>,
    pub ssml_gender: Option<String>,
    pub audio_encoding: Option<String>,
    pub speaking_rate: Option<f32>,
    pub pitch: Option<f32>,
    pub endpoint_url: Option<String>,
}

/// Security settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    pub cors_allowed_origins: Option<String>,
}

/// Session settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYaml {
    pub idle_timeout_seconds: Option<u64>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
