//! Configuration module for the voice relay server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use voice_relay::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

/// Default system prompt handed to every reply backend.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "あなたは親切で有能な音声アシスタントです。簡潔で自然な日本語で応答してください。";

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Settings shared by the reply backends (Claude and OpenAI).
#[derive(Debug, Clone)]
pub struct ReplySettings {
    pub anthropic_model: String,
    pub openai_model: String,
    /// Override for the Anthropic API base URL (defaults to the public endpoint)
    pub anthropic_base_url: Option<String>,
    /// Override for the OpenAI API base URL (defaults to the public endpoint)
    pub openai_base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    /// Per-backend call timeout in seconds; 0 disables the timeout
    pub backend_timeout_seconds: u64,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            anthropic_model: "claude-3-sonnet-20240229".to_string(),
            openai_model: "gpt-4".to_string(),
            anthropic_base_url: None,
            openai_base_url: None,
            max_tokens: 1000,
            temperature: 0.7,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            backend_timeout_seconds: 30,
        }
    }
}

/// Streaming transcription settings.
#[derive(Debug, Clone)]
pub struct TranscriptionSettings {
    pub language: String,
    pub model: String,
    pub sample_rate: u32,
    /// Audio encoding sent by clients ("webm-opus", "linear16", ...)
    pub encoding: String,
    pub punctuation: bool,
    pub interim_results: bool,
    /// Override for the streaming endpoint (defaults to the public endpoint)
    pub endpoint_url: Option<String>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            language: "ja".to_string(),
            model: "nova-2".to_string(),
            sample_rate: 48000,
            encoding: "webm-opus".to_string(),
            punctuation: true,
            interim_results: true,
            endpoint_url: None,
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub language_code: String,
    pub voice_name: String,
    pub ssml_gender: String,
    pub audio_encoding: String,
    pub speaking_rate: f32,
    pub pitch: f32,
    /// Override for the synthesis endpoint (defaults to the public endpoint)
    pub endpoint_url: Option<String>,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
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

/// Server configuration
///
/// Contains all configuration needed to run the relay, including:
/// - Server settings (host, port, TLS, static files)
/// - Provider API keys (Anthropic, OpenAI, Deepgram, Google TTS)
/// - Reply, transcription and synthesis parameters
/// - Security and session settings (CORS, idle timeout)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Directory served for every path that is not a WebSocket or API route
    pub static_dir: Option<PathBuf>,

    // Provider API keys
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub deepgram_api_key: Option<String>,
    pub google_tts_api_key: Option<String>,

    pub reply: ReplySettings,
    pub transcription: TranscriptionSettings,
    pub synthesis: SynthesisSettings,

    // Security settings
    /// Comma-separated list of allowed origins, or "*" for any
    pub cors_allowed_origins: Option<String>,

    /// Seconds without inbound frames before a connection is closed (0 disables)
    pub idle_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            tls: None,
            static_dir: Some(PathBuf::from("public")),
            anthropic_api_key: None,
            openai_api_key: None,
            deepgram_api_key: None,
            google_tts_api_key: None,
            reply: ReplySettings::default(),
            transcription: TranscriptionSettings::default(),
            synthesis: SynthesisSettings::default(),
            cors_allowed_origins: None,
            idle_timeout_seconds: 300,
        }
    }
}

impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        // Zeroize all API keys to prevent memory leaks of sensitive data
        if let Some(ref mut key) = self.anthropic_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.deepgram_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.google_tts_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable fallback
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // Priority: YAML > environment (.env + actual ENV) > defaults
        // Note: .env file is loaded in main.rs at application startup
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Per-backend reply timeout, or `None` when disabled
    pub fn backend_timeout(&self) -> Option<Duration> {
        match self.reply.backend_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Idle timeout for WebSocket connections, or `None` when disabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Get the API key for a provider
    ///
    /// Returns an error message suitable for logging when the key is not configured.
    pub fn get_api_key(&self, provider: &str) -> Result<String, String> {
        let key = match provider.to_lowercase().as_str() {
            "anthropic" | "claude" => &self.anthropic_api_key,
            "openai" => &self.openai_api_key,
            "deepgram" => &self.deepgram_api_key,
            "google" => &self.google_tts_api_key,
            _ => return Err(format!("Unsupported provider: {provider}")),
        };

        key.as_ref()
            .filter(|k| !k.is_empty())
            .cloned()
            .ok_or_else(|| format!("{provider} API key not configured in server environment"))
    }
}
