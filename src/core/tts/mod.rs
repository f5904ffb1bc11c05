mod base;
pub mod google;

use std::sync::Arc;

pub use base::{BaseTTS, TTSConfig, TTSError, TTSResult};
pub use google::GoogleTTS;

/// Factory function to create a TTS provider by name
pub fn create_tts_provider(provider_type: &str, config: TTSConfig) -> TTSResult<Arc<dyn BaseTTS>> {
    match provider_type.to_lowercase().as_str() {
        "google" | "google-cloud" => Ok(Arc::new(GoogleTTS::new(config)?)),
        _ => Err(TTSError::InvalidConfiguration(format!(
            "Unsupported TTS provider: {provider_type}. Supported providers: google"
        ))),
    }
}
