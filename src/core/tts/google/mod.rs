//! Google Cloud Text-to-Speech integration (REST, API key auth).

mod config;
mod provider;

pub use config::{GoogleAudioEncoding, SsmlGender};
pub use provider::{GOOGLE_TTS_URL, GoogleTTS};
