//! Deepgram live transcription integration.
//!
//! - [`config`]: `DeepgramSTTConfig` and URL construction
//! - [`messages`]: WebSocket message types
//! - [`client`]: the `DeepgramSTT` streaming client
//!
//! Browser clients send Opus in a WebM container, which Deepgram detects on
//! its own. Raw PCM streams must declare `encoding` and `sample_rate`.

mod client;
mod config;
mod messages;


pub use client::DeepgramSTT;
pub use config::{DEEPGRAM_STT_URL, DeepgramEncoding, DeepgramSTTConfig};
pub use messages::{ControlMessage, DeepgramMessage, ResultsMessage};
