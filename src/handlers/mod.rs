//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `ws` - Voice and text WebSocket endpoints

pub mod api;
pub mod ws;

pub use ws::{ws_text_handler, ws_voice_handler};
