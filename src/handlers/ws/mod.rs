//! Voice and text WebSocket endpoints
//!
//! # Protocol
//!
//! ## Client → Server
//!
//! - **Binary frames** (voice only): audio chunks forwarded to transcription
//! - **text**: `{"type":"text","content":"..."}` answered as a turn
//! - **stop**: `{"type":"stop"}` ends the session
//!
//! ## Server → Client
//!
//! - **transcription** (voice): final transcript of the user's speech
//! - **response**: assistant reply with the winning backend as `source`
//! - **audio** (voice): base64 synthesized speech
//! - **status** (text): progress indicator
//! - **error**: translated failure description

mod handler;
pub mod messages;
mod processor;

pub use handler::{ws_text_handler, ws_voice_handler};
