//! Wire messages for the voice and text endpoints
//!
//! Every JSON frame is an object tagged by `type`. Audio from the client
//! arrives as binary frames on the voice endpoint and is not modelled here.

use serde::{Deserialize, Serialize};

/// Maximum accepted size of an inbound text frame (64 KiB)
pub const MAX_TEXT_SIZE: usize = 64 * 1024;

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IncomingMessage {
    /// User text to answer
    Text { content: String },

    /// Explicit end of session
    Stop,
}

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

/// Advisory progress state on the text endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Processing,
    Completed,
    Error,
    Idle,
}

impl StatusState {
    /// Human-readable label sent alongside the state
    pub fn label(&self) -> &'static str {
        match self {
            StatusState::Processing => "LLMに問い合わせ中...",
            StatusState::Completed => "完了",
            StatusState::Error => "エラー",
            StatusState::Idle => "待機中",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutgoingMessage {
    /// Final transcript of the user's speech (voice only)
    Transcription { text: String },

    /// The assistant's reply
    Response {
        text: String,
        /// Backend that produced the reply
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        /// Turn duration in milliseconds (text only)
        #[serde(
            rename = "responseTime",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        response_time: Option<u64>,
    },

    /// Base64-encoded synthesized speech (voice only)
    Audio { audio: String },

    /// Progress indicator (text only)
    Status { text: String, state: StatusState },

    Error { error: String },
}

impl OutgoingMessage {
    pub fn status(state: StatusState) -> Self {
        OutgoingMessage::Status {
            text: state.label().to_string(),
            state,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        OutgoingMessage::Error {
            error: error.into(),
        }
    }
}

// =============================================================================
// Message Routing
// =============================================================================

/// Work items for a connection's sender task
#[derive(Debug)]
pub enum MessageRoute {
    Outgoing(OutgoingMessage),
    Close,
}
