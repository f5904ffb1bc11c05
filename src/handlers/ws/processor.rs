//! Inbound frame demultiplexing
//!
//! Routes each WebSocket frame to the owning session: audio to its
//! transcription stream, text messages to its turn queue.

use axum::extract::ws::Message;
use tracing::{debug, info};

use super::messages::{IncomingMessage, MAX_TEXT_SIZE};
use crate::errors::GatewayError;
use crate::session::{Session, SessionMode};

/// Process one inbound frame
///
/// # Returns
/// * `Ok(true)` - keep the connection open
/// * `Ok(false)` - the client asked to close
/// * `Err(GatewayError)` - the frame was rejected; the caller reports it and
///   consults [`GatewayError::is_fatal`]
pub async fn process_message(msg: Message, session: &mut Session) -> Result<bool, GatewayError> {
    match msg {
        Message::Text(text) => {
            debug!(session_id = %session.id(), "Received text message: {} bytes", text.len());

            if text.len() > MAX_TEXT_SIZE {
                return Err(GatewayError::Protocol(format!(
                    "Text frame too large: {} bytes (max: {} bytes)",
                    text.len(),
                    MAX_TEXT_SIZE
                )));
            }

            let incoming: IncomingMessage = serde_json::from_str(&text)
                .map_err(|e| GatewayError::Protocol(format!("Invalid message format: {e}")))?;

            Ok(handle_incoming_message(incoming, session).await)
        }
        Message::Binary(data) => match session.mode() {
            SessionMode::Voice => {
                debug!(session_id = %session.id(), "Received audio chunk: {} bytes", data.len());
                session.push_audio(data).await;
                Ok(true)
            }
            SessionMode::Text => Err(GatewayError::Protocol(
                "Binary frames are not accepted on the text endpoint".to_string(),
            )),
        },
        Message::Ping(_) | Message::Pong(_) => Ok(true),
        Message::Close(frame) => {
            info!(session_id = %session.id(), "Client closed connection: {:?}", frame);
            Ok(false)
        }
    }
}

async fn handle_incoming_message(msg: IncomingMessage, session: &mut Session) -> bool {
    match msg {
        IncomingMessage::Text { content } => {
            session.submit_text(&content).await;
            true
        }
        IncomingMessage::Stop => {
            info!(session_id = %session.id(), "Client requested stop");
            false
        }
    }
}
