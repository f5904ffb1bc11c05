//! Per-session turn worker
//!
//! A turn is one user utterance or text message answered by the coordinator.
//! Each session drains its turns in FIFO order on a single task, so one turn's
//! events are all emitted before the next turn's begin.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{SessionHandle, SessionMode};
use crate::errors::GatewayError;
use crate::handlers::ws::messages::{OutgoingMessage, StatusState};
use crate::state::AppState;

/// Capacity of a session's pending turn queue
pub const TURN_QUEUE_CAPACITY: usize = 32;

/// One reply request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Final transcript from the transcription stream
    Transcript(String),
    /// Text typed by the user
    Text(String),
}

impl Turn {
    pub fn text(&self) -> &str {
        match self {
            Turn::Transcript(text) | Turn::Text(text) => text,
        }
    }
}

/// Drain `turns` until the session is cancelled or every sender is gone.
///
/// A turn already in progress when the session closes runs to completion;
/// its outbound events are dropped by the closed handle.
pub(crate) async fn run_turn_loop(
    handle: Arc<SessionHandle>,
    app_state: Arc<AppState>,
    mut turns: mpsc::Receiver<Turn>,
) {
    loop {
        let turn = tokio::select! {
            biased;
            _ = handle.cancelled() => break,
            next = turns.recv() => match next {
                Some(turn) => turn,
                None => break,
            },
        };

        process_turn(&handle, &app_state, turn).await;
        handle.finish_turn();
    }

    debug!(session_id = %handle.id(), "Turn worker stopped");
}

/// Run a single turn and emit its events in order
pub(crate) async fn process_turn(handle: &SessionHandle, app_state: &AppState, turn: Turn) {
    match handle.mode() {
        SessionMode::Voice => process_voice_turn(handle, app_state, turn).await,
        SessionMode::Text => process_text_turn(handle, app_state, turn).await,
    }
}

async fn process_voice_turn(handle: &SessionHandle, app_state: &AppState, turn: Turn) {
    if let Turn::Transcript(text) = &turn {
        handle
            .send(OutgoingMessage::Transcription { text: text.clone() })
            .await;
    }

    info!(session_id = %handle.id(), "Processing voice turn: {}", turn.text());

    let reply = match app_state.coordinator.get_reply(turn.text()).await {
        Ok(reply) => reply,
        Err(e) => {
            handle.report_error(&GatewayError::Backend(e)).await;
            return;
        }
    };

    handle
        .send(OutgoingMessage::Response {
            text: reply.text.clone(),
            source: Some(reply.source),
            response_time: None,
        })
        .await;

    match app_state.synthesize(&reply.text).await {
        Ok(Some(audio)) => {
            debug!(session_id = %handle.id(), "Synthesized {} bytes", audio.len());
            handle
                .send(OutgoingMessage::Audio {
                    audio: BASE64.encode(&audio),
                })
                .await;
        }
        Ok(None) => debug!(session_id = %handle.id(), "Synthesis unavailable, text-only reply"),
        Err(e) => handle.report_error(&GatewayError::Synthesis(e)).await,
    }
}

async fn process_text_turn(handle: &SessionHandle, app_state: &AppState, turn: Turn) {
    info!(session_id = %handle.id(), "Text message: {}", turn.text());

    handle
        .send(OutgoingMessage::status(StatusState::Processing))
        .await;

    let started = Instant::now();
    match app_state.coordinator.get_reply(turn.text()).await {
        Ok(reply) => {
            let response_time = started.elapsed().as_millis() as u64;
            handle
                .send(OutgoingMessage::Response {
                    text: reply.text,
                    source: Some(reply.source),
                    response_time: Some(response_time),
                })
                .await;
        }
        Err(e) => {
            handle.report_error(&GatewayError::Backend(e)).await;
            handle.send(OutgoingMessage::status(StatusState::Error)).await;
        }
    }
}
