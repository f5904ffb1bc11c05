//! WebSocket connection handling
//!
//! Each upgraded connection gets a sender task that serializes outbound
//! events, and a receive loop that feeds inbound frames to its [`Session`].

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Redirect, Response},
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::messages::MessageRoute;
use super::processor::process_message;
use crate::errors::GatewayError;
use crate::session::{Session, SessionMode};
use crate::state::AppState;

/// Outbound queue size per connection
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// How long the sender task may take to flush after the session closes
const SENDER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Voice endpoint (`GET /`)
///
/// Binary frames carry audio. A plain browser request without upgrade headers
/// is redirected to the static client when one is being served.
pub async fn ws_voice_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match ws {
        Ok(ws) => upgrade(ws, state, SessionMode::Voice),
        Err(rejection) => {
            if state.config.static_dir.is_some() {
                Redirect::temporary("/index.html").into_response()
            } else {
                rejection.into_response()
            }
        }
    }
}

/// Text endpoint (`GET /text`)
pub async fn ws_text_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    upgrade(ws, state, SessionMode::Text)
}

fn upgrade(ws: WebSocketUpgrade, state: Arc<AppState>, mode: SessionMode) -> Response {
    info!(mode = %mode, "WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, state, mode))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, mode: SessionMode) {
    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<MessageRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task for outgoing messages
    let mut sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let result = match route {
                MessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                MessageRoute::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if let Err(e) = result {
                warn!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let mut session = Session::open(app_state.clone(), mode, message_tx.clone()).await;
    let idle_timeout = app_state.config.idle_timeout();

    loop {
        let next = match idle_timeout {
            Some(limit) => match timeout(limit, receiver.next()).await {
                Ok(next) => next.map(transport),
                // The client is waiting on a reply, not idle
                Err(_) if session.handle().has_pending_turns() => continue,
                Err(_) => Some(Err(GatewayError::Transport(format!(
                    "idle for {}s",
                    limit.as_secs()
                )))),
            },
            None => receiver.next().await.map(transport),
        };

        let outcome = match next {
            Some(Ok(msg)) => process_message(msg, &mut session).await,
            Some(Err(e)) => Err(e),
            None => {
                info!(session_id = %session.id(), "WebSocket connection closed by client");
                break;
            }
        };

        match outcome {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                session.report_error(&e).await;
                if e.is_fatal() {
                    break;
                }
            }
        }
    }

    session.close().await;

    let _ = message_tx.try_send(MessageRoute::Close);
    drop(message_tx);
    if timeout(SENDER_DRAIN_TIMEOUT, &mut sender_task).await.is_err() {
        sender_task.abort();
    }

    info!(mode = %mode, "WebSocket connection terminated");
}

fn transport(frame: Result<Message, axum::Error>) -> Result<Message, GatewayError> {
    frame.map_err(|e| GatewayError::Transport(e.to_string()))
}
