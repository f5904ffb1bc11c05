//! Per-connection sessions
//!
//! A [`Session`] is owned by its connection task and drives the lifecycle:
//!
//! ```text
//! Connecting -> Open -> Closing -> Closed
//! ```
//!
//! The parts other tasks need (outbound queue, turn queue, state, cancellation)
//! live in a shared [`SessionHandle`], which is what the [`SessionRegistry`]
//! stores. Transcription callbacks and the turn worker only ever reach a
//! session through its handle.

mod registry;
mod transcriber;
mod turn;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use registry::SessionRegistry;
pub use transcriber::{REOPEN_COOLDOWN, Transcriber};
pub use turn::{TURN_QUEUE_CAPACITY, Turn};

use crate::errors::GatewayError;
use crate::handlers::ws::messages::{MessageRoute, OutgoingMessage, StatusState};
use crate::state::AppState;

/// Opaque, never reused session identifier
pub type SessionId = String;

/// Generate a fresh session identifier
pub fn new_session_id() -> SessionId {
    format!("client_{}", Uuid::new_v4().simple())
}

/// Which endpoint the session was opened on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Voice,
    Text,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Voice => write!(f, "voice"),
            SessionMode::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Open) | (Connecting, Closing) | (Open, Closing) | (Closing, Closed)
        )
    }

    /// Outbound events may still be delivered
    pub fn accepts_sends(self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Open)
    }
}

// =============================================================================
// Shared handle
// =============================================================================

/// The shareable part of a session
pub struct SessionHandle {
    id: SessionId,
    mode: SessionMode,
    outbound: mpsc::Sender<MessageRoute>,
    turns: mpsc::Sender<Turn>,
    state: Mutex<SessionState>,
    cancel: CancellationToken,
    /// Turns queued or running on the worker
    pending_turns: AtomicUsize,
}

impl SessionHandle {
    pub fn new(
        id: SessionId,
        mode: SessionMode,
        outbound: mpsc::Sender<MessageRoute>,
        turns: mpsc::Sender<Turn>,
    ) -> Self {
        Self {
            id,
            mode,
            outbound,
            turns,
            state: Mutex::new(SessionState::Connecting),
            cancel: CancellationToken::new(),
            pending_turns: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Apply a state transition; invalid transitions are ignored
    pub(crate) fn advance(&self, next: SessionState) -> bool {
        let mut state = self.state.lock();
        if state.can_transition_to(next) {
            *state = next;
            true
        } else {
            false
        }
    }

    pub(crate) fn mark_open(&self) -> bool {
        self.advance(SessionState::Open)
    }

    pub(crate) async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Queue an outbound event.
    ///
    /// Returns `false` when the event was dropped because the session is
    /// closing or the connection is gone.
    pub async fn send(&self, message: OutgoingMessage) -> bool {
        if !self.state().accepts_sends() {
            debug!(session_id = %self.id, "Session closing, dropping outbound event");
            return false;
        }
        self.outbound
            .send(MessageRoute::Outgoing(message))
            .await
            .is_ok()
    }

    /// Queue a turn for the worker; waits while the queue is full
    pub async fn submit(&self, turn: Turn) -> bool {
        if !self.state().accepts_sends() {
            return false;
        }
        self.pending_turns.fetch_add(1, Ordering::AcqRel);
        let queued = tokio::select! {
            sent = self.turns.send(turn) => sent.is_ok(),
            _ = self.cancel.cancelled() => false,
        };
        if !queued {
            self.finish_turn();
        }
        queued
    }

    pub(crate) fn finish_turn(&self) {
        self.pending_turns.fetch_sub(1, Ordering::AcqRel);
    }

    /// A turn is queued or in progress, so the client is waiting on us
    pub fn has_pending_turns(&self) -> bool {
        self.pending_turns.load(Ordering::Acquire) > 0
    }

    /// Log a per-turn error and surface its translated message to the client
    pub async fn report_error(&self, error: &GatewayError) {
        warn!(session_id = %self.id, "{}", error);
        self.send(OutgoingMessage::error(error.client_message())).await;
    }
}

// =============================================================================
// Session
// =============================================================================

/// One client connection's lifecycle, owned by the connection task
pub struct Session {
    handle: Arc<SessionHandle>,
    transcriber: Option<Transcriber>,
    worker: Option<JoinHandle<()>>,
    app_state: Arc<AppState>,
}

impl Session {
    /// Create the session, register it and start its turn worker.
    ///
    /// Voice sessions also open their transcription stream. Failing to open it
    /// is reported to the client but does not prevent the session from opening.
    pub async fn open(
        app_state: Arc<AppState>,
        mode: SessionMode,
        outbound: mpsc::Sender<MessageRoute>,
    ) -> Self {
        let (turns_tx, turns_rx) = mpsc::channel(TURN_QUEUE_CAPACITY);
        let mut handle = Arc::new(SessionHandle::new(
            new_session_id(),
            mode,
            outbound.clone(),
            turns_tx.clone(),
        ));
        while !app_state.sessions.insert(handle.clone()) {
            handle = Arc::new(SessionHandle::new(
                new_session_id(),
                mode,
                outbound.clone(),
                turns_tx.clone(),
            ));
        }

        let worker = tokio::spawn(turn::run_turn_loop(
            handle.clone(),
            app_state.clone(),
            turns_rx,
        ));

        let mut session = Self {
            handle,
            transcriber: None,
            worker: Some(worker),
            app_state,
        };

        if mode == SessionMode::Voice {
            session.open_transcriber().await;
        }

        session.handle.mark_open();
        info!(session_id = %session.id(), mode = %mode, "Session opened");

        if mode == SessionMode::Text {
            session
                .handle
                .send(OutgoingMessage::status(StatusState::Idle))
                .await;
        }

        session
    }

    async fn open_transcriber(&mut self) {
        let Some(factory) = self.app_state.transcription.clone() else {
            debug!(session_id = %self.id(), "Transcription unavailable, audio will be dropped");
            return;
        };

        let mut transcriber = Transcriber::new(
            self.handle.id.clone(),
            factory,
            self.app_state.sessions.clone(),
        );
        if let Err(e) = transcriber.start().await {
            self.report_error(&GatewayError::Transcription(e)).await;
        }
        self.transcriber = Some(transcriber);
    }

    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn mode(&self) -> SessionMode {
        self.handle.mode()
    }

    pub fn state(&self) -> SessionState {
        self.handle.state()
    }

    pub fn handle(&self) -> &Arc<SessionHandle> {
        &self.handle
    }

    /// Forward an inbound audio chunk to the transcription stream
    pub async fn push_audio(&mut self, chunk: Bytes) {
        let Some(transcriber) = self.transcriber.as_mut() else {
            debug!(session_id = %self.handle.id, "Dropping {} bytes of audio", chunk.len());
            return;
        };

        if let Err(e) = transcriber.write(chunk).await {
            self.handle
                .report_error(&GatewayError::Transcription(e))
                .await;
        }
    }

    /// Queue typed text as a turn; blank input is ignored
    pub async fn submit_text(&self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            debug!(session_id = %self.handle.id, "Ignoring empty text message");
            return;
        }
        self.handle.submit(Turn::Text(content.to_string())).await;
    }

    pub async fn report_error(&self, error: &GatewayError) {
        self.handle.report_error(error).await;
    }

    /// Close the session. Safe to call more than once.
    pub async fn close(&mut self) {
        if !self.handle.advance(SessionState::Closing) {
            return;
        }

        self.handle.cancel.cancel();
        if let Some(mut transcriber) = self.transcriber.take() {
            transcriber.close().await;
        }
        // The worker stops after its current turn
        self.worker.take();

        self.app_state.sessions.remove(self.handle.id());
        self.handle.advance(SessionState::Closed);
        info!(session_id = %self.handle.id, "Session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.handle.state() != SessionState::Closed {
            self.handle.cancel.cancel();
            self.app_state.sessions.remove(self.handle.id());
            *self.handle.state.lock() = SessionState::Closed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        use SessionState::*;
        assert!(Connecting.can_transition_to(Open));
        assert!(Connecting.can_transition_to(Closing));
        assert!(Open.can_transition_to(Closing));
        assert!(Closing.can_transition_to(Closed));

        assert!(!Closing.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Open));
        assert!(!Open.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Closing));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert!(a.starts_with("client_"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_handle_drops_sends_after_closing() {
        let (outbound_tx, mut outbound_rx) = mpsc::channel(4);
        let (turns_tx, _turns_rx) = mpsc::channel(4);
        let handle =
            SessionHandle::new("client_1".into(), SessionMode::Text, outbound_tx, turns_tx);

        assert!(handle.mark_open());
        assert!(handle.send(OutgoingMessage::error("first")).await);
        assert!(handle.advance(SessionState::Closing));
        assert!(!handle.send(OutgoingMessage::error("late")).await);
        assert!(!handle.submit(Turn::Text("late".into())).await);

        assert!(matches!(outbound_rx.try_recv(), Ok(MessageRoute::Outgoing(_))));
        assert!(outbound_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_to_dropped_connection_is_not_fatal() {
        let (outbound_tx, outbound_rx) = mpsc::channel(4);
        let (turns_tx, _turns_rx) = mpsc::channel(4);
        let handle =
            SessionHandle::new("client_2".into(), SessionMode::Voice, outbound_tx, turns_tx);
        drop(outbound_rx);

        assert!(!handle.send(OutgoingMessage::error("gone")).await);
    }

    #[tokio::test]
    async fn test_pending_turns_follow_queue_and_worker() {
        let (outbound_tx, _outbound_rx) = mpsc::channel(4);
        let (turns_tx, mut turns_rx) = mpsc::channel(4);
        let handle =
            SessionHandle::new("client_3".into(), SessionMode::Text, outbound_tx, turns_tx);
        handle.mark_open();
        assert!(!handle.has_pending_turns());

        assert!(handle.submit(Turn::Text("one".into())).await);
        assert!(handle.has_pending_turns());

        // Dequeued but still running
        turns_rx.recv().await.unwrap();
        assert!(handle.has_pending_turns());
        handle.finish_turn();
        assert!(!handle.has_pending_turns());

        // A turn that never reaches the queue is not counted
        drop(turns_rx);
        assert!(!handle.submit(Turn::Text("two".into())).await);
        assert!(!handle.has_pending_turns());
    }
}
