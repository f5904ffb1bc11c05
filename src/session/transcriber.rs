//! Transcription stream owned by a voice session
//!
//! Wraps one [`BaseSTT`] instance at a time. Final transcripts become turns on
//! the owning session; stream errors are reported to the client and mark the
//! stream as failed. The next audio chunk after a failure opens a fresh stream,
//! at most once per [`REOPEN_COOLDOWN`], and replays the connection's first
//! chunk (the container header) before forwarding new audio.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::SessionId;
use super::registry::SessionRegistry;
use super::turn::Turn;
use crate::core::stt::{
    BaseSTT, STTError, STTErrorCallback, STTFactory, STTResult, STTResultCallback,
};
use crate::errors::GatewayError;

/// Minimum delay between two attempts to open a stream
pub const REOPEN_COOLDOWN: Duration = Duration::from_secs(2);

pub struct Transcriber {
    session_id: SessionId,
    factory: Arc<dyn STTFactory>,
    registry: SessionRegistry,
    stream: Option<Box<dyn BaseSTT>>,
    /// First chunk of the connection
    header: Option<Bytes>,
    failed: Arc<AtomicBool>,
    last_attempt: Option<Instant>,
    closed: bool,
}

impl Transcriber {
    pub fn new(
        session_id: SessionId,
        factory: Arc<dyn STTFactory>,
        registry: SessionRegistry,
    ) -> Self {
        Self {
            session_id,
            factory,
            registry,
            stream: None,
            header: None,
            failed: Arc::new(AtomicBool::new(false)),
            last_attempt: None,
            closed: false,
        }
    }

    /// Open a new upstream stream, replacing the current one
    pub async fn start(&mut self) -> Result<(), STTError> {
        self.last_attempt = Some(Instant::now());

        if let Some(mut old) = self.stream.take()
            && let Err(e) = old.disconnect().await
        {
            debug!(session_id = %self.session_id, "Failed to disconnect old stream: {}", e);
        }
        self.failed.store(false, Ordering::Release);

        let mut stream = self.factory.create()?;
        stream.on_result(self.result_callback()).await?;
        stream.on_error(self.error_callback()).await?;
        stream.connect().await?;

        info!(
            session_id = %self.session_id,
            provider = self.factory.provider_name(),
            "Transcription stream opened"
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// The current stream accepts audio
    pub fn is_active(&self) -> bool {
        !self.failed.load(Ordering::Acquire) && self.stream.as_ref().is_some_and(|s| s.is_ready())
    }

    /// Forward one audio chunk, reopening the stream if it has failed.
    ///
    /// Writes after [`close`](Self::close) are ignored. Chunks arriving during
    /// the reopen cooldown are dropped.
    pub async fn write(&mut self, chunk: Bytes) -> Result<(), STTError> {
        if self.closed {
            return Ok(());
        }

        let first_chunk = self.header.is_none();
        if first_chunk {
            self.header = Some(chunk.clone());
        }

        if !self.is_active() {
            if !self.cooldown_elapsed() {
                debug!(
                    session_id = %self.session_id,
                    "No transcription stream, dropping {} bytes", chunk.len()
                );
                return Ok(());
            }

            info!(session_id = %self.session_id, "Reopening transcription stream");
            self.start().await?;

            if !first_chunk && let Some(header) = self.header.clone() {
                self.send(header).await?;
            }
        }

        self.send(chunk).await
    }

    /// Close the stream; idempotent
    pub async fn close(&mut self) {
        self.closed = true;
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.disconnect().await {
                warn!(session_id = %self.session_id, "Failed to close transcription stream: {}", e);
            }
            info!(session_id = %self.session_id, "Transcription stream closed");
        }
    }

    fn cooldown_elapsed(&self) -> bool {
        self.last_attempt
            .is_none_or(|at| at.elapsed() >= REOPEN_COOLDOWN)
    }

    async fn send(&mut self, chunk: Bytes) -> Result<(), STTError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };
        if let Err(e) = stream.send_audio(chunk).await {
            self.failed.store(true, Ordering::Release);
            return Err(e);
        }
        Ok(())
    }

    fn result_callback(&self) -> STTResultCallback {
        let registry = self.registry.clone();
        let session_id = self.session_id.clone();

        Arc::new(move |result: STTResult| {
            let registry = registry.clone();
            let session_id = session_id.clone();
            Box::pin(async move {
                if !result.is_final {
                    debug!(session_id = %session_id, "Interim transcript: {}", result.transcript);
                    return;
                }

                let transcript = result.transcript.trim();
                if transcript.is_empty() {
                    return;
                }

                info!(session_id = %session_id, "Final transcript: {}", transcript);
                if let Some(handle) = registry.get(&session_id) {
                    handle.submit(Turn::Transcript(transcript.to_string())).await;
                }
            })
        })
    }

    fn error_callback(&self) -> STTErrorCallback {
        let registry = self.registry.clone();
        let session_id = self.session_id.clone();
        let failed = self.failed.clone();

        Arc::new(move |error: STTError| {
            let registry = registry.clone();
            let session_id = session_id.clone();
            let failed = failed.clone();
            Box::pin(async move {
                failed.store(true, Ordering::Release);
                if let Some(handle) = registry.get(&session_id) {
                    handle.report_error(&GatewayError::Transcription(error)).await;
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ws::messages::MessageRoute;
    use crate::session::{SessionHandle, SessionMode};
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct Recorded {
        created: usize,
        chunks: Vec<(usize, Bytes)>,
        error_callbacks: Vec<STTErrorCallback>,
        result_callbacks: Vec<STTResultCallback>,
        fail_connect: bool,
    }

    struct MockStream {
        index: usize,
        ready: bool,
        recorded: Arc<Mutex<Recorded>>,
    }

    #[async_trait::async_trait]
    impl BaseSTT for MockStream {
        fn new(_config: crate::core::stt::STTConfig) -> Result<Self, STTError> {
            Err(STTError::ConfigurationError("use the factory".into()))
        }

        async fn connect(&mut self) -> Result<(), STTError> {
            if self.recorded.lock().fail_connect {
                return Err(STTError::ConnectionFailed("refused".into()));
            }
            self.ready = true;
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<(), STTError> {
            self.ready = false;
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn send_audio(&mut self, audio_data: Bytes) -> Result<(), STTError> {
            self.recorded.lock().chunks.push((self.index, audio_data));
            Ok(())
        }

        async fn on_result(&mut self, callback: STTResultCallback) -> Result<(), STTError> {
            self.recorded.lock().result_callbacks.push(callback);
            Ok(())
        }

        async fn on_error(&mut self, callback: STTErrorCallback) -> Result<(), STTError> {
            self.recorded.lock().error_callbacks.push(callback);
            Ok(())
        }

        fn get_config(&self) -> Option<&crate::core::stt::STTConfig> {
            None
        }

        fn get_provider_info(&self) -> &'static str {
            "mock"
        }
    }

    struct MockFactory(Arc<Mutex<Recorded>>);

    impl STTFactory for MockFactory {
        fn create(&self) -> Result<Box<dyn BaseSTT>, STTError> {
            let mut recorded = self.0.lock();
            recorded.created += 1;
            Ok(Box::new(MockStream {
                index: recorded.created,
                ready: false,
                recorded: self.0.clone(),
            }))
        }

        fn provider_name(&self) -> &str {
            "mock"
        }
    }

    struct Fixture {
        recorded: Arc<Mutex<Recorded>>,
        transcriber: Transcriber,
        outbound: mpsc::Receiver<MessageRoute>,
        turns: mpsc::Receiver<Turn>,
        _handle: Arc<SessionHandle>,
    }

    fn fixture() -> Fixture {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let registry = SessionRegistry::new();
        let (outbound_tx, outbound) = mpsc::channel(16);
        let (turns_tx, turns) = mpsc::channel(16);
        let handle = Arc::new(SessionHandle::new(
            "client_test".to_string(),
            SessionMode::Voice,
            outbound_tx,
            turns_tx,
        ));
        registry.insert(handle.clone());
        handle.mark_open();

        let transcriber = Transcriber::new(
            "client_test".to_string(),
            Arc::new(MockFactory(recorded.clone())),
            registry,
        );
        Fixture {
            recorded,
            transcriber,
            outbound,
            turns,
            _handle: handle,
        }
    }

    #[tokio::test]
    async fn test_forwards_audio_after_start() {
        let mut f = fixture();
        f.transcriber.start().await.unwrap();
        assert!(f.transcriber.is_active());

        f.transcriber.write(Bytes::from_static(b"hdr")).await.unwrap();
        f.transcriber.write(Bytes::from_static(b"a1")).await.unwrap();

        let recorded = f.recorded.lock();
        assert_eq!(recorded.created, 1);
        assert_eq!(
            recorded.chunks,
            vec![(1, Bytes::from_static(b"hdr")), (1, Bytes::from_static(b"a1"))]
        );
    }

    #[tokio::test]
    async fn test_final_result_submits_turn_and_interim_does_not() {
        let mut f = fixture();
        f.transcriber.start().await.unwrap();
        let callback = f.recorded.lock().result_callbacks[0].clone();

        callback(STTResult::new("こん".into(), false, false, 0.5)).await;
        callback(STTResult::new("  ".into(), true, true, 0.9)).await;
        callback(STTResult::new("こんにちは".into(), true, true, 0.9)).await;

        assert_eq!(f.turns.try_recv().unwrap(), Turn::Transcript("こんにちは".into()));
        assert!(f.turns.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_after_error_replays_header() {
        let mut f = fixture();
        f.transcriber.start().await.unwrap();
        f.transcriber.write(Bytes::from_static(b"hdr")).await.unwrap();

        let on_error = f.recorded.lock().error_callbacks[0].clone();
        on_error(STTError::NetworkError("reset".into())).await;
        assert!(!f.transcriber.is_active());

        match f.outbound.try_recv().unwrap() {
            MessageRoute::Outgoing(crate::handlers::ws::messages::OutgoingMessage::Error {
                error,
            }) => assert!(error.starts_with("音声認識エラー")),
            other => panic!("unexpected route: {other:?}"),
        }

        tokio::time::advance(REOPEN_COOLDOWN).await;
        f.transcriber.write(Bytes::from_static(b"a2")).await.unwrap();

        let recorded = f.recorded.lock();
        assert_eq!(recorded.created, 2);
        assert_eq!(
            recorded.chunks[1..],
            [(2, Bytes::from_static(b"hdr")), (2, Bytes::from_static(b"a2"))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_dropped_during_cooldown() {
        let mut f = fixture();
        f.recorded.lock().fail_connect = true;
        assert!(f.transcriber.start().await.is_err());

        // Within the cooldown window nothing is attempted
        f.transcriber.write(Bytes::from_static(b"hdr")).await.unwrap();
        assert_eq!(f.recorded.lock().created, 1);

        f.recorded.lock().fail_connect = false;
        tokio::time::advance(REOPEN_COOLDOWN + Duration::from_millis(1)).await;
        f.transcriber.write(Bytes::from_static(b"a1")).await.unwrap();

        let recorded = f.recorded.lock();
        assert_eq!(recorded.created, 2);
        assert_eq!(
            recorded.chunks,
            vec![(2, Bytes::from_static(b"hdr")), (2, Bytes::from_static(b"a1"))]
        );
    }

    #[tokio::test]
    async fn test_write_after_close_is_noop() {
        let mut f = fixture();
        f.transcriber.start().await.unwrap();
        f.transcriber.close().await;
        f.transcriber.close().await;

        f.transcriber.write(Bytes::from_static(b"late")).await.unwrap();
        assert!(f.recorded.lock().chunks.is_empty());
        assert_eq!(f.recorded.lock().created, 1);
    }
}
