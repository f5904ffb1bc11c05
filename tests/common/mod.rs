//! Shared mock adapters for integration tests
//!
//! - `ScriptedBackend`: reply backend with a scripted delay and outcome
//! - `MockTTS`: synthesis adapter returning fixed bytes or an error
//! - `MockSTTFactory`: transcription factory whose streams record audio and
//!   expose their callbacks so tests can inject transcripts

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use voice_relay::config::ServerConfig;
use voice_relay::core::coordinator::ResponseCoordinator;
use voice_relay::core::llm::{LLMError, LLMResult, ReplyBackend};
use voice_relay::core::stt::{
    BaseSTT, STTConfig, STTError, STTErrorCallback, STTFactory, STTResult, STTResultCallback,
};
use voice_relay::core::tts::{BaseTTS, TTSConfig, TTSError, TTSResult};
use voice_relay::handlers::ws::messages::{MessageRoute, OutgoingMessage};
use voice_relay::state::AppState;

// =============================================================================
// Reply backends
// =============================================================================

pub struct ScriptedBackend {
    name: &'static str,
    delay: Duration,
    outcome: Result<String, LLMError>,
    pub calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn ok(name: &'static str, delay_ms: u64, text: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            delay: Duration::from_millis(delay_ms),
            outcome: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &'static str, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            name,
            delay: Duration::from_millis(delay_ms),
            outcome: Err(LLMError::ApiError {
                status: 500,
                message: format!("{name} internal error"),
            }),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplyBackend for ScriptedBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, _prompt: &str) -> LLMResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.outcome.clone()
    }
}

/// Coordinator over the given backends, in order
pub fn coordinator(backends: &[Arc<ScriptedBackend>]) -> ResponseCoordinator {
    ResponseCoordinator::new(
        backends
            .iter()
            .map(|b| b.clone() as Arc<dyn ReplyBackend>)
            .collect(),
    )
}

// =============================================================================
// Synthesis
// =============================================================================

pub struct MockTTS {
    config: TTSConfig,
    fail: bool,
    pub calls: AtomicUsize,
}

impl MockTTS {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            config: TTSConfig::default(),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            config: TTSConfig::default(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }
}

/// Bytes every successful `MockTTS` call returns
pub const MOCK_AUDIO: &[u8] = b"ID3-mock-audio";

#[async_trait]
impl BaseTTS for MockTTS {
    async fn synthesize(&self, _text: &str) -> TTSResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TTSError::ProviderError("quota exceeded".into()));
        }
        Ok(Bytes::from_static(MOCK_AUDIO))
    }

    fn get_config(&self) -> &TTSConfig {
        &self.config
    }

    fn get_provider_info(&self) -> &'static str {
        "mock-tts"
    }
}

// =============================================================================
// Transcription
// =============================================================================

#[derive(Default)]
pub struct StreamLog {
    pub opened: usize,
    pub closed: usize,
    pub chunks: Vec<Bytes>,
    pub result_callbacks: Vec<STTResultCallback>,
    pub error_callbacks: Vec<STTErrorCallback>,
}

struct MockStream {
    ready: bool,
    log: Arc<Mutex<StreamLog>>,
}

#[async_trait]
impl BaseSTT for MockStream {
    fn new(_config: STTConfig) -> Result<Self, STTError> {
        Err(STTError::ConfigurationError("created by MockSTTFactory".into()))
    }

    async fn connect(&mut self) -> Result<(), STTError> {
        self.ready = true;
        self.log.lock().opened += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), STTError> {
        if self.ready {
            self.ready = false;
            self.log.lock().closed += 1;
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn send_audio(&mut self, audio_data: Bytes) -> Result<(), STTError> {
        self.log.lock().chunks.push(audio_data);
        Ok(())
    }

    async fn on_result(&mut self, callback: STTResultCallback) -> Result<(), STTError> {
        self.log.lock().result_callbacks.push(callback);
        Ok(())
    }

    async fn on_error(&mut self, callback: STTErrorCallback) -> Result<(), STTError> {
        self.log.lock().error_callbacks.push(callback);
        Ok(())
    }

    fn get_config(&self) -> Option<&STTConfig> {
        None
    }

    fn get_provider_info(&self) -> &'static str {
        "mock-stt"
    }
}

#[derive(Default)]
pub struct MockSTTFactory {
    pub log: Arc<Mutex<StreamLog>>,
}

impl MockSTTFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver a transcript through the most recently opened stream
    pub async fn emit(&self, transcript: &str, is_final: bool) {
        let callback = self
            .log
            .lock()
            .result_callbacks
            .last()
            .cloned()
            .expect("no stream opened");
        callback(STTResult::new(transcript.to_string(), is_final, is_final, 0.95)).await;
    }
}

impl STTFactory for MockSTTFactory {
    fn create(&self) -> Result<Box<dyn BaseSTT>, STTError> {
        Ok(Box::new(MockStream {
            ready: false,
            log: self.log.clone(),
        }))
    }

    fn provider_name(&self) -> &str {
        "mock-stt"
    }
}

// =============================================================================
// State and helpers
// =============================================================================

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".to_string();
    config.static_dir = None;
    config
}

pub fn app_state(
    backends: &[Arc<ScriptedBackend>],
    tts: Option<Arc<MockTTS>>,
    stt: Option<Arc<MockSTTFactory>>,
) -> Arc<AppState> {
    AppState::from_parts(
        test_config(),
        coordinator(backends),
        tts.map(|t| t as Arc<dyn BaseTTS>),
        stt.map(|s| s as Arc<dyn STTFactory>),
    )
}

/// Next outbound event, failing the test after five (possibly virtual) seconds
pub async fn next_event(rx: &mut mpsc::Receiver<MessageRoute>) -> OutgoingMessage {
    match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(MessageRoute::Outgoing(message))) => message,
        Ok(Some(MessageRoute::Close)) => panic!("unexpected close route"),
        Ok(None) => panic!("outbound channel closed"),
        Err(_) => panic!("timed out waiting for outbound event"),
    }
}

/// Assert nothing else is emitted within `window`
pub async fn assert_quiet(rx: &mut mpsc::Receiver<MessageRoute>, window: Duration) {
    if let Ok(Some(route)) = tokio::time::timeout(window, rx.recv()).await {
        panic!("unexpected outbound event: {route:?}");
    }
}
