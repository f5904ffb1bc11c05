//! Deepgram live transcription WebSocket client.
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │   send_audio()  │────▶│  ws_sender (mpsc)│────▶│  WebSocket Task │
//! └─────────────────┘     └──────────────────┘     └────────┬────────┘
//!                                                           │
//!                         ┌──────────────────┐              │
//!                         │  result_tx (mpsc)│◀─────────────┘
//!                         └────────┬─────────┘
//!                                  │
//!                         ┌────────▼─────────┐
//!                         │ Result Forward   │────▶ User Callback
//!                         │      Task        │
//!                         └──────────────────┘
//! ```
//!
//! Errors travel the same way on a separate channel. Once an error has been
//! reported the stream is closed and `is_ready()` returns false.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use super::config::DeepgramSTTConfig;
use super::messages::{ControlMessage, DeepgramMessage};
use crate::core::stt::base::{
    BaseSTT, STTConfig, STTError, STTErrorCallback, STTResult, STTResultCallback,
};

// =============================================================================
// Constants
// =============================================================================

/// Maximum audio chunk size in bytes (sanity check against runaway clients)
const MAX_AUDIO_CHUNK_SIZE: usize = 1024 * 1024;

/// Deepgram closes streams that see neither audio nor KeepAlive for ~10s
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Per-message idle timeout for WebSocket message reception.
const WS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Time allowed for the WebSocket handshake
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type AsyncSTTCallback = Box<
    dyn Fn(STTResult) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
        + Send
        + Sync,
>;

type AsyncErrorCallback = Box<
    dyn Fn(STTError) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
        + Send
        + Sync,
>;

// =============================================================================
// DeepgramSTT Client
// =============================================================================

/// Deepgram streaming STT client.
pub struct DeepgramSTT {
    pub(crate) config: DeepgramSTTConfig,

    /// Audio sender; bounded for backpressure
    ws_sender: Option<mpsc::Sender<Bytes>>,

    shutdown_tx: Option<oneshot::Sender<()>>,

    connection_handle: Option<tokio::task::JoinHandle<()>>,
    result_forward_handle: Option<tokio::task::JoinHandle<()>>,
    error_forward_handle: Option<tokio::task::JoinHandle<()>>,

    result_callback: Arc<Mutex<Option<AsyncSTTCallback>>>,
    error_callback: Arc<Mutex<Option<AsyncErrorCallback>>>,

    /// Connection state flag (shared with connection task)
    is_connected: Arc<AtomicBool>,
}

impl DeepgramSTT {
    /// Handle one incoming WebSocket message.
    ///
    /// # Returns
    /// * `Ok(true)` - Continue processing messages
    /// * `Ok(false)` - Stream closed by the server
    /// * `Err(STTError)` - Provider error, close connection
    pub(crate) async fn handle_websocket_message(
        message: Message,
        result_tx: &mpsc::Sender<STTResult>,
    ) -> Result<bool, STTError> {
        match message {
            Message::Text(text) => match DeepgramMessage::parse(&text) {
                Ok(DeepgramMessage::Results(results)) => {
                    let Some(best) = results.best() else {
                        return Ok(true);
                    };
                    // Silence produces empty hypotheses
                    if best.transcript.trim().is_empty() {
                        return Ok(true);
                    }

                    let stt_result = STTResult::new(
                        best.transcript.clone(),
                        results.is_final,
                        results.speech_final,
                        (best.confidence as f32).clamp(0.0, 1.0),
                    );
                    // Finals wait for room; interim hypotheses may be dropped
                    if stt_result.is_final {
                        if result_tx.send(stt_result).await.is_err() {
                            warn!("Deepgram result channel closed, final transcript lost");
                        }
                    } else if result_tx.try_send(stt_result).is_err() {
                        debug!("Deepgram result channel full, dropping interim transcript");
                    }
                }
                Ok(DeepgramMessage::Metadata(metadata)) => {
                    debug!("Deepgram stream metadata: request_id={}", metadata.request_id);
                }
                Ok(DeepgramMessage::UtteranceEnd) | Ok(DeepgramMessage::SpeechStarted) => {}
                Ok(DeepgramMessage::Error(err)) => {
                    error!(
                        "Deepgram STT error ({}): {}",
                        err.code.as_deref().unwrap_or("unknown"),
                        err.description
                    );
                    return Err(match err.code.as_deref() {
                        Some("INVALID_AUTH") | Some("INSUFFICIENT_PERMISSIONS") => {
                            STTError::AuthenticationFailed(err.description)
                        }
                        Some("DATA-0000") | Some("BAD_AUDIO") => {
                            STTError::InvalidAudioFormat(err.description)
                        }
                        _ => STTError::ProviderError(err.description),
                    });
                }
                Ok(DeepgramMessage::Unknown(raw)) => {
                    debug!("Received unknown Deepgram message: {}", raw);
                }
                Err(e) => {
                    warn!("Failed to parse Deepgram message: {}", e);
                }
            },
            Message::Close(close_frame) => {
                info!("Deepgram WebSocket closed: {:?}", close_frame);
                return Ok(false);
            }
            _ => {}
        }

        Ok(true)
    }

    async fn start_connection(&mut self) -> Result<(), STTError> {
        let ws_url = self.config.build_websocket_url()?;

        let mut request = ws_url
            .as_str()
            .into_client_request()
            .map_err(|e| STTError::ConfigurationError(format!("Invalid Deepgram URL: {e}")))?;
        let auth = HeaderValue::from_str(&format!("Token {}", self.config.base.api_key))
            .map_err(|e| STTError::ConfigurationError(format!("Invalid API key header: {e}")))?;
        request.headers_mut().insert("Authorization", auth);

        let (ws_tx, mut ws_rx) = mpsc::channel::<Bytes>(32);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let (result_tx, mut result_rx) = mpsc::channel::<STTResult>(256);
        let (error_tx, mut error_rx) = mpsc::channel::<STTError>(16);
        let (connected_tx, connected_rx) = oneshot::channel::<Result<(), STTError>>();

        let is_connected = self.is_connected.clone();

        let connection_handle = tokio::spawn(async move {
            let ws_stream = match timeout(CONNECT_TIMEOUT, connect_async(request)).await {
                Ok(Ok((ws_stream, _response))) => ws_stream,
                Ok(Err(e)) => {
                    let _ = connected_tx.send(Err(STTError::ConnectionFailed(format!(
                        "Failed to connect to Deepgram: {e}"
                    ))));
                    return;
                }
                Err(_) => {
                    let _ = connected_tx.send(Err(STTError::ConnectionFailed(
                        "Timed out connecting to Deepgram".to_string(),
                    )));
                    return;
                }
            };

            info!("Connected to Deepgram STT WebSocket");
            is_connected.store(true, Ordering::Release);
            let _ = connected_tx.send(Ok(()));

            let (mut ws_sink, mut ws_stream) = ws_stream.split();
            let mut keepalive = tokio::time::interval(KEEPALIVE_INTERVAL);
            keepalive.tick().await;

            loop {
                tokio::select! {
                    Some(audio_data) = ws_rx.recv() => {
                        let data_len = audio_data.len();
                        if let Err(e) = ws_sink.send(Message::Binary(audio_data)).await {
                            let _ = error_tx.try_send(STTError::NetworkError(format!(
                                "Failed to send audio to Deepgram: {e}"
                            )));
                            break;
                        }
                        debug!("Sent {} bytes of audio to Deepgram", data_len);
                    }

                    _ = keepalive.tick() => {
                        let keepalive_msg = ControlMessage::KeepAlive.to_json();
                        if let Err(e) = ws_sink.send(Message::Text(keepalive_msg.into())).await {
                            warn!("Failed to send Deepgram KeepAlive: {}", e);
                        }
                    }

                    message = timeout(WS_MESSAGE_TIMEOUT, ws_stream.next()) => {
                        match message {
                            Ok(Some(Ok(msg))) => {
                                match Self::handle_websocket_message(msg, &result_tx).await {
                                    Ok(true) => {}
                                    Ok(false) => break,
                                    Err(e) => {
                                        let _ = error_tx.try_send(e);
                                        break;
                                    }
                                }
                            }
                            Ok(Some(Err(e))) => {
                                let _ = error_tx.try_send(STTError::NetworkError(format!(
                                    "WebSocket error: {e}"
                                )));
                                break;
                            }
                            Ok(None) => {
                                info!("Deepgram WebSocket stream ended");
                                break;
                            }
                            Err(_elapsed) => {
                                let _ = error_tx.try_send(STTError::NetworkError(
                                    "WebSocket idle timeout - no message for 60 seconds".into(),
                                ));
                                break;
                            }
                        }
                    }

                    _ = &mut shutdown_rx => {
                        let close_msg = ControlMessage::CloseStream.to_json();
                        let _ = ws_sink.send(Message::Text(close_msg.into())).await;
                        let _ = ws_sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            is_connected.store(false, Ordering::Release);
            info!("Deepgram STT WebSocket connection closed");
        });

        // Start result forwarding task
        let callback_ref = self.result_callback.clone();
        let result_forward_handle = tokio::spawn(async move {
            while let Some(result) = result_rx.recv().await {
                if let Some(callback) = callback_ref.lock().await.as_ref() {
                    callback(result).await;
                } else {
                    debug!(
                        "Deepgram STT result (no callback): {} (final: {})",
                        result.transcript, result.is_final
                    );
                }
            }
        });

        // Start error forwarding task
        let error_callback_ref = self.error_callback.clone();
        let error_forward_handle = tokio::spawn(async move {
            while let Some(error) = error_rx.recv().await {
                if let Some(callback) = error_callback_ref.lock().await.as_ref() {
                    callback(error).await;
                } else {
                    error!("Deepgram STT error (no callback registered): {}", error);
                }
            }
        });

        self.ws_sender = Some(ws_tx);
        self.shutdown_tx = Some(shutdown_tx);
        self.connection_handle = Some(connection_handle);
        self.result_forward_handle = Some(result_forward_handle);
        self.error_forward_handle = Some(error_forward_handle);

        match connected_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("{}", e);
                Err(e)
            }
            Err(_) => Err(STTError::ConnectionFailed(
                "Connection task ended before the stream opened".to_string(),
            )),
        }
    }
}

impl Drop for DeepgramSTT {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

// =============================================================================
// BaseSTT Trait Implementation
// =============================================================================

#[async_trait::async_trait]
impl BaseSTT for DeepgramSTT {
    fn new(config: STTConfig) -> Result<Self, STTError> {
        if config.api_key.is_empty() {
            return Err(STTError::AuthenticationFailed(
                "API key is required for Deepgram STT".to_string(),
            ));
        }

        let config = DeepgramSTTConfig::from_base(config)?;
        // Surface URL problems at construction rather than on first connect
        config.build_websocket_url()?;

        Ok(Self {
            config,
            ws_sender: None,
            shutdown_tx: None,
            connection_handle: None,
            result_forward_handle: None,
            error_forward_handle: None,
            result_callback: Arc::new(Mutex::new(None)),
            error_callback: Arc::new(Mutex::new(None)),
            is_connected: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn connect(&mut self) -> Result<(), STTError> {
        if self.is_ready() {
            return Ok(());
        }
        self.start_connection().await
    }

    async fn disconnect(&mut self) -> Result<(), STTError> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }

        if let Some(handle) = self.connection_handle.take() {
            let _ = timeout(Duration::from_secs(5), handle).await;
        }

        if let Some(handle) = self.result_forward_handle.take() {
            handle.abort();
            let _ = handle.await;
        }

        if let Some(handle) = self.error_forward_handle.take() {
            handle.abort();
            let _ = handle.await;
        }

        self.ws_sender = None;
        *self.result_callback.lock().await = None;
        *self.error_callback.lock().await = None;
        self.is_connected.store(false, Ordering::Release);

        info!("Disconnected from Deepgram STT");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.is_connected.load(Ordering::Acquire) && self.ws_sender.is_some()
    }

    async fn send_audio(&mut self, audio_data: Bytes) -> Result<(), STTError> {
        if !self.is_ready() {
            return Err(STTError::ConnectionFailed(
                "Not connected to Deepgram STT".to_string(),
            ));
        }

        let data_len = audio_data.len();
        if data_len > MAX_AUDIO_CHUNK_SIZE {
            return Err(STTError::InvalidAudioFormat(format!(
                "Audio chunk size {data_len} bytes exceeds maximum {MAX_AUDIO_CHUNK_SIZE} bytes"
            )));
        }

        if let Some(ws_sender) = &self.ws_sender {
            ws_sender
                .send(audio_data)
                .await
                .map_err(|e| STTError::NetworkError(format!("Failed to send audio data: {e}")))?;
        }

        Ok(())
    }

    async fn on_result(&mut self, callback: STTResultCallback) -> Result<(), STTError> {
        *self.result_callback.lock().await = Some(Box::new(move |result| {
            let cb = callback.clone();
            Box::pin(async move {
                cb(result).await;
            })
        }));
        Ok(())
    }

    async fn on_error(&mut self, callback: STTErrorCallback) -> Result<(), STTError> {
        *self.error_callback.lock().await = Some(Box::new(move |error| {
            let cb = callback.clone();
            Box::pin(async move {
                cb(error).await;
            })
        }));
        Ok(())
    }

    fn get_config(&self) -> Option<&STTConfig> {
        Some(&self.config.base)
    }

    fn get_provider_info(&self) -> &'static str {
        "Deepgram Live Streaming STT"
    }
}
