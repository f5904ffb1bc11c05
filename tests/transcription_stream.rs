//! Deepgram streaming client against a local WebSocket server
//!
//! The mock accepts one connection, records what the client sends and answers
//! the first audio frame with a scripted list of provider messages.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

use voice_relay::core::stt::{
    BaseSTT, DeepgramSTT, STTConfig, STTError, STTErrorCallback, STTResult, STTResultCallback,
};

/// What the mock server saw during the handshake
struct Handshake {
    uri: String,
    authorization: Option<String>,
}

/// A frame received from the client
#[derive(Debug)]
enum Received {
    Audio(Vec<u8>),
    Control(String),
    Closed,
}

async fn spawn_mock_deepgram(
    script: Vec<String>,
) -> (
    SocketAddr,
    oneshot::Receiver<Handshake>,
    mpsc::UnboundedReceiver<Received>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (handshake_tx, handshake_rx) = oneshot::channel();
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut handshake = None;
        let record = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            handshake = Some(Handshake {
                uri: req.uri().to_string(),
                authorization: req
                    .headers()
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            });
            Ok(resp)
        };
        let ws = accept_hdr_async(stream, record).await.unwrap();
        if let Some(handshake) = handshake {
            let _ = handshake_tx.send(handshake);
        }

        let (mut sink, mut source) = ws.split();
        let mut script = Some(script);
        while let Some(Ok(msg)) = source.next().await {
            match msg {
                Message::Binary(data) => {
                    let _ = frames_tx.send(Received::Audio(data.to_vec()));
                    for reply in script.take().unwrap_or_default() {
                        if sink.send(Message::Text(reply.into())).await.is_err() {
                            return;
                        }
                    }
                }
                Message::Text(text) => {
                    let _ = frames_tx.send(Received::Control(text.as_str().to_string()));
                }
                Message::Close(_) => {
                    let _ = frames_tx.send(Received::Closed);
                    break;
                }
                _ => {}
            }
        }
    });

    (addr, handshake_rx, frames_rx)
}

fn config(addr: SocketAddr) -> STTConfig {
    STTConfig {
        api_key: "dg-test-key".to_string(),
        endpoint_url: Some(format!("ws://{addr}/v1/listen")),
        ..Default::default()
    }
}

fn results(transcript: &str, is_final: bool) -> String {
    json!({
        "type": "Results",
        "is_final": is_final,
        "speech_final": is_final,
        "start": 0.0,
        "duration": 1.2,
        "channel": {"alternatives": [{"transcript": transcript, "confidence": 0.97}]}
    })
    .to_string()
}

async fn connected_client(
    addr: SocketAddr,
) -> (
    DeepgramSTT,
    mpsc::UnboundedReceiver<STTResult>,
    mpsc::UnboundedReceiver<STTError>,
) {
    let mut client = <DeepgramSTT as BaseSTT>::new(config(addr)).unwrap();

    let (result_tx, result_rx) = mpsc::unbounded_channel();
    let on_result: STTResultCallback = Arc::new(move |result| {
        let tx = result_tx.clone();
        Box::pin(async move {
            let _ = tx.send(result);
        })
    });
    let (error_tx, error_rx) = mpsc::unbounded_channel();
    let on_error: STTErrorCallback = Arc::new(move |error| {
        let tx = error_tx.clone();
        Box::pin(async move {
            let _ = tx.send(error);
        })
    });

    client.on_result(on_result).await.unwrap();
    client.on_error(on_error).await.unwrap();
    client.connect().await.unwrap();
    (client, result_rx, error_rx)
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed")
}

#[tokio::test]
async fn test_handshake_carries_token_and_query() {
    let (addr, handshake, _frames) = spawn_mock_deepgram(Vec::new()).await;
    let (client, _results, _errors) = connected_client(addr).await;
    assert!(client.is_ready());

    let handshake = timeout(Duration::from_secs(5), handshake).await.unwrap().unwrap();
    assert_eq!(handshake.authorization.as_deref(), Some("Token dg-test-key"));
    assert!(handshake.uri.starts_with("/v1/listen?"));
    assert!(handshake.uri.contains("model=nova-2"));
    assert!(handshake.uri.contains("language=ja"));
    assert!(handshake.uri.contains("interim_results=true"));
}

#[tokio::test]
async fn test_audio_forwarded_and_results_delivered() {
    let script = vec![
        results("こんにち", false),
        results("", true),
        results("こんにちは", true),
    ];
    let (addr, _handshake, mut frames) = spawn_mock_deepgram(script).await;
    let (mut client, mut results_rx, _errors) = connected_client(addr).await;

    client
        .send_audio(Bytes::from_static(b"\x1a\x45\xdf\xa3webm-header"))
        .await
        .unwrap();

    match recv(&mut frames).await {
        Received::Audio(data) => assert_eq!(data, b"\x1a\x45\xdf\xa3webm-header"),
        other => panic!("expected audio, got {other:?}"),
    }

    let interim = recv(&mut results_rx).await;
    assert_eq!(interim.transcript, "こんにち");
    assert!(!interim.is_final);

    // The empty final hypothesis is skipped
    let last = recv(&mut results_rx).await;
    assert_eq!(last.transcript, "こんにちは");
    assert!(last.is_final);
    assert!(last.is_speech_final);
}

#[tokio::test]
async fn test_provider_error_reaches_error_callback() {
    let script = vec![
        json!({"type": "Error", "err_code": "INVALID_AUTH", "err_msg": "bad key"}).to_string(),
    ];
    let (addr, _handshake, _frames) = spawn_mock_deepgram(script).await;
    let (mut client, _results, mut errors) = connected_client(addr).await;

    client.send_audio(Bytes::from_static(b"chunk")).await.unwrap();

    let error = recv(&mut errors).await;
    assert_eq!(error, STTError::AuthenticationFailed("bad key".to_string()));

    // The stream is terminated after a provider error
    let mut ready = client.is_ready();
    for _ in 0..100 {
        if !ready {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        ready = client.is_ready();
    }
    assert!(!ready);
}

#[tokio::test]
async fn test_disconnect_sends_close_stream() {
    let (addr, _handshake, mut frames) = spawn_mock_deepgram(Vec::new()).await;
    let (mut client, _results, _errors) = connected_client(addr).await;

    client.disconnect().await.unwrap();
    assert!(!client.is_ready());

    match recv(&mut frames).await {
        Received::Control(text) => {
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(value["type"], "CloseStream");
        }
        other => panic!("expected CloseStream, got {other:?}"),
    }
    assert!(matches!(recv(&mut frames).await, Received::Closed));
}

#[tokio::test]
async fn test_connect_refused_is_connection_failure() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut client = <DeepgramSTT as BaseSTT>::new(config(addr)).unwrap();
    assert!(matches!(
        client.connect().await,
        Err(STTError::ConnectionFailed(_))
    ));
    assert!(!client.is_ready());
}
