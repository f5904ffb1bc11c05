//! Gateway error taxonomy
//!
//! Errors are grouped by how far they propagate. Only transport failures end a
//! session; every other error is reported to the client as an `error` event and
//! the connection stays open.

use thiserror::Error;

use crate::core::coordinator::AllFailedError;
use crate::core::stt::STTError;
use crate::core::tts::TTSError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    // ─────────────────────────────────────────────────────────────────────────────
    // Session-terminating
    // ─────────────────────────────────────────────────────────────────────────────
    /// Connection dropped, socket error or idle timeout
    #[error("Transport error: {0}")]
    Transport(String),

    // ─────────────────────────────────────────────────────────────────────────────
    // Degraded features
    // ─────────────────────────────────────────────────────────────────────────────
    /// An upstream client could not be initialized; its feature is disabled
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    // ─────────────────────────────────────────────────────────────────────────────
    // Per-turn
    // ─────────────────────────────────────────────────────────────────────────────
    /// Every reply backend failed for the turn
    #[error(transparent)]
    Backend(#[from] AllFailedError),

    #[error("Transcription failed: {0}")]
    Transcription(#[from] STTError),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] TTSError),

    /// Malformed inbound frame or unexpected message type
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl GatewayError {
    /// Whether the session must be torn down
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::Transport(_))
    }

    /// Translated, user-visible description.
    ///
    /// Provider payloads stay in the logs and never reach the client.
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::Transport(_) => "接続エラーが発生しました".to_string(),
            GatewayError::UpstreamUnavailable(_) => {
                "この機能は現在利用できません".to_string()
            }
            GatewayError::Backend(_) => {
                "レスポンス生成エラー: すべてのLLMが応答できませんでした".to_string()
            }
            GatewayError::Transcription(err) => {
                format!("音声認識エラー: {}", stt_reason(err))
            }
            GatewayError::Synthesis(_) => "音声合成エラー: 音声を生成できませんでした".to_string(),
            GatewayError::Protocol(_) => "メッセージ形式が不正です".to_string(),
        }
    }
}

fn stt_reason(err: &STTError) -> &'static str {
    match err {
        STTError::AuthenticationFailed(_) | STTError::ConfigurationError(_) => {
            "認識サービスの設定が無効です"
        }
        STTError::ConnectionFailed(_) | STTError::NetworkError(_) => {
            "認識サービスに接続できません"
        }
        STTError::InvalidAudioFormat(_) => "音声形式がサポートされていません",
        STTError::ProviderError(_) => "認識サービスでエラーが発生しました",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coordinator::BackendFailure;
    use crate::core::llm::LLMError;

    #[test]
    fn test_only_transport_is_fatal() {
        assert!(GatewayError::Transport("reset".into()).is_fatal());
        assert!(!GatewayError::Protocol("bad json".into()).is_fatal());
        assert!(!GatewayError::UpstreamUnavailable("tts".into()).is_fatal());
        assert!(!GatewayError::Backend(AllFailedError { failures: vec![] }).is_fatal());
    }

    #[test]
    fn test_client_message_hides_provider_details() {
        let err = GatewayError::Backend(AllFailedError {
            failures: vec![BackendFailure {
                backend: "Claude".to_string(),
                error: LLMError::ApiError {
                    status: 500,
                    message: "{\"internal\":\"trace\"}".to_string(),
                },
            }],
        });
        let message = err.client_message();
        assert!(message.starts_with("レスポンス生成エラー"));
        assert!(!message.contains("internal"));

        let err = GatewayError::Transcription(STTError::AuthenticationFailed(
            "INVALID_AUTH: key abc".to_string(),
        ));
        let message = err.client_message();
        assert!(message.starts_with("音声認識エラー: "));
        assert!(!message.contains("abc"));
    }

    #[test]
    fn test_from_conversions() {
        let err: GatewayError = TTSError::NetworkError("down".into()).into();
        assert!(matches!(err, GatewayError::Synthesis(_)));

        let err: GatewayError = STTError::NetworkError("down".into()).into();
        assert!(matches!(err, GatewayError::Transcription(_)));
    }
}
