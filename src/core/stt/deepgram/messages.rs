//! WebSocket message types for the Deepgram live transcription API.
//!
//! - **Incoming messages** (server to client)
//!   - [`ResultsMessage`]: interim or final transcript for a span of audio
//!   - [`MetadataMessage`]: request metadata, sent once per stream
//!   - `UtteranceEnd` / `SpeechStarted`: voice activity markers
//!   - [`ErrorMessage`]: provider-side failure
//!
//! - **Outgoing messages** (client to server)
//!   - Binary audio data (sent directly, no JSON wrapper)
//!   - [`ControlMessage`]: `KeepAlive`, `Finalize` and `CloseStream`

use serde::{Deserialize, Serialize};

// =============================================================================
// Incoming Messages (Server to Client)
// =============================================================================

/// One recognition alternative
#[derive(Debug, Clone, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: f64,
}

/// Channel payload of a results message
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Channel {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

/// Transcription results for a span of audio
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsMessage {
    #[serde(default)]
    pub channel: Channel,
    /// The transcript for this span will not change
    #[serde(default)]
    pub is_final: bool,
    /// Deepgram detected the end of an utterance
    #[serde(default)]
    pub speech_final: bool,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub duration: f64,
}

impl ResultsMessage {
    /// Best alternative's transcript and confidence
    pub fn best(&self) -> Option<&Alternative> {
        self.channel.alternatives.first()
    }
}

/// Stream metadata
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataMessage {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub duration: f64,
}

/// Error reported by Deepgram
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorMessage {
    #[serde(default, alias = "err_code")]
    pub code: Option<String>,
    #[serde(default, alias = "err_msg", alias = "message")]
    pub description: String,
}

/// Parsed incoming Deepgram message
#[derive(Debug, Clone)]
pub enum DeepgramMessage {
    Results(ResultsMessage),
    Metadata(MetadataMessage),
    UtteranceEnd,
    SpeechStarted,
    Error(ErrorMessage),
    /// Unknown message type (for forward compatibility)
    Unknown(String),
}

impl DeepgramMessage {
    /// Parse a WebSocket text message into the appropriate type.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct TypePeek {
            #[serde(rename = "type", default)]
            message_type: String,
        }

        let peek: TypePeek = serde_json::from_str(text)?;

        match peek.message_type.as_str() {
            "Results" => Ok(DeepgramMessage::Results(serde_json::from_str(text)?)),
            "Metadata" => Ok(DeepgramMessage::Metadata(serde_json::from_str(text)?)),
            "UtteranceEnd" => Ok(DeepgramMessage::UtteranceEnd),
            "SpeechStarted" => Ok(DeepgramMessage::SpeechStarted),
            "Error" => Ok(DeepgramMessage::Error(serde_json::from_str(text)?)),
            _ => Ok(DeepgramMessage::Unknown(text.to_string())),
        }
    }
}

// =============================================================================
// Outgoing Messages (Client to Server)
// =============================================================================

/// Control messages sent as JSON text frames
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Keeps the stream open while no audio is flowing
    KeepAlive,
    /// Flush buffered audio and emit final results
    Finalize,
    /// Flush and close the stream
    CloseStream,
}

impl ControlMessage {
    pub fn to_json(self) -> String {
        // Unit variants always serialize
        serde_json::to_string(&self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results() {
        let text = r#"{"type":"Results","channel_index":[0,1],"duration":1.2,"start":0.0,"is_final":true,"speech_final":true,"channel":{"alternatives":[{"transcript":"こんにちは","confidence":0.97,"words":[]}]}}"#;

        match DeepgramMessage::parse(text).unwrap() {
            DeepgramMessage::Results(results) => {
                assert!(results.is_final);
                assert!(results.speech_final);
                let best = results.best().unwrap();
                assert_eq!(best.transcript, "こんにちは");
                assert!(best.confidence > 0.9);
            }
            other => panic!("Expected Results, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_interim_without_alternatives() {
        let text = r#"{"type":"Results","is_final":false,"channel":{"alternatives":[]}}"#;
        match DeepgramMessage::parse(text).unwrap() {
            DeepgramMessage::Results(results) => {
                assert!(!results.is_final);
                assert!(results.best().is_none());
            }
            other => panic!("Expected Results, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_metadata_and_markers() {
        let metadata = r#"{"type":"Metadata","request_id":"req-1","duration":3.5}"#;
        assert!(matches!(
            DeepgramMessage::parse(metadata).unwrap(),
            DeepgramMessage::Metadata(m) if m.request_id == "req-1"
        ));
        assert!(matches!(
            DeepgramMessage::parse(r#"{"type":"UtteranceEnd","last_word_end":2.1}"#).unwrap(),
            DeepgramMessage::UtteranceEnd
        ));
        assert!(matches!(
            DeepgramMessage::parse(r#"{"type":"SomethingNew"}"#).unwrap(),
            DeepgramMessage::Unknown(_)
        ));
    }

    #[test]
    fn test_parse_error() {
        let text = r#"{"type":"Error","err_code":"INVALID_AUTH","err_msg":"Invalid credentials."}"#;
        match DeepgramMessage::parse(text).unwrap() {
            DeepgramMessage::Error(err) => {
                assert_eq!(err.code.as_deref(), Some("INVALID_AUTH"));
                assert_eq!(err.description, "Invalid credentials.");
            }
            other => panic!("Expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(DeepgramMessage::parse("not json").is_err());
    }

    #[test]
    fn test_control_message_wire_format() {
        assert_eq!(ControlMessage::KeepAlive.to_json(), r#"{"type":"KeepAlive"}"#);
        assert_eq!(
            ControlMessage::CloseStream.to_json(),
            r#"{"type":"CloseStream"}"#
        );
    }
}
