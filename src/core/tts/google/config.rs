//! Configuration types for Google Cloud Text-to-Speech.

use serde::{Deserialize, Serialize};

/// Output audio encodings supported by `text:synthesize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoogleAudioEncoding {
    #[default]
    Mp3,
    OggOpus,
    Linear16,
    Mulaw,
}

impl GoogleAudioEncoding {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "MP3",
            Self::OggOpus => "OGG_OPUS",
            Self::Linear16 => "LINEAR16",
            Self::Mulaw => "MULAW",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_uppercase().replace('-', "_").as_str() {
            "MP3" => Self::Mp3,
            "OGG_OPUS" | "OPUS" => Self::OggOpus,
            "LINEAR16" | "PCM" | "WAV" => Self::Linear16,
            "MULAW" => Self::Mulaw,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for GoogleAudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Voice gender requested from the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SsmlGender {
    #[default]
    Female,
    Male,
    Neutral,
    SsmlVoiceGenderUnspecified,
}

impl SsmlGender {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "FEMALE",
            Self::Male => "MALE",
            Self::Neutral => "NEUTRAL",
            Self::SsmlVoiceGenderUnspecified => "SSML_VOICE_GENDER_UNSPECIFIED",
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "FEMALE" => Self::Female,
            "MALE" => Self::Male,
            "NEUTRAL" => Self::Neutral,
            "" | "UNSPECIFIED" | "SSML_VOICE_GENDER_UNSPECIFIED" => {
                Self::SsmlVoiceGenderUnspecified
            }
            _ => Self::default(),
        }
    }
}
