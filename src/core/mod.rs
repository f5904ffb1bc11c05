pub mod coordinator;
pub mod llm;
pub mod stt;
pub mod tts;

// Re-export commonly used types for convenience
pub use coordinator::{AllFailedError, BackendFailure, Reply, ResponseCoordinator};

pub use llm::{
    AnthropicBackend, LLMConfig, LLMError, LLMProvider, LLMResult, OpenAIBackend, ReplyBackend,
    create_reply_backend,
};

pub use stt::{
    BaseSTT, ConfiguredSTTFactory, DeepgramSTT, DeepgramSTTConfig, STTConfig, STTError,
    STTErrorCallback, STTFactory, STTProvider, STTResult, STTResultCallback,
    create_stt_provider_from_enum,
};

pub use tts::{BaseTTS, GoogleTTS, TTSConfig, TTSError, TTSResult, create_tts_provider};
