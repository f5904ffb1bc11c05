mod base;
pub mod deepgram;

// Re-export public types and traits
pub use base::{
    BaseSTT, STTConfig, STTError, STTErrorCallback, STTFactory, STTResult, STTResultCallback,
};

// Re-export Deepgram implementation
pub use deepgram::{DeepgramSTT, DeepgramSTTConfig};

/// Supported STT providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum STTProvider {
    /// Deepgram live streaming WebSocket API
    Deepgram,
}

impl std::fmt::Display for STTProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            STTProvider::Deepgram => write!(f, "deepgram"),
        }
    }
}

impl std::str::FromStr for STTProvider {
    type Err = STTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deepgram" => Ok(STTProvider::Deepgram),
            _ => Err(STTError::ConfigurationError(format!(
                "Unsupported STT provider: {s}. Supported providers: deepgram"
            ))),
        }
    }
}

/// Factory function to create STT providers using the provider enum
pub fn create_stt_provider_from_enum(
    provider: STTProvider,
    config: STTConfig,
) -> Result<Box<dyn BaseSTT>, STTError> {
    match provider {
        STTProvider::Deepgram => Ok(Box::new(<DeepgramSTT as BaseSTT>::new(config)?)),
    }
}

/// Stream factory bound to a provider and its configuration.
///
/// Creating a stream only validates configuration; no network traffic
/// happens until the caller connects it.
pub struct ConfiguredSTTFactory {
    provider: STTProvider,
    config: STTConfig,
}

impl ConfiguredSTTFactory {
    pub fn new(config: STTConfig) -> Result<Self, STTError> {
        let provider: STTProvider = config.provider.parse()?;
        // Fail at startup rather than on the first voice connection
        create_stt_provider_from_enum(provider, config.clone())?;
        Ok(Self { provider, config })
    }
}

impl STTFactory for ConfiguredSTTFactory {
    fn create(&self) -> Result<Box<dyn BaseSTT>, STTError> {
        create_stt_provider_from_enum(self.provider, self.config.clone())
    }

    fn provider_name(&self) -> &str {
        match self.provider {
            STTProvider::Deepgram => "deepgram",
        }
    }
}

#[cfg(test)]
mod factory_tests {
    use super::*;

    #[test]
    fn test_stt_provider_enum() {
        assert_eq!(STTProvider::Deepgram.to_string(), "deepgram");
        assert_eq!("Deepgram".parse::<STTProvider>().unwrap(), STTProvider::Deepgram);
        assert!("whisper".parse::<STTProvider>().is_err());
    }

    #[test]
    fn test_create_stt_provider_from_enum() {
        let config = STTConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        };
        let stt = create_stt_provider_from_enum(STTProvider::Deepgram, config).unwrap();
        assert!(!stt.is_ready());
        assert_eq!(stt.get_provider_info(), "Deepgram Live Streaming STT");
    }

    #[test]
    fn test_configured_factory_rejects_unknown_provider() {
        let result = ConfiguredSTTFactory::new(STTConfig {
            provider: "unknown".to_string(),
            api_key: "test_key".to_string(),
            ..Default::default()
        });
        match result {
            Err(STTError::ConfigurationError(msg)) => {
                assert!(msg.contains("Unsupported STT provider: unknown"))
            }
            _ => panic!("Expected ConfigurationError"),
        }
    }

    #[test]
    fn test_configured_factory_validates_up_front() {
        // Missing API key
        assert!(ConfiguredSTTFactory::new(STTConfig::default()).is_err());

        let factory = ConfiguredSTTFactory::new(STTConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(factory.provider_name(), "deepgram");

        // Each call yields an independent, unconnected stream
        let first = factory.create().unwrap();
        let second = factory.create().unwrap();
        assert!(!first.is_ready());
        assert!(!second.is_ready());
    }
}
