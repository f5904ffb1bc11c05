use super::{ReplySettings, ServerConfig, SynthesisSettings, TlsConfig};

/// Run every validation rule against a merged configuration
pub(super) fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.port == 0 {
        return Err("Server port must be greater than 0".into());
    }
    validate_tls(config.tls.as_ref())?;
    validate_reply(&config.reply)?;
    validate_synthesis(&config.synthesis)?;
    Ok(())
}

/// Validate that TLS certificate and key files exist when TLS is enabled
pub(super) fn validate_tls(tls: Option<&TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(tls) = tls else {
        return Ok(());
    };

    if !tls.cert_path.is_file() {
        return Err(format!(
            "TLS certificate file not found: {}",
            tls.cert_path.display()
        )
        .into());
    }
    if !tls.key_path.is_file() {
        return Err(format!("TLS key file not found: {}", tls.key_path.display()).into());
    }

    Ok(())
}

/// Validate reply backend sampling parameters
pub(super) fn validate_reply(reply: &ReplySettings) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=2.0).contains(&reply.temperature) {
        return Err(format!(
            "LLM temperature {} is outside the supported range (0.0-2.0)",
            reply.temperature
        )
        .into());
    }
    if reply.max_tokens == 0 {
        return Err("LLM max_tokens must be greater than 0".into());
    }
    Ok(())
}

/// Validate synthesis voice parameters
pub(super) fn validate_synthesis(
    synthesis: &SynthesisSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.25..=4.0).contains(&synthesis.speaking_rate) {
        return Err(format!(
            "TTS speaking rate {} is outside the supported range (0.25-4.0)",
            synthesis.speaking_rate
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_validate_defaults() {
        assert!(validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_tls_files() {
        let temp_dir = TempDir::new().unwrap();
        let cert = temp_dir.path().join("cert.pem");
        let key = temp_dir.path().join("key.pem");
        fs::write(&cert, "cert").unwrap();

        let tls = TlsConfig {
            cert_path: cert.clone(),
            key_path: key.clone(),
        };
        let err = validate_tls(Some(&tls)).unwrap_err();
        assert!(err.to_string().contains("TLS key file not found"));

        fs::write(&key, "key").unwrap();
        assert!(validate_tls(Some(&tls)).is_ok());

        let missing = TlsConfig {
            cert_path: PathBuf::from("/nonexistent/cert.pem"),
            key_path: key,
        };
        assert!(validate_tls(Some(&missing)).is_err());
    }

    #[test]
    fn test_validate_reply_ranges() {
        let mut reply = ReplySettings::default();
        assert!(validate_reply(&reply).is_ok());

        reply.temperature = 2.5;
        assert!(validate_reply(&reply).is_err());

        reply.temperature = 0.0;
        reply.max_tokens = 0;
        assert!(validate_reply(&reply).is_err());
    }

    #[test]
    fn test_validate_speaking_rate() {
        let mut synthesis = SynthesisSettings::default();
        synthesis.speaking_rate = 0.1;
        assert!(validate_synthesis(&synthesis).is_err());

        synthesis.speaking_rate = 4.0;
        assert!(validate_synthesis(&synthesis).is_ok());
    }

    #[test]
    fn test_validate_port_zero() {
        let mut config = ServerConfig::default();
        config.port = 0;
        assert!(validate(&config).is_err());
    }
}
