//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatekeeperConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for startup configuration. Fatal: the process never serves
/// traffic after one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("GATEKEEPER_JWT_SECRET must be set in production mode")]
    MissingSecret,

    #[error("GATEKEEPER_JWT_SECRET must be at least {min} bytes in production mode")]
    WeakSecret { min: usize },

    #[error("unrecognised deployment mode '{0}'")]
    UnknownMode(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatekeeperConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatekeeperConfig, ConfigError> {
    let config: GatekeeperConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("gatekeeper-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[auth]\ntoken_ttl_secs = 600\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.auth.token_ttl_secs, 600);

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_semantic_errors_are_joined() {
        let err = parse_config("[auth]\ntoken_ttl_secs = 0\n[timeouts]\nrequest_secs = 0\n").unwrap_err();
        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("auth.token_ttl_secs"));
        assert!(message.contains("timeouts.request_secs"));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        assert!(matches!(parse_config("[auth"), Err(ConfigError::Parse(_))));
    }
}
