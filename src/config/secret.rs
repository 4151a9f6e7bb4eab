//! Signing secret and deployment mode resolution.
//!
//! The secret is read once at startup and handed to the token service as an
//! immutable value. Production refuses to start without one; development
//! falls back to a fixed key and says so loudly.

use std::fmt;

use crate::config::loader::ConfigError;
use crate::config::schema::DeploymentMode;

pub const SECRET_ENV: &str = "GATEKEEPER_JWT_SECRET";
pub const MODE_ENV: &str = "GATEKEEPER_ENV";

/// Minimum secret length accepted in production (HS256 key size).
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

const DEVELOPMENT_SECRET: &[u8] = b"restaurant-gatekeeper-development-secret-do-not-deploy";

/// HMAC key used to sign and verify bearer tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn development() -> Self {
        Self(DEVELOPMENT_SECRET.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret([REDACTED; {} bytes])", self.0.len())
    }
}

/// Apply the `GATEKEEPER_ENV` override to the configured mode.
pub fn resolve_mode(
    configured: DeploymentMode,
    env_value: Option<&str>,
) -> Result<DeploymentMode, ConfigError> {
    match env_value {
        None => Ok(configured),
        Some(raw) => DeploymentMode::from_env_value(raw)
            .ok_or_else(|| ConfigError::UnknownMode(raw.to_string())),
    }
}

/// Decide which secret the process signs with.
pub fn resolve_secret(
    mode: DeploymentMode,
    supplied: Option<&str>,
) -> Result<SigningSecret, ConfigError> {
    let supplied = supplied.map(str::trim).filter(|s| !s.is_empty());

    match (mode, supplied) {
        (DeploymentMode::Production, None) => Err(ConfigError::MissingSecret),
        (DeploymentMode::Production, Some(s)) if s.len() < MIN_PRODUCTION_SECRET_LEN => {
            Err(ConfigError::WeakSecret {
                min: MIN_PRODUCTION_SECRET_LEN,
            })
        }
        (_, Some(s)) => Ok(SigningSecret::new(s.as_bytes())),
        (DeploymentMode::Development, None) => {
            tracing::warn!(
                env = SECRET_ENV,
                "No signing secret supplied; using the built-in DEVELOPMENT secret. \
                 Tokens are forgeable by anyone with the source. Never run this in production."
            );
            Ok(SigningSecret::development())
        }
    }
}

/// Resolve mode and secret from the process environment.
pub fn from_env(configured: DeploymentMode) -> Result<(DeploymentMode, SigningSecret), ConfigError> {
    let mode_value = std::env::var(MODE_ENV).ok();
    let mode = resolve_mode(configured, mode_value.as_deref())?;
    let secret_value = std::env::var(SECRET_ENV).ok();
    let secret = resolve_secret(mode, secret_value.as_deref())?;
    Ok((mode, secret))
}
