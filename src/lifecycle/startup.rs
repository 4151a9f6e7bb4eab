//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Resolve the deployment mode and signing secret from the environment
//! - Build the HTTP server
//!
//! Any error here is fatal: the process exits before binding a port.

use std::path::Path;

use crate::config::{self, secret, ConfigError, DeploymentMode, GatekeeperConfig};
use crate::http::HttpServer;

/// Everything needed to start serving.
pub struct Prepared {
    pub config: GatekeeperConfig,
    pub mode: DeploymentMode,
    pub server: HttpServer,
}

/// Load `path`, or fall back to defaults (no users) when `None`.
pub fn load(path: Option<&Path>) -> Result<GatekeeperConfig, ConfigError> {
    match path {
        Some(path) => config::load_config(path),
        None => Ok(GatekeeperConfig::default()),
    }
}

/// Mode after the environment override, used before logging is up.
pub fn effective_mode(config: &GatekeeperConfig) -> Result<DeploymentMode, ConfigError> {
    let value = std::env::var(secret::MODE_ENV).ok();
    secret::resolve_mode(config.deployment.mode, value.as_deref())
}

/// Resolve the signing secret and build the server.
pub fn prepare(config: GatekeeperConfig) -> Result<Prepared, ConfigError> {
    let (mode, signing_secret) = secret::from_env(config.deployment.mode)?;

    if config.users.is_empty() {
        tracing::warn!("No users configured; every login will be rejected");
    }

    tracing::info!(
        mode = ?mode,
        bind_address = %config.listener.bind_address,
        users = config.users.len(),
        rate_limiting = config.rate_limit.enabled,
        token_ttl_secs = config.auth.token_ttl_secs,
        "Configuration loaded"
    );

    let server = HttpServer::new(config.clone(), mode, &signing_secret);
    Ok(Prepared { config, mode, server })
}
