//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gatekeeper.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Root configuration for the gatekeeper service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Deployment mode (production refuses to start without a secret).
    pub deployment: DeploymentConfig,

    /// Token issuance settings.
    pub auth: AuthConfig,

    /// Role name to ordinal rank.
    pub roles: RolesConfig,

    /// Per-route-group rate limiting policies.
    pub rate_limit: RateLimitConfig,

    /// Input sanitizer settings.
    pub sanitizer: SanitizerConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Credential directory used by the login endpoint.
    pub users: Vec<UserRecord>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Where the process is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    #[default]
    Development,
    Production,
}

impl DeploymentMode {
    /// Parse the value of the `GATEKEEPER_ENV` variable.
    pub fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" | "test" => Some(Self::Development),
            _ => None,
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Overridden by `GATEKEEPER_ENV` when set.
    pub mode: DeploymentMode,
}

/// Token issuance configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// Value of the `iss` claim.
    pub issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: 24 * 60 * 60,
            issuer: "restaurant-gatekeeper".to_string(),
        }
    }
}

/// Role ordinal table, monotonically increasing with privilege.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RolesConfig(pub BTreeMap<String, u32>);

impl Default for RolesConfig {
    fn default() -> Self {
        let mut ranks = BTreeMap::new();
        ranks.insert("customer".to_string(), 0);
        ranks.insert("staff".to_string(), 1);
        ranks.insert("manager".to_string(), 2);
        ranks.insert("director".to_string(), 3);
        Self(ranks)
    }
}

/// A single fixed-window quota.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct RatePolicy {
    /// Requests admitted per window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

/// Eviction of stale limiter entries.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvictionConfig {
    /// Upper bound on tracked clients per policy.
    pub max_entries: usize,

    /// Interval of the background sweep; `None` disables it.
    pub sweep_interval_secs: Option<u64>,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
            sweep_interval_secs: Some(60),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// General API traffic.
    pub api: RatePolicy,

    /// Login attempts; kept stricter than `api`.
    pub login: RatePolicy,

    pub eviction: EvictionConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api: RatePolicy {
                max_requests: 100,
                window_secs: 60,
            },
            login: RatePolicy {
                max_requests: 10,
                window_secs: 60,
            },
            eviction: EvictionConfig::default(),
        }
    }
}

/// Sanitizer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Characters removed from every string after markup is stripped.
    /// `<` and `>` are always removed.
    pub strip_chars: String,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            strip_chars: "\"'`\\\0".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A login-capable account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: String,

    /// PHC-formatted Argon2id digest (see `gatekeeper-cli hash-password`).
    pub password_hash: String,
}
