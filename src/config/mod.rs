//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatekeeperConfig (validated, immutable)
//!
//! environment (GATEKEEPER_ENV, GATEKEEPER_JWT_SECRET)
//!     → secret.rs (mode override, fail fast in production)
//!     → SigningSecret handed to the token service
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod secret;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DeploymentMode, GatekeeperConfig, RateLimitConfig, RatePolicy, SanitizerConfig, UserRecord,
};
pub use secret::SigningSecret;
