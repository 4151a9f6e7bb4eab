//! Restaurant Gatekeeper Library
//!
//! Request gatekeeping for a restaurant management API: per-client rate
//! limiting, input sanitization and validation, bearer-token
//! authentication, and hierarchical role authorization.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod input;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatekeeperConfig;
pub use error::GateError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
