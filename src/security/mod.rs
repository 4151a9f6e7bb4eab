//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-IP fixed window, per route group)
//!     → [input sanitization + schema validation]
//!     → token.rs (verify bearer token → Claims)
//!     → roles.rs (caller rank ≥ route minimum)
//!     → Pass to handler
//!
//! Login:
//!     credentials.rs (Argon2id verify) → token.rs (issue)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod credentials;
pub mod rate_limit;
pub mod roles;
pub mod token;

pub use credentials::PasswordHasher;
pub use rate_limit::{FixedWindowLimiter, RateDecision};
pub use roles::RoleTable;
pub use token::{Claims, Identity, TokenError, TokenService};
