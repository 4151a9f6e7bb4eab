//! HTTP surface of the gatekeeper.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address captured)
//!     → server.rs (request ID, trace, timeout, body limit)
//!     → security::rate_limit (per policy, per peer IP)
//!     → input (sanitize, then validate against the route's schema)
//!     → middleware/auth.rs (verify bearer token, then check route role)
//!     → api handlers
//! ```

pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{AppState, HttpServer};
