//! Endpoint handlers.
//!
//! Handlers only run after the whole gatekeeping chain has passed; they
//! read the verified [`Claims`](crate::security::Claims) and the
//! [`Validated`](crate::input::Validated) body from request extensions.

pub mod admin;
pub mod auth;
pub mod directory;
pub mod reservations;

pub use directory::UserDirectory;
