//! Input hygiene subsystem.
//!
//! # Data Flow
//! ```text
//! request body (bytes, bounded)
//!     → JSON parse
//!     → sanitize.rs (strip markup + dangerous characters, depth-first)
//!     → schema.rs (check every field, collect every violation)
//!     → typed request attached as Validated<T>
//! ```
//!
//! Sanitization always precedes validation so that validation sees the
//! cleaned data.

pub mod body;
pub mod sanitize;
pub mod schema;

pub use body::{validate_body, InputState, Validated};
pub use sanitize::Sanitizer;
pub use schema::{FieldError, RequestSchema, Rule, Schema, ValidationErrors};
