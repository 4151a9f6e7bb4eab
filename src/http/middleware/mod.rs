pub mod auth;

pub use auth::{authenticate, bearer_token, require_role, RoleGuard};
