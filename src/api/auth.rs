//! Login and logout handlers.

use std::sync::LazyLock;

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::error::{AuthFailure, GateError};
use crate::http::routes;
use crate::http::server::AppState;
use crate::input::{RequestSchema, Rule, Schema, Validated};
use crate::observability::metrics;
use crate::security::{Claims, Identity};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl RequestSchema for LoginRequest {
    fn schema() -> &'static Schema {
        static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
            Schema::new()
                .field("username", Rule::string().len(1, 64))
                .field("password", Rule::string().len(1, 256))
        });
        &SCHEMA
    }

    fn raw_fields() -> &'static [&'static str] {
        &["password"]
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: Identity,
}

/// Exchange a username and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Extension(Validated(request)): Extension<Validated<LoginRequest>>,
) -> Result<Json<LoginResponse>, GateError> {
    // login has no role guard, so it counts itself
    metrics::record_request(routes::LOGIN);

    let record = state.users.get(&request.username).cloned();
    let digest = match &record {
        Some(user) => Some(user.password_hash.clone()),
        None => state.users.decoy_digest().map(str::to_string),
    };

    let verified = match digest {
        Some(digest) => {
            let hasher = state.hasher.clone();
            let password = request.password;
            tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
                .await
                .map_err(|e| GateError::Internal(format!("password verification task failed: {e}")))?
        }
        None => false,
    };

    let user = match record {
        Some(user) if verified => user,
        _ => {
            tracing::warn!(username = %request.username, "Login failed");
            metrics::record_login("failure");
            return Err(GateError::Unauthenticated(AuthFailure::InvalidCredentials));
        }
    };

    let identity = user.identity();
    let token = state.tokens.issue(&identity)?;

    tracing::info!(user = %identity.user_id, role = %identity.role, "Login succeeded");
    metrics::record_login("success");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.ttl_secs(),
        user: identity,
    }))
}

/// Tokens are not tracked server-side; the client discards its copy.
pub async fn logout(Extension(claims): Extension<Claims>) -> StatusCode {
    tracing::info!(user = %claims.sub, "Logout");
    StatusCode::NO_CONTENT
}

/// The verified claims of the caller.
pub async fn me(Extension(claims): Extension<Claims>) -> Json<Claims> {
    Json(claims)
}
