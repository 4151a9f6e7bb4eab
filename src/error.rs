//! Request-time rejections and their HTTP rendering.
//!
//! Every check in the chain returns a [`GateError`] on failure, which ends
//! the request immediately with a stable reason code.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::input::ValidationErrors;
use crate::observability::metrics;
use crate::security::TokenError;

/// Why a caller is not authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingToken,
    MalformedToken,
    ExpiredToken,
    InvalidCredentials,
}

impl AuthFailure {
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::MalformedToken => "malformed_token",
            Self::ExpiredToken => "expired_token",
            Self::InvalidCredentials => "invalid_credentials",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::MissingToken => "An Authorization: Bearer token is required",
            Self::MalformedToken => "The bearer token is invalid",
            Self::ExpiredToken => "The bearer token has expired",
            Self::InvalidCredentials => "Invalid username or password",
        }
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("unauthenticated: {}", .0.code())]
    Unauthenticated(AuthFailure),

    #[error("role '{role}' does not meet required role '{required}'")]
    Unauthorized { role: String, required: String },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("request body exceeds {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthorized { .. } => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(failure) => failure.code(),
            Self::Unauthorized { .. } => "insufficient_role",
            Self::RateLimited { .. } => "rate_limited",
            Self::ValidationFailed(_) => "validation_failed",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<TokenError> for GateError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::Unauthenticated(AuthFailure::ExpiredToken),
            TokenError::Malformed => Self::Unauthenticated(AuthFailure::MalformedToken),
            TokenError::Signing(e) => Self::Internal(e),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        metrics::record_rejection(code);

        let body = match &self {
            Self::Unauthenticated(failure) => json!({
                "code": code,
                "message": failure.message(),
            }),
            Self::Unauthorized { required, .. } => json!({
                "code": code,
                "message": format!("This action requires the '{required}' role or higher"),
            }),
            Self::RateLimited { retry_after_secs } => json!({
                "code": code,
                "message": "Too many requests",
                "retry_after": retry_after_secs,
            }),
            Self::ValidationFailed(errors) => json!({
                "code": code,
                "message": format!("{} field(s) failed validation", errors.len()),
                "errors": errors,
            }),
            Self::PayloadTooLarge { limit_bytes } => json!({
                "code": code,
                "message": format!("Request body exceeds {limit_bytes} bytes"),
            }),
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error while handling request");
                json!({
                    "code": code,
                    "message": "Internal server error",
                })
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        if let Self::Unauthenticated(_) = self {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let response = GateError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");

        let body = body_json(response).await;
        assert_eq!(body["code"], "rate_limited");
        assert_eq!(body["retry_after"], 42);
    }

    #[tokio::test]
    async fn test_validation_response_lists_fields() {
        let mut errors = ValidationErrors::single("name", "is required");
        errors.0.extend(ValidationErrors::single("party_size", "must be at most 12").0);
        let response = GateError::ValidationFailed(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "validation_failed");
        assert_eq!(body["errors"][0]["field"], "name");
        assert_eq!(body["errors"][1]["reason"], "must be at most 12");
    }

    #[tokio::test]
    async fn test_token_errors_map_to_401() {
        let expired: GateError = TokenError::Expired.into();
        let malformed: GateError = TokenError::Malformed.into();
        assert_eq!(expired.code(), "expired_token");
        assert_eq!(malformed.code(), "malformed_token");

        let response = expired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn test_payload_too_large_response() {
        let response = GateError::PayloadTooLarge { limit_bytes: 512 }.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["code"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_internal_detail_not_leaked() {
        let response = GateError::Internal("pool exhausted at db-3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body.to_string().contains("db-3"));
    }
}
