//! Body sanitization and validation middleware.
//!
//! Runs before authentication on routes that declare a request schema. The
//! body is buffered (bounded), parsed as JSON, sanitized, validated, and the
//! typed result is attached to the request as [`Validated<T>`].

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::error::GateError;
use crate::input::sanitize::Sanitizer;
use crate::input::schema::{RequestSchema, ValidationErrors};

/// A request body that passed sanitization and its schema.
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

/// Shared by every body-validating route.
#[derive(Debug, Clone)]
pub struct InputState {
    pub sanitizer: Arc<Sanitizer>,
    pub max_body_bytes: usize,
}

impl InputState {
    pub fn new(sanitizer: Sanitizer, max_body_bytes: usize) -> Self {
        Self {
            sanitizer: Arc::new(sanitizer),
            max_body_bytes,
        }
    }

    /// Sanitize then validate raw body bytes.
    pub fn process<T: RequestSchema>(&self, bytes: &[u8]) -> Result<T, ValidationErrors> {
        let raw: Value = serde_json::from_slice(bytes)
            .map_err(|e| ValidationErrors::single("$", format!("invalid JSON: {e}")))?;
        let clean = self.sanitizer.sanitize_except(raw, T::raw_fields());
        T::schema().parse(clean)
    }
}

/// Route layer: `from_fn_with_state(input, validate_body::<T>)`.
pub async fn validate_body<T>(
    State(state): State<InputState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GateError>
where
    T: RequestSchema + Clone + Send + Sync + 'static,
{
    let (parts, body) = request.into_parts();
    // the only read failure a live client can see is the length limit
    let bytes = to_bytes(body, state.max_body_bytes).await.map_err(|e| {
        tracing::warn!(
            path = %parts.uri.path(),
            limit_bytes = state.max_body_bytes,
            error = %e,
            "Request body not read"
        );
        GateError::PayloadTooLarge {
            limit_bytes: state.max_body_bytes,
        }
    })?;

    let parsed = state.process::<T>(&bytes).map_err(|errors| {
        tracing::warn!(
            path = %parts.uri.path(),
            error_count = errors.len(),
            errors = %errors,
            "Request body rejected"
        );
        GateError::ValidationFailed(errors)
    })?;

    let mut request = Request::from_parts(parts, Body::empty());
    request.extensions_mut().insert(Validated(parsed));
    Ok(next.run(request).await)
}
