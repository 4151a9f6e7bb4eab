//! Authentication and authorization middleware.
//! Verifies the bearer token, then enforces the route's minimum role.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::error::{AuthFailure, GateError};
use crate::http::routes::RouteRule;
use crate::observability::metrics;
use crate::security::{Claims, RoleTable, TokenService};

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GateError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(GateError::Unauthenticated(AuthFailure::MissingToken))?;
    let value = value
        .to_str()
        .map_err(|_| GateError::Unauthenticated(AuthFailure::MalformedToken))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(GateError::Unauthenticated(AuthFailure::MalformedToken)),
    }
}

/// Verify the bearer token and attach its [`Claims`] to the request.
pub async fn authenticate(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, GateError> {
    let claims = match bearer_token(request.headers()).and_then(|t| tokens.verify(t).map_err(GateError::from)) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                path = %request.uri().path(),
                reason = err.code(),
                "Authentication failed"
            );
            return Err(err);
        }
    };

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Minimum role for one route.
#[derive(Clone)]
pub struct RoleGuard {
    pub roles: Arc<RoleTable>,
    pub rule: RouteRule,
}

impl RoleGuard {
    pub fn new(roles: Arc<RoleTable>, rule: RouteRule) -> Self {
        Self { roles, rule }
    }
}

/// Reject callers whose role ranks below the route minimum.
pub async fn require_role(
    State(guard): State<RoleGuard>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GateError> {
    // no claims means authenticate did not run: deny
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or(GateError::Unauthenticated(AuthFailure::MissingToken))?;

    if !guard.roles.authorize(claims, guard.rule.minimum_role) {
        tracing::warn!(
            user = %claims.sub,
            role = %claims.role,
            required = guard.rule.minimum_role,
            path = guard.rule.path,
            "Insufficient role"
        );
        return Err(GateError::Unauthorized {
            role: claims.role.clone(),
            required: guard.rule.minimum_role.to_string(),
        });
    }

    metrics::record_request(guard.rule.path);
    Ok(next.run(request).await)
}
