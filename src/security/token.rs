//! Signed bearer tokens (HS256 JWT).
//!
//! # Design Decisions
//! - Signature is checked before expiry; expiry is checked here, strictly
//!   (`now < exp`), not by the JWT library and without leeway
//! - Only HS256 is accepted; `alg` in the header cannot downgrade
//! - The service is stateless: no token is ever stored server-side

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SigningSecret;

/// Default token lifetime.
pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Cannot be parsed, wrong algorithm, or signature mismatch.
    #[error("token is malformed or its signature does not verify")]
    Malformed,

    /// Well-formed and authentic, but past its expiry.
    #[error("token has expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Who a token speaks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub role: String,
}

/// Decoded token content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier.
    pub sub: String,
    /// Display name.
    pub name: String,
    pub role: String,
    pub iss: String,
    /// Issued at, seconds since epoch.
    pub iat: u64,
    /// Expiry, seconds since epoch.
    pub exp: u64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
        }
    }

    /// True iff `now` is strictly before expiry.
    pub fn is_live_at(&self, now: u64) -> bool {
        now < self.exp
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Issues and verifies tokens with one immutable secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl_secs: u64,
}

impl TokenService {
    pub fn new(secret: &SigningSecret, issuer: impl Into<String>, ttl_secs: u64) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256];
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[issuer.as_str()]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Sign a token for `identity`, valid for the configured TTL from now.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, unix_now()).map(|(token, _)| token)
    }

    /// Sign a token as if issued at `now`. Returns the token and its claims.
    pub fn issue_at(&self, identity: &Identity, now: u64) -> Result<(String, Claims), TokenError> {
        let claims = Claims {
            sub: identity.user_id.clone(),
            name: identity.name.clone(),
            role: identity.role.clone(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok((token, claims))
    }

    /// Verify signature then expiry against the current clock.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, unix_now())
    }

    pub fn verify_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            TokenError::Malformed
        })?;

        if !data.claims.is_live_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(ttl: u64) -> TokenService {
        TokenService::new(&SigningSecret::new("test-secret-0123456789abcdef0123"), "gk-test", ttl)
    }

    fn waiter() -> Identity {
        Identity {
            user_id: "u-17".to_string(),
            name: "Luigi".to_string(),
            role: "staff".to_string(),
        }
    }

    #[test]
    fn test_round_trip_before_expiry() {
        let tokens = service(DEFAULT_TTL_SECS);
        let (token, issued) = tokens.issue_at(&waiter(), 1_000).unwrap();

        let claims = tokens.verify_at(&token, 1_000).unwrap();
        assert_eq!(claims, issued);
        assert_eq!(claims.identity(), waiter());
        assert_eq!(claims.exp, 1_000 + DEFAULT_TTL_SECS);

        let claims = tokens.verify_at(&token, 1_000 + DEFAULT_TTL_SECS - 1).unwrap();
        assert_eq!(claims.identity(), waiter());
    }

    #[test]
    fn test_issue_uses_wall_clock() {
        let tokens = service(60);
        let token = tokens.issue(&waiter()).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_expired_at_and_after_exp() {
        let tokens = service(3_600);
        let (token, _) = tokens.issue_at(&waiter(), 10_000).unwrap();

        assert_eq!(tokens.verify_at(&token, 13_600), Err(TokenError::Expired));
        assert_eq!(tokens.verify_at(&token, 13_601), Err(TokenError::Expired));
        for later in [13_602, 20_000, u64::MAX] {
            assert_eq!(tokens.verify_at(&token, later), Err(TokenError::Expired));
        }
    }

    #[test]
    fn test_wrong_secret_is_malformed() {
        let (token, _) = service(60).issue_at(&waiter(), 100).unwrap();
        let other = TokenService::new(&SigningSecret::new("another-secret"), "gk-test", 60);
        assert_eq!(other.verify_at(&token, 100), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tampered_payload_is_malformed() {
        let tokens = service(60);
        let (token, _) = tokens.issue_at(&waiter(), 100).unwrap();
        let (_, signature) = token.rsplit_once('.').unwrap();

        // splice the genuine signature onto a payload claiming director
        let promoted = Identity {
            role: "director".to_string(),
            ..waiter()
        };
        let (forged, _) = TokenService::new(&SigningSecret::new("attacker"), "gk-test", 60)
            .issue_at(&promoted, 100)
            .unwrap();
        let (unsigned, _) = forged.rsplit_once('.').unwrap();
        let spliced = format!("{unsigned}.{signature}");

        assert_eq!(tokens.verify_at(&spliced, 100), Err(TokenError::Malformed));
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        // an expired token signed with another key reports Malformed, not Expired
        let (token, _) = service(60).issue_at(&waiter(), 100).unwrap();
        let other = TokenService::new(&SigningSecret::new("another-secret"), "gk-test", 60);
        assert_eq!(other.verify_at(&token, 10_000), Err(TokenError::Malformed));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = service(60);
        for junk in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert_eq!(tokens.verify_at(junk, 0), Err(TokenError::Malformed));
        }
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let secret = SigningSecret::new("shared");
        let (token, _) = TokenService::new(&secret, "someone-else", 60)
            .issue_at(&waiter(), 100)
            .unwrap();
        let ours = TokenService::new(&secret, "gk-test", 60);
        assert_eq!(ours.verify_at(&token, 100), Err(TokenError::Malformed));
    }
}
