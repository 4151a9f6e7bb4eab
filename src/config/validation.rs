//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes and users reference known roles)
//! - Validate value ranges (windows > 0, limits > 0, TTL > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatekeeperConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use argon2::password_hash::PasswordHash;
use thiserror::Error;

use crate::config::schema::{GatekeeperConfig, RatePolicy};
use crate::http::routes::ROUTE_TABLE;
use crate::input::Sanitizer;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &GatekeeperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError::new("auth.token_ttl_secs", "must be greater than zero"));
    }
    if config.auth.issuer.trim().is_empty() {
        errors.push(ValidationError::new("auth.issuer", "must not be empty"));
    }

    let roles = &config.roles.0;
    if roles.is_empty() {
        errors.push(ValidationError::new("roles", "at least one role is required"));
    }
    for rule in ROUTE_TABLE {
        if !roles.contains_key(rule.minimum_role) {
            errors.push(ValidationError::new(
                "roles",
                format!("role '{}' required by {} is not defined", rule.minimum_role, rule.path),
            ));
        }
    }

    check_policy(&mut errors, "rate_limit.api", &config.rate_limit.api);
    check_policy(&mut errors, "rate_limit.login", &config.rate_limit.login);
    if config.rate_limit.eviction.max_entries == 0 {
        errors.push(ValidationError::new(
            "rate_limit.eviction.max_entries",
            "must be greater than zero",
        ));
    }
    if config.rate_limit.eviction.sweep_interval_secs == Some(0) {
        errors.push(ValidationError::new(
            "rate_limit.eviction.sweep_interval_secs",
            "must be greater than zero when set",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a socket address",
        ));
    }

    // login bodies are sanitized before lookup, so a stored name must survive it
    let sanitizer = Sanitizer::from_config(&config.sanitizer);
    let mut seen = HashSet::new();
    for (i, user) in config.users.iter().enumerate() {
        let field = format!("users[{i}]");
        if user.username.trim().is_empty() {
            errors.push(ValidationError::new(format!("{field}.username"), "must not be empty"));
        } else if sanitizer.sanitize_str(&user.username) != user.username {
            errors.push(ValidationError::new(
                format!("{field}.username"),
                format!(
                    "'{}' contains characters removed from login requests",
                    user.username
                ),
            ));
        } else if !seen.insert(user.username.as_str()) {
            errors.push(ValidationError::new(
                format!("{field}.username"),
                format!("duplicate username '{}'", user.username),
            ));
        }
        if !roles.contains_key(&user.role) {
            errors.push(ValidationError::new(
                format!("{field}.role"),
                format!("unknown role '{}'", user.role),
            ));
        }
        if PasswordHash::new(&user.password_hash).is_err() {
            errors.push(ValidationError::new(
                format!("{field}.password_hash"),
                "is not a PHC-formatted digest",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_policy(errors: &mut Vec<ValidationError>, field: &str, policy: &RatePolicy) {
    if policy.max_requests == 0 {
        errors.push(ValidationError::new(
            format!("{field}.max_requests"),
            "must be greater than zero",
        ));
    }
    if policy.window_secs == 0 {
        errors.push(ValidationError::new(
            format!("{field}.window_secs"),
            "must be greater than zero",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UserRecord;
    use uuid::Uuid;

    fn user(name: &str, role: &str, hash: &str) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: name.to_string(),
            display_name: name.to_string(),
            role: role.to_string(),
            password_hash: hash.to_string(),
        }
    }

    const DIGEST: &str = "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNo";

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatekeeperConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = GatekeeperConfig::default();
        config.auth.token_ttl_secs = 0;
        config.rate_limit.login.max_requests = 0;
        config.rate_limit.api.window_secs = 0;
        config.users.push(user("ana", "sommelier", DIGEST));

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"auth.token_ttl_secs"));
        assert!(fields.contains(&"rate_limit.login.max_requests"));
        assert!(fields.contains(&"rate_limit.api.window_secs"));
        assert!(fields.contains(&"users[0].role"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_route_roles_must_exist() {
        let mut config = GatekeeperConfig::default();
        config.roles.0.remove("manager");

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().all(|e| e.field == "roles"));
        assert!(errors.iter().any(|e| e.reason.contains("'manager'")));
    }

    #[test]
    fn test_duplicate_usernames_and_bad_digest() {
        let mut config = GatekeeperConfig::default();
        config.users.push(user("bob", "staff", DIGEST));
        config.users.push(user("bob", "staff", "plaintext"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::new("users[1].username", "duplicate username 'bob'"),
                ValidationError::new("users[1].password_hash", "is not a PHC-formatted digest"),
            ]
        );
    }

    #[test]
    fn test_username_must_survive_sanitization() {
        let mut config = GatekeeperConfig::default();
        config.users.push(user("o'brien", "staff", DIGEST));
        config.users.push(user(" padded ", "staff", DIGEST));
        config.users.push(user("<b>chef</b>", "staff", DIGEST));
        config.users.push(user("obrien", "staff", DIGEST));

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["users[0].username", "users[1].username", "users[2].username"]);
    }

    #[test]
    fn test_username_check_follows_sanitizer_config() {
        let mut config = GatekeeperConfig::default();
        config.sanitizer.strip_chars = ";".to_string();
        config.users.push(user("o'brien", "staff", DIGEST));
        assert_eq!(validate_config(&config), Ok(()));

        config.users.push(user("semi;colon", "staff", DIGEST));
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "users[1].username");
    }
}
