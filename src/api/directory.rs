//! In-memory credential directory loaded from configuration.

use std::collections::HashMap;

use crate::config::UserRecord;
use crate::security::Identity;

/// Accounts that may log in, keyed by username.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, UserRecord>,
    decoy_digest: Option<String>,
}

impl UserDirectory {
    pub fn new(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let users: HashMap<String, UserRecord> = records
            .into_iter()
            .map(|record| (record.username.clone(), record))
            .collect();
        // verifying unknown usernames against a real digest keeps their
        // response time in line with known ones
        let decoy_digest = users.values().next().map(|u| u.password_hash.clone());
        Self { users, decoy_digest }
    }

    pub fn get(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    /// Digest to verify against for a username that does not exist.
    pub fn decoy_digest(&self) -> Option<&str> {
        self.decoy_digest.as_deref()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id.to_string(),
            name: self.display_name.clone(),
            role: self.role.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(username: &str, role: &str) -> UserRecord {
        UserRecord {
            id: Uuid::nil(),
            username: username.to_string(),
            display_name: format!("{username} (display)"),
            role: role.to_string(),
            password_hash: format!("digest-of-{username}"),
        }
    }

    #[test]
    fn test_lookup_and_identity() {
        let directory = UserDirectory::new([record("chef", "staff"), record("boss", "director")]);
        assert_eq!(directory.len(), 2);

        let identity = directory.get("chef").unwrap().identity();
        assert_eq!(identity.role, "staff");
        assert_eq!(identity.name, "chef (display)");
        assert_eq!(identity.user_id, Uuid::nil().to_string());
        assert!(directory.get("Chef").is_none());
    }

    #[test]
    fn test_decoy_digest() {
        assert!(UserDirectory::new([]).decoy_digest().is_none());
        let directory = UserDirectory::new([record("chef", "staff")]);
        assert_eq!(directory.decoy_digest(), Some("digest-of-chef"));
    }
}
