//! Role hierarchy authorization.
//!
//! One ordinal table, loaded at startup and read-only afterwards, decides
//! every role check. Higher ordinal means more privilege.

use std::collections::HashMap;

use crate::config::schema::RolesConfig;
use crate::security::token::Claims;

/// Fixed mapping from role name to rank.
#[derive(Debug, Clone)]
pub struct RoleTable {
    ranks: HashMap<String, u32>,
    lowest: u32,
}

impl RoleTable {
    pub fn new(ranks: impl IntoIterator<Item = (String, u32)>) -> Self {
        let ranks: HashMap<String, u32> = ranks.into_iter().collect();
        let lowest = ranks.values().copied().min().unwrap_or(0);
        Self { ranks, lowest }
    }

    pub fn from_config(config: &RolesConfig) -> Self {
        Self::new(config.0.iter().map(|(name, rank)| (name.clone(), *rank)))
    }

    /// Rank of a caller's role. Unknown roles get the lowest rank.
    pub fn ordinal(&self, role: &str) -> u32 {
        self.ranks.get(role).copied().unwrap_or(self.lowest)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.ranks.contains_key(role)
    }

    /// Does `role` meet `minimum`? Inclusive.
    ///
    /// An unknown `minimum` denies everyone: a misspelt requirement must not
    /// open a route.
    pub fn permits(&self, role: &str, minimum: &str) -> bool {
        match self.ranks.get(minimum) {
            Some(required) => self.ordinal(role) >= *required,
            None => {
                tracing::error!(minimum, "Authorization against undefined role; denying");
                false
            }
        }
    }

    /// Check verified claims against a route's minimum role.
    pub fn authorize(&self, claims: &Claims, minimum: &str) -> bool {
        self.permits(&claims.role, minimum)
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::from_config(&RolesConfig::default())
    }
}
