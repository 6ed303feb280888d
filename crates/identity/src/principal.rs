use serde::{Deserialize, Serialize};

use rolesync_core::UserKey;

/// Which desired-membership list asked for a principal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalSource {
    /// Must already exist in the identity directory.
    Internal,
    /// Email-style identity, provisioned on demand.
    Federated,
    /// Resolved from a directory group.
    Group,
}

/// A user identity requested to hold a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    /// Username as it will be sent to the platform.
    pub username: String,
    pub key: UserKey,
    pub source: PrincipalSource,
}

impl Principal {
    pub fn new(username: impl Into<String>, source: PrincipalSource) -> Self {
        let username = username.into();
        let key = UserKey::new(&username);
        Self {
            username,
            key,
            source,
        }
    }
}

impl core::fmt::Display for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.username)
    }
}
