//! Identity records as held by the identity store.

use serde::{Deserialize, Serialize};

use rolesync_core::{IdentityId, UserKey};

/// Origin tag of identities managed by the platform's own user store.
pub const INTERNAL_ORIGIN: &str = "uaa";

/// One user identity from the identity store snapshot.
///
/// Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Case-preserved username.
    pub username: String,
    pub identifier: IdentityId,
    pub email: String,
    /// Which identity provider issued this identity.
    pub origin: String,
}

impl IdentityRecord {
    pub fn new(
        username: impl Into<String>,
        identifier: impl Into<IdentityId>,
        email: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            identifier: identifier.into(),
            email: email.into(),
            origin: origin.into(),
        }
    }

    /// Record for a platform-internal user whose username doubles as email.
    pub fn internal(username: impl Into<String>, identifier: impl Into<IdentityId>) -> Self {
        let username = username.into();
        Self::new(username.clone(), identifier, username, INTERNAL_ORIGIN)
    }

    pub fn key(&self) -> UserKey {
        UserKey::new(&self.username)
    }
}
