//! Case-folded username key.

use serde::{Deserialize, Serialize};

/// Canonical, case-insensitive username key.
///
/// Usernames are compared case-insensitively everywhere; this is the only
/// type used as a map key for users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct UserKey(String);

impl UserKey {
    pub fn new(username: &str) -> Self {
        Self(username.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserKey {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for UserKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<UserKey> for String {
    fn from(value: UserKey) -> Self {
        value.0
    }
}

impl core::fmt::Display for UserKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
