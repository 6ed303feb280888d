//! Actual and desired role membership.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rolesync_core::{IdentityId, SyncError, SyncResult, UserKey};

use crate::platform::RoleHolder;

/// Current holders of one role on one org/space, keyed by case-folded username.
///
/// Rebuilt for every reconciliation call; never cached. Each holder keeps the
/// username exactly as the platform reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleMemberSet {
    members: BTreeMap<UserKey, RoleHolder>,
}

impl RoleMemberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, username: &str, id: IdentityId) {
        self.members
            .insert(UserKey::new(username), RoleHolder::new(username, id));
    }

    pub fn contains(&self, key: &UserKey) -> bool {
        self.members.contains_key(key)
    }

    pub fn get(&self, key: &UserKey) -> Option<&IdentityId> {
        self.members.get(key).map(|holder| &holder.id)
    }

    /// Platform-reported username of a holder.
    pub fn username(&self, key: &UserKey) -> Option<&str> {
        self.members.get(key).map(|holder| holder.username.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &UserKey> {
        self.members.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserKey, &RoleHolder)> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Union in place; used to collect every role holder of an org.
    pub fn extend(&mut self, other: RoleMemberSet) {
        self.members.extend(other.members);
    }
}

impl FromIterator<RoleHolder> for RoleMemberSet {
    fn from_iter<I: IntoIterator<Item = RoleHolder>>(iter: I) -> Self {
        let members = iter
            .into_iter()
            .map(|holder| (UserKey::new(&holder.username), holder))
            .collect();
        Self { members }
    }
}

/// Requested principals for one role on one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredMembership {
    /// Must already exist in the identity directory.
    #[serde(default)]
    pub internal_users: Vec<String>,
    /// Directory groups whose members should hold the role.
    #[serde(default)]
    pub group_names: Vec<String>,
    /// Email-style identities, provisioned if absent.
    #[serde(default)]
    pub federated_users: Vec<String>,
    #[serde(default)]
    pub remove_extraneous: bool,
}

impl DesiredMembership {
    pub fn is_empty(&self) -> bool {
        self.internal_users.is_empty()
            && self.group_names.is_empty()
            && self.federated_users.is_empty()
    }

    /// Reject blank entries and non email-style federated users.
    pub fn validate(&self) -> SyncResult<()> {
        if let Some(blank) = self
            .internal_users
            .iter()
            .chain(&self.group_names)
            .chain(&self.federated_users)
            .find(|entry| entry.trim().is_empty())
        {
            return Err(SyncError::configuration(format!(
                "blank entry [{blank}] in desired membership"
            )));
        }
        if let Some(user) = self.federated_users.iter().find(|u| !u.contains('@')) {
            return Err(SyncError::configuration(format!(
                "federated user [{user}] must be an email address"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_set_folds_usernames() {
        let set: RoleMemberSet = [
            RoleHolder::new("Alice", "id-a"),
            RoleHolder::new("CAROL", "id-c"),
        ]
        .into_iter()
        .collect();

        assert!(set.contains(&UserKey::new("alice")));
        assert_eq!(set.username(&UserKey::new("carol")), Some("CAROL"));
        assert_eq!(set.get(&UserKey::new("carol")).unwrap().as_str(), "id-c");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn validation_rejects_malformed_entries() {
        let blank = DesiredMembership {
            internal_users: vec!["  ".to_string()],
            ..Default::default()
        };
        assert!(matches!(blank.validate(), Err(SyncError::Configuration(_))));

        let not_email = DesiredMembership {
            federated_users: vec!["dana".to_string()],
            ..Default::default()
        };
        assert!(matches!(not_email.validate(), Err(SyncError::Configuration(_))));

        let ok = DesiredMembership {
            internal_users: vec!["bob".to_string()],
            group_names: vec!["space-devs".to_string()],
            federated_users: vec!["dana@example.com".to_string()],
            remove_extraneous: true,
        };
        assert!(ok.validate().is_ok());
    }
}
