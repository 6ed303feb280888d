//! Directory-group resolution.

use std::collections::HashMap;

use rolesync_core::{SyncError, SyncResult};

use crate::IdentityRecord;

/// Resolves directory group names to their member identities.
///
/// Fails with [`SyncError::GroupLookup`] when a name cannot be resolved.
pub trait GroupResolver {
    fn resolve_members(&self, group_names: &[String]) -> SyncResult<Vec<IdentityRecord>>;
}

impl<R> GroupResolver for &R
where
    R: GroupResolver + ?Sized,
{
    fn resolve_members(&self, group_names: &[String]) -> SyncResult<Vec<IdentityRecord>> {
        (**self).resolve_members(group_names)
    }
}

/// Fixed group table, for tests and previews.
#[derive(Debug, Clone, Default)]
pub struct StaticGroupResolver {
    groups: HashMap<String, Vec<IdentityRecord>>,
}

impl StaticGroupResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(
        mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = IdentityRecord>,
    ) -> Self {
        self.groups.insert(name.into(), members.into_iter().collect());
        self
    }
}

impl GroupResolver for StaticGroupResolver {
    fn resolve_members(&self, group_names: &[String]) -> SyncResult<Vec<IdentityRecord>> {
        let mut members = Vec::new();
        for name in group_names {
            let group = self
                .groups
                .get(name)
                .ok_or_else(|| SyncError::group_lookup(name.as_str(), "no such group"))?;
            members.extend(group.iter().cloned());
        }
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_of_all_groups_are_concatenated() {
        let resolver = StaticGroupResolver::new()
            .with_group("devs", [IdentityRecord::internal("alice", "1")])
            .with_group("ops", [IdentityRecord::internal("bob", "2")]);

        let members = resolver
            .resolve_members(&["devs".to_string(), "ops".to_string()])
            .unwrap();
        let names: Vec<_> = members.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
    }

    #[test]
    fn unknown_group_fails() {
        let err = StaticGroupResolver::new()
            .resolve_members(&["missing".to_string()])
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::GroupLookup {
                group: "missing".to_string(),
                reason: "no such group".to_string()
            }
        );
    }
}
