//! Org-member cleanup pass.
//!
//! Removes org members who hold no org role and no space role in any space of
//! the org. Runs only for orgs that opt in.

use tracing::{debug, info};

use rolesync_core::{SyncError, SyncResult};
use rolesync_identity::RoleKind;

use crate::binding::{PlatformRoleOps, RoleOperations};
use crate::membership::RoleMemberSet;
use crate::platform::PlatformClient;
use crate::report::CleanupOutcome;
use crate::target::{OrgRef, Target};

pub struct OrgCleanup<'c, C> {
    client: &'c C,
    dry_run: bool,
}

impl<'c, C: PlatformClient> OrgCleanup<'c, C> {
    pub fn new(client: &'c C, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    pub fn run(&self, org: &OrgRef) -> SyncResult<CleanupOutcome> {
        let members: RoleMemberSet = self
            .client
            .list_org_members(&org.id)
            .map_err(|e| SyncError::remote(format!("listing members of org [{}]", org.name), e))?
            .into_iter()
            .collect();

        let holders = self.role_holders(org)?;
        debug!(org = %org.name, members = members.len(), holders = holders.len(), "org cleanup inputs");

        let mut removed = Vec::new();
        for (_, member) in members.iter().filter(|(key, _)| !holders.contains(key)) {
            let username = member.username.as_str();
            if self.dry_run {
                info!(org = %org.name, user = %username, "[dry-run] removing user from org");
            } else {
                info!(org = %org.name, user = %username, "removing user from org");
                self.client
                    .remove_org_member(&org.id, username)
                    .map_err(|e| SyncError::remote(format!("removing user {username} from org [{}]", org.name), e))?;
            }
            removed.push(username.to_string());
        }

        Ok(CleanupOutcome {
            org: org.name.clone(),
            retained: members.len() - removed.len(),
            removed,
            dry_run: self.dry_run,
        })
    }

    /// Union of every org-role holder and every space-role holder of the org.
    fn role_holders(&self, org: &OrgRef) -> SyncResult<RoleMemberSet> {
        let mut holders = RoleMemberSet::new();
        let org_target = Target::Org(org.clone());
        for role in RoleKind::ORG {
            holders.extend(PlatformRoleOps::new(self.client, role, self.dry_run).list(&org_target)?);
        }

        let spaces = self
            .client
            .list_spaces(&org.id)
            .map_err(|e| SyncError::remote(format!("listing spaces of org [{}]", org.name), e))?;
        for space in spaces {
            let target = Target::space(org.name.as_str(), space);
            for role in RoleKind::SPACE {
                holders.extend(PlatformRoleOps::new(self.client, role, self.dry_run).list(&target)?);
            }
        }
        Ok(holders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryPlatform, Operation};

    fn platform() -> (InMemoryPlatform, OrgRef) {
        let platform = InMemoryPlatform::new();
        let org = platform.add_org("test-org");
        let dev = platform.add_space("test-org", "dev").unwrap();
        for user in ["alice", "bob", "carol", "dave"] {
            platform.add_internal_user(user);
        }
        platform.grant(RoleKind::OrgAuditor, org.id.as_str(), "alice");
        platform.grant(RoleKind::SpaceDeveloper, dev.id.as_str(), "bob");
        platform.seed_org_member(&org.id, "carol");
        platform.seed_org_member(&org.id, "dave");
        (platform, org)
    }

    #[test]
    fn removes_members_without_any_role() {
        let (platform, org) = platform();

        let outcome = OrgCleanup::new(&platform, false).run(&org).unwrap();
        assert_eq!(outcome.removed, ["carol", "dave"]);
        assert_eq!(outcome.retained, 2);
        assert_eq!(platform.org_members(&org.id), ["alice", "bob"]);
    }

    #[test]
    fn dry_run_only_reports() {
        let (platform, org) = platform();

        let outcome = OrgCleanup::new(&platform, true).run(&org).unwrap();
        assert_eq!(outcome.removed, ["carol", "dave"]);
        assert!(outcome.dry_run);
        assert!(platform.mutations().is_empty());
        assert_eq!(platform.org_members(&org.id).len(), 4);
    }

    #[test]
    fn removal_sends_the_platform_username() {
        let (platform, org) = platform();
        platform.add_internal_user("Frank.Smith");
        platform.seed_org_member(&org.id, "frank.smith");

        let outcome = OrgCleanup::new(&platform, false).run(&org).unwrap();

        assert!(outcome.removed.contains(&"Frank.Smith".to_string()));
        let removals: Vec<Option<String>> = platform
            .mutations()
            .into_iter()
            .filter(|c| c.operation == Operation::RemoveOrgMember)
            .map(|c| c.username)
            .collect();
        assert!(removals.contains(&Some("Frank.Smith".to_string())));
        assert!(!removals.contains(&Some("frank.smith".to_string())));
    }

    #[test]
    fn removal_failure_is_fatal() {
        let (platform, org) = platform();
        platform.fail_on(Operation::RemoveOrgMember, Some("carol"));

        let err = OrgCleanup::new(&platform, false).run(&org).unwrap_err();
        assert_eq!(err.kind(), rolesync_core::ErrorKind::RemoteOperation);
    }
}
