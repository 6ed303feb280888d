//! Role operation bindings.
//!
//! A binding ties one role on one target to the operations that list, add and
//! remove its members, together with the role's desired membership. The
//! reconciler only ever talks to a binding.

use tracing::{debug, info};

use rolesync_core::{SyncError, SyncResult};
use rolesync_identity::RoleKind;

use crate::membership::{DesiredMembership, RoleMemberSet};
use crate::platform::PlatformClient;
use crate::target::Target;

/// Capability set of one role: list, add, remove.
pub trait RoleOperations {
    fn role(&self) -> RoleKind;

    fn list(&self, target: &Target) -> SyncResult<RoleMemberSet>;

    /// Grant the role. Implementations must associate the user with the org
    /// before the role association.
    fn add(&self, target: &Target, username: &str) -> SyncResult<()>;

    fn remove(&self, target: &Target, username: &str) -> SyncResult<()>;
}

/// One role on one target, ready to be reconciled.
pub struct RoleBinding<'a> {
    pub target: Target,
    pub desired: &'a DesiredMembership,
    ops: &'a dyn RoleOperations,
}

impl<'a> RoleBinding<'a> {
    pub fn new(target: Target, desired: &'a DesiredMembership, ops: &'a dyn RoleOperations) -> Self {
        Self { target, desired, ops }
    }

    pub fn role(&self) -> RoleKind {
        self.ops.role()
    }

    pub fn list(&self) -> SyncResult<RoleMemberSet> {
        self.ops.list(&self.target)
    }

    pub fn add(&self, username: &str) -> SyncResult<()> {
        self.ops.add(&self.target, username)
    }

    pub fn remove(&self, username: &str) -> SyncResult<()> {
        self.ops.remove(&self.target, username)
    }
}

impl core::fmt::Debug for RoleBinding<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RoleBinding")
            .field("target", &self.target)
            .field("role", &self.role())
            .field("desired", &self.desired)
            .finish()
    }
}

/// Platform-backed operations for one role kind.
///
/// One value per role kind gives the six org/space role variants. In dry-run
/// every mutating call is logged instead of sent.
#[derive(Debug)]
pub struct PlatformRoleOps<'c, C> {
    client: &'c C,
    role: RoleKind,
    dry_run: bool,
}

impl<'c, C: PlatformClient> PlatformRoleOps<'c, C> {
    pub fn new(client: &'c C, role: RoleKind, dry_run: bool) -> Self {
        Self {
            client,
            role,
            dry_run,
        }
    }

    fn associate_org_member(&self, target: &Target, username: &str) -> SyncResult<()> {
        if self.dry_run {
            debug!(user = %username, org = %target.org_name(), "[dry-run] associating user with org");
            return Ok(());
        }
        self.client
            .associate_org_member(target.org_id(), username)
            .map_err(|e| {
                SyncError::remote(
                    format!("associating user {username} with org {}", target.org_name()),
                    e,
                )
            })
    }
}

impl<C: PlatformClient> RoleOperations for PlatformRoleOps<'_, C> {
    fn role(&self) -> RoleKind {
        self.role
    }

    fn list(&self, target: &Target) -> SyncResult<RoleMemberSet> {
        let holders = self
            .client
            .list_role_members(self.role, target.id())
            .map_err(|e| SyncError::remote(format!("listing {} holders of {target}", self.role), e))?;
        let members: RoleMemberSet = holders.into_iter().collect();
        debug!(
            target = %target,
            role = %self.role,
            members = ?members.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
            "current role users"
        );
        Ok(members)
    }

    fn add(&self, target: &Target, username: &str) -> SyncResult<()> {
        self.associate_org_member(target, username)?;

        if self.dry_run {
            info!(user = %username, role = %self.role.label(), target = %target, "[dry-run] adding user to role");
            return Ok(());
        }
        info!(user = %username, role = %self.role.label(), target = %target, "adding user to role");
        self.client
            .associate_role(self.role, target.id(), username)
            .map_err(|e| SyncError::remote(format!("adding user {username} to {} for {target}", self.role), e))
    }

    fn remove(&self, target: &Target, username: &str) -> SyncResult<()> {
        if self.dry_run {
            info!(user = %username, role = %self.role.label(), target = %target, "[dry-run] removing user from role");
            return Ok(());
        }
        info!(user = %username, role = %self.role.label(), target = %target, "removing user from role");
        self.client
            .remove_role(self.role, target.id(), username)
            .map_err(|e| {
                SyncError::remote(format!("removing user {username} from {} for {target}", self.role), e)
            })
    }
}
