//! Platform API boundary.

use serde::{Deserialize, Serialize};

use rolesync_core::{IdentityId, OrgId, PlatformError};
use rolesync_identity::RoleKind;

use crate::target::{OrgRef, SpaceRef};

/// A current holder of a role (or of org membership).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHolder {
    pub username: String,
    pub id: IdentityId,
}

impl RoleHolder {
    pub fn new(username: impl Into<String>, id: impl Into<IdentityId>) -> Self {
        Self {
            username: username.into(),
            id: id.into(),
        }
    }
}

/// Calls the engine needs from the platform API.
///
/// Role calls are addressed by role kind and target id: an org id for the
/// three org roles, a space id for the three space roles. Association and
/// removal are by username.
pub trait PlatformClient {
    fn find_org(&self, name: &str) -> Result<Option<OrgRef>, PlatformError>;

    fn list_spaces(&self, org_id: &OrgId) -> Result<Vec<SpaceRef>, PlatformError>;

    fn list_role_members(&self, role: RoleKind, target_id: &str) -> Result<Vec<RoleHolder>, PlatformError>;

    fn associate_role(&self, role: RoleKind, target_id: &str, username: &str) -> Result<(), PlatformError>;

    fn remove_role(&self, role: RoleKind, target_id: &str, username: &str) -> Result<(), PlatformError>;

    /// Make the user a plain member of the org. Idempotent on the platform side.
    fn associate_org_member(&self, org_id: &OrgId, username: &str) -> Result<(), PlatformError>;

    fn list_org_members(&self, org_id: &OrgId) -> Result<Vec<RoleHolder>, PlatformError>;

    fn remove_org_member(&self, org_id: &OrgId, username: &str) -> Result<(), PlatformError>;
}

impl<C> PlatformClient for &C
where
    C: PlatformClient + ?Sized,
{
    fn find_org(&self, name: &str) -> Result<Option<OrgRef>, PlatformError> {
        (**self).find_org(name)
    }

    fn list_spaces(&self, org_id: &OrgId) -> Result<Vec<SpaceRef>, PlatformError> {
        (**self).list_spaces(org_id)
    }

    fn list_role_members(&self, role: RoleKind, target_id: &str) -> Result<Vec<RoleHolder>, PlatformError> {
        (**self).list_role_members(role, target_id)
    }

    fn associate_role(&self, role: RoleKind, target_id: &str, username: &str) -> Result<(), PlatformError> {
        (**self).associate_role(role, target_id, username)
    }

    fn remove_role(&self, role: RoleKind, target_id: &str, username: &str) -> Result<(), PlatformError> {
        (**self).remove_role(role, target_id, username)
    }

    fn associate_org_member(&self, org_id: &OrgId, username: &str) -> Result<(), PlatformError> {
        (**self).associate_org_member(org_id, username)
    }

    fn list_org_members(&self, org_id: &OrgId) -> Result<Vec<RoleHolder>, PlatformError> {
        (**self).list_org_members(org_id)
    }

    fn remove_org_member(&self, org_id: &OrgId, username: &str) -> Result<(), PlatformError> {
        (**self).remove_org_member(org_id, username)
    }
}
