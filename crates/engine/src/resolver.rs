//! Org and space lookup by name.

use tracing::info;

use rolesync_core::{SyncError, SyncResult};

use crate::platform::PlatformClient;
use crate::target::{OrgRef, SpaceRef};

/// Resolves configured names to platform targets.
///
/// A missing org is always an error. A missing space is an error unless
/// dry-run is on, in which case a synthetic placeholder is returned so the
/// run can preview roles on a space that hasn't been created yet.
pub struct TargetResolver<'c, C> {
    client: &'c C,
    dry_run: bool,
}

impl<'c, C: PlatformClient> TargetResolver<'c, C> {
    pub fn new(client: &'c C, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    pub fn find_org(&self, name: &str) -> SyncResult<OrgRef> {
        self.client
            .find_org(name)
            .map_err(|e| SyncError::remote(format!("looking up org [{name}]"), e))?
            .ok_or_else(|| SyncError::not_found(format!("org [{name}] not found")))
    }

    pub fn find_space(&self, org: &OrgRef, name: &str) -> SyncResult<SpaceRef> {
        let spaces = self
            .client
            .list_spaces(&org.id)
            .map_err(|e| SyncError::remote(format!("listing spaces of org [{}]", org.name), e))?;
        if let Some(space) = spaces.into_iter().find(|s| s.name == name) {
            return Ok(space);
        }
        if self.dry_run {
            info!(org = %org.name, space = %name, "[dry-run] space doesn't exist, using placeholder");
            return Ok(SpaceRef::placeholder(name, org.id.clone()));
        }
        Err(SyncError::not_found(format!(
            "space [{name}] not found in org [{}]",
            org.name
        )))
    }
}
