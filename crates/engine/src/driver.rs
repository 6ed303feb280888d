//! Run driver: walks the configured orgs and spaces, reconciles every role and
//! runs the cleanup pass.
//!
//! Processing is sequential. Each binding runs to completion before the next
//! one starts, and the first fatal error aborts the run. Mutations already
//! applied are not rolled back.

use tracing::{info, warn};

use rolesync_core::SyncResult;
use rolesync_identity::{GroupResolver, IdentityDirectory, IdentityProvisioner, IdentitySource, RoleKind};

use crate::binding::{PlatformRoleOps, RoleBinding};
use crate::cleanup::OrgCleanup;
use crate::config::{OrgConfig, SpaceConfig, SyncConfig};
use crate::membership::DesiredMembership;
use crate::platform::PlatformClient;
use crate::reconciler::{Reconciler, ReconcilerConfig, RoleOutcome};
use crate::report::{CleanupOutcome, RunReport};
use crate::resolver::TargetResolver;
use crate::target::Target;

pub struct RunDriver<'a, C> {
    client: &'a C,
    source: &'a dyn IdentitySource,
    groups: &'a dyn GroupResolver,
    provisioner: &'a dyn IdentityProvisioner,
    config: ReconcilerConfig,
}

impl<'a, C: PlatformClient> RunDriver<'a, C> {
    pub fn new(
        client: &'a C,
        source: &'a dyn IdentitySource,
        groups: &'a dyn GroupResolver,
        provisioner: &'a dyn IdentityProvisioner,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            client,
            source,
            groups,
            provisioner,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn load_directory(&self) -> SyncResult<IdentityDirectory> {
        IdentityDirectory::load(self.source)
    }

    /// Reconcile billing managers, managers and auditors of every org.
    pub fn sync_org_roles(
        &self,
        orgs: &[OrgConfig],
        directory: &IdentityDirectory,
    ) -> SyncResult<Vec<RoleOutcome>> {
        let resolver = TargetResolver::new(self.client, self.config.dry_run);
        let mut outcomes = Vec::new();
        for org_config in orgs {
            let org = resolver.find_org(&org_config.org)?;
            info!(org = %org.name, "syncing org roles");
            let target = Target::Org(org);
            for role in RoleKind::ORG {
                let Some(desired) = org_config.desired(role) else {
                    continue;
                };
                outcomes.push(self.reconcile(&target, role, &desired, directory)?);
            }
        }
        Ok(outcomes)
    }

    /// Reconcile developers, managers and auditors of every space.
    pub fn sync_space_roles(
        &self,
        spaces: &[SpaceConfig],
        directory: &IdentityDirectory,
    ) -> SyncResult<Vec<RoleOutcome>> {
        let resolver = TargetResolver::new(self.client, self.config.dry_run);
        let mut outcomes = Vec::new();
        for space_config in spaces {
            let org = resolver.find_org(&space_config.org)?;
            let space = resolver.find_space(&org, &space_config.space)?;
            info!(org = %org.name, space = %space.name, "syncing space roles");
            let target = Target::space(org.name, space);
            for role in RoleKind::SPACE {
                let Some(desired) = space_config.desired(role) else {
                    continue;
                };
                outcomes.push(self.reconcile(&target, role, &desired, directory)?);
            }
        }
        Ok(outcomes)
    }

    /// Cleanup pass over the orgs that enable it.
    pub fn cleanup_org_members(&self, orgs: &[OrgConfig]) -> SyncResult<Vec<CleanupOutcome>> {
        let resolver = TargetResolver::new(self.client, self.config.dry_run);
        let cleanup = OrgCleanup::new(self.client, self.config.dry_run);
        let mut outcomes = Vec::new();
        for org_config in orgs.iter().filter(|o| o.enable_cleanup_org_users) {
            let org = resolver.find_org(&org_config.org)?;
            info!(org = %org.name, "cleaning up org users");
            outcomes.push(cleanup.run(&org)?);
        }
        Ok(outcomes)
    }

    /// Full run: directory load, org roles, space roles, cleanup.
    ///
    /// Dry-run and the federated origin come from the driver's own
    /// [`ReconcilerConfig`]; only the org and space declarations are read from
    /// `config`.
    pub fn run(&self, config: &SyncConfig) -> SyncResult<RunReport> {
        let mut report = RunReport::start(self.config.dry_run);
        info!(
            run_id = %report.run_id,
            dry_run = self.config.dry_run,
            orgs = config.orgs.len(),
            spaces = config.spaces.len(),
            "starting role sync run"
        );

        let directory = self.load_directory()?;
        report.roles.extend(self.sync_org_roles(&config.orgs, &directory)?);
        report.roles.extend(self.sync_space_roles(&config.spaces, &directory)?);
        report.cleanup = self.cleanup_org_members(&config.orgs)?;

        let report = report.complete();
        let summary = report.summary();
        if summary.skipped > 0 {
            warn!(run_id = %report.run_id, skipped = summary.skipped, "some principals could not be provisioned");
        }
        info!(
            run_id = %report.run_id,
            added = summary.added,
            removed = summary.removed,
            org_members_removed = summary.org_members_removed,
            "role sync run complete"
        );
        Ok(report)
    }

    fn reconcile(
        &self,
        target: &Target,
        role: RoleKind,
        desired: &DesiredMembership,
        directory: &IdentityDirectory,
    ) -> SyncResult<RoleOutcome> {
        let ops = PlatformRoleOps::new(self.client, role, self.config.dry_run);
        let binding = RoleBinding::new(target.clone(), desired, &ops);
        Reconciler::new(&self.config, self.groups, self.provisioner).reconcile(&binding, directory)
    }
}
