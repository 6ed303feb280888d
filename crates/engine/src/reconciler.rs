//! Role-membership reconciler.
//!
//! For one binding: read the current holders, resolve the three desired
//! sources into principals (validating internal users, provisioning missing
//! federated and directory identities), plan the delta, then apply adds and,
//! when enabled, removals. Nothing is mutated until every source resolved.

use serde::Serialize;
use tracing::{debug, info, warn};

use rolesync_core::{IdentityId, SyncError, SyncResult, UserKey};
use rolesync_identity::{
    DirectoryOverlay, GroupResolver, IdentityDirectory, IdentityProvisioner, IdentityRecord,
    Principal, PrincipalSource, ProvisioningOutcome, RoleKind, SkippedPrincipal,
};

use crate::binding::RoleBinding;
use crate::membership::RoleMemberSet;
use crate::plan::MembershipPlan;

/// Default origin tag for federated identities.
pub const DEFAULT_FEDERATED_ORIGIN: &str = "saml";

/// Reconciler configuration, passed explicitly to everything that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Log mutations instead of sending them.
    pub dry_run: bool,
    /// Origin tag given to auto-provisioned federated identities.
    pub federated_origin: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            federated_origin: DEFAULT_FEDERATED_ORIGIN.to_string(),
        }
    }
}

impl ReconcilerConfig {
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_federated_origin(mut self, origin: impl Into<String>) -> Self {
        self.federated_origin = origin.into();
        self
    }
}

/// What one reconciliation did (or, in dry-run, would do).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleOutcome {
    pub target: String,
    pub role: RoleKind,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
    /// Extraneous holders kept because removal is disabled.
    pub retained_extraneous: Vec<String>,
    /// Identities created for this binding.
    pub provisioned: Vec<String>,
    pub skipped: Vec<SkippedPrincipal>,
    pub dry_run: bool,
}

impl RoleOutcome {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Reconciles role bindings against the identity directory.
pub struct Reconciler<'a> {
    config: &'a ReconcilerConfig,
    groups: &'a dyn GroupResolver,
    provisioner: &'a dyn IdentityProvisioner,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        config: &'a ReconcilerConfig,
        groups: &'a dyn GroupResolver,
        provisioner: &'a dyn IdentityProvisioner,
    ) -> Self {
        Self {
            config,
            groups,
            provisioner,
        }
    }

    /// Reconcile one binding. Errors carry the binding's target and role.
    pub fn reconcile(
        &self,
        binding: &RoleBinding<'_>,
        directory: &IdentityDirectory,
    ) -> SyncResult<RoleOutcome> {
        self.reconcile_binding(binding, directory)
            .map_err(|e| e.in_role(binding.target.to_string(), binding.role().as_str()))
    }

    fn reconcile_binding(
        &self,
        binding: &RoleBinding<'_>,
        directory: &IdentityDirectory,
    ) -> SyncResult<RoleOutcome> {
        let role = binding.role();
        let spec = binding.desired;
        spec.validate()?;

        let actual = if binding.target.is_synthetic() {
            debug!(target = %binding.target, role = %role, "placeholder target, treating membership as empty");
            RoleMemberSet::new()
        } else {
            binding.list()?
        };

        let mut overlay = directory.overlay();
        let mut desired = Vec::new();
        let mut skipped = Vec::new();

        for username in &spec.internal_users {
            let key = UserKey::new(username);
            if !overlay.contains(&key) {
                return Err(SyncError::unknown_principal(key.as_str()));
            }
            desired.push(Principal::new(username.as_str(), PrincipalSource::Internal));
        }

        for email in &spec.federated_users {
            match self.ensure_identity(&mut overlay, email, email, &self.config.federated_origin) {
                ProvisioningOutcome::Provisioned(_) => {
                    desired.push(Principal::new(email.as_str(), PrincipalSource::Federated))
                }
                ProvisioningOutcome::Skipped(s) => skipped.push(s),
            }
        }

        if !spec.group_names.is_empty() {
            let members = self.groups.resolve_members(&spec.group_names)?;
            debug!(
                target = %binding.target,
                role = %role,
                groups = ?spec.group_names,
                members = members.len(),
                "resolved directory groups"
            );
            for member in members {
                match self.ensure_identity(&mut overlay, &member.username, &member.email, &member.origin) {
                    ProvisioningOutcome::Provisioned(_) => {
                        desired.push(Principal::new(member.username, PrincipalSource::Group))
                    }
                    ProvisioningOutcome::Skipped(s) => skipped.push(s),
                }
            }
        }

        let plan = MembershipPlan::compute(&desired, &actual, spec.remove_extraneous);

        for principal in &plan.to_add {
            binding.add(&principal.username)?;
        }
        let removed: Vec<String> = plan
            .removals()
            .iter()
            .map(|key| actual.username(key).unwrap_or(key.as_str()).to_string())
            .collect();
        for username in &removed {
            binding.remove(username)?;
        }
        if let Some(retained) = plan.retention_notice() {
            info!(
                target = %binding.target,
                role = %role,
                retained,
                "not removing users; enable_remove_users is off for this target"
            );
        }

        let mut provisioned: Vec<String> = overlay.provisioned().map(|r| r.username.clone()).collect();
        provisioned.sort();

        Ok(RoleOutcome {
            target: binding.target.to_string(),
            role,
            added: plan.to_add.iter().map(|p| p.username.clone()).collect(),
            removed,
            unchanged: plan.unchanged.iter().map(|k| k.to_string()).collect(),
            retained_extraneous: plan.retained().iter().map(|k| k.to_string()).collect(),
            provisioned,
            skipped,
            dry_run: self.config.dry_run,
        })
    }

    /// Best-effort: a provisioning failure skips the principal, never the binding.
    fn ensure_identity(
        &self,
        overlay: &mut DirectoryOverlay<'_>,
        username: &str,
        email: &str,
        origin: &str,
    ) -> ProvisioningOutcome {
        let key = UserKey::new(username);
        if let Some(record) = overlay.get(&key) {
            return ProvisioningOutcome::Provisioned(record.clone());
        }

        if self.config.dry_run {
            info!(user = %username, origin = %origin, "[dry-run] creating user in identity store");
            let record = IdentityRecord::new(
                username,
                IdentityId::new(format!("dry-run-{key}")),
                email,
                origin,
            );
            overlay.insert_provisioned(record.clone());
            return ProvisioningOutcome::Provisioned(record);
        }

        debug!(user = %username, origin = %origin, "user doesn't exist in identity store, creating it");
        match self.provisioner.create_federated_identity(username, email, origin) {
            Ok(record) => {
                overlay.insert_provisioned(record.clone());
                ProvisioningOutcome::Provisioned(record)
            }
            Err(e) => {
                let err = SyncError::provisioning(username, e.to_string());
                warn!(user = %username, error = %err, "skipping user");
                ProvisioningOutcome::Skipped(SkippedPrincipal {
                    username: username.to_string(),
                    origin: origin.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
