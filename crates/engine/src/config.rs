//! Sync configuration: which principals should hold which roles.
//!
//! One JSON document declares the orgs and spaces to reconcile. Each role is
//! a block of internal users, directory groups and federated users; removal of
//! extraneous holders and org-member cleanup are opt-in per org/space.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use rolesync_core::{SyncError, SyncResult};
use rolesync_identity::RoleKind;
use rolesync_observability::LoggingConfig;

use crate::membership::DesiredMembership;
use crate::reconciler::{DEFAULT_FEDERATED_ORIGIN, ReconcilerConfig};

pub const ENV_DRY_RUN: &str = "ROLESYNC_DRY_RUN";
pub const ENV_FEDERATED_ORIGIN: &str = "ROLESYNC_FEDERATED_ORIGIN";

/// Principals requested for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMembershipConfig {
    pub users: Vec<String>,
    pub groups: Vec<String>,
    pub federated_users: Vec<String>,
}

impl RoleMembershipConfig {
    pub fn desired(&self, remove_extraneous: bool) -> DesiredMembership {
        DesiredMembership {
            internal_users: self.users.clone(),
            group_names: self.groups.clone(),
            federated_users: self.federated_users.clone(),
            remove_extraneous,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgConfig {
    pub org: String,
    #[serde(default)]
    pub billing_managers: RoleMembershipConfig,
    #[serde(default)]
    pub managers: RoleMembershipConfig,
    #[serde(default)]
    pub auditors: RoleMembershipConfig,
    #[serde(default)]
    pub enable_remove_users: bool,
    /// Remove org members that hold no org or space role.
    #[serde(default)]
    pub enable_cleanup_org_users: bool,
}

impl OrgConfig {
    pub fn new(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            ..Self::default()
        }
    }

    /// `None` for space roles.
    pub fn desired(&self, role: RoleKind) -> Option<DesiredMembership> {
        let block = match role {
            RoleKind::OrgBillingManager => &self.billing_managers,
            RoleKind::OrgManager => &self.managers,
            RoleKind::OrgAuditor => &self.auditors,
            _ => return None,
        };
        Some(block.desired(self.enable_remove_users))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceConfig {
    pub org: String,
    pub space: String,
    #[serde(default)]
    pub developers: RoleMembershipConfig,
    #[serde(default)]
    pub managers: RoleMembershipConfig,
    #[serde(default)]
    pub auditors: RoleMembershipConfig,
    #[serde(default)]
    pub enable_remove_users: bool,
}

impl SpaceConfig {
    pub fn new(org: impl Into<String>, space: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            space: space.into(),
            ..Self::default()
        }
    }

    /// `None` for org roles.
    pub fn desired(&self, role: RoleKind) -> Option<DesiredMembership> {
        let block = match role {
            RoleKind::SpaceDeveloper => &self.developers,
            RoleKind::SpaceManager => &self.managers,
            RoleKind::SpaceAuditor => &self.auditors,
            _ => return None,
        };
        Some(block.desired(self.enable_remove_users))
    }
}

fn default_federated_origin() -> String {
    DEFAULT_FEDERATED_ORIGIN.to_string()
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_federated_origin")]
    pub federated_origin: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub orgs: Vec<OrgConfig>,
    #[serde(default)]
    pub spaces: Vec<SpaceConfig>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            federated_origin: default_federated_origin(),
            logging: LoggingConfig::default(),
            orgs: Vec::new(),
            spaces: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// Read, parse, apply process environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config = Self::from_json_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config
            .apply_env_overrides(|key| std::env::var(key).ok())
            .context("applying environment overrides")?;
        config
            .validate()
            .with_context(|| format!("validating config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> SyncResult<Self> {
        serde_json::from_str(raw).map_err(|e| SyncError::configuration(e.to_string()))
    }

    /// Override `dry_run` and `federated_origin` from variables returned by
    /// `lookup` (normally the process environment).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> SyncResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DRY_RUN) {
            self.dry_run = parse_flag(&raw).ok_or_else(|| {
                SyncError::configuration(format!("{ENV_DRY_RUN} must be true or false, got [{raw}]"))
            })?;
        }
        if let Some(origin) = lookup(ENV_FEDERATED_ORIGIN) {
            if origin.trim().is_empty() {
                return Err(SyncError::configuration(format!("{ENV_FEDERATED_ORIGIN} is blank")));
            }
            self.federated_origin = origin;
        }
        Ok(())
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.federated_origin.trim().is_empty() {
            return Err(SyncError::configuration("federated_origin is blank"));
        }

        let mut orgs = HashSet::new();
        for org in &self.orgs {
            if org.org.trim().is_empty() {
                return Err(SyncError::configuration("org name is blank"));
            }
            if !orgs.insert(org.org.as_str()) {
                return Err(SyncError::configuration(format!("org [{}] is configured twice", org.org)));
            }
            for role in RoleKind::ORG {
                if let Some(desired) = org.desired(role) {
                    desired.validate().map_err(|e| e.in_role(format!("org {}", org.org), role.as_str()))?;
                }
            }
        }

        let mut spaces = HashSet::new();
        for space in &self.spaces {
            if space.org.trim().is_empty() || space.space.trim().is_empty() {
                return Err(SyncError::configuration("space entry needs both org and space names"));
            }
            if !spaces.insert((space.org.as_str(), space.space.as_str())) {
                return Err(SyncError::configuration(format!(
                    "space [{}/{}] is configured twice",
                    space.org, space.space
                )));
            }
            for role in RoleKind::SPACE {
                if let Some(desired) = space.desired(role) {
                    desired
                        .validate()
                        .map_err(|e| e.in_role(format!("org/space {}/{}", space.org, space.space), role.as_str()))?;
                }
            }
        }
        Ok(())
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig::default()
            .with_dry_run(self.dry_run)
            .with_federated_origin(self.federated_origin.clone())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
