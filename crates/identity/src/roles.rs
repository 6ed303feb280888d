use serde::{Deserialize, Serialize};

/// Level of the tenancy hierarchy a role is granted on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Org,
    Space,
}

impl core::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TargetKind::Org => f.write_str("org"),
            TargetKind::Space => f.write_str("space"),
        }
    }
}

/// A named permission grant on an org or a space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleKind {
    OrgBillingManager,
    OrgManager,
    OrgAuditor,
    SpaceDeveloper,
    SpaceManager,
    SpaceAuditor,
}

impl RoleKind {
    /// Org roles in reconciliation order.
    pub const ORG: [RoleKind; 3] = [
        RoleKind::OrgBillingManager,
        RoleKind::OrgManager,
        RoleKind::OrgAuditor,
    ];

    /// Space roles in reconciliation order.
    pub const SPACE: [RoleKind; 3] = [
        RoleKind::SpaceDeveloper,
        RoleKind::SpaceManager,
        RoleKind::SpaceAuditor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::OrgBillingManager => "org-billing-manager",
            RoleKind::OrgManager => "org-manager",
            RoleKind::OrgAuditor => "org-auditor",
            RoleKind::SpaceDeveloper => "space-developer",
            RoleKind::SpaceManager => "space-manager",
            RoleKind::SpaceAuditor => "space-auditor",
        }
    }

    /// Short name used in log lines ("billing manager", "developer", ...).
    pub fn label(&self) -> &'static str {
        match self {
            RoleKind::OrgBillingManager => "billing manager",
            RoleKind::OrgManager | RoleKind::SpaceManager => "manager",
            RoleKind::OrgAuditor | RoleKind::SpaceAuditor => "auditor",
            RoleKind::SpaceDeveloper => "developer",
        }
    }

    pub fn target_kind(&self) -> TargetKind {
        match self {
            RoleKind::OrgBillingManager | RoleKind::OrgManager | RoleKind::OrgAuditor => {
                TargetKind::Org
            }
            RoleKind::SpaceDeveloper | RoleKind::SpaceManager | RoleKind::SpaceAuditor => {
                TargetKind::Space
            }
        }
    }

    pub fn for_target(kind: TargetKind) -> [RoleKind; 3] {
        match kind {
            TargetKind::Org => Self::ORG,
            TargetKind::Space => Self::SPACE,
        }
    }
}

impl core::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
