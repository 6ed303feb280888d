//! Orgs and spaces that roles are reconciled on.

use serde::{Deserialize, Serialize};

use rolesync_core::{OrgId, SpaceId};
use rolesync_identity::TargetKind;

/// A resolved org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRef {
    pub name: String,
    pub id: OrgId,
}

impl OrgRef {
    pub fn new(name: impl Into<String>, id: impl Into<OrgId>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// A resolved space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRef {
    pub name: String,
    pub id: SpaceId,
    pub org_id: OrgId,
    /// Set only for dry-run placeholders of spaces that don't exist yet.
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub synthetic: bool,
}

impl SpaceRef {
    pub fn new(name: impl Into<String>, id: impl Into<SpaceId>, org_id: impl Into<OrgId>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            org_id: org_id.into(),
            synthetic: false,
        }
    }

    /// Placeholder with deterministic identifiers for a dry-run preview.
    pub fn placeholder(name: &str, org_id: OrgId) -> Self {
        Self {
            name: name.to_string(),
            id: SpaceId::dry_run_placeholder(name),
            org_id,
            synthetic: true,
        }
    }
}

/// The org or space a role binding operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Org(OrgRef),
    Space { org_name: String, space: SpaceRef },
}

impl Target {
    pub fn space(org_name: impl Into<String>, space: SpaceRef) -> Self {
        Self::Space {
            org_name: org_name.into(),
            space,
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Org(_) => TargetKind::Org,
            Target::Space { .. } => TargetKind::Space,
        }
    }

    /// Platform id the role calls are addressed to.
    pub fn id(&self) -> &str {
        match self {
            Target::Org(org) => org.id.as_str(),
            Target::Space { space, .. } => space.id.as_str(),
        }
    }

    pub fn org_id(&self) -> &OrgId {
        match self {
            Target::Org(org) => &org.id,
            Target::Space { space, .. } => &space.org_id,
        }
    }

    pub fn org_name(&self) -> &str {
        match self {
            Target::Org(org) => &org.name,
            Target::Space { org_name, .. } => org_name,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        match self {
            Target::Org(_) => false,
            Target::Space { space, .. } => space.synthetic,
        }
    }
}

impl core::fmt::Display for Target {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Target::Org(org) => write!(f, "org {}", org.name),
            Target::Space { org_name, space } => write!(f, "org/space {}/{}", org_name, space.name),
        }
    }
}
