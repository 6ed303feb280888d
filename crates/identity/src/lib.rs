//! `rolesync-identity`: identity providers consumed by the reconciler.
//!
//! Three sources feed desired role membership: the platform's internal user
//! store, directory groups, and federated (SAML) identities. This crate holds
//! the records, the snapshot, and the collaborator traits; no transport.

pub mod directory;
pub mod groups;
pub mod principal;
pub mod provisioning;
pub mod record;
pub mod roles;

pub use directory::{DirectoryOverlay, IdentityDirectory, IdentitySource};
pub use groups::{GroupResolver, StaticGroupResolver};
pub use principal::{Principal, PrincipalSource};
pub use provisioning::{IdentityProvisioner, ProvisioningOutcome, SkippedPrincipal};
pub use record::{INTERNAL_ORIGIN, IdentityRecord};
pub use roles::{RoleKind, TargetKind};
