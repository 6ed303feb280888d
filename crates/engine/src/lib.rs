//! `rolesync-engine`: role-membership reconciliation.
//!
//! Bindings tie a role on an org or space to its list/add/remove operations;
//! the [`Reconciler`] brings one binding in line with its desired membership
//! and the [`RunDriver`] walks a whole [`SyncConfig`].

pub mod binding;
pub mod cleanup;
pub mod config;
pub mod driver;
pub mod membership;
pub mod plan;
pub mod platform;
pub mod reconciler;
pub mod report;
pub mod resolver;
pub mod target;

/// In-memory platform used by tests, benches and the preview binary.
pub mod memory;

mod integration_tests;

pub use binding::{PlatformRoleOps, RoleBinding, RoleOperations};
pub use cleanup::OrgCleanup;
pub use config::{OrgConfig, RoleMembershipConfig, SpaceConfig, SyncConfig};
pub use driver::RunDriver;
pub use membership::{DesiredMembership, RoleMemberSet};
pub use memory::{InMemoryPlatform, PlatformSnapshot};
pub use plan::MembershipPlan;
pub use platform::{PlatformClient, RoleHolder};
pub use reconciler::{Reconciler, ReconcilerConfig, RoleOutcome};
pub use report::{CleanupOutcome, RunReport, RunSummary};
pub use resolver::TargetResolver;
pub use target::{OrgRef, SpaceRef, Target};
