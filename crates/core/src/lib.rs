//! `rolesync-core`: shared primitives for role-membership reconciliation.
//!
//! No IO lives here: errors, identifiers and the username key.

pub mod error;
pub mod id;
pub mod username;

pub use error::{ErrorKind, PlatformError, SyncError, SyncResult};
pub use id::{IdentityId, OrgId, RunId, SpaceId};
pub use username::UserKey;
