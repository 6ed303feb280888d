//! Identity provisioning for federated and directory-sourced users.

use serde::Serialize;

use rolesync_core::PlatformError;

use crate::IdentityRecord;

/// Creates identities that don't exist yet in the identity store.
pub trait IdentityProvisioner {
    fn create_federated_identity(
        &self,
        username: &str,
        email: &str,
        origin: &str,
    ) -> Result<IdentityRecord, PlatformError>;
}

impl<P> IdentityProvisioner for &P
where
    P: IdentityProvisioner + ?Sized,
{
    fn create_federated_identity(
        &self,
        username: &str,
        email: &str,
        origin: &str,
    ) -> Result<IdentityRecord, PlatformError> {
        (**self).create_federated_identity(username, email, origin)
    }
}

/// A principal that could not be provisioned and was left out of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPrincipal {
    pub username: String,
    pub origin: String,
    pub reason: String,
}

/// Result of one best-effort provisioning attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    /// Identity already existed or was created.
    Provisioned(IdentityRecord),
    Skipped(SkippedPrincipal),
}
