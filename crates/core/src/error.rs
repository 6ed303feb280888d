//! Error model shared by every rolesync crate.

use thiserror::Error;

/// Result type used across the reconciliation engine.
pub type SyncResult<T> = Result<T, SyncError>;

/// Failure reported by an external collaborator (platform API, identity store,
/// provisioning endpoint).
///
/// Collaborators stay opaque to the engine; they only need to say whether the
/// thing was missing, refused, or unreachable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

impl PlatformError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Discriminant of a [`SyncError`], with role context stripped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    NotFound,
    UnknownPrincipal,
    GroupLookup,
    RemoteOperation,
    Provisioning,
}

/// Reconciliation error.
///
/// Every kind except [`SyncError::Provisioning`] aborts the run. Provisioning
/// failures are recovered locally by the reconciler and only surface through
/// the run report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The desired-membership declaration is malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An org or space does not exist on the platform.
    #[error("{0}")]
    NotFound(String),

    /// An internal user is referenced that the identity directory doesn't know.
    #[error("user {0} doesn't exist in the identity directory, so must add internal user first")]
    UnknownPrincipal(String),

    #[error("group lookup failed for [{group}]: {reason}")]
    GroupLookup { group: String, reason: String },

    /// A list/add/remove call against the platform failed.
    #[error("{operation}: {source}")]
    RemoteOperation {
        operation: String,
        #[source]
        source: PlatformError,
    },

    #[error("unable to provision identity {username}: {reason}")]
    Provisioning { username: String, reason: String },

    /// Context wrapper naming the binding that was being reconciled.
    #[error("error syncing users for {target} role {role}: {source}")]
    Role {
        target: String,
        role: String,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unknown_principal(username: impl Into<String>) -> Self {
        Self::UnknownPrincipal(username.into())
    }

    pub fn group_lookup(group: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GroupLookup {
            group: group.into(),
            reason: reason.into(),
        }
    }

    pub fn remote(operation: impl Into<String>, source: PlatformError) -> Self {
        Self::RemoteOperation {
            operation: operation.into(),
            source,
        }
    }

    pub fn provisioning(username: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Provisioning {
            username: username.into(),
            reason: reason.into(),
        }
    }

    /// Attach the target/role being reconciled. Already-wrapped errors are
    /// returned unchanged so context is never stacked twice.
    pub fn in_role(self, target: impl Into<String>, role: impl Into<String>) -> Self {
        match self {
            wrapped @ Self::Role { .. } => wrapped,
            other => Self::Role {
                target: target.into(),
                role: role.into(),
                source: Box::new(other),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::UnknownPrincipal(_) => ErrorKind::UnknownPrincipal,
            Self::GroupLookup { .. } => ErrorKind::GroupLookup,
            Self::RemoteOperation { .. } => ErrorKind::RemoteOperation,
            Self::Provisioning { .. } => ErrorKind::Provisioning,
            Self::Role { source, .. } => source.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_context_is_transparent_to_kind() {
        let err = SyncError::unknown_principal("bob").in_role("org/space test-org/dev", "space-developer");
        assert_eq!(err.kind(), ErrorKind::UnknownPrincipal);
        assert_eq!(
            err.to_string(),
            "error syncing users for org/space test-org/dev role space-developer: \
             user bob doesn't exist in the identity directory, so must add internal user first"
        );
    }

    #[test]
    fn role_context_is_not_stacked() {
        let err = SyncError::not_found("space [qa] not found in org [test-org]")
            .in_role("org test-org", "org-manager")
            .in_role("org other", "org-auditor");

        let SyncError::Role { target, role, .. } = &err else {
            panic!("expected role context");
        };
        assert_eq!(target, "org test-org");
        assert_eq!(role, "org-manager");
    }

    #[test]
    fn provisioning_error_names_the_user() {
        let err = SyncError::provisioning("x@example.com", "rejected: user exists");
        assert_eq!(err.kind(), ErrorKind::Provisioning);
        assert_eq!(
            err.to_string(),
            "unable to provision identity x@example.com: rejected: user exists"
        );
    }
}
