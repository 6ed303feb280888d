//! Identity directory snapshot.
//!
//! The snapshot is loaded once per run and shared read-only by every
//! reconciliation. Identities provisioned during a reconciliation go into a
//! [`DirectoryOverlay`] owned by that reconciliation.

use std::collections::HashMap;

use tracing::debug;

use rolesync_core::{PlatformError, SyncError, SyncResult, UserKey};

use crate::IdentityRecord;

/// Source of the identity snapshot (the platform's user store).
pub trait IdentitySource {
    fn load_all(&self) -> Result<Vec<IdentityRecord>, PlatformError>;
}

impl<S> IdentitySource for &S
where
    S: IdentitySource + ?Sized,
{
    fn load_all(&self) -> Result<Vec<IdentityRecord>, PlatformError> {
        (**self).load_all()
    }
}

/// Point-in-time mapping from case-folded username to identity record.
#[derive(Debug, Clone, Default)]
pub struct IdentityDirectory {
    users: HashMap<UserKey, IdentityRecord>,
}

impl IdentityDirectory {
    /// Load the full snapshot from the identity store.
    pub fn load<S: IdentitySource + ?Sized>(source: &S) -> SyncResult<Self> {
        let records = source
            .load_all()
            .map_err(|e| SyncError::remote("loading identity directory", e))?;
        let directory = Self::from_records(records);
        debug!(users = directory.len(), "identity directory loaded");
        Ok(directory)
    }

    /// Later records win when two usernames fold to the same key.
    pub fn from_records(records: impl IntoIterator<Item = IdentityRecord>) -> Self {
        let users = records.into_iter().map(|r| (r.key(), r)).collect();
        Self { users }
    }

    pub fn get(&self, key: &UserKey) -> Option<&IdentityRecord> {
        self.users.get(key)
    }

    pub fn contains(&self, key: &UserKey) -> bool {
        self.users.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Start a private, writable view for one reconciliation.
    pub fn overlay(&self) -> DirectoryOverlay<'_> {
        DirectoryOverlay {
            base: self,
            provisioned: HashMap::new(),
        }
    }
}

/// Shared snapshot plus identities provisioned by the owning reconciliation.
#[derive(Debug)]
pub struct DirectoryOverlay<'a> {
    base: &'a IdentityDirectory,
    provisioned: HashMap<UserKey, IdentityRecord>,
}

impl DirectoryOverlay<'_> {
    pub fn get(&self, key: &UserKey) -> Option<&IdentityRecord> {
        self.provisioned.get(key).or_else(|| self.base.get(key))
    }

    pub fn contains(&self, key: &UserKey) -> bool {
        self.provisioned.contains_key(key) || self.base.contains(key)
    }

    pub fn insert_provisioned(&mut self, record: IdentityRecord) {
        self.provisioned.insert(record.key(), record);
    }

    pub fn provisioned(&self) -> impl Iterator<Item = &IdentityRecord> {
        self.provisioned.values()
    }
}
