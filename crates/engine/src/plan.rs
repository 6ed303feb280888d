//! Desired-vs-actual delta for one role binding.
//!
//! Planning is pure: given the resolved desired principals and the current
//! holders, it partitions them into principals to add, principals already
//! satisfied, and extraneous holders. Removal is gated separately.

use std::collections::HashSet;

use rolesync_core::UserKey;
use rolesync_identity::Principal;

use crate::membership::RoleMemberSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipPlan {
    /// Desired principals that don't hold the role yet, in request order.
    pub to_add: Vec<Principal>,
    /// Desired principals that already hold the role.
    pub unchanged: Vec<UserKey>,
    /// Holders not requested by any source.
    pub extraneous: Vec<UserKey>,
    pub remove_extraneous: bool,
}

impl MembershipPlan {
    /// Duplicate principals collapse to their first occurrence.
    pub fn compute(desired: &[Principal], actual: &RoleMemberSet, remove_extraneous: bool) -> Self {
        let mut seen: HashSet<&UserKey> = HashSet::with_capacity(desired.len());
        let mut to_add = Vec::new();
        let mut unchanged = Vec::new();

        for principal in desired {
            if !seen.insert(&principal.key) {
                continue;
            }
            if actual.contains(&principal.key) {
                unchanged.push(principal.key.clone());
            } else {
                to_add.push(principal.clone());
            }
        }

        let extraneous = actual
            .keys()
            .filter(|key| !seen.contains(key))
            .cloned()
            .collect();

        Self {
            to_add,
            unchanged,
            extraneous,
            remove_extraneous,
        }
    }

    /// Holders that will actually be removed.
    pub fn removals(&self) -> &[UserKey] {
        if self.remove_extraneous {
            &self.extraneous
        } else {
            &[]
        }
    }

    /// Extraneous holders kept because removal is disabled.
    pub fn retained(&self) -> &[UserKey] {
        if self.remove_extraneous {
            &[]
        } else {
            &self.extraneous
        }
    }

    /// Number of holders kept back by the removal gate, `None` when removal
    /// is enabled. Zero still means the gate applied.
    pub fn retention_notice(&self) -> Option<usize> {
        (!self.remove_extraneous).then_some(self.extraneous.len())
    }

    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.removals().is_empty()
    }
}
