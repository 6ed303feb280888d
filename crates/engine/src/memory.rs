//! In-memory platform for tests, benchmarks and previews.
//!
//! Implements every collaborator the engine consumes (platform API, identity
//! store, provisioning, group resolution) over a single locked state, and
//! journals each call with a logical sequence number so tests can assert on
//! what reached the backend and in which order.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};

use rolesync_core::{IdentityId, OrgId, PlatformError, SpaceId, SyncError, SyncResult, UserKey};
use rolesync_identity::{
    GroupResolver, IdentityProvisioner, IdentityRecord, IdentitySource, RoleKind, TargetKind,
};

use crate::platform::{PlatformClient, RoleHolder};
use crate::target::{OrgRef, SpaceRef};

/// Origin tag given to group members the identity store doesn't know yet.
pub const DIRECTORY_ORIGIN: &str = "ldap";

// ─────────────────────────────────────────────────────────────────────────────
// Journal
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of call received by the in-memory platform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    LoadIdentities,
    ResolveGroups,
    FindOrg,
    ListSpaces,
    ListRoleMembers,
    ListOrgMembers,
    AssociateOrgMember,
    AssociateRole,
    RemoveRole,
    RemoveOrgMember,
    CreateIdentity,
}

impl Operation {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::AssociateOrgMember
                | Operation::AssociateRole
                | Operation::RemoveRole
                | Operation::RemoveOrgMember
                | Operation::CreateIdentity
        )
    }
}

/// One journaled call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformCall {
    /// Logical timestamp, starting at 1.
    pub seq: u64,
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleKind>,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone)]
struct FailureRule {
    operation: Operation,
    username: Option<UserKey>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot (file format of the preview binary)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformSnapshot {
    #[serde(default)]
    pub users: Vec<IdentityRecord>,
    /// Directory group name → member usernames.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub orgs: Vec<OrgSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgSnapshot {
    pub name: String,
    pub id: OrgId,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub billing_managers: Vec<String>,
    #[serde(default)]
    pub managers: Vec<String>,
    #[serde(default)]
    pub auditors: Vec<String>,
    #[serde(default)]
    pub spaces: Vec<SpaceSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceSnapshot {
    pub name: String,
    pub id: SpaceId,
    #[serde(default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub managers: Vec<String>,
    #[serde(default)]
    pub auditors: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Platform
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserKey, IdentityRecord>,
    groups: BTreeMap<String, Vec<String>>,
    orgs: Vec<OrgRef>,
    spaces: Vec<SpaceRef>,
    org_members: HashMap<OrgId, BTreeSet<UserKey>>,
    roles: HashMap<(RoleKind, String), BTreeSet<UserKey>>,
}

impl State {
    fn org_of_target(&self, role: RoleKind, target_id: &str) -> Option<OrgId> {
        match role.target_kind() {
            TargetKind::Org => self
                .orgs
                .iter()
                .find(|o| o.id.as_str() == target_id)
                .map(|o| o.id.clone()),
            TargetKind::Space => self
                .spaces
                .iter()
                .find(|s| s.id.as_str() == target_id)
                .map(|s| s.org_id.clone()),
        }
    }

    fn has_org(&self, org_id: &OrgId) -> bool {
        self.orgs.iter().any(|o| &o.id == org_id)
    }

    fn holder(&self, key: &UserKey) -> RoleHolder {
        match self.users.get(key) {
            Some(record) => RoleHolder::new(record.username.clone(), record.identifier.clone()),
            None => RoleHolder::new(key.as_str(), format!("user-{key}")),
        }
    }
}

/// In-memory platform, identity store and group directory.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    state: RwLock<State>,
    journal: Mutex<Vec<PlatformCall>>,
    failures: Mutex<Vec<FailureRule>>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a platform from a snapshot. Org members are implied by every
    /// role holder, as on the real platform.
    pub fn from_snapshot(snapshot: PlatformSnapshot) -> Self {
        let platform = Self::new();
        for user in snapshot.users {
            platform.add_user(user);
        }
        for (name, members) in snapshot.groups {
            let members: Vec<&str> = members.iter().map(String::as_str).collect();
            platform.add_group(&name, &members);
        }
        for org in snapshot.orgs {
            let org_ref = OrgRef::new(org.name.clone(), org.id.clone());
            platform.insert_org(org_ref.clone());
            let org_roles = [
                (RoleKind::OrgBillingManager, &org.billing_managers),
                (RoleKind::OrgManager, &org.managers),
                (RoleKind::OrgAuditor, &org.auditors),
            ];
            for user in &org.members {
                platform.seed_org_member(&org_ref.id, user);
            }
            for (role, users) in org_roles {
                for user in users {
                    platform.grant(role, org_ref.id.as_str(), user);
                }
            }
            for space in org.spaces {
                let space_ref = SpaceRef::new(space.name, space.id.clone(), org_ref.id.clone());
                platform.insert_space(space_ref);
                let space_roles = [
                    (RoleKind::SpaceDeveloper, &space.developers),
                    (RoleKind::SpaceManager, &space.managers),
                    (RoleKind::SpaceAuditor, &space.auditors),
                ];
                for (role, users) in space_roles {
                    for user in users {
                        platform.grant(role, space.id.as_str(), user);
                    }
                }
            }
        }
        platform
    }

    // ── seeding (not journaled) ──────────────────────────────────────────────

    pub fn add_user(&self, record: IdentityRecord) {
        if let Ok(mut state) = self.state.write() {
            state.users.insert(record.key(), record);
        }
    }

    /// Add a platform-internal user with id `user-<key>`.
    pub fn add_internal_user(&self, username: &str) -> IdentityRecord {
        let record = IdentityRecord::internal(username, format!("user-{}", UserKey::new(username)));
        self.add_user(record.clone());
        record
    }

    pub fn add_group(&self, name: &str, members: &[&str]) {
        if let Ok(mut state) = self.state.write() {
            state
                .groups
                .insert(name.to_string(), members.iter().map(|m| m.to_string()).collect());
        }
    }

    /// Add an org with id `org-<name>`.
    pub fn add_org(&self, name: &str) -> OrgRef {
        let org = OrgRef::new(name, format!("org-{name}"));
        self.insert_org(org.clone());
        org
    }

    /// Add a space with id `space-<org>-<name>`; `None` when the org is unknown.
    pub fn add_space(&self, org_name: &str, space_name: &str) -> Option<SpaceRef> {
        let org_id = {
            let state = self.state.read().ok()?;
            state.orgs.iter().find(|o| o.name == org_name)?.id.clone()
        };
        let space = SpaceRef::new(space_name, format!("space-{org_name}-{space_name}"), org_id);
        self.insert_space(space.clone());
        Some(space)
    }

    /// Seed a role holder; the holder also becomes an org member.
    pub fn grant(&self, role: RoleKind, target_id: &str, username: &str) {
        let key = UserKey::new(username);
        if let Ok(mut state) = self.state.write() {
            if let Some(org_id) = state.org_of_target(role, target_id) {
                state.org_members.entry(org_id).or_default().insert(key.clone());
            }
            state
                .roles
                .entry((role, target_id.to_string()))
                .or_default()
                .insert(key);
        }
    }

    pub fn seed_org_member(&self, org_id: &OrgId, username: &str) {
        if let Ok(mut state) = self.state.write() {
            state
                .org_members
                .entry(org_id.clone())
                .or_default()
                .insert(UserKey::new(username));
        }
    }

    fn insert_org(&self, org: OrgRef) {
        if let Ok(mut state) = self.state.write() {
            state.orgs.push(org);
        }
    }

    fn insert_space(&self, space: SpaceRef) {
        if let Ok(mut state) = self.state.write() {
            state.spaces.push(space);
        }
    }

    /// Make every later call of `operation` fail (optionally only for one user).
    pub fn fail_on(&self, operation: Operation, username: Option<&str>) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(FailureRule {
                operation,
                username: username.map(UserKey::new),
            });
        }
    }

    // ── inspection ───────────────────────────────────────────────────────────

    /// Sorted case-folded holders of a role.
    pub fn role_members(&self, role: RoleKind, target_id: &str) -> Vec<String> {
        let Ok(state) = self.state.read() else {
            return vec![];
        };
        state
            .roles
            .get(&(role, target_id.to_string()))
            .map(|keys| keys.iter().map(|k| k.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn org_members(&self, org_id: &OrgId) -> Vec<String> {
        let Ok(state) = self.state.read() else {
            return vec![];
        };
        state
            .org_members
            .get(org_id)
            .map(|keys| keys.iter().map(|k| k.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.state
            .read()
            .map(|s| s.users.contains_key(&UserKey::new(username)))
            .unwrap_or(false)
    }

    pub fn journal(&self) -> Vec<PlatformCall> {
        self.journal.lock().map(|j| j.clone()).unwrap_or_default()
    }

    pub fn mutations(&self) -> Vec<PlatformCall> {
        self.journal()
            .into_iter()
            .filter(|c| c.operation.is_mutation())
            .collect()
    }

    pub fn clear_journal(&self) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.clear();
        }
    }

    // ── call plumbing ────────────────────────────────────────────────────────

    fn record(
        &self,
        operation: Operation,
        role: Option<RoleKind>,
        target: &str,
        username: Option<&str>,
    ) -> Result<(), PlatformError> {
        {
            let mut journal = self
                .journal
                .lock()
                .map_err(|_| PlatformError::transport("lock poisoned"))?;
            let seq = journal.len() as u64 + 1;
            journal.push(PlatformCall {
                seq,
                operation,
                role,
                target: target.to_string(),
                username: username.map(str::to_string),
            });
        }

        let failures = self
            .failures
            .lock()
            .map_err(|_| PlatformError::transport("lock poisoned"))?;
        let key = username.map(UserKey::new);
        let injected = failures
            .iter()
            .any(|rule| rule.operation == operation && (rule.username.is_none() || rule.username == key));
        if injected {
            return Err(PlatformError::transport(format!("injected failure for {operation:?}")));
        }
        Ok(())
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, PlatformError> {
        self.state
            .read()
            .map_err(|_| PlatformError::transport("lock poisoned"))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, PlatformError> {
        self.state
            .write()
            .map_err(|_| PlatformError::transport("lock poisoned"))
    }
}

impl PlatformClient for InMemoryPlatform {
    fn find_org(&self, name: &str) -> Result<Option<OrgRef>, PlatformError> {
        self.record(Operation::FindOrg, None, name, None)?;
        let state = self.read_state()?;
        Ok(state.orgs.iter().find(|o| o.name == name).cloned())
    }

    fn list_spaces(&self, org_id: &OrgId) -> Result<Vec<SpaceRef>, PlatformError> {
        self.record(Operation::ListSpaces, None, org_id.as_str(), None)?;
        let state = self.read_state()?;
        if !state.has_org(org_id) {
            return Err(PlatformError::not_found(format!("org {org_id}")));
        }
        Ok(state
            .spaces
            .iter()
            .filter(|s| &s.org_id == org_id)
            .cloned()
            .collect())
    }

    fn list_role_members(&self, role: RoleKind, target_id: &str) -> Result<Vec<RoleHolder>, PlatformError> {
        self.record(Operation::ListRoleMembers, Some(role), target_id, None)?;
        let state = self.read_state()?;
        if state.org_of_target(role, target_id).is_none() {
            return Err(PlatformError::not_found(format!("{} {target_id}", role.target_kind())));
        }
        Ok(state
            .roles
            .get(&(role, target_id.to_string()))
            .map(|keys| keys.iter().map(|k| state.holder(k)).collect())
            .unwrap_or_default())
    }

    fn associate_role(&self, role: RoleKind, target_id: &str, username: &str) -> Result<(), PlatformError> {
        self.record(Operation::AssociateRole, Some(role), target_id, Some(username))?;
        let key = UserKey::new(username);
        let mut state = self.write_state()?;
        if !state.users.contains_key(&key) {
            return Err(PlatformError::not_found(format!("user {username}")));
        }
        let org_id = state
            .org_of_target(role, target_id)
            .ok_or_else(|| PlatformError::not_found(format!("{} {target_id}", role.target_kind())))?;
        let is_member = state
            .org_members
            .get(&org_id)
            .is_some_and(|members| members.contains(&key));
        if !is_member {
            return Err(PlatformError::rejected(format!(
                "user {username} is not a member of org {org_id}"
            )));
        }
        state
            .roles
            .entry((role, target_id.to_string()))
            .or_default()
            .insert(key);
        Ok(())
    }

    fn remove_role(&self, role: RoleKind, target_id: &str, username: &str) -> Result<(), PlatformError> {
        self.record(Operation::RemoveRole, Some(role), target_id, Some(username))?;
        let mut state = self.write_state()?;
        if let Some(holders) = state.roles.get_mut(&(role, target_id.to_string())) {
            holders.remove(&UserKey::new(username));
        }
        Ok(())
    }

    fn associate_org_member(&self, org_id: &OrgId, username: &str) -> Result<(), PlatformError> {
        self.record(Operation::AssociateOrgMember, None, org_id.as_str(), Some(username))?;
        let key = UserKey::new(username);
        let mut state = self.write_state()?;
        if !state.users.contains_key(&key) {
            return Err(PlatformError::not_found(format!("user {username}")));
        }
        if !state.has_org(org_id) {
            return Err(PlatformError::not_found(format!("org {org_id}")));
        }
        state.org_members.entry(org_id.clone()).or_default().insert(key);
        Ok(())
    }

    fn list_org_members(&self, org_id: &OrgId) -> Result<Vec<RoleHolder>, PlatformError> {
        self.record(Operation::ListOrgMembers, None, org_id.as_str(), None)?;
        let state = self.read_state()?;
        if !state.has_org(org_id) {
            return Err(PlatformError::not_found(format!("org {org_id}")));
        }
        Ok(state
            .org_members
            .get(org_id)
            .map(|keys| keys.iter().map(|k| state.holder(k)).collect())
            .unwrap_or_default())
    }

    fn remove_org_member(&self, org_id: &OrgId, username: &str) -> Result<(), PlatformError> {
        self.record(Operation::RemoveOrgMember, None, org_id.as_str(), Some(username))?;
        let mut state = self.write_state()?;
        if let Some(members) = state.org_members.get_mut(org_id) {
            members.remove(&UserKey::new(username));
        }
        Ok(())
    }
}

impl IdentitySource for InMemoryPlatform {
    fn load_all(&self) -> Result<Vec<IdentityRecord>, PlatformError> {
        self.record(Operation::LoadIdentities, None, "identity-store", None)?;
        let state = self.read_state()?;
        Ok(state.users.values().cloned().collect())
    }
}

impl IdentityProvisioner for InMemoryPlatform {
    fn create_federated_identity(
        &self,
        username: &str,
        email: &str,
        origin: &str,
    ) -> Result<IdentityRecord, PlatformError> {
        self.record(Operation::CreateIdentity, None, origin, Some(username))?;
        let key = UserKey::new(username);
        let mut state = self.write_state()?;
        if state.users.contains_key(&key) {
            return Err(PlatformError::rejected(format!("user {username} already exists")));
        }
        let record = IdentityRecord::new(username, IdentityId::new(format!("user-{key}")), email, origin);
        state.users.insert(key, record.clone());
        Ok(record)
    }
}

impl GroupResolver for InMemoryPlatform {
    /// Members unknown to the identity store come back with the directory
    /// origin, as a directory server would report them.
    fn resolve_members(&self, group_names: &[String]) -> SyncResult<Vec<IdentityRecord>> {
        self.record(Operation::ResolveGroups, None, &group_names.join(","), None)
            .map_err(|e| SyncError::group_lookup(group_names.join(","), e.to_string()))?;
        let state = self
            .read_state()
            .map_err(|e| SyncError::group_lookup(group_names.join(","), e.to_string()))?;

        let mut members = Vec::new();
        for name in group_names {
            let group = state
                .groups
                .get(name)
                .ok_or_else(|| SyncError::group_lookup(name.as_str(), "no such group"))?;
            for username in group {
                let key = UserKey::new(username);
                let record = state.users.get(&key).cloned().unwrap_or_else(|| {
                    IdentityRecord::new(
                        username.as_str(),
                        format!("{DIRECTORY_ORIGIN}-{key}"),
                        username.as_str(),
                        DIRECTORY_ORIGIN,
                    )
                });
                members.push(record);
            }
        }
        Ok(members)
    }
}
