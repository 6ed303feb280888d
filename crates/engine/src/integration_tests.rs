//! Integration tests for full reconciliation runs.
//!
//! Tests: SyncConfig → RunDriver → Reconciler → PlatformRoleOps → InMemoryPlatform
//!
//! Verifies:
//! - Desired membership is reached and extraneous holders are removed only on opt-in
//! - Org association always precedes role association
//! - Dry-run issues no mutation at all
//! - Fatal errors abort with role context, provisioning failures do not

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use rolesync_core::{ErrorKind, SyncResult};
    use rolesync_identity::RoleKind;

    use crate::config::{OrgConfig, SpaceConfig, SyncConfig};
    use crate::driver::RunDriver;
    use crate::memory::{DIRECTORY_ORIGIN, InMemoryPlatform, Operation};
    use crate::reconciler::ReconcilerConfig;
    use crate::report::RunReport;
    use crate::target::{OrgRef, SpaceRef};

    struct World {
        platform: InMemoryPlatform,
        org: OrgRef,
        dev: SpaceRef,
    }

    /// Org "test-org" with space "dev"; alice and carol already develop there.
    fn world() -> World {
        let platform = InMemoryPlatform::new();
        let org = platform.add_org("test-org");
        let dev = platform.add_space("test-org", "dev").unwrap();
        for user in ["alice", "bob", "carol"] {
            platform.add_internal_user(user);
        }
        platform.grant(RoleKind::SpaceDeveloper, dev.id.as_str(), "alice");
        platform.grant(RoleKind::SpaceDeveloper, dev.id.as_str(), "carol");
        World { platform, org, dev }
    }

    fn run(platform: &InMemoryPlatform, config: &SyncConfig) -> SyncResult<RunReport> {
        RunDriver::new(platform, platform, platform, platform, config.reconciler_config()).run(config)
    }

    fn dev_config(users: &[&str], remove: bool) -> SyncConfig {
        let mut space = SpaceConfig::new("test-org", "dev");
        space.developers.users = users.iter().map(|u| u.to_string()).collect();
        space.enable_remove_users = remove;
        SyncConfig {
            spaces: vec![space],
            ..SyncConfig::default()
        }
    }

    #[test]
    fn reaches_desired_membership_with_removal() {
        let w = world();

        let report = run(&w.platform, &dev_config(&["alice", "bob"], true)).unwrap();

        let devs = &report.roles[0];
        assert_eq!(devs.role, RoleKind::SpaceDeveloper);
        assert_eq!(devs.added, ["bob"]);
        assert_eq!(devs.removed, ["carol"]);
        assert_eq!(devs.unchanged, ["alice"]);
        assert_eq!(
            w.platform.role_members(RoleKind::SpaceDeveloper, w.dev.id.as_str()),
            ["alice", "bob"]
        );
        assert_eq!(report.roles.len(), 3);
    }

    #[test]
    fn group_and_internal_sources_together_reach_desired_membership() {
        let w = world();
        w.platform.add_group("space-devs", &["alice"]);
        let mut config = dev_config(&["bob"], true);
        config.spaces[0].developers.groups.push("space-devs".to_string());

        let report = run(&w.platform, &config).unwrap();

        let devs = &report.roles[0];
        assert_eq!(devs.added, ["bob"]);
        assert_eq!(devs.removed, ["carol"]);
        assert_eq!(devs.unchanged, ["alice"]);
        assert!(devs.provisioned.is_empty());
        assert_eq!(
            w.platform.role_members(RoleKind::SpaceDeveloper, w.dev.id.as_str()),
            ["alice", "bob"]
        );
        let role_mutations: Vec<(Operation, Option<String>)> = w
            .platform
            .mutations()
            .into_iter()
            .filter(|c| c.role.is_some())
            .map(|c| (c.operation, c.username))
            .collect();
        assert_eq!(
            role_mutations,
            [
                (Operation::AssociateRole, Some("bob".to_string())),
                (Operation::RemoveRole, Some("carol".to_string())),
            ]
        );
    }

    #[test]
    fn malformed_membership_aborts_run_as_configuration_error() {
        let w = world();
        let mut config = dev_config(&["alice"], true);
        config.spaces[0].developers.federated_users.push("dana".to_string());

        let err = run(&w.platform, &config).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("org/space test-org/dev role space-developer"));
        assert!(w.platform.mutations().is_empty());
        assert!(!w.platform.has_user("dana"));

        let err = run(&w.platform, &dev_config(&[""], false)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn keeps_extraneous_holders_without_removal() {
        let w = world();

        let report = run(&w.platform, &dev_config(&["alice", "bob"], false)).unwrap();

        assert_eq!(report.roles[0].retained_extraneous, ["carol"]);
        assert_eq!(
            w.platform.role_members(RoleKind::SpaceDeveloper, w.dev.id.as_str()),
            ["alice", "bob", "carol"]
        );
        assert!(
            w.platform
                .mutations()
                .iter()
                .all(|c| c.operation != Operation::RemoveRole)
        );
    }

    #[test]
    fn dry_run_against_missing_space_uses_placeholder() {
        let w = world();
        let mut config = dev_config(&["alice"], true);
        config.spaces[0].space = "qa".to_string();
        config.dry_run = true;

        let report = run(&w.platform, &config).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.roles[0].target, "org/space test-org/qa");
        assert_eq!(report.roles[0].added, ["alice"]);
        assert!(w.platform.mutations().is_empty());
        assert!(
            w.platform
                .journal()
                .iter()
                .all(|c| !(c.operation == Operation::ListRoleMembers && c.target == "qa-dry-run-space-guid"))
        );
    }

    #[test]
    fn org_association_precedes_role_association() {
        let w = world();
        let mut config = dev_config(&["alice", "bob"], false);
        config.orgs.push(OrgConfig::new("test-org"));
        config.orgs[0].auditors.users.push("carol".to_string());

        run(&w.platform, &config).unwrap();

        let journal = w.platform.journal();
        let role_adds: Vec<_> = journal
            .iter()
            .filter(|c| c.operation == Operation::AssociateRole)
            .collect();
        assert_eq!(role_adds.len(), 2);
        for add in role_adds {
            let org_assoc = journal
                .iter()
                .find(|c| c.operation == Operation::AssociateOrgMember && c.username == add.username);
            assert!(org_assoc.is_some_and(|c| c.seq < add.seq), "{add:?}");
        }
    }

    #[test]
    fn org_roles_run_before_space_roles() {
        let w = world();
        let mut config = dev_config(&["bob"], false);
        config.orgs.push(OrgConfig::new("test-org"));
        config.orgs[0].managers.users.push("alice".to_string());

        let report = run(&w.platform, &config).unwrap();

        let roles: Vec<RoleKind> = report.roles.iter().map(|o| o.role).collect();
        assert_eq!(&roles[..3], RoleKind::ORG);
        assert_eq!(&roles[3..], RoleKind::SPACE);
    }

    #[test]
    fn unknown_principal_aborts_before_mutation() {
        let w = world();

        let err = run(&w.platform, &dev_config(&["alice", "mallory"], true)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnknownPrincipal);
        assert!(err.to_string().contains("org/space test-org/dev role space-developer"));
        assert!(w.platform.mutations().is_empty());
        assert_eq!(
            w.platform.role_members(RoleKind::SpaceDeveloper, w.dev.id.as_str()),
            ["alice", "carol"]
        );
    }

    #[test]
    fn remote_failure_carries_role_context_and_is_not_rolled_back() {
        let w = world();
        w.platform.fail_on(Operation::AssociateRole, Some("bob"));

        let err = run(&w.platform, &dev_config(&["alice", "bob"], true)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RemoteOperation);
        assert!(err.to_string().contains("org/space test-org/dev role space-developer"));
        assert!(w.platform.org_members(&w.org.id).contains(&"bob".to_string()));
        assert!(
            w.platform
                .mutations()
                .iter()
                .all(|c| c.operation != Operation::RemoveRole)
        );
    }

    #[test]
    fn missing_org_is_fatal_in_dry_run_too() {
        let w = world();
        let mut config = SyncConfig {
            dry_run: true,
            ..SyncConfig::default()
        };
        config.orgs.push(OrgConfig::new("missing-org"));

        let err = run(&w.platform, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn provisioning_failure_is_reported_and_skipped() {
        let w = world();
        w.platform.fail_on(Operation::CreateIdentity, Some("erin@example.com"));
        let mut config = SyncConfig::default();
        config.orgs.push(OrgConfig::new("test-org"));
        config.orgs[0].managers.federated_users =
            vec!["erin@example.com".to_string(), "dana@example.com".to_string()];

        let report = run(&w.platform, &config).unwrap();

        let skipped: Vec<_> = report.skipped_principals().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].username, "erin@example.com");
        assert_eq!(report.summary().skipped, 1);
        assert_eq!(
            w.platform.role_members(RoleKind::OrgManager, w.org.id.as_str()),
            ["dana@example.com"]
        );
    }

    #[test]
    fn group_members_are_provisioned_with_directory_origin() {
        let w = world();
        w.platform.add_group("space-devs", &["alice", "Gina"]);
        let mut config = dev_config(&[], false);
        config.spaces[0].developers.groups.push("space-devs".to_string());

        let report = run(&w.platform, &config).unwrap();

        assert_eq!(report.roles[0].added, ["Gina"]);
        assert_eq!(report.roles[0].provisioned, ["Gina"]);
        assert!(w.platform.has_user("gina"));
        assert!(
            w.platform
                .journal()
                .iter()
                .any(|c| c.operation == Operation::CreateIdentity && c.target == DIRECTORY_ORIGIN)
        );
    }

    #[test]
    fn unknown_group_is_fatal() {
        let w = world();
        let mut config = dev_config(&["bob"], false);
        config.spaces[0].developers.groups.push("nope".to_string());

        let err = run(&w.platform, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GroupLookup);
        assert!(w.platform.mutations().is_empty());
    }

    #[test]
    fn cleanup_keeps_every_role_holder_including_developers() {
        let w = world();
        w.platform.seed_org_member(&w.org.id, "frank");
        w.platform.add_internal_user("frank");
        let mut config = SyncConfig::default();
        let mut org = OrgConfig::new("test-org");
        org.managers.users.push("bob".to_string());
        org.enable_cleanup_org_users = true;
        config.orgs.push(org);

        let report = run(&w.platform, &config).unwrap();

        assert_eq!(report.cleanup[0].removed, ["frank"]);
        assert_eq!(w.platform.org_members(&w.org.id), ["alice", "bob", "carol"]);
    }

    #[test]
    fn dry_run_is_pure_across_all_phases() {
        let w = world();
        w.platform.seed_org_member(&w.org.id, "frank");
        let mut config = dev_config(&["alice", "bob"], true);
        config.dry_run = true;
        let mut org = OrgConfig::new("test-org");
        org.managers.federated_users.push("dana@example.com".to_string());
        org.enable_remove_users = true;
        org.enable_cleanup_org_users = true;
        config.orgs.push(org);

        let report = run(&w.platform, &config).unwrap();

        assert!(w.platform.mutations().is_empty());
        assert!(!w.platform.has_user("dana@example.com"));
        assert_eq!(report.roles[1].added, ["dana@example.com"]);
        assert_eq!(report.roles[3].removed, ["carol"]);
        assert_eq!(report.cleanup[0].removed, ["frank"]);
    }

    #[test]
    fn phases_can_run_on_their_own() {
        let w = world();
        let config = dev_config(&["alice"], true);
        let driver = RunDriver::new(
            &w.platform,
            &w.platform,
            &w.platform,
            &w.platform,
            ReconcilerConfig::default(),
        );
        let directory = driver.load_directory().unwrap();

        let outcomes = driver.sync_space_roles(&config.spaces, &directory).unwrap();
        assert_eq!(outcomes[0].removed, ["carol"]);
        assert!(driver.sync_org_roles(&config.orgs, &directory).unwrap().is_empty());
        assert!(driver.cleanup_org_members(&config.orgs).unwrap().is_empty());
    }

    const POOL: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

    fn pick(mask: &[bool]) -> Vec<&'static str> {
        POOL.iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(name, _)| *name)
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a second run with the same inputs issues no mutation,
        /// every desired user holds the role, and without removal every
        /// initial holder keeps it.
        #[test]
        fn reconciliation_is_idempotent(
            desired_mask in prop::collection::vec(any::<bool>(), POOL.len()),
            initial_mask in prop::collection::vec(any::<bool>(), POOL.len()),
            remove in any::<bool>(),
        ) {
            let platform = InMemoryPlatform::new();
            platform.add_org("test-org");
            let dev = platform.add_space("test-org", "dev").unwrap();
            for user in POOL {
                platform.add_internal_user(user);
            }
            let initial = pick(&initial_mask);
            for user in &initial {
                platform.grant(RoleKind::SpaceDeveloper, dev.id.as_str(), user);
            }
            let desired = pick(&desired_mask);
            let config = dev_config(&desired, remove);

            run(&platform, &config).unwrap();
            let members = platform.role_members(RoleKind::SpaceDeveloper, dev.id.as_str());
            for user in &desired {
                prop_assert!(members.contains(&user.to_string()));
            }
            if remove {
                prop_assert_eq!(members.len(), desired.len());
            } else {
                for user in &initial {
                    prop_assert!(members.contains(&user.to_string()));
                }
            }

            platform.clear_journal();
            let report = run(&platform, &config).unwrap();
            prop_assert!(platform.mutations().is_empty());
            prop_assert!(report.is_noop());
        }
    }
}
