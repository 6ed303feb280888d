//! Run report: what a reconciliation run did or, in dry-run, would do.

use chrono::{DateTime, Utc};
use serde::Serialize;

use rolesync_core::RunId;
use rolesync_identity::SkippedPrincipal;

use crate::reconciler::RoleOutcome;

/// Result of the cleanup pass for one org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupOutcome {
    pub org: String,
    /// Org members holding no role, removed (or logged in dry-run).
    pub removed: Vec<String>,
    /// Org members kept because they hold at least one role.
    pub retained: usize,
    pub dry_run: bool,
}

/// Totals over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub bindings: usize,
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub retained_extraneous: usize,
    pub provisioned: usize,
    pub skipped: usize,
    pub org_members_removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub roles: Vec<RoleOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cleanup: Vec<CleanupOutcome>,
}

impl RunReport {
    pub fn start(dry_run: bool) -> Self {
        Self {
            run_id: RunId::new(),
            dry_run,
            started_at: Utc::now(),
            completed_at: None,
            roles: Vec::new(),
            cleanup: Vec::new(),
        }
    }

    pub fn complete(mut self) -> Self {
        self.completed_at = Some(Utc::now());
        self
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            bindings: self.roles.len(),
            ..RunSummary::default()
        };
        for outcome in &self.roles {
            summary.added += outcome.added.len();
            summary.removed += outcome.removed.len();
            summary.unchanged += outcome.unchanged.len();
            summary.retained_extraneous += outcome.retained_extraneous.len();
            summary.provisioned += outcome.provisioned.len();
            summary.skipped += outcome.skipped.len();
        }
        summary.org_members_removed = self.cleanup.iter().map(|c| c.removed.len()).sum();
        summary
    }

    /// Every principal left out because provisioning failed.
    pub fn skipped_principals(&self) -> impl Iterator<Item = &SkippedPrincipal> {
        self.roles.iter().flat_map(|outcome| outcome.skipped.iter())
    }

    pub fn is_noop(&self) -> bool {
        self.roles.iter().all(RoleOutcome::is_noop) && self.cleanup.iter().all(|c| c.removed.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolesync_identity::RoleKind;

    fn outcome(added: &[&str], skipped: &[&str]) -> RoleOutcome {
        RoleOutcome {
            target: "org test-org".to_string(),
            role: RoleKind::OrgManager,
            added: added.iter().map(|s| s.to_string()).collect(),
            removed: vec![],
            unchanged: vec!["alice".to_string()],
            retained_extraneous: vec![],
            provisioned: vec![],
            skipped: skipped
                .iter()
                .map(|s| SkippedPrincipal {
                    username: s.to_string(),
                    origin: "saml".to_string(),
                    reason: "rejected".to_string(),
                })
                .collect(),
            dry_run: false,
        }
    }

    #[test]
    fn summary_totals_every_binding() {
        let mut report = RunReport::start(false);
        report.roles.push(outcome(&["bob"], &[]));
        report.roles.push(outcome(&["carol", "dana"], &["erin@example.com"]));
        report.cleanup.push(CleanupOutcome {
            org: "test-org".to_string(),
            removed: vec!["frank".to_string()],
            retained: 3,
            dry_run: false,
        });
        let report = report.complete();

        let summary = report.summary();
        assert_eq!(summary.bindings, 2);
        assert_eq!(summary.added, 3);
        assert_eq!(summary.unchanged, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.org_members_removed, 1);
        assert_eq!(
            report.skipped_principals().map(|s| s.username.as_str()).collect::<Vec<_>>(),
            ["erin@example.com"]
        );
        assert!(!report.is_noop());
        assert!(report.completed_at.is_some());
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = RunReport::start(true);
        report.roles.push(outcome(&[], &[]));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["roles"][0]["role"], "org-manager");
        assert!(json.get("cleanup").is_none());
        assert!(report.is_noop());
    }
}
