//! Aggregated result of one diagnostic run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::outcome::{Detail, Outcome, OutcomeStatus};

/// How Warning outcomes are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WarningPolicy {
    /// Warnings are issues and fail the run.
    #[default]
    Issue,
    /// Warnings are listed as notes and do not affect the result.
    Note,
}

/// One executed check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    pub name: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Detail::is_empty")]
    pub detail: Detail,
}

impl CheckRecord {
    pub fn new(name: impl Into<String>, outcome: &Outcome) -> Self {
        Self {
            name: name.into(),
            status: outcome.status(),
            message: outcome.message().map(ToString::to_string),
            detail: outcome.detail().cloned().unwrap_or_default(),
        }
    }
}

/// The complete diagnostic report.
///
/// `overall_success` is true exactly when `issues` is empty. Issues keep the
/// execution order of the checks that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    overall_success: bool,
    issues: Vec<String>,
    notes: Vec<String>,
    checks: Vec<CheckRecord>,
    warning_policy: WarningPolicy,
    started_at: DateTime<Utc>,
    elapsed_ms: u64,
}

impl Report {
    /// Fold executed checks into a report. Every record is kept; nothing is
    /// short-circuited.
    pub fn collect(
        checks: Vec<CheckRecord>,
        policy: WarningPolicy,
        started_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let (issues, notes) = checks.iter().fold(
            (Vec::new(), Vec::new()),
            |(mut issues, mut notes), record| {
                if let Some(message) = &record.message {
                    match (record.status, policy) {
                        (OutcomeStatus::Failure, _)
                        | (OutcomeStatus::Warning, WarningPolicy::Issue) => {
                            issues.push(message.clone());
                        }
                        (OutcomeStatus::Warning, WarningPolicy::Note) => {
                            notes.push(message.clone());
                        }
                        (OutcomeStatus::Success, _) => {}
                    }
                }
                (issues, notes)
            },
        );

        Self {
            overall_success: issues.is_empty(),
            issues,
            notes,
            checks,
            warning_policy: policy,
            started_at,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn overall_success(&self) -> bool {
        self.overall_success
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn checks(&self) -> &[CheckRecord] {
        &self.checks
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn total_checks(&self) -> usize {
        self.checks.len()
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<CheckRecord> {
        vec![
            CheckRecord::new("nodes", &Outcome::success()),
            CheckRecord::new("pods", &Outcome::failure("pod 'a' is terminating")),
            CheckRecord::new("replication", &Outcome::warning("replication is not configured")),
            CheckRecord::new(
                "disks",
                &Outcome::failure("disk '1' health: expected ONLINE, got 'OFFLINE'"),
            ),
        ]
    }

    fn collect(policy: WarningPolicy) -> Report {
        Report::collect(records(), policy, Utc::now(), Duration::from_millis(1500))
    }

    #[test]
    fn failures_are_issues_in_execution_order() {
        let report = collect(WarningPolicy::Note);
        assert!(!report.overall_success());
        assert_eq!(
            report.issues(),
            [
                "pod 'a' is terminating".to_string(),
                "disk '1' health: expected ONLINE, got 'OFFLINE'".to_string(),
            ]
        );
        assert_eq!(report.notes(), ["replication is not configured".to_string()]);
    }

    #[test]
    fn warnings_count_as_issues_by_default() {
        let report = collect(WarningPolicy::default());
        assert_eq!(report.issues().len(), 3);
        assert_eq!(report.issues()[1], "replication is not configured");
        assert!(report.notes().is_empty());
    }

    #[test]
    fn warnings_alone_do_not_fail_under_note_policy() {
        let checks = vec![
            CheckRecord::new("ldap", &Outcome::warning("LDAP is not configured")),
            CheckRecord::new("nodes", &Outcome::success()),
        ];
        let report = Report::collect(checks, WarningPolicy::Note, Utc::now(), Duration::ZERO);
        assert!(report.overall_success());
        assert!(report.issues().is_empty());
    }

    #[test]
    fn every_check_is_recorded() {
        let report = collect(WarningPolicy::Issue);
        assert_eq!(report.total_checks(), 4);
        assert_eq!(report.count(OutcomeStatus::Success), 1);
        assert_eq!(report.count(OutcomeStatus::Failure), 2);
        assert_eq!(report.elapsed(), Duration::from_millis(1500));
    }

    #[test]
    fn report_serializes_to_json() {
        let report = collect(WarningPolicy::Issue);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overall_success"], false);
        assert_eq!(json["warning_policy"], "issue");
        assert_eq!(json["checks"][0]["status"], "success");
        assert!(json["checks"][0].get("message").is_none());
    }
}
