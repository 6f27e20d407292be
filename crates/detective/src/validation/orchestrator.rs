//! Sequential execution of the check battery.

use std::time::Instant;

use chrono::Utc;
use tracing::info;

use super::checks::kubernetes::{CoreComponents, LocalVolumesBound, NodesReady, PodsRunning};
use super::checks::storage::{
    ClusterHealth, DiskStatus, DisksetStatus, LdapStatus, NodeStatus, ObjectStoreVersion,
    ReplicationStatus,
};
use super::checks::{Check, Target};
use super::outcome::Outcome;
use super::pods::RequiredPrefixes;
use super::report::{CheckRecord, Report, WarningPolicy};
use crate::discovery::Deployment;

/// Progress hook for callers that render the run.
pub trait RunObserver {
    fn check_started(&self, _index: usize, _total: usize, _name: &str) {}

    fn check_finished(&self, _index: usize, _name: &str, _outcome: &Outcome) {}
}

/// Silent observer.
impl RunObserver for () {}

/// Runs checks one after another and folds every outcome into a [`Report`].
///
/// A failing check never stops the run: checks are independent and the
/// report lists everything that is broken.
pub struct Orchestrator {
    checks: Vec<Check>,
    policy: WarningPolicy,
}

impl Orchestrator {
    pub fn new(checks: Vec<Check>, policy: WarningPolicy) -> Self {
        Self { checks, policy }
    }

    /// The standard battery for an Object Store deployment.
    pub fn standard(deployment: &Deployment, policy: WarningPolicy) -> Self {
        let checks = vec![
            Check::cluster(CoreComponents),
            Check::cluster(NodesReady),
            Check::cluster(PodsRunning::kube_system()),
            Check::cluster(PodsRunning::new(
                deployment.namespace.clone(),
                RequiredPrefixes::new(deployment.required_pod_prefixes()),
            )),
            Check::cluster(LocalVolumesBound),
            Check::storage(ObjectStoreVersion),
            Check::storage(DiskStatus),
            Check::storage(DisksetStatus),
            Check::storage(NodeStatus),
            Check::storage(ReplicationStatus),
            Check::storage(LdapStatus),
            Check::storage(ClusterHealth),
        ];
        Self::new(checks, policy)
    }

    pub fn check_names(&self) -> Vec<String> {
        self.checks.iter().map(Check::name).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Execute every check in order.
    pub async fn run(&self, target: &Target<'_>, observer: &dyn RunObserver) -> Report {
        let started_at = Utc::now();
        let clock = Instant::now();
        let total = self.checks.len();
        let mut records = Vec::with_capacity(total);

        for (i, check) in self.checks.iter().enumerate() {
            let index = i + 1;
            let name = check.name();
            observer.check_started(index, total, &name);

            let outcome = check.run(target).await;
            info!(check = %name, status = %outcome.status(), "Check finished");

            observer.check_finished(index, &name, &outcome);
            records.push(CheckRecord::new(name, &outcome));
        }

        Report::collect(records, self.policy, started_at, clock.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::cluster::{ClusterInventory, StaticInventory};
    use crate::storage::{SessionToken, StorageApi, StorageEndpoints, StorageSession};
    use crate::validation::checks::ClusterCheck;
    use crate::validation::outcome::{CheckError, OutcomeStatus};

    struct Fixed(&'static str, Outcome);

    #[async_trait]
    impl ClusterCheck for Fixed {
        fn name(&self) -> String {
            self.0.to_string()
        }

        async fn evaluate(&self, _cluster: &dyn ClusterInventory) -> Result<Outcome, CheckError> {
            Ok(self.1.clone())
        }
    }

    struct Broken;

    #[async_trait]
    impl ClusterCheck for Broken {
        fn name(&self) -> String {
            "broken".to_string()
        }

        async fn evaluate(&self, _cluster: &dyn ClusterInventory) -> Result<Outcome, CheckError> {
            Err(CheckError::transport("the Kubernetes API (nodes)", "connection refused"))
        }
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl RunObserver for Recorder {
        fn check_started(&self, index: usize, total: usize, name: &str) {
            self.0.borrow_mut().push(format!("{index}/{total} {name}"));
        }
    }

    fn session() -> StorageSession {
        let api = StorageApi::new(
            StorageEndpoints::for_host("127.0.0.1"),
            Duration::from_secs(1),
        )
        .unwrap();
        StorageSession::new(api, SessionToken::new("unused"))
    }

    #[tokio::test]
    async fn collects_every_failure_without_short_circuit() {
        let orchestrator = Orchestrator::new(
            vec![
                Check::cluster(Fixed("one", Outcome::failure("first problem"))),
                Check::cluster(Fixed("two", Outcome::success())),
                Check::cluster(Broken),
                Check::cluster(Fixed("four", Outcome::failure("last problem"))),
            ],
            WarningPolicy::Issue,
        );
        let cluster = StaticInventory::default();
        let storage = session();
        let target = Target {
            cluster: &cluster,
            storage: &storage,
        };

        let report = orchestrator.run(&target, &()).await;

        assert_eq!(report.total_checks(), 4);
        assert_eq!(report.issues().len(), 3);
        assert!(!report.overall_success());
        assert_eq!(report.issues()[0], "first problem");
        assert!(report.issues()[1].contains("connection refused"));
        assert_eq!(report.issues()[2], "last problem");
        assert_eq!(report.checks()[2].status, OutcomeStatus::Failure);
    }

    #[tokio::test]
    async fn all_success_is_overall_success() {
        let orchestrator = Orchestrator::new(
            vec![
                Check::cluster(Fixed("one", Outcome::success())),
                Check::cluster(Fixed("two", Outcome::success())),
            ],
            WarningPolicy::Issue,
        );
        let cluster = StaticInventory::default();
        let storage = session();
        let report = orchestrator
            .run(
                &Target {
                    cluster: &cluster,
                    storage: &storage,
                },
                &(),
            )
            .await;

        assert!(report.overall_success());
        assert!(report.issues().is_empty());
    }

    #[tokio::test]
    async fn observer_sees_checks_in_order() {
        let orchestrator = Orchestrator::new(
            vec![
                Check::cluster(Fixed("alpha", Outcome::success())),
                Check::cluster(Fixed("beta", Outcome::warning("meh"))),
            ],
            WarningPolicy::Note,
        );
        let cluster = StaticInventory::default();
        let storage = session();
        let recorder = Recorder::default();
        let report = orchestrator
            .run(
                &Target {
                    cluster: &cluster,
                    storage: &storage,
                },
                &recorder,
            )
            .await;

        assert_eq!(*recorder.0.borrow(), vec!["1/2 alpha", "2/2 beta"]);
        assert!(report.overall_success());
        assert_eq!(report.notes(), ["meh".to_string()]);
    }

    #[test]
    fn standard_battery_order() {
        let deployment = Deployment {
            release: "ostore".to_string(),
            namespace: "ostore".to_string(),
        };
        let orchestrator = Orchestrator::standard(&deployment, WarningPolicy::Issue);
        assert_eq!(
            orchestrator.check_names(),
            vec![
                "Core Kubernetes components",
                "Kubernetes nodes ready",
                "Pods running in namespace 'kube-system'",
                "Pods running in namespace 'ostore'",
                "Local PersistentVolumes bound",
                "ObjectStore version",
                "Disk status",
                "Diskset status",
                "ObjectStore node status",
                "Replication status",
                "LDAP status",
                "ObjectStore cluster health",
            ]
        );
    }
}
