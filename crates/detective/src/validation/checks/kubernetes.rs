//! Checks over raw Kubernetes objects.

use async_trait::async_trait;
use tracing::{info, warn};

use super::ClusterCheck;
use crate::cluster::ClusterInventory;
use crate::validation::outcome::{CheckError, Outcome};
use crate::validation::pods::{PodReadinessEvaluator, RequiredPrefixes};

/// Namespace of the control-plane add-ons.
pub const KUBE_SYSTEM_NAMESPACE: &str = "kube-system";

/// Name prefix of the local-path volumes backing the Object Store.
pub const LOCAL_PV_PREFIX: &str = "local-pv-";

const UNNAMED: &str = "<unnamed>";

/// Render `Type=Status (reason)` pairs for a condition list.
fn describe_conditions<'a, I>(conditions: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str, Option<&'a str>)>,
{
    let parts: Vec<String> = conditions
        .into_iter()
        .map(|(kind, status, reason)| match reason {
            Some(reason) if !reason.is_empty() => format!("{kind}={status} ({reason})"),
            _ => format!("{kind}={status}"),
        })
        .collect();

    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

/// Every control-plane component reports `Healthy=True`.
pub struct CoreComponents;

#[async_trait]
impl ClusterCheck for CoreComponents {
    fn name(&self) -> String {
        "Core Kubernetes components".to_string()
    }

    async fn evaluate(&self, cluster: &dyn ClusterInventory) -> Result<Outcome, CheckError> {
        let statuses = cluster.component_statuses().await?;

        for component in &statuses {
            let name = component.metadata.name.as_deref().unwrap_or(UNNAMED);
            let conditions = component.conditions.as_deref().unwrap_or_default();

            let healthy = conditions
                .iter()
                .any(|c| c.type_ == "Healthy" && c.status == "True");

            if !healthy {
                let described = describe_conditions(conditions.iter().map(|c| {
                    (
                        c.type_.as_str(),
                        c.status.as_str(),
                        c.error.as_deref().or(c.message.as_deref()),
                    )
                }));
                return Ok(Outcome::failure(format!(
                    "component '{name}' is not healthy. Conditions: {described}"
                ))
                .with_detail("component", name));
            }

            info!(component = name, "Component is healthy");
        }

        Ok(Outcome::success())
    }
}

/// Every node reports `Ready=True`.
pub struct NodesReady;

#[async_trait]
impl ClusterCheck for NodesReady {
    fn name(&self) -> String {
        "Kubernetes nodes ready".to_string()
    }

    async fn evaluate(&self, cluster: &dyn ClusterInventory) -> Result<Outcome, CheckError> {
        let nodes = cluster.nodes().await?;

        for node in &nodes {
            let name = node.metadata.name.as_deref().unwrap_or(UNNAMED);
            let conditions = node
                .status
                .as_ref()
                .and_then(|s| s.conditions.as_deref())
                .unwrap_or_default();

            let ready = conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True");

            if !ready {
                let described = describe_conditions(
                    conditions
                        .iter()
                        .map(|c| (c.type_.as_str(), c.status.as_str(), c.reason.as_deref())),
                );
                return Ok(Outcome::failure(format!(
                    "node '{name}' is not ready. Conditions: {described}"
                ))
                .with_detail("node", name));
            }

            info!(node = name, "Kubernetes node is ready");
        }

        Ok(Outcome::success())
    }
}

/// Every pod in a namespace is healthy, and every required prefix is present.
pub struct PodsRunning {
    namespace: String,
    required: RequiredPrefixes,
}

impl PodsRunning {
    pub fn new(namespace: impl Into<String>, required: RequiredPrefixes) -> Self {
        Self {
            namespace: namespace.into(),
            required,
        }
    }

    /// The kube-system check: no required prefixes.
    pub fn kube_system() -> Self {
        Self::new(KUBE_SYSTEM_NAMESPACE, RequiredPrefixes::none())
    }
}

#[async_trait]
impl ClusterCheck for PodsRunning {
    fn name(&self) -> String {
        format!("Pods running in namespace '{}'", self.namespace)
    }

    async fn evaluate(&self, cluster: &dyn ClusterInventory) -> Result<Outcome, CheckError> {
        let pods = cluster.pods(&self.namespace).await?;
        info!(namespace = %self.namespace, count = pods.len(), "Evaluating pods");

        let evaluator = PodReadinessEvaluator::new(&self.namespace, &self.required);
        match evaluator.evaluate(&pods) {
            Ok(tally) => {
                info!(
                    namespace = %self.namespace,
                    ready = tally.ready,
                    skipped = tally.skipped,
                    "All pods are running and ready"
                );
                Ok(Outcome::success())
            }
            Err(problem) => {
                let mut outcome = Outcome::failure(problem.to_string())
                    .with_detail("namespace", self.namespace.clone());
                if let Some(pod) = problem.pod() {
                    outcome = outcome.with_detail("pod", pod);
                }
                Ok(outcome)
            }
        }
    }
}

/// Every `local-pv-*` volume is `Bound`. No such volumes is a Warning.
pub struct LocalVolumesBound;

#[async_trait]
impl ClusterCheck for LocalVolumesBound {
    fn name(&self) -> String {
        "Local PersistentVolumes bound".to_string()
    }

    async fn evaluate(&self, cluster: &dyn ClusterInventory) -> Result<Outcome, CheckError> {
        let volumes = cluster.persistent_volumes().await?;
        let mut matched = 0usize;

        for volume in &volumes {
            let name = volume.metadata.name.as_deref().unwrap_or(UNNAMED);
            if !name.starts_with(LOCAL_PV_PREFIX) {
                continue;
            }
            matched += 1;

            let phase = volume
                .status
                .as_ref()
                .and_then(|s| s.phase.as_deref())
                .unwrap_or("Unknown");
            info!(pv = name, phase, "Checking PersistentVolume");

            if phase != "Bound" {
                return Ok(Outcome::failure(format!(
                    "persistent volume '{name}' is not in 'Bound' state. Current state: '{phase}'"
                ))
                .with_detail("persistent_volume", name)
                .with_detail("phase", phase));
            }
        }

        if matched == 0 {
            warn!(prefix = LOCAL_PV_PREFIX, "No local PersistentVolumes found");
            return Ok(Outcome::warning(format!(
                "no local PersistentVolumes (prefix '{LOCAL_PV_PREFIX}') were found"
            )));
        }

        info!(count = matched, "All local PersistentVolumes are bound");
        Ok(Outcome::success())
    }
}
