//! Pod readiness evaluation shared by the pod checks.
//!
//! Pods are evaluated in listing order and the first problem found wins:
//! within one pod the readiness fields are causally related, so the first
//! cause is the actionable one. Required name prefixes are tracked across
//! the whole listing and reported once every pod has passed.

use k8s_openapi::api::core::v1::{ContainerStatus, Pod};
use thiserror::Error;
use tracing::{debug, info};

/// Waiting reasons that point at a crash or an image problem.
const CRASH_REASONS: &[&str] = &["CrashLoopBackOff", "ImagePullBackOff", "ErrImagePull"];

/// Phases after which a pod is no longer a liveness signal.
const TERMINAL_PHASES: &[&str] = &["Succeeded", "Failed"];

const UNNAMED: &str = "<unnamed>";

/// First readiness problem found in a pod listing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PodProblem {
    #[error("no pods found in namespace '{namespace}', but required pods were expected")]
    NoPods { namespace: String },

    #[error("pod '{pod}' is terminating")]
    Terminating { pod: String },

    #[error("pod '{pod}' has been evicted. Check node status and resource limits")]
    Evicted { pod: String },

    #[error("pod '{pod}' is not in 'Running' phase. Current phase: '{phase}'")]
    NotRunning { pod: String, phase: String },

    #[error("container '{container}' in pod '{pod}' is not ready. Reason: {reason} - {message}")]
    ContainerCrashing {
        pod: String,
        container: String,
        reason: String,
        message: String,
    },

    #[error(
        "container '{container}' in pod '{pod}' is in a waiting state. Reason: {reason} - {message}"
    )]
    ContainerWaiting {
        pod: String,
        container: String,
        reason: String,
        message: String,
    },

    #[error(
        "container '{container}' in pod '{pod}' has terminated with exit code {exit_code}. Reason: {reason}"
    )]
    ContainerTerminated {
        pod: String,
        container: String,
        exit_code: i32,
        reason: String,
    },

    #[error("container '{container}' in pod '{pod}' is not ready for an unknown reason")]
    ContainerNotReady { pod: String, container: String },

    #[error("pod '{pod}' is not ready. Check its readiness probes and conditions")]
    PodNotReady { pod: String },

    #[error("following pod not found: {prefix}")]
    MissingPrefix { prefix: String },
}

impl PodProblem {
    /// Name of the offending pod, when the problem is about one pod.
    pub fn pod(&self) -> Option<&str> {
        match self {
            Self::Terminating { pod }
            | Self::Evicted { pod }
            | Self::NotRunning { pod, .. }
            | Self::ContainerCrashing { pod, .. }
            | Self::ContainerWaiting { pod, .. }
            | Self::ContainerTerminated { pod, .. }
            | Self::ContainerNotReady { pod, .. }
            | Self::PodNotReady { pod } => Some(pod),
            Self::NoPods { .. } | Self::MissingPrefix { .. } => None,
        }
    }
}

/// Pod-name prefixes that must each match at least one healthy pod.
///
/// Duplicates are dropped; declaration order is kept so that the missing
/// prefix reported is always the same one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredPrefixes(Vec<String>);

impl RequiredPrefixes {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for prefix in prefixes.into_iter().map(Into::into) {
            if !unique.contains(&prefix) {
                unique.push(prefix);
            }
        }
        Self(unique)
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Counts from a successful evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PodTally {
    pub ready: usize,
    pub skipped: usize,
}

enum PodState {
    Ready,
    Skipped,
}

/// Decides whether the pods of one namespace are collectively healthy.
pub struct PodReadinessEvaluator<'a> {
    namespace: &'a str,
    required: &'a RequiredPrefixes,
}

impl<'a> PodReadinessEvaluator<'a> {
    pub fn new(namespace: &'a str, required: &'a RequiredPrefixes) -> Self {
        Self {
            namespace,
            required,
        }
    }

    /// Evaluate a pod listing, stopping at the first problem.
    pub fn evaluate(&self, pods: &[Pod]) -> Result<PodTally, PodProblem> {
        if pods.is_empty() && !self.required.is_empty() {
            return Err(PodProblem::NoPods {
                namespace: self.namespace.to_string(),
            });
        }

        let mut satisfied = vec![false; self.required.len()];

        let tally = pods.iter().try_fold(
            PodTally::default(),
            |mut tally, pod| -> Result<PodTally, PodProblem> {
                match evaluate_pod(pod)? {
                    PodState::Skipped => tally.skipped += 1,
                    PodState::Ready => {
                        tally.ready += 1;
                        let name = pod_name(pod);
                        for (found, prefix) in satisfied.iter_mut().zip(self.required.iter()) {
                            if !*found && name.starts_with(prefix) {
                                *found = true;
                            }
                        }
                    }
                }
                Ok(tally)
            },
        )?;

        if let Some((prefix, _)) = self
            .required
            .iter()
            .zip(&satisfied)
            .find(|(_, found)| !**found)
        {
            return Err(PodProblem::MissingPrefix {
                prefix: prefix.to_string(),
            });
        }

        Ok(tally)
    }
}

fn pod_name(pod: &Pod) -> &str {
    pod.metadata.name.as_deref().unwrap_or(UNNAMED)
}

fn evaluate_pod(pod: &Pod) -> Result<PodState, PodProblem> {
    let name = pod_name(pod);

    if pod.metadata.deletion_timestamp.is_some() {
        return Err(PodProblem::Terminating {
            pod: name.to_string(),
        });
    }

    let status = pod.status.as_ref();

    if status.and_then(|s| s.reason.as_deref()) == Some("Evicted") {
        return Err(PodProblem::Evicted {
            pod: name.to_string(),
        });
    }

    let phase = status.and_then(|s| s.phase.as_deref()).unwrap_or("Unknown");

    if TERMINAL_PHASES.contains(&phase) {
        info!(pod = name, phase, "Skipping pod in terminal phase");
        return Ok(PodState::Skipped);
    }

    if phase != "Running" {
        return Err(PodProblem::NotRunning {
            pod: name.to_string(),
            phase: phase.to_string(),
        });
    }

    let containers = status
        .and_then(|s| s.container_statuses.as_deref())
        .unwrap_or_default();

    if let Some(container) = containers.iter().find(|c| !c.ready) {
        return Err(container_problem(name, container));
    }

    let conditions = status
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default();

    if !conditions
        .iter()
        .any(|c| c.type_ == "Ready" && c.status == "True")
    {
        return Err(PodProblem::PodNotReady {
            pod: name.to_string(),
        });
    }

    debug!(pod = name, "Pod is running and ready");
    Ok(PodState::Ready)
}

fn container_problem(pod: &str, container: &ContainerStatus) -> PodProblem {
    let state = container.state.as_ref();
    let pod = pod.to_string();
    let name = container.name.clone();

    if let Some(waiting) = state.and_then(|s| s.waiting.as_ref()) {
        let reason = waiting.reason.clone().unwrap_or_default();
        let message = waiting.message.clone().unwrap_or_default();
        return if CRASH_REASONS.contains(&reason.as_str()) {
            PodProblem::ContainerCrashing {
                pod,
                container: name,
                reason,
                message,
            }
        } else {
            PodProblem::ContainerWaiting {
                pod,
                container: name,
                reason,
                message,
            }
        };
    }

    if let Some(terminated) = state.and_then(|s| s.terminated.as_ref()) {
        return PodProblem::ContainerTerminated {
            pod,
            container: name,
            exit_code: terminated.exit_code,
            reason: terminated.reason.clone().unwrap_or_default(),
        };
    }

    PodProblem::ContainerNotReady {
        pod,
        container: name,
    }
}
