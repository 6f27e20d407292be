//! Locating the Object Store deployment and its gateway endpoint.

use std::path::Path;

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Service;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::cluster::ClusterInventory;

/// Chart identifier of the supported Object Store release.
pub const DEFAULT_CHART: &str = "ostore-1.5.0";

/// Base name of the gateway Service exposing the control API.
pub const GATEWAY_SERVICE: &str = "ostore-gateway-server";

/// Release name for which the chart does not prefix its objects.
const UNPREFIXED_RELEASE: &str = "ostore";

/// Database pods that carry no release prefix.
const DATABASE_PODS: [&str; 2] = ["yb-master", "yb-tserver"];

/// Per-release application components.
const RELEASE_COMPONENTS: [&str; 6] = ["gateway", "cm", "agent", "dashboard", "dstore", "metrics"];

/// One entry of `helm list --output json`.
#[derive(Debug, Clone, Deserialize)]
pub struct HelmRelease {
    pub name: String,
    pub namespace: String,
    pub chart: String,
}

/// The release/namespace pair a run is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub release: String,
    pub namespace: String,
}

impl Deployment {
    /// Name of the gateway Service for this release.
    #[must_use]
    pub fn gateway_service(&self) -> String {
        if self.release != self.namespace && self.release != UNPREFIXED_RELEASE {
            format!("{}-{GATEWAY_SERVICE}", self.release)
        } else {
            GATEWAY_SERVICE.to_string()
        }
    }

    /// Name prefixes of the pods a healthy release runs.
    #[must_use]
    pub fn required_pod_prefixes(&self) -> Vec<String> {
        RELEASE_COMPONENTS
            .iter()
            .map(|component| format!("{}-{component}", self.release))
            .chain(DATABASE_PODS.iter().map(ToString::to_string))
            .collect()
    }
}

/// Find the release installed from `chart` using `helm list`.
///
/// # Errors
///
/// Returns an error if helm cannot be run, no release exists at all, or no
/// release was installed from `chart`.
pub async fn find_release(kubeconfig: &Path, chart: &str) -> Result<Deployment> {
    info!(chart, "Looking up Helm release");

    let output = Command::new("helm")
        .args(["list", "--all-namespaces", "--output", "json", "--kubeconfig"])
        .arg(kubeconfig)
        .output()
        .await
        .context("Failed to run helm list")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Failed to run 'helm list': {}", stderr.trim());
    }

    let releases: Vec<HelmRelease> =
        serde_json::from_slice(&output.stdout).context("Failed to parse helm list output")?;
    debug!(count = releases.len(), "Helm releases listed");

    let deployment = match_release(&releases, chart)?;
    info!(
        release = %deployment.release,
        namespace = %deployment.namespace,
        "Found Object Store release"
    );
    Ok(deployment)
}

/// Pick the first release whose chart equals `chart`.
///
/// # Errors
///
/// Returns an error when `releases` is empty or none matches.
pub fn match_release(releases: &[HelmRelease], chart: &str) -> Result<Deployment> {
    if releases.is_empty() {
        anyhow::bail!("no deployed Helm releases found in any namespace");
    }

    releases
        .iter()
        .find(|r| r.chart == chart)
        .map(|r| Deployment {
            release: r.name.clone(),
            namespace: r.namespace.clone(),
        })
        .with_context(|| format!("no deployed release found for chart '{chart}'"))
}

/// Resolve the externally reachable host of the gateway Service.
///
/// # Errors
///
/// Returns an error if the Service cannot be read or exposes no address.
pub async fn resolve_endpoint(
    cluster: &dyn ClusterInventory,
    deployment: &Deployment,
) -> Result<String> {
    let name = deployment.gateway_service();
    let service = cluster
        .service(&deployment.namespace, &name)
        .await
        .with_context(|| {
            format!(
                "failed to get service '{name}' in namespace '{}'",
                deployment.namespace
            )
        })?;

    let host = endpoint_from_service(&service).with_context(|| {
        format!("no external IP found for service '{name}' (it might be <pending> or not exposed)")
    })?;
    info!(service = %name, host = %host, "Resolved gateway endpoint");
    Ok(host)
}

/// First load-balancer ingress IP, else its hostname, else the first external IP.
#[must_use]
pub fn endpoint_from_service(service: &Service) -> Option<String> {
    let ingress = service
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .and_then(|items| items.first());

    if let Some(ingress) = ingress {
        let address = ingress
            .ip
            .as_deref()
            .filter(|ip| !ip.is_empty())
            .or_else(|| ingress.hostname.as_deref().filter(|h| !h.is_empty()));
        if let Some(address) = address {
            return Some(address.to_string());
        }
    }

    service
        .spec
        .as_ref()
        .and_then(|spec| spec.external_ips.as_ref())
        .and_then(|ips| ips.first())
        .cloned()
}
