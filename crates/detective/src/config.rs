//! Diagnostic run configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::discovery::{Deployment, DEFAULT_CHART};
use crate::storage::DEFAULT_TIMEOUT_SECS;
use crate::validation::report::WarningPolicy;

/// Factory account of the Object Store appliance.
pub const DEFAULT_USERNAME: &str = "robin";
pub const DEFAULT_PASSWORD: &str = "Robin123";

/// Everything a run needs before the first check executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnoseConfig {
    /// Kubeconfig used for both the Kubernetes API and `helm`.
    pub kubeconfig: PathBuf,
    /// Helm chart identifier the release is matched against (e.g. "ostore-1.5.0").
    pub chart: String,
    /// Release name; skips Helm discovery when given together with `namespace`.
    pub release: Option<String>,
    pub namespace: Option<String>,
    /// Gateway host; skips Service inspection when set.
    pub endpoint: Option<String>,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Per-request timeout for the storage API.
    pub timeout_secs: u64,
    pub warnings: WarningPolicy,
}

impl DiagnoseConfig {
    /// Config with the appliance defaults for a given kubeconfig.
    #[must_use]
    pub fn with_defaults(kubeconfig: PathBuf) -> Self {
        Self {
            kubeconfig,
            chart: DEFAULT_CHART.into(),
            release: None,
            namespace: None,
            endpoint: None,
            username: DEFAULT_USERNAME.into(),
            password: DEFAULT_PASSWORD.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            warnings: WarningPolicy::default(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The deployment named by the overrides, if both release and namespace are set.
    #[must_use]
    pub fn deployment_override(&self) -> Option<Deployment> {
        match (&self.release, &self.namespace) {
            (Some(release), Some(namespace)) => Some(Deployment {
                release: release.clone(),
                namespace: namespace.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DiagnoseConfig::with_defaults("/tmp/kubeconfig".into());
        assert_eq!(config.chart, "ostore-1.5.0");
        assert_eq!(config.username, "robin");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.warnings, WarningPolicy::Issue);
        assert!(config.deployment_override().is_none());
    }

    #[test]
    fn override_needs_release_and_namespace() {
        let mut config = DiagnoseConfig::with_defaults("/tmp/kubeconfig".into());
        config.release = Some("prod".into());
        assert!(config.deployment_override().is_none());

        config.namespace = Some("storage".into());
        let deployment = config.deployment_override().unwrap();
        assert_eq!(deployment.release, "prod");
        assert_eq!(deployment.namespace, "storage");
    }

    #[test]
    fn password_is_not_serialized() {
        let config = DiagnoseConfig::with_defaults("/tmp/kubeconfig".into());
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["warnings"], "issue");
    }
}
