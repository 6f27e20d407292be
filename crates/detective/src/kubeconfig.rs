//! Kubeconfig location and client construction.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

/// Get the default kubeconfig path (~/.kube/config).
#[must_use]
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".kube").join("config"))
}

/// Build a Kubernetes client from a kubeconfig file, using its current context.
///
/// # Errors
///
/// Returns an error if the kubeconfig cannot be read or the client cannot be created.
pub async fn client_from_kubeconfig(path: &Path) -> Result<Client> {
    debug!(kubeconfig = %path.display(), "Loading kubeconfig");

    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|| format!("Failed to read kubeconfig from {}", path.display()))?;

    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .context("Failed to create Kubernetes config from kubeconfig")?;

    Client::try_from(config).context("Failed to create Kubernetes client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kubeconfig_path() {
        let path = default_kubeconfig_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains(".kube"));
        assert!(path.to_string_lossy().ends_with("config"));
    }

    #[tokio::test]
    async fn missing_kubeconfig_is_reported() {
        let Err(err) = client_from_kubeconfig(Path::new("/nonexistent/ostore/kubeconfig")).await
        else {
            panic!("expected an error for a missing kubeconfig");
        };
        assert!(err.to_string().contains("/nonexistent/ostore/kubeconfig"));
    }
}
