//! Diagnose command - run the check battery against a cluster.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use ostore_detective::config::{DiagnoseConfig, DEFAULT_PASSWORD, DEFAULT_USERNAME};
use ostore_detective::discovery::DEFAULT_CHART;
use ostore_detective::kubeconfig::default_kubeconfig_path;
use ostore_detective::storage::DEFAULT_TIMEOUT_SECS;
use ostore_detective::ui;
use ostore_detective::validation::{self, WarningPolicy};

/// Diagnose the Kubernetes cluster and the Object Store running on it.
#[derive(Args)]
pub struct DiagnoseCommand {
    /// Path to kubeconfig file (defaults to ~/.kube/config).
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Helm chart identifier of the Object Store release.
    #[arg(long, env = "OSTORE_CHART", default_value = DEFAULT_CHART)]
    chart: String,

    /// Release name; skips Helm discovery together with --namespace.
    #[arg(long, env = "OSTORE_RELEASE", requires = "namespace")]
    release: Option<String>,

    /// Release namespace; skips Helm discovery together with --release.
    #[arg(long, env = "OSTORE_NAMESPACE", requires = "release")]
    namespace: Option<String>,

    /// Gateway address; skips reading the gateway Service.
    #[arg(long, env = "OSTORE_ENDPOINT")]
    endpoint: Option<String>,

    /// Object Store account name.
    #[arg(long, env = "OSTORE_USERNAME", default_value = DEFAULT_USERNAME)]
    username: String,

    /// Object Store account password.
    #[arg(
        long,
        env = "OSTORE_PASSWORD",
        default_value = DEFAULT_PASSWORD,
        hide_default_value = true,
        hide_env_values = true
    )]
    password: String,

    /// Per-request timeout for the storage API, in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// How warnings are aggregated.
    #[arg(long, value_enum, default_value_t = WarningPolicy::Issue)]
    warnings: WarningPolicy,

    /// Output report as JSON.
    #[arg(long, default_value = "false")]
    json: bool,
}

impl DiagnoseCommand {
    fn config(&self) -> Result<DiagnoseConfig> {
        let kubeconfig = match &self.kubeconfig {
            Some(path) => path.clone(),
            None => default_kubeconfig_path().context("Could not determine home directory")?,
        };

        let mut config = DiagnoseConfig::with_defaults(kubeconfig);
        config.chart.clone_from(&self.chart);
        config.release.clone_from(&self.release);
        config.namespace.clone_from(&self.namespace);
        config.endpoint.clone_from(&self.endpoint);
        config.username.clone_from(&self.username);
        config.password.clone_from(&self.password);
        config.timeout_secs = self.timeout_secs;
        config.warnings = self.warnings;
        Ok(config)
    }

    /// Run the diagnose command.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails or the diagnosis found issues.
    pub async fn run(&self) -> Result<()> {
        let config = self.config()?;
        info!("   Kubeconfig: {}", config.kubeconfig.display());
        info!("   Chart: {}", config.chart);

        let report = if self.json {
            validation::run_diagnosis(&config, &()).await?
        } else {
            ui::print_banner();
            ui::print_section("Running Checks");
            validation::run_diagnosis(&config, &ui::ConsoleObserver).await?
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            ui::print_report(&report);
        }

        if report.overall_success() {
            Ok(())
        } else {
            anyhow::bail!("Diagnosis found {} issues", report.issues().len());
        }
    }
}
