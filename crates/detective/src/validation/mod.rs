//! Object Store cluster diagnosis.
//!
//! A run resolves the deployment and its gateway, obtains a session token,
//! then executes the check battery in a fixed order and aggregates every
//! outcome into a [`Report`].

pub mod checks;
pub mod orchestrator;
pub mod outcome;
pub mod payload;
pub mod pods;
pub mod report;

use anyhow::{Context, Result};
use tracing::info;

use crate::cluster::KubeInventory;
use crate::config::DiagnoseConfig;
use crate::discovery;
use crate::kubeconfig;
use crate::storage::{StorageApi, StorageEndpoints, StorageSession};

pub use checks::Target;
pub use orchestrator::{Orchestrator, RunObserver};
pub use outcome::{CheckError, Outcome, OutcomeStatus};
pub use report::{Report, WarningPolicy};

/// Run the full diagnostic battery against the cluster named by `config`.
///
/// Setup failures (kubeconfig, release discovery, endpoint resolution,
/// login) abort before the first check. Check failures never abort; they
/// end up in the report.
///
/// # Errors
///
/// Returns an error if any setup step fails.
pub async fn run_diagnosis(config: &DiagnoseConfig, observer: &dyn RunObserver) -> Result<Report> {
    let client = kubeconfig::client_from_kubeconfig(&config.kubeconfig).await?;
    let cluster = KubeInventory::new(client);

    let deployment = match config.deployment_override() {
        Some(deployment) => deployment,
        None => discovery::find_release(&config.kubeconfig, &config.chart).await?,
    };

    let host = match &config.endpoint {
        Some(host) => host.clone(),
        None => discovery::resolve_endpoint(&cluster, &deployment).await?,
    };

    let api = StorageApi::new(StorageEndpoints::for_host(&host), config.timeout())
        .context("Failed to build the storage API client")?;
    let token = api
        .login(&config.username, &config.password)
        .await
        .context("Failed to obtain a storage API session token")?;
    info!(host = %host, "Storage API session established");

    let session = StorageSession::new(api, token);
    let target = Target {
        cluster: &cluster,
        storage: &session,
    };

    let orchestrator = Orchestrator::standard(&deployment, config.warnings);
    let report = orchestrator.run(&target, observer).await;

    if report.overall_success() {
        info!(checks = report.total_checks(), "Diagnosis passed");
    } else {
        info!(
            checks = report.total_checks(),
            issues = report.issues().len(),
            "Diagnosis found issues"
        );
    }

    Ok(report)
}
