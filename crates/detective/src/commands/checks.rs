//! Checks command - list the diagnostic battery.

use clap::Args;

use ostore_detective::discovery::Deployment;
use ostore_detective::ui;
use ostore_detective::validation::{Orchestrator, WarningPolicy};

/// List the checks a diagnosis runs, in execution order.
#[derive(Args)]
pub struct ChecksCommand {
    /// Helm release name used to derive the application pod check.
    #[arg(long, env = "OSTORE_RELEASE", default_value = "ostore")]
    release: String,

    /// Namespace of the release.
    #[arg(long, env = "OSTORE_NAMESPACE", default_value = "ostore")]
    namespace: String,
}

impl ChecksCommand {
    pub fn run(&self) {
        let deployment = Deployment {
            release: self.release.clone(),
            namespace: self.namespace.clone(),
        };
        let orchestrator = Orchestrator::standard(&deployment, WarningPolicy::default());

        ui::print_section("Diagnostic Checks");
        for (i, name) in orchestrator.check_names().iter().enumerate() {
            ui::print_progress_step(i + 1, orchestrator.len(), name);
        }
        println!();
        ui::print_kv("Gateway service", &deployment.gateway_service());
        ui::print_kv(
            "Required pods",
            &deployment.required_pod_prefixes().join(", "),
        );
    }
}
