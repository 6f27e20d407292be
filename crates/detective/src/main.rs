//! Object Store Detective CLI.
//!
//! Diagnoses a Kubernetes cluster and the Object Store running on it, and
//! prints every issue found in a single report.

// Allow product names without backticks in doc comments
#![allow(clippy::doc_markdown)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::checks::ChecksCommand;
use commands::diagnose::DiagnoseCommand;

/// Object Store Detective - cluster diagnostics.
#[derive(Parser)]
#[command(
    name = "ostore-detective",
    version,
    about = "Object Store cluster diagnostics",
    long_about = "Diagnose a Kubernetes cluster and the Object Store deployed on it.\n\n\
                  Every check runs even when an earlier one fails, so a single\n\
                  run lists everything that is broken."
)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the diagnostic battery.
    ///
    /// Checks core components, nodes, pods and volumes, then the Object Store
    /// version, disks, disksets, nodes, replication, LDAP and cluster health.
    Diagnose(DiagnoseCommand),

    /// List the checks a diagnosis runs, in order.
    Checks(ChecksCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("info,ostore_detective=debug")
    } else {
        EnvFilter::new("warn,ostore_detective=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Diagnose(cmd) => cmd.run().await,
        Commands::Checks(cmd) => {
            cmd.run();
            Ok(())
        }
    }
}
