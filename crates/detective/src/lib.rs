//! Object Store Detective Library.
//!
//! Runs an ordered battery of diagnostic checks against a Kubernetes
//! cluster and the Object Store deployed on it, and aggregates every
//! outcome into a single report.
//!
//! # Example
//!
//! ```ignore
//! use ostore_detective::{run_diagnosis, DiagnoseConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DiagnoseConfig::with_defaults("/home/me/.kube/config".into());
//!     let report = run_diagnosis(&config, &()).await?;
//!     println!("{} issues", report.issues().len());
//!     Ok(())
//! }
//! ```

// Allow product names without backticks in doc comments
#![allow(clippy::doc_markdown)]

pub mod cluster;
pub mod config;
pub mod discovery;
pub mod kubeconfig;
pub mod storage;
pub mod ui;
pub mod validation;

// Re-export commonly used types at the crate root
pub use config::DiagnoseConfig;
pub use discovery::Deployment;
pub use validation::{run_diagnosis, Orchestrator, Outcome, Report, RunObserver, WarningPolicy};
