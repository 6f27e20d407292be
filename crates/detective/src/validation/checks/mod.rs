//! Check definitions.
//!
//! A check inspects one subsystem and returns one [`Outcome`]. Checks come in
//! two capability groups: cluster checks read Kubernetes objects through a
//! [`ClusterInventory`], storage checks call the Object Store API through an
//! authenticated [`StorageSession`].

pub mod kubernetes;
pub mod storage;

use async_trait::async_trait;
use tracing::warn;

use super::outcome::{CheckError, Outcome};
use crate::cluster::ClusterInventory;
use crate::storage::StorageSession;

/// A check over Kubernetes objects.
#[async_trait]
pub trait ClusterCheck: Send + Sync {
    fn name(&self) -> String;

    async fn evaluate(&self, cluster: &dyn ClusterInventory) -> Result<Outcome, CheckError>;
}

/// A check over the Object Store control-plane API.
#[async_trait]
pub trait StorageCheck: Send + Sync {
    fn name(&self) -> String;

    async fn evaluate(&self, session: &StorageSession) -> Result<Outcome, CheckError>;
}

/// The handles a run operates against. Owned by the caller for the run.
pub struct Target<'a> {
    pub cluster: &'a dyn ClusterInventory,
    pub storage: &'a StorageSession,
}

/// One entry of the check sequence.
pub enum Check {
    Cluster(Box<dyn ClusterCheck>),
    Storage(Box<dyn StorageCheck>),
}

impl Check {
    pub fn cluster(check: impl ClusterCheck + 'static) -> Self {
        Self::Cluster(Box::new(check))
    }

    pub fn storage(check: impl StorageCheck + 'static) -> Self {
        Self::Storage(Box::new(check))
    }

    pub fn name(&self) -> String {
        match self {
            Self::Cluster(check) => check.name(),
            Self::Storage(check) => check.name(),
        }
    }

    /// Run the check. Errors are converted into a Failure here.
    pub async fn run(&self, target: &Target<'_>) -> Outcome {
        let result = match self {
            Self::Cluster(check) => check.evaluate(target.cluster).await,
            Self::Storage(check) => check.evaluate(target.storage).await,
        };

        result.unwrap_or_else(|err| {
            warn!(check = %self.name(), kind = err.kind(), error = %err, "Check errored");
            Outcome::from(err)
        })
    }
}
