//! Read-only access to the Kubernetes objects the checks inspect.
//!
//! Checks talk to the cluster through [`ClusterInventory`] so that the
//! readiness rules can be exercised against captured objects as well as a
//! live API server.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ComponentStatus, Node, PersistentVolume, Pod, Service};
use kube::api::{Api, ListParams};
use kube::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::validation::outcome::CheckError;

/// Listing capability over the object kinds the checks need.
#[async_trait]
pub trait ClusterInventory: Send + Sync {
    async fn component_statuses(&self) -> Result<Vec<ComponentStatus>, CheckError>;

    async fn nodes(&self) -> Result<Vec<Node>, CheckError>;

    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, CheckError>;

    async fn persistent_volumes(&self) -> Result<Vec<PersistentVolume>, CheckError>;

    async fn service(&self, namespace: &str, name: &str) -> Result<Service, CheckError>;
}

/// [`ClusterInventory`] backed by a live API server.
#[derive(Clone)]
pub struct KubeInventory {
    client: Client,
}

impl KubeInventory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

async fn list<K>(api: Api<K>, what: &str) -> Result<Vec<K>, CheckError>
where
    K: Clone + DeserializeOwned + Debug,
{
    debug!(kind = what, "Listing objects");
    api.list(&ListParams::default())
        .await
        .map(|list| list.items)
        .map_err(|e| kube_error(what, e))
}

/// Map a kube error into the check taxonomy.
fn kube_error(what: &str, err: kube::Error) -> CheckError {
    match &err {
        kube::Error::Api(response) if response.code == 401 || response.code == 403 => {
            CheckError::Authentication {
                target: format!("the Kubernetes API ({what})"),
                reason: response.message.clone(),
            }
        }
        _ => CheckError::transport(format!("the Kubernetes API ({what})"), err),
    }
}

#[async_trait]
impl ClusterInventory for KubeInventory {
    async fn component_statuses(&self) -> Result<Vec<ComponentStatus>, CheckError> {
        list(Api::all(self.client.clone()), "componentstatuses").await
    }

    async fn nodes(&self) -> Result<Vec<Node>, CheckError> {
        list(Api::all(self.client.clone()), "nodes").await
    }

    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, CheckError> {
        list(
            Api::namespaced(self.client.clone(), namespace),
            &format!("pods in {namespace}"),
        )
        .await
    }

    async fn persistent_volumes(&self) -> Result<Vec<PersistentVolume>, CheckError> {
        list(Api::all(self.client.clone()), "persistentvolumes").await
    }

    async fn service(&self, namespace: &str, name: &str) -> Result<Service, CheckError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| kube_error(&format!("service {namespace}/{name}"), e))
    }
}

/// [`ClusterInventory`] over a fixed snapshot of objects.
///
/// Used to replay captured cluster state through the checks.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    component_statuses: Vec<ComponentStatus>,
    nodes: Vec<Node>,
    pods: HashMap<String, Vec<Pod>>,
    persistent_volumes: Vec<PersistentVolume>,
    services: HashMap<(String, String), Service>,
}

impl StaticInventory {
    #[must_use]
    pub fn with_component_statuses(mut self, items: Vec<ComponentStatus>) -> Self {
        self.component_statuses = items;
        self
    }

    #[must_use]
    pub fn with_nodes(mut self, items: Vec<Node>) -> Self {
        self.nodes = items;
        self
    }

    #[must_use]
    pub fn with_pods(mut self, namespace: impl Into<String>, items: Vec<Pod>) -> Self {
        self.pods.insert(namespace.into(), items);
        self
    }

    #[must_use]
    pub fn with_persistent_volumes(mut self, items: Vec<PersistentVolume>) -> Self {
        self.persistent_volumes = items;
        self
    }

    #[must_use]
    pub fn with_service(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        service: Service,
    ) -> Self {
        self.services.insert((namespace.into(), name.into()), service);
        self
    }
}

#[async_trait]
impl ClusterInventory for StaticInventory {
    async fn component_statuses(&self) -> Result<Vec<ComponentStatus>, CheckError> {
        Ok(self.component_statuses.clone())
    }

    async fn nodes(&self) -> Result<Vec<Node>, CheckError> {
        Ok(self.nodes.clone())
    }

    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, CheckError> {
        Ok(self.pods.get(namespace).cloned().unwrap_or_default())
    }

    async fn persistent_volumes(&self) -> Result<Vec<PersistentVolume>, CheckError> {
        Ok(self.persistent_volumes.clone())
    }

    async fn service(&self, namespace: &str, name: &str) -> Result<Service, CheckError> {
        self.services
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| {
                CheckError::transport(
                    format!("service {namespace}/{name}"),
                    "service not found in snapshot",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn static_inventory_serves_pods_by_namespace() {
        let pod: Pod = serde_json::from_value(json!({ "metadata": { "name": "p" } })).unwrap();
        let inventory = StaticInventory::default().with_pods("ostore", vec![pod]);

        assert_eq!(inventory.pods("ostore").await.unwrap().len(), 1);
        assert!(inventory.pods("kube-system").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn static_inventory_missing_service_is_an_error() {
        let err = StaticInventory::default()
            .service("ostore", "gw")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
