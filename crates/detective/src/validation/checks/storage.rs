//! Checks over the Object Store control-plane API.
//!
//! Each check issues one request through the shared [`StorageSession`]
//! protocol and hands the body to a pure validation function, so the
//! validation policy can be exercised without a gateway.

use async_trait::async_trait;
use tracing::{info, warn};

use super::StorageCheck;
use crate::storage::{Listener, StorageSession};
use crate::validation::outcome::{CheckError, Outcome};
use crate::validation::payload::Payload;

const EMPTY_OBJECT: &str = "{}";

/// Object Store version endpoint answers with a non-empty body.
pub struct ObjectStoreVersion;

impl ObjectStoreVersion {
    pub const PATH: &'static str = "/version";

    pub fn validate(body: &[u8]) -> Result<Outcome, CheckError> {
        let version = String::from_utf8_lossy(body);
        let version = version.trim();
        if version.is_empty() {
            return Err(CheckError::violation(
                "ObjectStore version",
                "an empty body",
                "a version string",
            ));
        }
        info!(version, "ObjectStore version");
        Ok(Outcome::success())
    }
}

#[async_trait]
impl StorageCheck for ObjectStoreVersion {
    fn name(&self) -> String {
        "ObjectStore version".to_string()
    }

    async fn evaluate(&self, session: &StorageSession) -> Result<Outcome, CheckError> {
        let body = session.get(Listener::Api, Self::PATH).await?;
        Self::validate(&body)
    }
}

/// Every disk is `ONLINE` and either `IN_USE` or `UNUSED`; at least one disk.
pub struct DiskStatus;

impl DiskStatus {
    pub const PATH: &'static str = "/disk";
    const HEALTHY: &'static str = "ONLINE";
    const STATUSES: [&'static str; 2] = ["IN_USE", "UNUSED"];

    pub fn validate(body: &[u8]) -> Result<Outcome, CheckError> {
        let payload = Payload::parse(body)?;
        let disks = payload.root().elements()?;
        info!(count = disks.len(), "Disks present in the ObjectStore cluster");

        if disks.is_empty() {
            return Ok(Outcome::failure(
                "there are no disks present in the ObjectStore cluster, \
                 a user can not perform data operations",
            ));
        }

        for disk in &disks {
            let id = disk.scalar_field("disk_id")?;
            let health = disk.str_field("health_str")?;
            let status = disk.str_field("status_str")?;

            if health != Self::HEALTHY {
                return Err(CheckError::violation(
                    format!("disk '{id}' health"),
                    health,
                    Self::HEALTHY,
                ));
            }
            if !Self::STATUSES.contains(&status) {
                return Err(CheckError::violation(
                    format!("disk '{id}' status"),
                    status,
                    format!("one of {}", Self::STATUSES.join(", ")),
                ));
            }
            info!(disk = %id, health, status, "Disk is healthy");
        }

        Ok(Outcome::success())
    }
}

#[async_trait]
impl StorageCheck for DiskStatus {
    fn name(&self) -> String {
        "Disk status".to_string()
    }

    async fn evaluate(&self, session: &StorageSession) -> Result<Outcome, CheckError> {
        let body = session.get(Listener::Api, Self::PATH).await?;
        Self::validate(&body)
    }
}

/// Every diskset is `HEALTHY` and `ACTIVE` or `REBUILDING`; at least one diskset.
pub struct DisksetStatus;

impl DisksetStatus {
    pub const PATH: &'static str = "/diskset?action=list";
    const HEALTHY: &'static str = "HEALTHY";
    const STATUSES: [&'static str; 2] = ["ACTIVE", "REBUILDING"];

    pub fn validate(body: &[u8]) -> Result<Outcome, CheckError> {
        let payload = Payload::parse(body)?;
        let disksets = payload.root().array_field("disksets")?;
        info!(count = disksets.len(), "Disksets present in the ObjectStore cluster");

        if disksets.is_empty() {
            return Ok(Outcome::failure(
                "there are no disksets present, a user can not perform data operations",
            ));
        }

        for diskset in &disksets {
            let id = diskset.scalar_field("id")?;
            let health = diskset.str_field("health_str")?;
            let status = diskset.str_field("status_str")?;

            if health != Self::HEALTHY || !Self::STATUSES.contains(&status) {
                return Err(CheckError::violation(
                    format!("diskset '{id}'"),
                    format!("health {health}, status {status}"),
                    format!(
                        "health {} with status {}",
                        Self::HEALTHY,
                        Self::STATUSES.join(" or ")
                    ),
                ));
            }
            info!(diskset = %id, health, status, "Diskset is healthy");
        }

        Ok(Outcome::success())
    }
}

#[async_trait]
impl StorageCheck for DisksetStatus {
    fn name(&self) -> String {
        "Diskset status".to_string()
    }

    async fn evaluate(&self, session: &StorageSession) -> Result<Outcome, CheckError> {
        let body = session.get(Listener::Api, Self::PATH).await?;
        Self::validate(&body)
    }
}

/// Every Object Store node is `ACTIVE`.
pub struct NodeStatus;

impl NodeStatus {
    pub const PATH: &'static str = "/node";
    const ACTIVE: &'static str = "ACTIVE";

    pub fn validate(body: &[u8]) -> Result<Outcome, CheckError> {
        let payload = Payload::parse(body)?;
        let nodes = payload.root().elements()?;
        info!(count = nodes.len(), "ObjectStore nodes");

        for node in &nodes {
            let name = node.str_field("name")?;
            let status = node.str_field("status_str")?;

            if status != Self::ACTIVE {
                return Err(CheckError::violation(
                    format!("node '{name}' status"),
                    status,
                    Self::ACTIVE,
                ));
            }
            info!(node = name, status, "ObjectStore node is active");
        }

        Ok(Outcome::success())
    }
}

#[async_trait]
impl StorageCheck for NodeStatus {
    fn name(&self) -> String {
        "ObjectStore node status".to_string()
    }

    async fn evaluate(&self, session: &StorageSession) -> Result<Outcome, CheckError> {
        let body = session.get(Listener::Api, Self::PATH).await?;
        Self::validate(&body)
    }
}

/// Replication is configured and the first replicated cluster is `ONLINE`.
pub struct ReplicationStatus;

impl ReplicationStatus {
    pub const PATH: &'static str = "/cluster_replication_config";
    const ONLINE: &'static str = "ONLINE";

    pub fn validate(body: &[u8]) -> Result<Outcome, CheckError> {
        if String::from_utf8_lossy(body).trim() == EMPTY_OBJECT {
            warn!("Replication is not configured");
            return Ok(Outcome::warning("replication is not configured"));
        }

        let payload = Payload::parse(body)?;
        let clusters = payload.root().array_field("ReplicatedClusters")?;
        if clusters.is_empty() {
            return Err(CheckError::violation(
                "replication",
                "an empty 'ReplicatedClusters' list",
                "at least one replicated cluster",
            ));
        }

        let health = clusters[0].str_field("Health")?;
        if health != Self::ONLINE {
            return Err(CheckError::violation(
                "replication is configured but the health of the replicated cluster",
                health,
                Self::ONLINE,
            ));
        }

        info!(health, "Replication is set");
        Ok(Outcome::success())
    }
}

#[async_trait]
impl StorageCheck for ReplicationStatus {
    fn name(&self) -> String {
        "Replication status".to_string()
    }

    async fn evaluate(&self, session: &StorageSession) -> Result<Outcome, CheckError> {
        let body = session.get(Listener::Replication, Self::PATH).await?;
        Self::validate(&body)
    }
}

/// LDAP identity provider state. Disabled states are Warnings.
pub struct LdapStatus;

impl LdapStatus {
    pub const PATH: &'static str = "/idp?idp=ldap";

    pub fn validate(body: &[u8]) -> Result<Outcome, CheckError> {
        let payload = Payload::parse(body)?;
        let info = payload.root().get("ldap_info")?;
        let status = info.str_field("status_str")?;

        match status {
            "ENABLED" => {
                info!("LDAP is configured and enabled");
                Ok(Outcome::success())
            }
            "DISABLED" => {
                let address = info.str_field("ldap_server_address")?;
                if address.is_empty() {
                    Ok(Outcome::warning("LDAP is not configured"))
                } else {
                    warn!(address, "LDAP is configured but disabled");
                    Ok(Outcome::warning("LDAP is configured but disabled")
                        .with_detail("ldap_server_address", address))
                }
            }
            other => Err(CheckError::violation(
                "LDAP status",
                other,
                "one of ENABLED, DISABLED",
            )),
        }
    }
}

#[async_trait]
impl StorageCheck for LdapStatus {
    fn name(&self) -> String {
        "LDAP status".to_string()
    }

    async fn evaluate(&self, session: &StorageSession) -> Result<Outcome, CheckError> {
        let body = session.get(Listener::Api, Self::PATH).await?;
        Self::validate(&body)
    }
}

/// Control path, metadata store, data path and overall cluster are `Online`.
pub struct ClusterHealth;

impl ClusterHealth {
    pub const PATH: &'static str = "/cluster_health";
    const ONLINE: &'static str = "Online";

    /// Evaluated in order; the first field not `Online` is reported.
    pub const FIELDS: [&'static str; 4] = [
        "controlHealthStatus",
        "metadataHealthStatus",
        "datapathHealthStatus",
        "clusterHealthStatus",
    ];

    pub fn validate(body: &[u8]) -> Result<Outcome, CheckError> {
        let payload = Payload::parse(body)?;
        let root = payload.root();

        for field in Self::FIELDS {
            let status = root.str_field(field)?;
            if status != Self::ONLINE {
                return Err(CheckError::violation(
                    format!("cluster health check failed: '{field}'"),
                    status,
                    Self::ONLINE,
                ));
            }
            info!(field, "Online");
        }

        Ok(Outcome::success())
    }
}

#[async_trait]
impl StorageCheck for ClusterHealth {
    fn name(&self) -> String {
        "ObjectStore cluster health".to_string()
    }

    async fn evaluate(&self, session: &StorageSession) -> Result<Outcome, CheckError> {
        let body = session.get(Listener::Api, Self::PATH).await?;
        Self::validate(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::outcome::OutcomeStatus;

    fn failure_message(result: Result<Outcome, CheckError>) -> String {
        let outcome = result.unwrap_or_else(Outcome::from);
        assert_eq!(outcome.status(), OutcomeStatus::Failure, "{outcome:?}");
        outcome.message().unwrap().to_string()
    }

    #[test]
    fn version_requires_a_body() {
        assert!(ObjectStoreVersion::validate(b"1.5.0-42\n").unwrap().is_success());
        assert!(ObjectStoreVersion::validate(b"  ").is_err());
    }

    #[test]
    fn healthy_disks_pass() {
        let body = br#"[
            {"disk_id": 1, "health_str": "ONLINE", "status_str": "IN_USE"},
            {"disk_id": 2, "health_str": "ONLINE", "status_str": "UNUSED"}
        ]"#;
        assert!(DiskStatus::validate(body).unwrap().is_success());
    }

    #[test]
    fn no_disks_fails() {
        let message = failure_message(DiskStatus::validate(b"[]"));
        assert!(message.contains("no disks present"), "{message}");
    }

    #[test]
    fn offline_disk_fails() {
        let body = br#"[{"disk_id": 4, "health_str": "OFFLINE", "status_str": "IN_USE"}]"#;
        let message = failure_message(DiskStatus::validate(body));
        assert_eq!(message, "disk '4' health: expected ONLINE, got 'OFFLINE'");
    }

    #[test]
    fn disk_with_unexpected_status_fails() {
        let body = br#"[{"disk_id": 4, "health_str": "ONLINE", "status_str": "FAILED"}]"#;
        let message = failure_message(DiskStatus::validate(body));
        assert!(message.contains("one of IN_USE, UNUSED"), "{message}");
    }

    #[test]
    fn disk_missing_health_names_the_path() {
        let body = br#"[{"disk_id": 4, "status_str": "IN_USE"}]"#;
        let message = failure_message(DiskStatus::validate(body));
        assert!(message.contains("$[0].health_str"), "{message}");
    }

    #[test]
    fn disksets_active_or_rebuilding_pass() {
        let body = br#"{"disksets": [
            {"id": 1, "health_str": "HEALTHY", "status_str": "ACTIVE"},
            {"id": 2, "health_str": "HEALTHY", "status_str": "REBUILDING"}
        ]}"#;
        assert!(DisksetStatus::validate(body).unwrap().is_success());
    }

    #[test]
    fn no_disksets_fails() {
        let message = failure_message(DisksetStatus::validate(br#"{"disksets": []}"#));
        assert!(message.contains("no disksets present"), "{message}");
    }

    #[test]
    fn degraded_diskset_fails() {
        let body = br#"{"disksets": [{"id": 9, "health_str": "DEGRADED", "status_str": "ACTIVE"}]}"#;
        let message = failure_message(DisksetStatus::validate(body));
        assert!(message.contains("diskset '9'"), "{message}");
        assert!(message.contains("DEGRADED"), "{message}");
    }

    #[test]
    fn diskset_missing_health_names_the_path() {
        let body = br#"{"disksets": [{"id": 1, "status_str": "ACTIVE"}]}"#;
        let message = failure_message(DisksetStatus::validate(body));
        assert!(message.contains("$.disksets[0].health_str"), "{message}");
    }

    #[test]
    fn diskset_listing_must_be_an_object() {
        let message = failure_message(DisksetStatus::validate(b"[]"));
        assert!(message.contains("'$'"), "{message}");
    }

    #[test]
    fn inactive_node_is_reported_alone() {
        let body = br#"[{"name":"n1","status_str":"ACTIVE"}, {"name":"n2","status_str":"DEGRADED"}]"#;
        let message = failure_message(NodeStatus::validate(body));
        assert!(message.contains("n2"), "{message}");
        assert!(message.contains("DEGRADED"), "{message}");
        assert!(!message.contains("n1"), "{message}");
    }

    #[test]
    fn node_listing_must_be_an_array() {
        let message = failure_message(NodeStatus::validate(br#"{"nodes": []}"#));
        assert!(message.contains("expected an array"), "{message}");
    }

    #[test]
    fn node_without_name_fails() {
        let message = failure_message(NodeStatus::validate(br#"[{"status_str":"ACTIVE"}]"#));
        assert!(message.contains("$[0].name"), "{message}");
    }

    #[test]
    fn unconfigured_replication_is_a_warning() {
        let outcome = ReplicationStatus::validate(b"{}").unwrap();
        assert_eq!(outcome.status(), OutcomeStatus::Warning);
        assert_eq!(outcome.message(), Some("replication is not configured"));
    }

    #[test]
    fn online_replication_passes() {
        let body = br#"{"ReplicatedClusters": [{"Health": "ONLINE"}, {"Health": "OFFLINE"}]}"#;
        assert!(ReplicationStatus::validate(body).unwrap().is_success());
    }

    #[test]
    fn offline_replication_fails() {
        let body = br#"{"ReplicatedClusters": [{"Health": "OFFLINE"}]}"#;
        let message = failure_message(ReplicationStatus::validate(body));
        assert!(message.contains("OFFLINE"), "{message}");
    }

    #[test]
    fn empty_replicated_cluster_list_fails() {
        let body = br#"{"ReplicatedClusters": []}"#;
        let outcome = ReplicationStatus::validate(body).unwrap_or_else(Outcome::from);
        assert_eq!(outcome.status(), OutcomeStatus::Failure);
        assert_eq!(
            outcome.detail().unwrap().get("error").map(String::as_str),
            Some("policy_violation")
        );
    }

    #[test]
    fn replication_missing_field_fails() {
        let message = failure_message(ReplicationStatus::validate(br#"{"Other": 1}"#));
        assert!(message.contains("$.ReplicatedClusters"), "{message}");
    }

    #[test]
    fn ldap_enabled_passes() {
        let body = br#"{"ldap_info":{"status_str":"ENABLED","ldap_server_address":"ldap://dc"}}"#;
        assert!(LdapStatus::validate(body).unwrap().is_success());
    }

    #[test]
    fn ldap_disabled_without_address_is_not_configured() {
        let body = br#"{"ldap_info":{"status_str":"DISABLED","ldap_server_address":""}}"#;
        let outcome = LdapStatus::validate(body).unwrap();
        assert_eq!(outcome.status(), OutcomeStatus::Warning);
        assert_eq!(outcome.message(), Some("LDAP is not configured"));
    }

    #[test]
    fn ldap_disabled_with_address_is_configured_but_disabled() {
        let body = br#"{"ldap_info":{"status_str":"DISABLED","ldap_server_address":"ldap://dc"}}"#;
        let outcome = LdapStatus::validate(body).unwrap();
        assert_eq!(outcome.status(), OutcomeStatus::Warning);
        assert_eq!(outcome.message(), Some("LDAP is configured but disabled"));
    }

    #[test]
    fn ldap_without_info_fails() {
        let message = failure_message(LdapStatus::validate(br#"{"status_str":"ENABLED"}"#));
        assert!(message.contains("$.ldap_info"), "{message}");
    }

    #[test]
    fn cluster_health_all_online_passes() {
        let body = br#"{"controlHealthStatus":"Online","metadataHealthStatus":"Online",
                        "datapathHealthStatus":"Online","clusterHealthStatus":"Online"}"#;
        assert!(ClusterHealth::validate(body).unwrap().is_success());
    }

    #[test]
    fn cluster_health_reports_first_offline_field() {
        let body = br#"{"controlHealthStatus":"Online","metadataHealthStatus":"Online",
                        "datapathHealthStatus":"Offline","clusterHealthStatus":"Online"}"#;
        let message = failure_message(ClusterHealth::validate(body));
        assert!(message.contains("datapathHealthStatus"), "{message}");
        assert!(message.contains("Offline"), "{message}");
    }

    #[test]
    fn cluster_health_stops_at_first_mismatch() {
        // clusterHealthStatus is missing, but the metadata store is reported first.
        let body = br#"{"controlHealthStatus":"Online","metadataHealthStatus":"Degraded"}"#;
        let message = failure_message(ClusterHealth::validate(body));
        assert!(message.contains("metadataHealthStatus"), "{message}");
    }

    #[test]
    fn cluster_health_missing_field_names_the_path() {
        let body = br#"{"controlHealthStatus":"Online","metadataHealthStatus":"Online",
                        "datapathHealthStatus":"Online"}"#;
        let message = failure_message(ClusterHealth::validate(body));
        assert!(message.contains("$.clusterHealthStatus"), "{message}");
    }

    #[test]
    fn malformed_body_fails() {
        let message = failure_message(ClusterHealth::validate(b"Bad Gateway"));
        assert!(message.contains("failed to parse JSON response"), "{message}");
    }
}
