//! Wire shapes of the IAM, Compute and Managed Kubernetes REST APIs.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A page of a list call: its items plus the continuation token, if any.
pub trait Page {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

#[derive(Debug, Serialize)]
pub struct CreateIamTokenRequest<'a> {
    pub jwt: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateIamTokenResponse {
    pub iam_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub folder_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub zone_id: String,
    pub fqdn: String,
    /// kept in response order, exporter ports are emitted in this order
    #[serde(default)]
    pub labels: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub metadata: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

impl Instance {
    /// Primary IPv4 address of the first network interface.
    pub fn primary_address(&self) -> Option<&str> {
        self.network_interfaces
            .first()
            .and_then(|nic| nic.primary_v4_address.as_ref())
            .and_then(|v4| v4.address.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(default)]
    pub primary_v4_address: Option<V4Address>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct V4Address {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub one_to_one_nat: Option<OneToOneNat>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OneToOneNat {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInstancesResponse {
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl Page for ListInstancesResponse {
    type Item = Instance;

    fn into_parts(self) -> (Vec<Instance>, Option<String>) {
        (self.instances, self.next_page_token)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroup {
    pub id: String,
    pub name: String,
    pub cluster_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNodeGroupsResponse {
    #[serde(default)]
    pub node_groups: Vec<NodeGroup>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl Page for ListNodeGroupsResponse {
    type Item = NodeGroup;

    fn into_parts(self) -> (Vec<NodeGroup>, Option<String>) {
        (self.node_groups, self.next_page_token)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub status: String,
    pub cloud_status: NodeCloudStatus,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeCloudStatus {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNodesResponse {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl Page for ListNodesResponse {
    type Item = Node;

    fn into_parts(self) -> (Vec<Node>, Option<String>) {
        (self.nodes, self.next_page_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_instance_with_nat_and_optional_fields() {
        let raw = json!({
            "id": "fhm1",
            "folderId": "b1g",
            "zoneId": "ru-central1-a",
            "fqdn": "fhm1.auto.internal",
            "status": "RUNNING",
            "labels": { "env": "prod" },
            "networkInterfaces": [{
                "index": "0",
                "primaryV4Address": {
                    "address": "10.0.0.5",
                    "oneToOneNat": { "address": "84.201.1.1", "ipVersion": "IPV4" }
                }
            }]
        });

        let instance: Instance = serde_json::from_value(raw).unwrap();

        assert_eq!(instance.name, None);
        assert_eq!(instance.metadata, None);
        assert_eq!(instance.primary_address(), Some("10.0.0.5"));
        let nat = instance.network_interfaces[0]
            .primary_v4_address
            .as_ref()
            .and_then(|v4| v4.one_to_one_nat.as_ref())
            .and_then(|nat| nat.address.as_deref());
        assert_eq!(nat, Some("84.201.1.1"));
    }

    #[test]
    fn empty_list_page_has_no_items() {
        let page: ListInstancesResponse = serde_json::from_value(json!({})).unwrap();
        let (items, next) = page.into_parts();
        assert!(items.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn iam_response_parses_nanosecond_timestamp() {
        let raw = json!({ "iamToken": "t1.abc", "expiresAt": "2026-10-17T22:00:00.123456789Z" });
        let token: CreateIamTokenResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(token.iam_token, "t1.abc");
        assert_eq!(token.expires_at.timestamp(), 1_792_274_400);
    }
}
