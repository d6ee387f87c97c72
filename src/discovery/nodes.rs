use serde::{Deserialize, Serialize};

use crate::cloud::model::{Instance, Node, NodeGroup};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeNetworkInterface {
    pub private: Option<String>,
    pub public: Option<String>,
}

/// A managed Kubernetes node joined with its node group and backing compute instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct K8sNodeView {
    pub cluster_id: String,
    pub node_group_id: String,
    pub node_group_name: String,
    pub node_group_status: String,
    pub node_status: String,
    pub node_cloud_id: String,
    pub node_cloud_status: String,
    pub node_cloud_status_message: Option<String>,
    pub instance_name: Option<String>,
    pub network_interfaces: Vec<NodeNetworkInterface>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct K8sNodesDocument {
    pub nodes: Vec<K8sNodeView>,
}

impl K8sNodeView {
    pub fn new(group: &NodeGroup, node: &Node, instance: &Instance) -> Self {
        let network_interfaces = instance
            .network_interfaces
            .iter()
            .map(|nic| {
                let v4 = nic.primary_v4_address.as_ref();
                NodeNetworkInterface {
                    private: v4.and_then(|v4| v4.address.clone()),
                    public: v4
                        .and_then(|v4| v4.one_to_one_nat.as_ref())
                        .and_then(|nat| nat.address.clone()),
                }
            })
            .collect();

        Self {
            cluster_id: group.cluster_id.clone(),
            node_group_id: group.id.clone(),
            node_group_name: group.name.clone(),
            node_group_status: group.status.clone(),
            node_status: node.status.clone(),
            node_cloud_id: node.cloud_status.id.clone(),
            node_cloud_status: node.cloud_status.status.clone(),
            node_cloud_status_message: node.cloud_status.status_message.clone(),
            instance_name: instance.name.clone(),
            network_interfaces,
        }
    }
}
