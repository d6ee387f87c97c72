use crate::cache::token::IamToken;
use crate::cloud::api::CloudApi;
use crate::cloud::model::{ListNodeGroupsResponse, ListNodesResponse, Node, NodeGroup};
use crate::error::SdError;

/// Managed Service for Kubernetes API.
#[derive(Debug, Clone)]
pub struct KubernetesClient {
    api: CloudApi,
}

impl KubernetesClient {
    pub fn new(api: CloudApi) -> Self {
        Self { api }
    }

    /// Node groups of the folder, optionally only those named exactly `name`.
    pub async fn list_node_groups(
        &self,
        token: &IamToken,
        folder_id: &str,
        name: Option<&str>,
    ) -> Result<Vec<NodeGroup>, SdError> {
        let groups = self
            .api
            .paginate::<ListNodeGroupsResponse>("/nodeGroups", &[("folderId", folder_id.to_owned())], token)
            .await?;

        Ok(match name {
            Some(name) => groups.into_iter().filter(|group| group.name == name).collect(),
            None => groups,
        })
    }

    pub async fn list_nodes(&self, token: &IamToken, node_group_id: &str) -> Result<Vec<Node>, SdError> {
        self.api
            .paginate::<ListNodesResponse>("/nodes", &[("nodeGroupId", node_group_id.to_owned())], token)
            .await
    }
}
