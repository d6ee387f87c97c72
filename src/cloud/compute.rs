use crate::cache::token::IamToken;
use crate::cloud::api::CloudApi;
use crate::cloud::model::{Instance, ListInstancesResponse};
use crate::error::SdError;

/// Compute Cloud instances API.
#[derive(Debug, Clone)]
pub struct ComputeClient {
    api: CloudApi,
}

impl ComputeClient {
    pub fn new(api: CloudApi) -> Self {
        Self { api }
    }

    /// All instances of the folder, every page, in listing order.
    pub async fn list_instances(&self, token: &IamToken, folder_id: &str) -> Result<Vec<Instance>, SdError> {
        self.api
            .paginate::<ListInstancesResponse>("/instances", &[("folderId", folder_id.to_owned())], token)
            .await
    }

    pub async fn get_instance(&self, token: &IamToken, instance_id: &str) -> Result<Instance, SdError> {
        self.api
            .get_json(&format!("/instances/{}", instance_id), &[], token)
            .await
    }
}
