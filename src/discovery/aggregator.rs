use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::cache::token_cache::{IssueToken, TokenProvider};
use crate::cloud::api::CloudApi;
use crate::cloud::compute::ComputeClient;
use crate::cloud::iam::IamTokenIssuer;
use crate::cloud::jwt::parse_private_key;
use crate::cloud::kubernetes::KubernetesClient;
use crate::config::types::ServiceConfig;
use crate::discovery::deriver::{derive_targets, DiscoveryMode};
use crate::discovery::nodes::{K8sNodeView, K8sNodesDocument};
use crate::discovery::target::DiscoveryDocument;
use crate::error::SdError;
use crate::observability::metrics::get_metrics;

static COMPUTE_API: &str = "compute";
static KUBERNETES_API: &str = "kubernetes";

/// Token, listing and derivation wired together for one folder.
pub struct Discovery<I = IamTokenIssuer> {
    tokens: TokenProvider<I>,
    compute: ComputeClient,
    kubernetes: KubernetesClient,
    folder_id: String,
    mode: DiscoveryMode,
}

impl<I: IssueToken> Discovery<I> {
    pub fn new(
        tokens: TokenProvider<I>,
        compute: ComputeClient,
        kubernetes: KubernetesClient,
        folder_id: impl Into<String>,
        mode: DiscoveryMode,
    ) -> Self {
        Self { tokens, compute, kubernetes, folder_id: folder_id.into(), mode }
    }

    pub fn mode(&self) -> DiscoveryMode {
        self.mode
    }

    /// Scrape targets for every instance of the folder, in listing order.
    ///
    /// Token or listing failures abort the whole call.
    pub async fn discover(&self) -> Result<DiscoveryDocument, SdError> {
        let token = self.tokens.get_valid_token().await?;
        let instances = self.compute.list_instances(&token, &self.folder_id).await?;

        let document: DiscoveryDocument = instances
            .iter()
            .flat_map(|instance| derive_targets(instance, self.mode))
            .collect();

        info!(
            folder_id = %self.folder_id,
            mode = ?self.mode,
            instances = instances.len(),
            targets = document.len(),
            "discovery complete"
        );
        get_metrics().await.discovered_targets.set(document.len() as i64);
        Ok(document)
    }

    /// Nodes of every node group (or only groups named `node_group_name`),
    /// each joined with its compute instance.
    pub async fn kubernetes_nodes(&self, node_group_name: Option<&str>) -> Result<K8sNodesDocument, SdError> {
        let token = self.tokens.get_valid_token().await?;
        let groups = self
            .kubernetes
            .list_node_groups(&token, &self.folder_id, node_group_name)
            .await?;

        let mut nodes = Vec::new();
        for group in &groups {
            for node in self.kubernetes.list_nodes(&token, &group.id).await? {
                let instance = self.compute.get_instance(&token, &node.cloud_status.id).await?;
                nodes.push(K8sNodeView::new(group, &node, &instance));
            }
            debug!(node_group = %group.name, "node group resolved");
        }

        info!(folder_id = %self.folder_id, node_groups = groups.len(), nodes = nodes.len(), "kubernetes nodes resolved");
        Ok(K8sNodesDocument { nodes })
    }
}

impl Discovery<IamTokenIssuer> {
    /// Build the production pipeline: one shared HTTP client with the
    /// configured timeout, IAM issuer from the service account key.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let settings = &config.settings;
        let cloud = &config.cloud;

        let client = Client::builder()
            .timeout(Duration::from_millis(settings.http_timeout_ms()))
            .build()
            .context("failed to build HTTP client")?;

        let raw_key = cloud.private_key.resolve().context("failed to read service account private key")?;
        let private_key = parse_private_key(&raw_key)?;

        let issuer = IamTokenIssuer::new(
            client.clone(),
            &cloud.endpoints.iam,
            &cloud.service_account_id,
            &cloud.key_id,
            private_key,
        );
        let tokens = TokenProvider::new(issuer).with_safety_margin(settings.safety_margin_seconds());

        let retry = settings.retry_settings();
        let compute = ComputeClient::new(CloudApi::new(COMPUTE_API, client.clone(), &cloud.endpoints.compute, retry.clone()));
        let kubernetes = KubernetesClient::new(CloudApi::new(KUBERNETES_API, client, &cloud.endpoints.kubernetes, retry));

        info!(folder_id = %cloud.folder_id, mode = ?config.discovery.mode, "discovery configured");
        Ok(Self::new(tokens, compute, kubernetes, &cloud.folder_id, config.discovery.mode))
    }
}
