use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::{env, fs};

pub const IAM_TOKENS_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";
pub const COMPUTE_API_URL: &str = "https://compute.api.cloud.yandex.net/compute/v1";
pub const KUBERNETES_API_URL: &str = "https://mks.api.cloud.yandex.net/managed-kubernetes/v1";

/// ================================
/// Cloud account and API endpoints
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct CloudConfig {
    pub folder_id: String,
    pub service_account_id: String,
    pub key_id: String,
    /// PEM encoded private key of the service account authorized key
    pub private_key: SecretValue,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointsConfig {
    #[serde(default = "default_iam_url")]
    pub iam: String,
    #[serde(default = "default_compute_url")]
    pub compute: String,
    #[serde(default = "default_kubernetes_url")]
    pub kubernetes: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            iam: default_iam_url(),
            compute: default_compute_url(),
            kubernetes: default_kubernetes_url(),
        }
    }
}

/// Secret material sources
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum SecretValue {
    Literal {
        value: String,
    },
    FromEnv {
        from_env: String,
    },
    FromFile {
        path: String,
    },
}

impl SecretValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            SecretValue::Literal { value } => Ok(value.to_owned()),
            SecretValue::FromEnv { from_env } => env::var(from_env)
                .map_err(|err| anyhow!("env variable '{}': {}", from_env, err)),
            SecretValue::FromFile { path } => fs::read_to_string(path)
                .map_err(|err| anyhow!("secret file '{}': {}", path, err))
                .map(|content| content.trim().to_string()),
        }
    }
}

fn default_iam_url() -> String {
    IAM_TOKENS_URL.to_string()
}

fn default_compute_url() -> String {
    COMPUTE_API_URL.to_string()
}

fn default_kubernetes_url() -> String {
    KUBERNETES_API_URL.to_string()
}
