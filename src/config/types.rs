use serde::Deserialize;

use crate::config::cloud::CloudConfig;
use crate::config::settings::SettingsConfig;
use crate::discovery::deriver::DiscoveryMode;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub cloud: CloudConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub mode: DiscoveryMode,
}
