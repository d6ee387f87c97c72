use serde::Deserialize;

use crate::resilience::retry::RetrySettings;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 2000;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SAFETY_MARGIN_SECONDS: u64 = 60;

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    /// refresh the IAM token this many seconds before it expires
    pub safety_margin_seconds: Option<u64>,
    pub retry: Option<RetryConfig>,
    /// per-request timeout for every outbound call
    pub http_timeout_ms: Option<u64>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
}

impl SettingsConfig {
    pub fn retry_settings(&self) -> RetrySettings {
        let retry = self.retry.as_ref();
        RetrySettings {
            attempts: retry.and_then(|r| r.attempts).unwrap_or(DEFAULT_RETRY_ATTEMPTS),
            base_delay_ms: retry.and_then(|r| r.base_delay_ms).unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
            max_delay_ms: retry.and_then(|r| r.max_delay_ms).unwrap_or(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }

    pub fn http_timeout_ms(&self) -> u64 {
        self.http_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS)
    }

    pub fn safety_margin_seconds(&self) -> u64 {
        self.safety_margin_seconds.unwrap_or(DEFAULT_SAFETY_MARGIN_SECONDS)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    /// will be mutiply by 2 on every attempt until max_delay_ms
    pub base_delay_ms: Option<u64>,
    /// invariant: >= base_delay_ms
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { path: default_metrics_path(), is_enabled: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_server_host(), port: default_server_port() }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> String {
    "8000".to_string()
}
