//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks cloud account identifiers and endpoint URLs
//! - Checks server / metrics / logging / retry invariants

use tracing::{error, info};

use crate::config::cloud::{CloudConfig, SecretValue};
use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::config::types::ServiceConfig;
use crate::observability::metrics::get_metrics;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_cloud(&cfg.cloud, &mut errors);

    if errors.is_empty() {
        info!("config is valid");
        return Ok(());
    }

    let metrics = get_metrics().await;
    for err in &errors {
        error!("config validation: {}", err);
        metrics.config_validation_errors.inc();
    }
    Err(errors)
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(retry) = &settings.retry {
        validate_retry("settings.retry", retry, errors);
    }

    if let Some(s) = settings.safety_margin_seconds {
        // IAM tokens live at most 12 hours
        if s >= 60 * 60 * 12 {
            errors.push(format!(
                "settings.safety_margin_seconds ({}) must be below the 12h token lifetime",
                s
            ));
        }
    }

    if settings.http_timeout_ms == Some(0) {
        errors.push("settings.http_timeout_ms must be > 0".to_string());
    }

    if settings.server.host.is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_retry(path: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if let Some(attempts) = retry.attempts {
        if attempts == 0 {
            errors.push(format!("{}.attempts must be > 0", path));
        }
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if max < base {
            errors.push(format!(
                "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
                path, max, base
            ));
        }
    }
}

fn validate_cloud(cloud: &CloudConfig, errors: &mut Vec<String>) {
    let required = [
        ("cloud.folder_id", &cloud.folder_id),
        ("cloud.service_account_id", &cloud.service_account_id),
        ("cloud.key_id", &cloud.key_id),
    ];
    for (path, value) in required {
        if value.trim().is_empty() {
            errors.push(format!("{} must not be empty", path));
        }
    }

    match &cloud.private_key {
        SecretValue::Literal { value } if value.trim().is_empty() => {
            errors.push("cloud.private_key.value must not be empty".to_string())
        }
        SecretValue::FromEnv { from_env } if from_env.is_empty() => {
            errors.push("cloud.private_key.from_env must name a variable".to_string())
        }
        SecretValue::FromFile { path } if path.is_empty() => {
            errors.push("cloud.private_key.path must not be empty".to_string())
        }
        _ => {}
    }

    let endpoints = [
        ("cloud.endpoints.iam", &cloud.endpoints.iam),
        ("cloud.endpoints.compute", &cloud.endpoints.compute),
        ("cloud.endpoints.kubernetes", &cloud.endpoints.kubernetes),
    ];
    for (path, url) in endpoints {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            errors.push(format!("{} '{}' must be an http(s) URL", path, url));
        }
    }
}
