use std::sync::Arc;
use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tracing::info;
use crate::config::settings::SettingsConfig;
use crate::discovery::aggregator::Discovery;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::routes::{get_discover, get_kubernetes_instances, healthz};

pub const DISCOVER_PATH: &str = "/api/v1/discover";
pub const KUBERNETES_INSTANCES_PATH: &str = "/api/v1/kubernetes/instances";
pub const HEALTH_PATH: &str = "/healthz";

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub discovery: Arc<Discovery>,
}

impl AppState {
    pub fn new(metrics: &Metrics, discovery: Arc<Discovery>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            discovery,
        }
    }
}

/// Discovery, node listing, health and (when enabled) metrics routes.
pub fn router(state: AppState, settings_config: &SettingsConfig) -> Router {
    Router::new()
        .route(DISCOVER_PATH, get(get_discover))
        .route(&format!("{}/", DISCOVER_PATH), get(get_discover))
        .route(KUBERNETES_INSTANCES_PATH, get(get_kubernetes_instances))
        .route(HEALTH_PATH, get(healthz))
        .merge(state.metrics_state.router(&settings_config.metrics))
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn start(settings_config: &SettingsConfig, discovery: Arc<Discovery>) -> Result<()> {
    let metrics = get_metrics().await;
    let app = router(AppState::new(metrics, discovery), settings_config);

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);

    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;
    metrics.up.set(0);

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
