use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::error;

use crate::error::SdError;
use crate::observability::metrics::get_metrics;
use crate::server::server::AppState;

static DISCOVER_ENDPOINT: &str = "discover";
static KUBERNETES_ENDPOINT: &str = "kubernetes";

#[derive(Debug, Deserialize)]
pub struct NodesQuery {
    pub node_group_name: Option<String>,
}

/// Prometheus HTTP SD endpoint.
pub async fn get_discover(State(state): State<AppState>) -> Response {
    let start = begin(DISCOVER_ENDPOINT).await;
    let result = state.discovery.discover().await;
    finish(DISCOVER_ENDPOINT, start, result.as_ref().err()).await;

    match result {
        Ok(document) => Json(document).into_response(),
        Err(err) => upstream_error(err),
    }
}

pub async fn get_kubernetes_instances(
    State(state): State<AppState>,
    Query(query): Query<NodesQuery>,
) -> Response {
    let start = begin(KUBERNETES_ENDPOINT).await;
    let name = query.node_group_name.as_deref().filter(|name| !name.is_empty());
    let result = state.discovery.kubernetes_nodes(name).await;
    finish(KUBERNETES_ENDPOINT, start, result.as_ref().err()).await;

    match result {
        Ok(document) => Json(document).into_response(),
        Err(err) => upstream_error(err),
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

async fn begin(endpoint: &str) -> Instant {
    get_metrics().await.discover_requests.with_label_values(&[endpoint]).inc();
    Instant::now()
}

async fn finish(endpoint: &str, start: Instant, err: Option<&SdError>) {
    let metrics = get_metrics().await;
    metrics
        .discover_duration
        .with_label_values(&[endpoint])
        .observe(start.elapsed().as_secs_f64());
    if let Some(err) = err {
        error!(endpoint, error = %err, "discovery failed");
        metrics.discover_failures.with_label_values(&[endpoint, err.reason()]).inc();
    }
}

fn upstream_error(err: SdError) -> Response {
    (StatusCode::BAD_GATEWAY, format!("Error: {}", err)).into_response()
}
