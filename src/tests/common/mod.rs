// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use chrono::{Duration, Utc};
use http::{HeaderMap, StatusCode};
use rand_core::OsRng;
use reqwest::Client;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use serde_json::Value;

use crate::cache::token::IamToken;
use crate::cloud::api::CloudApi;
use crate::resilience::retry::RetrySettings;

pub const TEST_IAM_TOKEN: &str = "t1.test-iam-token";
pub const COMPUTE_PREFIX: &str = "/compute/v1";
pub const KUBERNETES_PREFIX: &str = "/managed-kubernetes/v1";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// One RSA key per test binary, key generation is slow.
pub fn test_private_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 2048).expect("rsa key"))
}

pub fn test_private_key_pem() -> String {
    test_private_key()
        .to_pkcs8_pem(LineEnding::LF)
        .expect("pem encoding")
        .to_string()
}

pub fn valid_token() -> IamToken {
    IamToken::new(TEST_IAM_TOKEN.to_string(), Utc::now() + Duration::hours(12))
}

pub fn cloud_api(name: &'static str, base_url: String) -> CloudApi {
    let retry = RetrySettings { attempts: 3, base_delay_ms: 1, max_delay_ms: 5 };
    CloudApi::new(name, build_reqwest_client(), base_url, retry)
}

pub fn instance_json(id: &str, address: Option<&str>, labels: Value) -> Value {
    let interfaces = match address {
        Some(address) => json!([{ "index": "0", "primaryV4Address": { "address": address } }]),
        None => json!([]),
    };
    json!({
        "id": id,
        "folderId": "b1gfolder",
        "zoneId": "ru-central1-a",
        "fqdn": format!("{}.auto.internal", id),
        "labels": labels,
        "networkInterfaces": interfaces,
    })
}

/// In-memory stand-in for the Compute and Managed Kubernetes APIs.
///
/// List endpoints serve `pages` in order, chaining them with `page-<n>` tokens.
#[derive(Clone, Default)]
pub struct FakeCloud {
    pub instance_pages: Arc<Vec<Vec<Value>>>,
    pub instances_by_id: Arc<HashMap<String, Value>>,
    pub node_group_pages: Arc<Vec<Vec<Value>>>,
    pub nodes_by_group: Arc<HashMap<String, Vec<Value>>>,
    /// answer every list call with this status instead
    pub failure: Option<StatusCode>,
    pub list_hits: Arc<AtomicUsize>,
    pub seen_page_tokens: Arc<Mutex<Vec<Option<String>>>>,
    pub seen_page_sizes: Arc<Mutex<Vec<Option<String>>>>,
}

impl FakeCloud {
    pub fn with_instance_pages(pages: Vec<Vec<Value>>) -> Self {
        Self { instance_pages: Arc::new(pages), ..Self::default() }
    }

    pub fn hits(&self) -> usize {
        self.list_hits.load(Ordering::SeqCst)
    }

    pub fn page_tokens(&self) -> Vec<Option<String>> {
        self.seen_page_tokens.lock().unwrap().clone()
    }

    pub async fn spawn(self) -> (JoinHandle<()>, SocketAddr) {
        let router = Router::new()
            .route(&format!("{}/instances", COMPUTE_PREFIX), get(list_instances))
            .route(&format!("{}/instances/{{id}}", COMPUTE_PREFIX), get(get_instance))
            .route(&format!("{}/nodeGroups", KUBERNETES_PREFIX), get(list_node_groups))
            .route(&format!("{}/nodes", KUBERNETES_PREFIX), get(list_nodes))
            .with_state(self);
        spawn_axum(router).await
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == format!("Bearer {}", TEST_IAM_TOKEN))
    }

    fn record(&self, query: &HashMap<String, String>) {
        self.list_hits.fetch_add(1, Ordering::SeqCst);
        self.seen_page_tokens.lock().unwrap().push(query.get("pageToken").cloned());
        self.seen_page_sizes.lock().unwrap().push(query.get("pageSize").cloned());
    }
}

fn serve_page(pages: &[Vec<Value>], query: &HashMap<String, String>, items_key: &str) -> Response {
    let index = match query.get("pageToken") {
        None => 0,
        Some(token) => match token.strip_prefix("page-").and_then(|n| n.parse::<usize>().ok()) {
            Some(n) => n,
            None => return (StatusCode::BAD_REQUEST, "bad page token").into_response(),
        },
    };
    let items = pages.get(index).cloned().unwrap_or_default();
    let mut body = serde_json::Map::new();
    body.insert(items_key.to_string(), Value::Array(items));
    if index + 1 < pages.len() {
        body.insert("nextPageToken".to_string(), Value::String(format!("page-{}", index + 1)));
    }
    Json(Value::Object(body)).into_response()
}

async fn list_instances(
    State(fake): State<FakeCloud>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !FakeCloud::authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing bearer").into_response();
    }
    fake.record(&query);
    if let Some(status) = fake.failure {
        return (status, "upstream failure").into_response();
    }
    if query.get("folderId").map(String::as_str) != Some("b1gfolder") {
        return (StatusCode::BAD_REQUEST, "unknown folder").into_response();
    }
    serve_page(&fake.instance_pages, &query, "instances")
}

async fn get_instance(State(fake): State<FakeCloud>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !FakeCloud::authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing bearer").into_response();
    }
    match fake.instances_by_id.get(&id) {
        Some(instance) => Json(instance.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("instance {} not found", id)).into_response(),
    }
}

async fn list_node_groups(
    State(fake): State<FakeCloud>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !FakeCloud::authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing bearer").into_response();
    }
    fake.record(&query);
    serve_page(&fake.node_group_pages, &query, "nodeGroups")
}

async fn list_nodes(
    State(fake): State<FakeCloud>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !FakeCloud::authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing bearer").into_response();
    }
    fake.record(&query);
    let nodes = query
        .get("nodeGroupId")
        .and_then(|id| fake.nodes_by_group.get(id))
        .cloned()
        .unwrap_or_default();
    serve_page(&[nodes], &query, "nodes")
}
