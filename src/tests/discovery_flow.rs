// End to end through the HTTP surface:
//  - identity endpoint (httpmock) issues the IAM token
//  - fake Compute API serves two pages of instances
//  - config is parsed from YAML and wired with Discovery::from_config
//  - GET /api/v1/discover returns the Prometheus document, 502 on upstream failure
#[cfg(test)]
mod test {
    use std::io::Write;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use anyhow::Result;
    use http::StatusCode;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::{json, Value};
    use tempfile::NamedTempFile;

    use crate::config::proc_loader::parse_config;
    use crate::discovery::aggregator::Discovery;
    use crate::discovery::target::DiscoveryDocument;
    use crate::observability::metrics::get_metrics;
    use crate::server::server::{router, AppState, DISCOVER_PATH, HEALTH_PATH};
    use crate::tests::common::{
        build_reqwest_client, instance_json, spawn_axum, test_private_key_pem, FakeCloud, COMPUTE_PREFIX,
        KUBERNETES_PREFIX, TEST_IAM_TOKEN,
    };

    const TOKENS_PATH: &str = "/iam/v1/tokens";

    async fn iam_mock(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(POST).path(TOKENS_PATH);
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"iamToken": TEST_IAM_TOKEN, "expiresAt": "2099-01-01T00:00:00Z"}));
            })
            .await;
    }

    fn sample_instances() -> Vec<Vec<Value>> {
        let mut web = instance_json(
            "fhm-web",
            Some("10.0.0.11"),
            json!({"env": "prod", "team-name": "core", "prometheus_job": "node", "prometheus_node_port": "9100"}),
        );
        web["name"] = json!("web-1");
        web["metadata"] = json!({"env": "staging"});

        let detached = instance_json("fhm-detached", None, json!({"prometheus_job": "node", "prometheus_node_port": "9100"}));
        let db = instance_json("fhm-db", Some("10.0.0.12"), json!({}));

        vec![vec![web, detached], vec![db]]
    }

    /// Parse a config pointing every endpoint at the local fakes and serve the app router.
    async fn spawn_app(iam: &MockServer, cloud: SocketAddr, mode: &str) -> Result<(SocketAddr, NamedTempFile)> {
        let mut key_file = NamedTempFile::new()?;
        writeln!(key_file, "PLEASE DO NOT REMOVE THIS LINE! Yandex.Cloud SA Key ID <aje-key>")?;
        write!(key_file, "{}", test_private_key_pem())?;

        let yaml = format!(
            r#"
settings:
  http_timeout_ms: 2000
  retry:
    attempts: 2
    base_delay_ms: 1
    max_delay_ms: 2
  metrics:
    is_enabled: true
cloud:
  folder_id: b1gfolder
  service_account_id: aje-sa
  key_id: aje-key
  private_key:
    path: "{key_path}"
  endpoints:
    iam: "{iam}"
    compute: "http://{cloud}{compute}"
    kubernetes: "http://{cloud}{kubernetes}"
discovery:
  mode: {mode}
"#,
            key_path = key_file.path().display(),
            iam = iam.url(TOKENS_PATH),
            cloud = cloud,
            compute = COMPUTE_PREFIX,
            kubernetes = KUBERNETES_PREFIX,
            mode = mode,
        );

        let service_config = parse_config(yaml).await?;
        let discovery = Arc::new(Discovery::from_config(&service_config)?);
        let state = AppState::new(get_metrics().await, discovery);
        let (_h, addr) = spawn_axum(router(state, &service_config.settings)).await;
        Ok((addr, key_file))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn passthrough_document_over_http() -> Result<()> {
        let iam = MockServer::start_async().await;
        iam_mock(&iam).await;
        let fake = FakeCloud::with_instance_pages(sample_instances());
        let (_cloud_h, cloud_addr) = fake.clone().spawn().await;
        let (addr, _key) = spawn_app(&iam, cloud_addr, "passthrough").await?;

        let response = build_reqwest_client()
            .get(format!("http://{}{}", addr, DISCOVER_PATH))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let document: DiscoveryDocument = response.json().await?;

        assert_eq!(document.len(), 2);
        assert_eq!(document[0].targets, vec!["10.0.0.11"]);
        let labels = &document[0].labels;
        assert_eq!(labels["id"], "fhm-web");
        assert_eq!(labels["folder_id"], "b1gfolder");
        assert_eq!(labels["zone_id"], "ru-central1-a");
        assert_eq!(labels["fqdn"], "fhm-web.auto.internal");
        assert_eq!(labels["name"], "web-1");
        assert_eq!(labels["team_name"], "core");
        // metadata overrides labels
        assert_eq!(labels["env"], "staging");
        assert!(!labels.contains_key("team-name"));

        assert_eq!(document[1].targets, vec!["10.0.0.12"]);
        assert!(!document[1].labels.contains_key("name"));
        assert_eq!(fake.hits(), 2);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn exporter_document_and_trailing_slash_route() -> Result<()> {
        let iam = MockServer::start_async().await;
        iam_mock(&iam).await;
        let (_cloud_h, cloud_addr) = FakeCloud::with_instance_pages(sample_instances()).spawn().await;
        let (addr, _key) = spawn_app(&iam, cloud_addr, "exporter").await?;

        let body: Value = build_reqwest_client()
            .get(format!("http://{}{}/", addr, DISCOVER_PATH))
            .send()
            .await?
            .json()
            .await?;

        assert_eq!(
            body,
            json!([{
                "targets": ["10.0.0.11:9100"],
                "labels": {
                    "hostname": "web-1",
                    "job": "node",
                    "yc_folder_id": "b1gfolder",
                    "yc_fqdn": "fhm-web.auto.internal",
                    "yc_id": "fhm-web",
                    "yc_zone_id": "ru-central1-a"
                }
            }])
        );
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn upstream_failure_is_bad_gateway() -> Result<()> {
        let iam = MockServer::start_async().await;
        iam_mock(&iam).await;
        let fake = FakeCloud { failure: Some(StatusCode::FORBIDDEN), ..FakeCloud::default() };
        let (_cloud_h, cloud_addr) = fake.spawn().await;
        let (addr, _key) = spawn_app(&iam, cloud_addr, "passthrough").await?;

        let response = build_reqwest_client()
            .get(format!("http://{}{}", addr, DISCOVER_PATH))
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = response.text().await?;
        assert!(body.starts_with("Error: "), "{body}");
        assert!(body.contains("403"), "{body}");
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn identity_failure_is_bad_gateway() -> Result<()> {
        let iam = MockServer::start_async().await;
        iam.mock_async(|when, then| {
            when.method(POST).path(TOKENS_PATH);
            then.status(400).body("key revoked");
        })
        .await;
        let fake = FakeCloud::with_instance_pages(sample_instances());
        let (_cloud_h, cloud_addr) = fake.clone().spawn().await;
        let (addr, _key) = spawn_app(&iam, cloud_addr, "passthrough").await?;

        let response = build_reqwest_client()
            .get(format!("http://{}{}", addr, DISCOVER_PATH))
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.text().await?.contains("key revoked"));
        // listing never starts without a token
        assert_eq!(fake.hits(), 0);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn health_and_metrics_routes() -> Result<()> {
        let iam = MockServer::start_async().await;
        iam_mock(&iam).await;
        let (_cloud_h, cloud_addr) = FakeCloud::with_instance_pages(vec![vec![]]).spawn().await;
        let (addr, _key) = spawn_app(&iam, cloud_addr, "passthrough").await?;
        let client = build_reqwest_client();

        let health = client.get(format!("http://{}{}", addr, HEALTH_PATH)).send().await?;
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(health.text().await?, "ok");

        let document: Value = client.get(format!("http://{}{}", addr, DISCOVER_PATH)).send().await?.json().await?;
        assert_eq!(document, json!([]));

        let metrics = client.get(format!("http://{}/metrics", addr)).send().await?.text().await?;
        assert!(metrics.contains("ycsd_discover_requests_total"), "{metrics}");
        assert!(metrics.contains("ycsd_api_requests_total"), "{metrics}");
        Ok(())
    }
}
