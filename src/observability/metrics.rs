use prometheus::{Gauge, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Discovery endpoint metrics
    pub discover_requests: IntCounterVec,
    pub discover_failures: IntCounterVec,
    pub discover_duration: HistogramVec,
    pub discovered_targets: IntGauge,

    // Upstream API metrics
    pub api_requests: IntCounterVec,
    pub iam_token_fetches: IntCounterVec,
    pub iam_token_expiry_unix: IntGauge,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,

    // === Service resource metrics ===
    pub process_cpu_usage: Gauge,
    pub process_memory_usage: IntGauge,
    pub process_open_fds: IntGauge,
    pub process_start_time: IntGauge,
    pub process_uptime: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("ycsd".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Discovery
            discover_requests: IntCounterVec::new(Opts::new("discover_requests_total", "Total discovery requests by endpoint"),&["endpoint"],).unwrap(),
            discover_failures: IntCounterVec::new(Opts::new("discover_failures_total", "Discovery failures by endpoint and reason"),&["endpoint", "reason"],).unwrap(),
            discover_duration: HistogramVec::new(HistogramOpts::new("discover_duration_seconds", "Discovery request duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),&["endpoint"],).unwrap(),
            discovered_targets: IntGauge::new("discovered_targets", "Targets returned by the last discovery").unwrap(),

            // Upstream
            api_requests: IntCounterVec::new(Opts::new("api_requests_total", "Cloud API requests by api and status"),&["api", "status"],).unwrap(),
            iam_token_fetches: IntCounterVec::new(Opts::new("iam_token_fetches_total", "IAM token requests by result"),&["result"],).unwrap(),
            iam_token_expiry_unix: IntGauge::new("iam_token_expiry_unix_seconds", "Expiry timestamp of the cached IAM token").unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),
            process_cpu_usage: Gauge::new("process_cpu_usage_percent", "CPU usage % of this process").unwrap(),
            process_memory_usage: IntGauge::new("process_memory_usage_bytes", "Resident memory used by this process").unwrap(),
            process_open_fds: IntGauge::new("process_open_fds", "Number of open file descriptors").unwrap(),
            process_start_time: IntGauge::new("process_start_time_seconds", "Process start time (UNIX seconds)").unwrap(),
            process_uptime: IntGauge::new("process_uptime_seconds", "Process uptime seconds").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.discover_requests.clone())).unwrap();
        reg.register(Box::new(metrics.discover_failures.clone())).unwrap();
        reg.register(Box::new(metrics.discover_duration.clone())).unwrap();
        reg.register(Box::new(metrics.discovered_targets.clone())).unwrap();
        reg.register(Box::new(metrics.api_requests.clone())).unwrap();
        reg.register(Box::new(metrics.iam_token_fetches.clone())).unwrap();
        reg.register(Box::new(metrics.iam_token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        reg.register(Box::new(metrics.process_cpu_usage.clone())).unwrap();
        reg.register(Box::new(metrics.process_memory_usage.clone())).unwrap();
        reg.register(Box::new(metrics.process_open_fds.clone())).unwrap();
        reg.register(Box::new(metrics.process_start_time.clone())).unwrap();
        reg.register(Box::new(metrics.process_uptime.clone())).unwrap();

        metrics
    }
}
