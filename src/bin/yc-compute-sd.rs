use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use yc_compute_sd::observability::service_resources_metrics::collect_process_metrics;
use yc_compute_sd::server;
use yc_compute_sd::utils::config_loader;
use yc_compute_sd::utils::logging::{self, LogLevel};
use yc_compute_sd::Discovery;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "yc-compute-sd.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config.settings, args.log_level);

    // -------------------------------
    // 2. Build token provider and cloud clients
    // -------------------------------

    let discovery = Arc::new(Discovery::from_config(&service_config)?);

    // -------------------------------
    // 3. Serve discovery endpoints, sample process metrics
    // -------------------------------

    let settings = &service_config.settings;
    let metrics_enabled = settings.metrics.is_enabled;
    let service_metrics = tokio::spawn(async move {
        if let Err(err) = collect_process_metrics(metrics_enabled).await {
            warn!("process metrics disabled: {}", err);
        }
    });

    info!("Service starting...");
    server::server::start(settings, discovery).await?;

    service_metrics.abort();
    Ok(())
}
