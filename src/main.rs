//! Open WebUI metrics exporter.

use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use webui_kpi::collector::UsageCollector;
use webui_kpi::collector::cache::{self, SnapshotCache};
use webui_kpi::config::{Args, Config};
use webui_kpi::{db, metrics, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args)?;
    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_tracing()?;
    info!(
        db = %config.db_path.display(),
        endpoint = %config.otlp_endpoint,
        interval_secs = config.export_interval_secs,
        "Starting Open WebUI metrics exporter"
    );

    db::wait_for_database(&config.db_path).await;
    let pool = db::connect(&config.db_path).await?;

    let provider = telemetry::init_metrics(&config)?;

    let cache = Arc::new(SnapshotCache::new(
        UsageCollector::new(pool.clone()),
        cache::ttl_for_interval(config.export_interval_secs),
    ));
    let meter = opentelemetry::global::meter(metrics::METER_NAME);
    metrics::register_gauges(&meter, cache.clone());

    let shutdown_token = CancellationToken::new();
    let refresh_task = metrics::spawn_refresh_task(cache, shutdown_token.clone());

    info!("Exporter running");
    shutdown_signal().await;
    info!("Shutting down");

    shutdown_token.cancel();
    let _ = refresh_task.await;
    // Flush the final export before the process exits
    provider.shutdown()?;
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
