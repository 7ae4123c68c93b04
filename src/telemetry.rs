//! Telemetry initialization: tracing subscriber plus the OTLP metrics
//! pipeline.
//!
//! Logging uses tracing-subscriber with an `EnvFilter` (set `RUST_LOG` to
//! adjust verbosity, default `info`). Metrics are pushed over OTLP gRPC by a
//! periodic reader; the export interval comes from [`Config`]. The returned
//! [`SdkMeterProvider`] must be kept alive for the lifetime of the process
//! and shut down explicitly on exit so the final export is flushed.

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

/// Initialize the tracing subscriber (console output with env filter)
pub fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Build the OTLP metrics pipeline and install it as the global meter
/// provider.
///
/// The periodic reader exports every `export_interval_secs`; observable
/// gauge callbacks registered against the global meter run at each export.
pub fn init_metrics(config: &Config) -> anyhow::Result<SdkMeterProvider> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(config.export_interval_secs))
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(
            Resource::builder()
                .with_attribute(KeyValue::new("service.name", config.service_name.clone()))
                .build(),
        )
        .build();

    opentelemetry::global::set_meter_provider(provider.clone());

    Ok(provider)
}
