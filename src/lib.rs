//! Usage metrics and KPI reporting for Open WebUI deployments.
//!
//! Two binaries share this library:
//!
//! - `webui-exporter` reads Open WebUI's SQLite database on a schedule,
//!   aggregates chat usage into a consistent snapshot, and exports it as
//!   OpenTelemetry gauges over OTLP. See [`collector`] and [`metrics`].
//! - `kpi-report` queries Prometheus for a time window and prints a
//!   plain-text KPI summary (active users, token throughput, latency,
//!   per-model breakdown). See [`report`].

pub mod chat;
pub mod collector;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod report;
pub mod telemetry;

pub use config::Config;
pub use errors::{Error, Result};
