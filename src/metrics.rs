//! Observable gauge registration and the background cache refresh task.
//!
//! Gauge callbacks run inside the SDK's export cycle and must not block, so
//! they only read [`SnapshotCache::current`]. A background task drives the
//! actual database scans by calling [`SnapshotCache::get`] on a short
//! interval; the cache's TTL decides when a tick turns into a real rescan.

use opentelemetry::KeyValue;
use opentelemetry::metrics::Meter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::collector::cache::{Collect, SnapshotCache};

/// Instrumentation scope name for all exporter gauges
pub const METER_NAME: &str = "openwebui.metrics";

/// How often the refresh task checks the cache. Ticks faster than any sane
/// TTL; `get()` only rescans once the snapshot is actually stale.
const REFRESH_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Register the six Open WebUI gauges against `meter`.
///
/// Each callback reads the cache without refreshing it, so every gauge in a
/// single export cycle observes the same snapshot.
pub fn register_gauges<C: Collect + 'static>(meter: &Meter, cache: Arc<SnapshotCache<C>>) {
    let c = cache.clone();
    meter
        .u64_observable_gauge("openwebui_users_total")
        .with_description("Total number of registered users")
        .with_callback(move |observer| observer.observe(c.current().users_total, &[]))
        .build();

    let c = cache.clone();
    meter
        .u64_observable_gauge("openwebui_users_active_30d")
        .with_description("Users active in the last 30 days")
        .with_callback(move |observer| observer.observe(c.current().users_active_30d, &[]))
        .build();

    let c = cache.clone();
    meter
        .u64_observable_gauge("openwebui_chats_total")
        .with_description("Total number of chats")
        .with_callback(move |observer| observer.observe(c.current().chats_total, &[]))
        .build();

    let c = cache.clone();
    meter
        .u64_observable_gauge("openwebui_messages_total")
        .with_description("Total number of AI responses")
        .with_callback(move |observer| observer.observe(c.current().messages_total, &[]))
        .build();

    let c = cache.clone();
    meter
        .u64_observable_gauge("openwebui_model_usage")
        .with_description("AI responses per model")
        .with_callback(move |observer| {
            let snapshot = c.current();
            for (model, count) in &snapshot.messages_by_model {
                observer.observe(*count, &[KeyValue::new("model", model.clone())]);
            }
        })
        .build();

    meter
        .u64_observable_gauge("openwebui_user_messages")
        .with_description("AI responses per user")
        .with_callback(move |observer| {
            let snapshot = cache.current();
            for (user, count) in &snapshot.messages_by_user {
                observer.observe(*count, &[KeyValue::new("user_name", user.clone())]);
            }
        })
        .build();
}

/// Spawn the task that keeps the cache warm until `shutdown` is cancelled.
///
/// The first tick fires immediately, so a snapshot exists before the first
/// export cycle runs.
pub fn spawn_refresh_task<C: Collect + 'static>(
    cache: Arc<SnapshotCache<C>>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(REFRESH_CHECK_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    cache.get().await;
                }
                _ = shutdown.cancelled() => {
                    debug!("Cache refresh task shutting down");
                    break;
                }
            }
        }
    })
}
