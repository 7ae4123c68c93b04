//! Bounded-staleness cache in front of the usage collector.
//!
//! Every exported gauge reads from the same cached [`UsageSnapshot`], so one
//! export cycle observes one internally consistent aggregation pass. The TTL
//! is derived from the export interval (slightly shorter, so each cycle sees
//! a fresh snapshot) and concurrent cache misses collapse into a single
//! database scan.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{UsageCollector, UsageSnapshot};

/// Floor for the cache TTL, seconds
const MIN_TTL_SECS: u64 = 5;

/// Anything that can produce a [`UsageSnapshot`]. The cache is generic over
/// this so tests can substitute a counting stub for the real collector.
#[async_trait]
pub trait Collect: Send + Sync {
    async fn collect(&self) -> UsageSnapshot;
}

#[async_trait]
impl Collect for UsageCollector {
    async fn collect(&self) -> UsageSnapshot {
        UsageCollector::collect(self).await
    }
}

/// TTL for a given export interval: five seconds shorter than the interval,
/// but never below five seconds.
pub fn ttl_for_interval(export_interval_secs: u64) -> Duration {
    Duration::from_secs(export_interval_secs.saturating_sub(5).max(MIN_TTL_SECS))
}

struct CacheEntry {
    snapshot: Arc<UsageSnapshot>,
    fetched_at: Instant,
}

/// TTL cache holding the most recent snapshot.
///
/// [`SnapshotCache::get`] refreshes when the entry is stale; readers that
/// must not block (gauge callbacks) use [`SnapshotCache::current`] instead,
/// which returns whatever is cached right now, even if stale or empty.
pub struct SnapshotCache<C> {
    collector: C,
    ttl: Duration,
    entry: ArcSwapOption<CacheEntry>,
    refresh: Mutex<()>,
}

impl<C: Collect> SnapshotCache<C> {
    pub fn new(collector: C, ttl: Duration) -> Self {
        Self {
            collector,
            ttl,
            entry: ArcSwapOption::const_empty(),
            refresh: Mutex::new(()),
        }
    }

    /// The cached snapshot as-is, without refreshing. Zeroed before the
    /// first successful refresh.
    pub fn current(&self) -> Arc<UsageSnapshot> {
        self.entry
            .load()
            .as_ref()
            .map(|e| e.snapshot.clone())
            .unwrap_or_default()
    }

    /// The cached snapshot, refreshed first if older than the TTL.
    ///
    /// Concurrent callers that all find the entry stale serialize on the
    /// refresh lock; whoever wins scans once, the rest reuse its result.
    pub async fn get(&self) -> Arc<UsageSnapshot> {
        if let Some(snapshot) = self.fresh() {
            return snapshot;
        }

        let _guard = self.refresh.lock().await;
        // Someone else may have refreshed while we waited for the lock
        if let Some(snapshot) = self.fresh() {
            return snapshot;
        }

        let snapshot = Arc::new(self.collector.collect().await);
        self.entry.store(Some(Arc::new(CacheEntry {
            snapshot: snapshot.clone(),
            fetched_at: Instant::now(),
        })));
        snapshot
    }

    fn fresh(&self) -> Option<Arc<UsageSnapshot>> {
        let entry = self.entry.load();
        entry
            .as_ref()
            .filter(|e| e.fetched_at.elapsed() <= self.ttl)
            .map(|e| e.snapshot.clone())
    }
}
