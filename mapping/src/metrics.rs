use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// A completed entry was reused.
    Hit,
    /// An in-flight computation was joined.
    Join,
    /// A new computation was started.
    Miss,
}

/// Counters for the caching mapper. Every counter is monotonic; invalidation
/// does not reset them.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    joins: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, lookup: Lookup) {
        let counter = match lookup {
            Lookup::Hit => &self.hits,
            Lookup::Join => &self.joins,
            Lookup::Miss => &self.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let joins = self.joins.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);

        let total_requests = hits + joins + misses;
        let hit_rate = if total_requests > 0 {
            (hits + joins) as f32 / total_requests as f32
        } else {
            0.0
        };

        CacheMetricsSnapshot {
            total_requests,
            hits,
            joins,
            misses,
            failures,
            hit_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetricsSnapshot {
    pub total_requests: u64,
    pub hits: u64,
    pub joins: u64,
    pub misses: u64,
    /// Computations that ended in an error and were evicted.
    pub failures: u64,
    /// Share of requests served without starting a computation.
    pub hit_rate: f32,
}
