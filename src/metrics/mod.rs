//! Query Metrics System
//!
//! Provides BTreeMap-based metrics reporting for the query cores and stores.
//! Each component tracks its own counters while implementing the common
//! [`CacheMetrics`] trait, and [`HistoricalCache::metrics`](crate::HistoricalCache::metrics)
//! merges them under a per-component prefix.
//! Keys come back in sorted order, so reports and test assertions are stable.

use std::collections::BTreeMap;

pub mod store;
pub mod window;

pub use store::StoreMetrics;
pub use window::WindowMetrics;

/// Request/hit counters shared by every component.
#[derive(Debug, Default, Clone)]
pub struct CoreCacheMetrics {
    /// Total number of requests served.
    pub requests: u64,
    /// Requests answered without going to the next layer down.
    pub cache_hits: u64,
}

impl CoreCacheMetrics {
    /// Records a request answered from memory.
    pub fn record_hit(&mut self) {
        self.requests += 1;
        self.cache_hits += 1;
    }

    /// Records a request that had to go further down.
    pub fn record_miss(&mut self) {
        self.requests += 1;
    }

    /// Fraction of requests answered from memory (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Converts the counters to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert(
            "cache_misses".to_string(),
            (self.requests - self.cache_hits) as f64,
        );
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("requests".to_string(), self.requests as f64);
        metrics
    }
}

/// Uniform metrics reporting for stores and query cores.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Short name identifying the component (e.g. "GapStore", "CachedQueryCore").
    fn component_name(&self) -> &'static str;
}
