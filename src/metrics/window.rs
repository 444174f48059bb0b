//! Sliding Window Metrics
//!
//! Counters kept by [`CachedQueryCore`](crate::query_core::CachedQueryCore).
//! A full hit is a trailing request answered from the window alone; a partial
//! hit reused some window entries and loaded the rest from the store.

use super::{CacheMetrics, CoreCacheMetrics};
use std::collections::BTreeMap;

/// Window-specific metrics (extends CoreCacheMetrics).
#[derive(Debug, Default, Clone)]
pub struct WindowMetrics {
    /// Requests and full window hits.
    pub core: CoreCacheMetrics,
    /// Requests that reused part of the window.
    pub partial_hits: u64,
    /// Window replaced by a freshly walked result.
    pub replacements: u64,
    /// Newer entries appended to the window.
    pub appends: u64,
    /// Older entries prepended to the window.
    pub prepends: u64,
    /// Entries trimmed to respect the maximum size.
    pub evicted_entries: u64,
    /// Window dropped because the refresh epoch moved.
    pub refresh_invalidations: u64,
    /// Times the maximum size grew to fit a request.
    pub maximum_size_growths: u64,
}

impl WindowMetrics {
    /// Records a request that reused part of the window.
    pub fn record_partial_hit(&mut self) {
        self.core.record_miss();
        self.partial_hits += 1;
    }

    /// Converts window metrics to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();
        metrics.insert("appends".to_string(), self.appends as f64);
        metrics.insert("evicted_entries".to_string(), self.evicted_entries as f64);
        metrics.insert(
            "maximum_size_growths".to_string(),
            self.maximum_size_growths as f64,
        );
        metrics.insert("partial_hits".to_string(), self.partial_hits as f64);
        metrics.insert("prepends".to_string(), self.prepends as f64);
        metrics.insert(
            "refresh_invalidations".to_string(),
            self.refresh_invalidations as f64,
        );
        metrics.insert("replacements".to_string(), self.replacements as f64);
        metrics
    }
}

impl CacheMetrics for WindowMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn component_name(&self) -> &'static str {
        "CachedQueryCore"
    }
}
