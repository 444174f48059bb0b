//! Gap Store Metrics
//!
//! Counters kept by [`GapStore`](crate::store::GapStore). A lookup is a hit
//! when it is answered from the memo or from the loaded coverage without
//! calling the loader.

use super::{CacheMetrics, CoreCacheMetrics};
use std::collections::BTreeMap;

/// Store-specific metrics (extends CoreCacheMetrics).
#[derive(Debug, Default, Clone)]
pub struct StoreMetrics {
    /// Lookups and lookups answered from memory.
    pub core: CoreCacheMetrics,
    /// Lookups answered from the memo.
    pub memo_hits: u64,
    /// Calls to `load_latest_at_or_before`.
    pub latest_probes: u64,
    /// Calls to `load_ascending_from`.
    pub bulk_loads: u64,
    /// Entries received from bulk loads.
    pub loaded_entries: u64,
    /// Full invalidations caused by a refresh.
    pub refresh_invalidations: u64,
    /// Partial invalidations caused by a moved allowed bound.
    pub bound_invalidations: u64,
}

impl StoreMetrics {
    /// Converts store metrics to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();
        metrics.insert(
            "bound_invalidations".to_string(),
            self.bound_invalidations as f64,
        );
        metrics.insert("bulk_loads".to_string(), self.bulk_loads as f64);
        metrics.insert("latest_probes".to_string(), self.latest_probes as f64);
        metrics.insert("loaded_entries".to_string(), self.loaded_entries as f64);
        metrics.insert("memo_hits".to_string(), self.memo_hits as f64);
        metrics.insert(
            "refresh_invalidations".to_string(),
            self.refresh_invalidations as f64,
        );
        metrics
    }
}

impl CacheMetrics for StoreMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn component_name(&self) -> &'static str {
        "GapStore"
    }
}
