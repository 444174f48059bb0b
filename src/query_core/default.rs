//! Stateless query core.
//!
//! Every request is answered by walking the store, so this core is the
//! reference the cached core is measured against.

use super::{QueryCore, QueryOptions};
use crate::adjust::AdjustKeyProvider;
use crate::entry::{HistoricalEntry, TimeKey};
use crate::error::{QueryError, QueryResult};
use crate::metrics::CacheMetrics;
use crate::store::TimeKeyedStore;
use crate::walk::PreviousEntryWalk;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Query core that walks the store for every request.
pub struct DefaultQueryCore<V> {
    store: Arc<dyn TimeKeyedStore<V>>,
    adjust: Arc<dyn AdjustKeyProvider>,
    requests: AtomicU64,
}

impl<V: Clone> DefaultQueryCore<V> {
    /// Creates a core over `store`, clamping keys with `adjust`.
    pub fn new(store: Arc<dyn TimeKeyedStore<V>>, adjust: Arc<dyn AdjustKeyProvider>) -> Self {
        Self {
            store,
            adjust,
            requests: AtomicU64::new(0),
        }
    }

    /// The store this core reads from.
    pub fn store(&self) -> &dyn TimeKeyedStore<V> {
        &*self.store
    }

    pub(crate) fn adjusted_key(&self, key: TimeKey, options: &QueryOptions) -> TimeKey {
        if options.future {
            key
        } else {
            self.adjust.adjust_key(key)
        }
    }

    // Highest key a forward scan may return.
    fn scan_bound(&self, options: &QueryOptions) -> Option<TimeKey> {
        if options.future {
            None
        } else {
            self.adjust.highest_allowed_key()
        }
    }

    fn count_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Entries newest first, walking from the adjusted key.
    pub(crate) fn walk_trailing(
        &self,
        adjusted: TimeKey,
        count: usize,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        PreviousEntryWalk::new(self.store(), adjusted, count)
            .take(count)
            .collect()
    }

    fn forward(
        &self,
        key: TimeKey,
        options: &QueryOptions,
    ) -> impl Iterator<Item = QueryResult<HistoricalEntry<V>>> + '_ {
        let bound = self.scan_bound(options);
        self.store
            .entries_ascending_from(self.adjusted_key(key, options))
            .take_while(move |found| match (found, bound) {
                (Ok(entry), Some(bound)) => entry.key <= bound,
                _ => true,
            })
    }
}

impl<V: Clone + Send + Sync> QueryCore<V> for DefaultQueryCore<V> {
    fn entry(&self, key: TimeKey, options: &QueryOptions) -> QueryResult<Option<HistoricalEntry<V>>> {
        self.count_request();
        let adjusted = self.adjusted_key(key, options);
        let found = self.store.adjusted_lookup(adjusted)?;
        if found.as_ref().map_or(false, |entry| entry.key > adjusted) {
            return Err(QueryError::invariant(
                adjusted,
                0,
                "store returned an entry after the requested key",
            ));
        }
        options.assert_value.apply(adjusted, found)
    }

    fn previous_entry(
        &self,
        key: TimeKey,
        shift: usize,
        options: &QueryOptions,
    ) -> QueryResult<Option<HistoricalEntry<V>>> {
        self.count_request();
        let adjusted = self.adjusted_key(key, options);
        let steps = shift.saturating_add(1);
        let mut oldest = None;
        for entry in PreviousEntryWalk::new(self.store(), adjusted, steps).take(steps) {
            oldest = Some(entry?);
        }
        Ok(oldest)
    }

    fn previous_entries(
        &self,
        key: TimeKey,
        count: usize,
        options: &QueryOptions,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        self.count_request();
        let mut entries = self.walk_trailing(self.adjusted_key(key, options), count)?;
        entries.reverse();
        Ok(entries)
    }

    fn next_entry(
        &self,
        key: TimeKey,
        shift: usize,
        options: &QueryOptions,
    ) -> QueryResult<Option<HistoricalEntry<V>>> {
        self.count_request();
        let mut newest = None;
        for entry in self.forward(key, options).take(shift.saturating_add(1)) {
            newest = Some(entry?);
        }
        Ok(newest)
    }

    fn next_entries(
        &self,
        key: TimeKey,
        count: usize,
        options: &QueryOptions,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        self.count_request();
        self.forward(key, options).take(count).collect()
    }

    fn clear(&self) {}

    fn increase_maximum_size(&self, _size: usize) {}

    fn maximum_size(&self) -> Option<usize> {
        None
    }
}

impl<V> CacheMetrics for DefaultQueryCore<V> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert(
            "requests".to_string(),
            self.requests.load(Ordering::Relaxed) as f64,
        );
        metrics
    }

    fn component_name(&self) -> &'static str {
        "DefaultQueryCore"
    }
}

impl<V> fmt::Debug for DefaultQueryCore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultQueryCore")
            .field("requests", &self.requests.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
