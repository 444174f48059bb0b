//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::{Datelike, Duration, TimeZone, Utc};
use historical_cache::config::{HistoricalCacheConfig, QueryCoreKind};
use historical_cache::store::GapLoader;
use historical_cache::{
    AdjustKeyProvider, BoxError, HistoricalCache, HistoricalEntry, RefreshManager, TimeKey,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn key(year: i32) -> TimeKey {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
}

pub fn yearly_keys() -> Vec<TimeKey> {
    (1990..1996).map(key).collect()
}

/// A date well after every fixture entry.
pub fn now() -> TimeKey {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

#[derive(Debug, thiserror::Error)]
#[error("backend unavailable")]
pub struct BackendError;

#[derive(Default)]
struct Inner {
    entities: RwLock<BTreeMap<TimeKey, i64>>,
    bulk_loads: AtomicUsize,
    probes: AtomicUsize,
    failing: RwLock<bool>,
    blind_latest: RwLock<bool>,
}

/// In-memory loader counting every call; clones share data and counters.
#[derive(Clone, Default)]
pub struct CountingLoader {
    inner: Arc<Inner>,
    batch_limit: Option<NonZeroUsize>,
}

impl CountingLoader {
    /// Entities keyed by `keys`, valued by their year.
    pub fn with_keys(keys: &[TimeKey]) -> Self {
        let loader = Self::default();
        for k in keys {
            loader.put(*k, i64::from(k.year()));
        }
        loader
    }

    /// Six yearly entities, 1990 to 1995.
    pub fn yearly() -> Self {
        Self::with_keys(&yearly_keys())
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = NonZeroUsize::new(limit);
        self
    }

    pub fn put(&self, key: TimeKey, value: i64) {
        self.inner.entities.write().insert(key, value);
    }

    pub fn newest_key(&self) -> Option<TimeKey> {
        self.inner.entities.read().keys().next_back().copied()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.inner.failing.write() = failing;
    }

    /// Makes `load_latest_at_or_before` find nothing, leaving the bulk
    /// loader as the only way in.
    pub fn set_latest_lookup_blind(&self, blind: bool) {
        *self.inner.blind_latest.write() = blind;
    }

    pub fn bulk_loads(&self) -> usize {
        self.inner.bulk_loads.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.inner.probes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.bulk_loads() + self.probes()
    }

    fn check(&self) -> Result<(), BoxError> {
        if *self.inner.failing.read() {
            Err(Box::new(BackendError))
        } else {
            Ok(())
        }
    }
}

impl GapLoader<i64> for CountingLoader {
    fn load_ascending_from(&self, from: TimeKey) -> Result<Vec<HistoricalEntry<i64>>, BoxError> {
        self.inner.bulk_loads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let entities = self.inner.entities.read();
        let found = entities
            .range(from..)
            .map(|(k, v)| HistoricalEntry::new(*k, *v));
        Ok(match self.batch_limit {
            Some(limit) => found.take(limit.get()).collect(),
            None => found.collect(),
        })
    }

    fn load_latest_at_or_before(
        &self,
        key: TimeKey,
    ) -> Result<Option<HistoricalEntry<i64>>, BoxError> {
        self.inner.probes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if *self.inner.blind_latest.read() {
            return Ok(None);
        }
        let entities = self.inner.entities.read();
        Ok(entities
            .range(..=key)
            .next_back()
            .map(|(k, v)| HistoricalEntry::new(*k, *v)))
    }

    fn previous_key_of(&self, key: TimeKey) -> TimeKey {
        key - Duration::days(1)
    }

    fn next_key_of(&self, key: TimeKey) -> TimeKey {
        key + Duration::days(1)
    }

    fn batch_limit(&self) -> Option<NonZeroUsize> {
        self.batch_limit
    }
}

/// Cache over `loader` with the given core and window size.
pub fn make_cache(
    loader: &CountingLoader,
    core: QueryCoreKind,
    maximum_size: Option<usize>,
) -> HistoricalCache<i64> {
    make_cache_with(loader, core, maximum_size, None, RefreshManager::new())
}

pub fn make_cache_with(
    loader: &CountingLoader,
    core: QueryCoreKind,
    maximum_size: Option<usize>,
    adjust: Option<Arc<dyn AdjustKeyProvider>>,
    refresh: RefreshManager,
) -> HistoricalCache<i64> {
    let config = HistoricalCacheConfig {
        core,
        maximum_size: maximum_size.and_then(NonZeroUsize::new),
        ..HistoricalCacheConfig::default()
    };
    HistoricalCache::init(config, loader.clone(), adjust, refresh)
}
