//! Gap-Filling Store
//!
//! [`GapStore`] keeps every entry it has loaded in an ordered map together with
//! one [`Coverage`] interval inside which the loaded entries are known to be
//! complete. A lookup inside the coverage never reaches the loader.
//!
//! # Lookup Resolution
//!
//! ```text
//!   adjusted_lookup(key)
//!        │
//!        ├─ memo hit? ───────────────────────────────▶ cached answer
//!        ├─ key inside coverage? ────────────────────▶ nearest loaded entry
//!        └─ probe: load_latest_at_or_before(key) = p
//!               ├─ none ──▶ nearest loaded entry, after one bulk load
//!               │           from the earliest key if nothing is covered
//!               ├─ nothing loaded yet ──▶ bulk load from p.key
//!               ├─ p older than coverage ──▶ bulk load from p.key
//!               ├─ p newer than anything loaded ──▶ bulk load from coverage end
//!               └─ p already loaded ──▶ no bulk load
//!             coverage grows to include [p.key, key]
//! ```
//!
//! For six yearly entries 1990..1995 an ascending pass of exact lookups costs
//! one bulk load (at 1990) and two probes (1990, and 1995 which sits at the
//! open end of the bulk load). A second pass five days later costs no bulk
//! load at all.
//!
//! A forward scan marks only the span from its first returned entry as
//! complete: the gap between the scan's starting key and that entry may hide
//! the entry in effect there.
//!
//! # Invalidation
//!
//! - A new [`RefreshManager`] epoch drops everything.
//! - A new highest allowed key from the [`AdjustKeyProvider`] drops the memo
//!   and pulls the coverage back to an open bound at the newest loaded entry,
//!   so entries published after it are discovered by the next probe.
//!
//! # Thread Safety
//!
//! All state sits behind one `parking_lot::Mutex`. Loader calls happen while
//! the lock is held, so concurrent misses on the same gap load it once.
//! A registered [`ValueLoadedListener`] is called after the lock is released.

use super::coverage::Coverage;
use super::{EntryScan, GapLoader, TimeKeyedStore};
use crate::adjust::{AdjustKeyProvider, UnboundedAdjustKeyProvider};
use crate::config::GapStoreConfig;
use crate::entry::{HistoricalEntry, TimeKey};
use crate::error::{QueryError, QueryResult};
use crate::listener::ValueLoadedListener;
use crate::metrics::{CacheMetrics, StoreMetrics};
use crate::refresh::RefreshManager;
use core::fmt;
use core::mem;
use core::ops::Bound;
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace};

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

struct GapState<V> {
    loaded: BTreeMap<TimeKey, V>,
    coverage: Option<Coverage>,
    memo: HashMap<TimeKey, Option<HistoricalEntry<V>>>,
    // Set once an empty probe triggered the load from the earliest key.
    loaded_from_start: bool,
    epoch: u64,
    bound: Option<TimeKey>,
    listener: Option<Arc<dyn ValueLoadedListener<V>>>,
    // Newly stored entries not yet handed to the listener.
    unannounced: Vec<HistoricalEntry<V>>,
    metrics: StoreMetrics,
}

impl<V: Clone> GapState<V> {
    fn new(epoch: u64, bound: Option<TimeKey>) -> Self {
        Self {
            loaded: BTreeMap::new(),
            coverage: None,
            memo: HashMap::new(),
            loaded_from_start: false,
            epoch,
            bound,
            listener: None,
            unannounced: Vec::new(),
            metrics: StoreMetrics::default(),
        }
    }

    fn reset(&mut self) {
        self.loaded.clear();
        self.coverage = None;
        self.memo.clear();
        self.loaded_from_start = false;
    }

    // Returns whether `entry.key` was not stored before.
    fn store(&mut self, entry: &HistoricalEntry<V>) -> bool {
        let fresh = self
            .loaded
            .insert(entry.key, entry.value.clone())
            .is_none();
        if fresh && self.listener.is_some() {
            self.unannounced.push(entry.clone());
        }
        fresh
    }

    fn nearest_at_or_before(&self, key: TimeKey) -> Option<HistoricalEntry<V>> {
        self.loaded
            .range(..=key)
            .next_back()
            .map(|(k, v)| HistoricalEntry::new(*k, v.clone()))
    }

    fn extend_coverage(&mut self, incoming: Coverage) {
        self.coverage = Some(match self.coverage {
            Some(current) => current.union(incoming).unwrap_or(incoming),
            None => incoming,
        });
    }

    // Only the entries up to the newest loaded one remain trustworthy.
    fn retreat_coverage(&mut self) {
        let Some(coverage) = self.coverage else {
            return;
        };
        let newest = self.loaded.range(coverage.range()).next_back().map(|(k, _)| *k);
        self.coverage = newest.map(|newest| {
            let until = match coverage.until {
                Bound::Excluded(upper) if upper <= newest => coverage.until,
                _ => Bound::Excluded(newest),
            };
            Coverage::new(coverage.from, until)
        });
    }

    fn remember(&mut self, key: TimeKey, result: Option<HistoricalEntry<V>>, capacity: usize) {
        if self.memo.len() >= capacity {
            self.memo.clear();
        }
        self.memo.insert(key, result);
    }
}

/// In-memory [`TimeKeyedStore`] that fills gaps from a [`GapLoader`].
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use historical_cache::store::{GapLoader, GapStore, TimeKeyedStore};
/// use historical_cache::{BoxError, HistoricalEntry, TimeKey};
///
/// struct Yearly(Vec<TimeKey>);
///
/// impl GapLoader<i32> for Yearly {
///     fn load_ascending_from(&self, from: TimeKey) -> Result<Vec<HistoricalEntry<i32>>, BoxError> {
///         Ok(self.0.iter().filter(|k| **k >= from).map(|k| HistoricalEntry::new(*k, 1)).collect())
///     }
///     fn load_latest_at_or_before(&self, key: TimeKey) -> Result<Option<HistoricalEntry<i32>>, BoxError> {
///         Ok(self.0.iter().rev().find(|k| **k <= key).map(|k| HistoricalEntry::new(*k, 1)))
///     }
///     fn previous_key_of(&self, key: TimeKey) -> TimeKey { key - Duration::days(1) }
///     fn next_key_of(&self, key: TimeKey) -> TimeKey { key + Duration::days(1) }
/// }
///
/// let keys: Vec<TimeKey> = (1990..1996)
///     .map(|y| Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).unwrap())
///     .collect();
/// let store = GapStore::new(Yearly(keys.clone()));
/// let found = store.adjusted_lookup(keys[2] + Duration::days(30)).unwrap();
/// assert_eq!(found.map(|e| e.key), Some(keys[2]));
/// ```
pub struct GapStore<V, L> {
    loader: L,
    adjust: Arc<dyn AdjustKeyProvider>,
    refresh: RefreshManager,
    config: GapStoreConfig,
    state: Mutex<GapState<V>>,
}

impl<V, L> GapStore<V, L>
where
    V: Clone + Send,
    L: GapLoader<V>,
{
    /// Creates a store with default configuration, no key bound and a private
    /// refresh manager.
    pub fn new(loader: L) -> Self {
        Self::init(
            GapStoreConfig::default(),
            loader,
            Arc::new(UnboundedAdjustKeyProvider),
            RefreshManager::new(),
        )
    }

    /// Creates a store that watches `adjust` for newly published data and
    /// `refresh` for invalidation.
    pub fn init(
        config: GapStoreConfig,
        loader: L,
        adjust: Arc<dyn AdjustKeyProvider>,
        refresh: RefreshManager,
    ) -> Self {
        let state = GapState::new(refresh.epoch(), adjust.highest_allowed_key());
        Self {
            loader,
            adjust,
            refresh,
            config,
            state: Mutex::new(state),
        }
    }

    /// The wrapped loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Number of entries held in memory.
    pub fn loaded_len(&self) -> usize {
        self.state.lock().loaded.len()
    }

    fn sync(&self, state: &mut GapState<V>) {
        let epoch = self.refresh.epoch();
        if epoch != state.epoch {
            debug!(from = state.epoch, to = epoch, "gap store invalidated by refresh");
            state.reset();
            state.epoch = epoch;
            state.metrics.refresh_invalidations += 1;
        }
        let bound = self.adjust.highest_allowed_key();
        if bound != state.bound {
            debug!(?bound, "allowed bound moved, dropping memo and open coverage");
            state.bound = bound;
            state.memo.clear();
            state.retreat_coverage();
            state.metrics.bound_invalidations += 1;
        }
    }

    // Releases the lock, then tells the listener about entries stored while
    // it was held.
    fn announce<T>(&self, mut guard: MutexGuard<'_, GapState<V>>, result: T) -> T {
        let pending = mem::take(&mut guard.unannounced);
        let listener = guard.listener.clone();
        drop(guard);
        if let Some(listener) = listener {
            for entry in &pending {
                listener.on_value_loaded(entry.key, &entry.value);
            }
        }
        result
    }

    fn resolve(
        &self,
        state: &mut GapState<V>,
        key: TimeKey,
    ) -> QueryResult<Option<HistoricalEntry<V>>> {
        if let Some(coverage) = state.coverage {
            if coverage.contains(key) {
                state.metrics.core.record_hit();
                return Ok(state.nearest_at_or_before(key));
            }
        }
        state.metrics.core.record_miss();

        let Some(latest) = self.probe(state, key)? else {
            return self.resolve_from_bulk(state, key);
        };
        if latest.key > key {
            return Err(QueryError::invariant(
                key,
                0,
                "loader returned an entry after the requested key",
            ));
        }

        let already_loaded = !state.store(&latest);
        let gap_start = match state.coverage {
            None => Some(latest.key),
            Some(coverage) if latest.key < coverage.from => Some(latest.key),
            Some(coverage) if !already_loaded => {
                Some(coverage.upper_key().unwrap_or(latest.key))
            }
            Some(_) => None,
        };
        if let Some(start) = gap_start {
            self.bulk_load(state, start)?;
        }
        state.extend_coverage(Coverage::new(latest.key, Bound::Included(key)));
        Ok(Some(latest))
    }

    // The probe found nothing, so the bulk loader has to answer: a cold store
    // loads from the earliest key, a key past everything loaded continues from
    // the end of the coverage. The loaded entries answer afterwards.
    fn resolve_from_bulk(
        &self,
        state: &mut GapState<V>,
        key: TimeKey,
    ) -> QueryResult<Option<HistoricalEntry<V>>> {
        let cold = state.coverage.is_none() && !state.loaded_from_start;
        let gap = match state.coverage {
            _ if cold => Some((TimeKey::MIN_UTC, None)),
            Some(coverage)
                if key > coverage.from && state.loaded.range(key..).next().is_none() =>
            {
                coverage.upper_key().map(|upper| (upper, Some(upper)))
            }
            _ => None,
        };
        if let Some((from, covered_from)) = gap {
            debug!(%key, %from, "empty probe, loading ascending instead");
            self.load_until(state, from, covered_from, key)?;
        }
        if cold {
            state.loaded_from_start = true;
        }
        Ok(state.nearest_at_or_before(key))
    }

    // Pages forward from `from` until `key` is passed or the series ends.
    fn load_until(
        &self,
        state: &mut GapState<V>,
        mut from: TimeKey,
        mut covered_from: Option<TimeKey>,
        key: TimeKey,
    ) -> QueryResult<()> {
        loop {
            let (kept, full) = self.fetch(state, from, covered_from)?;
            let Some(newest) = kept.last().map(|e| e.key) else {
                return Ok(());
            };
            let next = self.loader.next_key_of(newest);
            if !full || newest >= key || next <= from {
                return Ok(());
            }
            covered_from = Some(newest);
            from = next;
        }
    }

    fn probe(
        &self,
        state: &mut GapState<V>,
        key: TimeKey,
    ) -> QueryResult<Option<HistoricalEntry<V>>> {
        state.metrics.latest_probes += 1;
        trace!(%key, "probing latest entry");
        self.loader
            .load_latest_at_or_before(key)
            .map_err(|source| QueryError::load(key, source))
    }

    fn bulk_load(&self, state: &mut GapState<V>, start: TimeKey) -> QueryResult<()> {
        state.metrics.bulk_loads += 1;
        let batch = self
            .loader
            .load_ascending_from(start)
            .map_err(|source| QueryError::load(start, source))?;
        debug!(from = %start, entries = batch.len(), "bulk load");
        let kept = self.absorb(state, start, batch);
        if let Some(newest) = kept.last() {
            state.extend_coverage(Coverage::new(start, Bound::Excluded(newest.key)));
        }
        Ok(())
    }

    // Stores the entries of a batch loaded from `start`, returning the kept
    // ones ascending.
    fn absorb(
        &self,
        state: &mut GapState<V>,
        start: TimeKey,
        batch: Vec<HistoricalEntry<V>>,
    ) -> Vec<HistoricalEntry<V>> {
        state.metrics.loaded_entries += batch.len() as u64;
        let mut kept: Vec<HistoricalEntry<V>> =
            batch.into_iter().filter(|e| e.key >= start).collect();
        kept.sort_by_key(|e| e.key);
        kept.dedup_by_key(|e| e.key);
        for entry in &kept {
            state.store(entry);
        }
        kept
    }

    // One forward batch from `from`; `true` when more batches may follow.
    //
    // The batch only proves completeness from its own first entry, or from
    // `covered_from` when nothing can exist between that key and `from`.
    fn fetch(
        &self,
        state: &mut GapState<V>,
        from: TimeKey,
        covered_from: Option<TimeKey>,
    ) -> QueryResult<(Vec<HistoricalEntry<V>>, bool)> {
        state.metrics.bulk_loads += 1;
        let batch = self
            .loader
            .load_ascending_from(from)
            .map_err(|source| QueryError::load(from, source))?;
        let full = self
            .loader
            .batch_limit()
            .map_or(false, |limit| batch.len() >= limit.get());
        let kept = self.absorb(state, from, batch);
        if let (Some(first), Some(newest)) = (kept.first(), kept.last()) {
            let covered_from = covered_from.unwrap_or(first.key);
            state.extend_coverage(Coverage::new(covered_from, Bound::Excluded(newest.key)));
        }
        Ok((kept, full))
    }

    fn load_page(
        &self,
        from: TimeKey,
        previous_newest: Option<TimeKey>,
    ) -> QueryResult<(Vec<HistoricalEntry<V>>, bool)> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.sync(state);
        let page = self.fetch(state, from, previous_newest);
        self.announce(guard, page)
    }
}

impl<V, L> TimeKeyedStore<V> for GapStore<V, L>
where
    V: Clone + Send,
    L: GapLoader<V>,
{
    fn previous_key_of(&self, key: TimeKey) -> TimeKey {
        self.loader.previous_key_of(key)
    }

    fn next_key_of(&self, key: TimeKey) -> TimeKey {
        self.loader.next_key_of(key)
    }

    fn adjusted_lookup(&self, key: TimeKey) -> QueryResult<Option<HistoricalEntry<V>>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.sync(state);

        if let Some(hit) = state.memo.get(&key) {
            let hit = hit.clone();
            state.metrics.memo_hits += 1;
            state.metrics.core.record_hit();
            return Ok(hit);
        }

        let resolved = self.resolve(state, key);
        if let Ok(found) = &resolved {
            state.remember(key, found.clone(), self.config.lookup_memo_capacity.get());
        }
        self.announce(guard, resolved)
    }

    fn entries_ascending_from(&self, from: TimeKey) -> EntryScan<'_, V> {
        Box::new(AscendingScan {
            store: self,
            cursor: Some(from),
            previous_newest: None,
            buffer: VecDeque::new(),
            last_yielded: None,
        })
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        debug!(entries = state.loaded.len(), "gap store cleared");
        state.reset();
    }

    fn set_value_loaded_listener(&self, listener: Arc<dyn ValueLoadedListener<V>>) {
        self.state.lock().listener = Some(listener);
    }
}

impl<V, L> CacheMetrics for GapStore<V, L> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.state.lock().metrics.to_btreemap()
    }

    fn component_name(&self) -> &'static str {
        "GapStore"
    }
}

impl<V, L> fmt::Debug for GapStore<V, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("GapStore")
            .field("config", &self.config)
            .field("loaded", &state.loaded.len())
            .field("coverage", &state.coverage)
            .field("epoch", &state.epoch)
            .finish_non_exhaustive()
    }
}

struct AscendingScan<'a, V, L> {
    store: &'a GapStore<V, L>,
    cursor: Option<TimeKey>,
    previous_newest: Option<TimeKey>,
    buffer: VecDeque<HistoricalEntry<V>>,
    last_yielded: Option<TimeKey>,
}

impl<V, L> Iterator for AscendingScan<'_, V, L>
where
    V: Clone + Send,
    L: GapLoader<V>,
{
    type Item = QueryResult<HistoricalEntry<V>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                if self.last_yielded.map_or(true, |last| entry.key > last) {
                    self.last_yielded = Some(entry.key);
                    return Some(Ok(entry));
                }
                continue;
            }

            let from = self.cursor.take()?;
            let (page, more) = match self.store.load_page(from, self.previous_newest) {
                Ok(page) => page,
                Err(err) => return Some(Err(err)),
            };
            if more {
                if let Some(newest) = page.last() {
                    let next = self.store.loader.next_key_of(newest.key);
                    if next > from {
                        self.cursor = Some(next);
                        self.previous_newest = Some(newest.key);
                    }
                }
            }
            if page.is_empty() {
                return None;
            }
            self.buffer.extend(page);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjust::PushingAdjustKeyProvider;
    use crate::error::BoxError;
    use chrono::{Datelike, Duration, TimeZone, Utc};
    use core::num::NonZeroUsize;
    use parking_lot::RwLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(year: i32) -> TimeKey {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct VecLoader {
        keys: RwLock<Vec<TimeKey>>,
        bulk: AtomicUsize,
        probes: AtomicUsize,
        limit: Option<NonZeroUsize>,
        blind_latest: bool,
    }

    impl VecLoader {
        fn yearly(from: i32, to: i32) -> Self {
            Self {
                keys: RwLock::new((from..=to).map(key).collect()),
                ..Self::default()
            }
        }
    }

    impl GapLoader<i32> for VecLoader {
        fn load_ascending_from(
            &self,
            from: TimeKey,
        ) -> Result<Vec<HistoricalEntry<i32>>, BoxError> {
            self.bulk.fetch_add(1, Ordering::SeqCst);
            let keys = self.keys.read();
            let found = keys
                .iter()
                .filter(|k| **k >= from)
                .map(|k| HistoricalEntry::new(*k, k.year()));
            Ok(match self.limit {
                Some(limit) => found.take(limit.get()).collect(),
                None => found.collect(),
            })
        }

        fn load_latest_at_or_before(
            &self,
            key: TimeKey,
        ) -> Result<Option<HistoricalEntry<i32>>, BoxError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.blind_latest {
                return Ok(None);
            }
            let keys = self.keys.read();
            Ok(keys
                .iter()
                .rev()
                .find(|k| **k <= key)
                .map(|k| HistoricalEntry::new(*k, k.year())))
        }

        fn previous_key_of(&self, key: TimeKey) -> TimeKey {
            key - Duration::days(1)
        }

        fn next_key_of(&self, key: TimeKey) -> TimeKey {
            key + Duration::days(1)
        }

        fn batch_limit(&self) -> Option<NonZeroUsize> {
            self.limit
        }
    }

    #[test]
    fn test_lookup_inside_coverage_skips_loader() {
        let store = GapStore::new(VecLoader::yearly(1990, 1995));
        let first = store.adjusted_lookup(key(1990)).unwrap().unwrap();
        assert_eq!(first.value, 1990);

        let mid = store.adjusted_lookup(key(1992) + Duration::days(10)).unwrap().unwrap();
        assert_eq!(mid.value, 1992);
        assert_eq!(store.loader().bulk.load(Ordering::SeqCst), 1);
        assert_eq!(store.loader().probes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lookup_before_first_entry_is_none() {
        let store = GapStore::new(VecLoader::yearly(1990, 1995));
        assert!(store.adjusted_lookup(key(1980)).unwrap().is_none());
        assert_eq!(store.loader().bulk.load(Ordering::SeqCst), 1);
        // memoized
        assert!(store.adjusted_lookup(key(1980)).unwrap().is_none());
        assert_eq!(store.loader().probes.load(Ordering::SeqCst), 1);

        assert_eq!(store.adjusted_lookup(key(1992)).unwrap().unwrap().value, 1992);
        assert_eq!(store.loader().bulk.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scan_does_not_cover_gap_before_first_entry() {
        let store = GapStore::new(VecLoader::yearly(1990, 1995));
        let next = store.entries_ascending_from(key(1993) + Duration::days(150)).next();
        assert_eq!(next.unwrap().unwrap().value, 1994);

        let found = store.adjusted_lookup(key(1993) + Duration::days(200)).unwrap();
        assert_eq!(found.unwrap().value, 1993);
    }

    #[test]
    fn test_truncated_scan_pages_join_coverage() {
        let loader = VecLoader {
            limit: NonZeroUsize::new(2),
            ..VecLoader::yearly(1990, 1995)
        };
        let store = GapStore::new(loader);
        assert_eq!(store.entries_ascending_from(key(1990)).count(), 6);
        let coverage = store.state.lock().coverage.unwrap();
        assert_eq!(coverage.from, key(1990));
        assert_eq!(coverage.until, Bound::Excluded(key(1995)));
    }

    #[test]
    fn test_missing_latest_entry_falls_back_to_bulk_load() {
        let loader = VecLoader {
            blind_latest: true,
            limit: NonZeroUsize::new(4),
            ..VecLoader::yearly(1990, 1995)
        };
        let store = GapStore::new(loader);
        for year in 1990..=1995 {
            assert_eq!(store.adjusted_lookup(key(year)).unwrap().unwrap().value, year);
        }
        assert_eq!(store.loader().bulk.load(Ordering::SeqCst), 2);
        assert!(store.adjusted_lookup(key(1985)).unwrap().is_none());
    }

    #[test]
    fn test_listener_hears_each_new_key_once() {
        let heard = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let store = GapStore::new(VecLoader::yearly(1990, 1995));
        let sink = Arc::clone(&heard);
        store.set_value_loaded_listener(Arc::new(move |key: TimeKey, value: &i32| {
            sink.lock().push((key, *value));
        }));

        for year in 1990..=1995 {
            store.adjusted_lookup(key(year)).unwrap();
        }
        store.adjusted_lookup(key(1992)).unwrap();

        let years: Vec<i32> = heard.lock().iter().map(|(_, v)| *v).collect();
        assert_eq!(years, vec![1990, 1991, 1992, 1993, 1994, 1995]);
    }

    #[test]
    fn test_refresh_drops_loaded_entries() {
        let refresh = RefreshManager::new();
        let store = GapStore::init(
            GapStoreConfig::default(),
            VecLoader::yearly(1990, 1995),
            Arc::new(UnboundedAdjustKeyProvider),
            refresh.clone(),
        );
        store.adjusted_lookup(key(1991)).unwrap();
        assert_eq!(store.loaded_len(), 5);

        refresh.refresh();
        store.adjusted_lookup(key(1994)).unwrap();
        assert_eq!(store.loaded_len(), 2);
        assert_eq!(store.metrics()["refresh_invalidations"], 1.0);
    }

    #[test]
    fn test_new_bound_reveals_appended_entry() {
        let adjust = Arc::new(PushingAdjustKeyProvider::new(Some(key(1995))));
        let store = GapStore::init(
            GapStoreConfig::default(),
            VecLoader::yearly(1990, 1995),
            adjust.clone(),
            RefreshManager::new(),
        );
        assert_eq!(store.adjusted_lookup(key(1996)).unwrap().unwrap().value, 1995);

        store.loader().keys.write().push(key(1996));
        adjust.push_highest_allowed_key(Some(key(1996)));
        assert_eq!(store.adjusted_lookup(key(1996)).unwrap().unwrap().value, 1996);
        assert_eq!(store.adjusted_lookup(key(1993)).unwrap().unwrap().value, 1993);
    }

    #[test]
    fn test_memo_is_bounded() {
        let store = GapStore::init(
            GapStoreConfig {
                lookup_memo_capacity: NonZeroUsize::new(2).unwrap(),
            },
            VecLoader::yearly(1990, 1995),
            Arc::new(UnboundedAdjustKeyProvider),
            RefreshManager::new(),
        );
        for year in 1990..1996 {
            store.adjusted_lookup(key(year)).unwrap();
        }
        assert!(store.state.lock().memo.len() <= 2);
    }

    #[test]
    fn test_scan_pages_through_truncated_batches() {
        let loader = VecLoader {
            limit: NonZeroUsize::new(2),
            ..VecLoader::yearly(1990, 1995)
        };
        let store = GapStore::new(loader);
        let years: Vec<i32> = store
            .entries_ascending_from(key(1991))
            .map(|e| e.unwrap().value)
            .collect();
        assert_eq!(years, vec![1991, 1992, 1993, 1994, 1995]);
        assert_eq!(store.loader().bulk.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_scan_stops_when_dropped() {
        let loader = VecLoader {
            limit: NonZeroUsize::new(2),
            ..VecLoader::yearly(1990, 1995)
        };
        let store = GapStore::new(loader);
        let first: Vec<_> = store.entries_ascending_from(key(1990)).take(1).collect();
        assert_eq!(first.len(), 1);
        assert_eq!(store.loader().bulk.load(Ordering::SeqCst), 1);
    }
}
