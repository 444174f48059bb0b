//! Sliding Window Query Core
//!
//! [`CachedQueryCore`] keeps the trailing entries of the last multi-entry
//! request in a [`Window`] and shapes the next request's answer from it.
//! Workloads that step forward through time asking for "the last N entries"
//! at every step only touch the store for the entries that are new.
//!
//! # Request Classification
//!
//! For a trailing request of `count` entries at adjusted key `k`, with a
//! window holding `first..=last` and anchored at `anchor`:
//!
//! ```text
//!   same key        k == anchor or k == last.key
//!                   └▶ serve from the window, load older entries if short
//!
//!   incremented     k > last.key and count > 1
//!                   └▶ walk back from k until last.key is reached, serve the
//!                      rest from the window and append the new entries
//!
//!   decremented     k <= anchor and first.key <= k <= last.key
//!                   └▶ serve from the window skipping keys after k, load
//!                      older entries if short and prepend them
//!
//!   anything else   └▶ walk the store and replace the window
//! ```
//!
//! # Window Size
//!
//! Before the window is replaced, appended to or prepended to, a request that
//! needs more entries than the maximum size grows the maximum to twice the
//! requested count. Appends trim the oldest entries, prepends trim the newest
//! ones, so the window always stays a contiguous chain of the store.
//!
//! A single-entry result never replaces a window holding more than one entry.
//!
//! # Thread Safety
//!
//! One `parking_lot::Mutex` guards the window, its maximum size and the last
//! seen refresh epoch. The lock is held from classification through the final
//! window update, store calls included, so no request observes a half-updated
//! window. Single-entry requests and forward requests never take it.

use super::default::DefaultQueryCore;
use super::window::Window;
use super::{QueryCore, QueryOptions};
use crate::adjust::AdjustKeyProvider;
use crate::entry::{HistoricalEntry, TimeKey};
use crate::error::{QueryError, QueryResult};
use crate::metrics::{CacheMetrics, WindowMetrics};
use crate::refresh::RefreshManager;
use crate::store::TimeKeyedStore;
use crate::walk::PreviousEntryWalk;
use core::fmt;
use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Growth factor applied when a request outgrows the window.
const REQUIRED_SIZE_MULTIPLIER: usize = 2;

struct WindowState<V> {
    window: Window<V>,
    maximum_size: Option<usize>,
    epoch: u64,
    metrics: WindowMetrics,
}

impl<V: Clone> WindowState<V> {
    fn grow_to_fit(&mut self, required: usize) {
        if let Some(maximum) = self.maximum_size {
            if maximum < required {
                let grown = required.saturating_mul(REQUIRED_SIZE_MULTIPLIER);
                debug!(from = maximum, to = grown, "window maximum size grown");
                self.maximum_size = Some(grown);
                self.metrics.maximum_size_growths += 1;
            }
        }
    }

    // `trailing` is newest first.
    fn replace(&mut self, adjusted: TimeKey, trailing: &[HistoricalEntry<V>]) {
        if trailing.is_empty() || (trailing.len() == 1 && self.window.len() > 1) {
            return;
        }
        self.grow_to_fit(trailing.len());
        debug!(anchor = %adjusted, entries = trailing.len(), "window replaced");
        self.window.replace(adjusted, trailing.iter().cloned());
        self.metrics.replacements += 1;
    }

    // `newer` is newest first and strictly newer than the window.
    fn append(&mut self, adjusted: TimeKey, newer: &[HistoricalEntry<V>], required: usize) {
        self.grow_to_fit(required);
        self.window.append_newer(adjusted, newer.iter().rev().cloned());
        if let Some(maximum) = self.maximum_size {
            self.metrics.evicted_entries += self.window.trim_oldest(maximum) as u64;
        }
        self.metrics.appends += 1;
    }

    // `older` is newest first and strictly older than the window.
    fn prepend(&mut self, older: &[HistoricalEntry<V>], required: usize) {
        self.grow_to_fit(required);
        self.window.prepend_older(older.iter().cloned());
        if let Some(maximum) = self.maximum_size {
            self.metrics.evicted_entries += self.window.trim_newest(maximum) as u64;
        }
        self.metrics.prepends += 1;
    }

    // Window entries newest first, skipping keys after `skip_above`.
    fn fill(
        &self,
        trailing: &mut Vec<HistoricalEntry<V>>,
        count: usize,
        skip_above: Option<TimeKey>,
    ) {
        let remaining = count.saturating_sub(trailing.len());
        trailing.extend(
            self.window
                .newest_first()
                .filter(|entry| skip_above.map_or(true, |bound| entry.key <= bound))
                .take(remaining)
                .cloned(),
        );
    }
}

/// Query core that reuses a sliding window of trailing entries.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use historical_cache::adjust::UnboundedAdjustKeyProvider;
/// use historical_cache::query_core::{CachedQueryCore, QueryCore, QueryOptions};
/// use historical_cache::store::{GapLoader, GapStore};
/// use historical_cache::{BoxError, HistoricalEntry, RefreshManager, TimeKey};
/// use std::sync::Arc;
///
/// struct Daily;
///
/// impl GapLoader<i64> for Daily {
///     fn load_ascending_from(&self, from: TimeKey) -> Result<Vec<HistoricalEntry<i64>>, BoxError> {
///         Ok((0..30).map(|d| from + Duration::days(d)).map(|k| HistoricalEntry::new(k, k.timestamp())).collect())
///     }
///     fn load_latest_at_or_before(&self, key: TimeKey) -> Result<Option<HistoricalEntry<i64>>, BoxError> {
///         Ok(Some(HistoricalEntry::new(key, key.timestamp())))
///     }
///     fn previous_key_of(&self, key: TimeKey) -> TimeKey { key - Duration::days(1) }
///     fn next_key_of(&self, key: TimeKey) -> TimeKey { key + Duration::days(1) }
/// }
///
/// let store = Arc::new(GapStore::new(Daily));
/// let core = CachedQueryCore::new(store, Arc::new(UnboundedAdjustKeyProvider), RefreshManager::new(), None);
/// let day = Utc.with_ymd_and_hms(2020, 3, 10, 0, 0, 0).unwrap();
/// let options = QueryOptions::default();
///
/// let week = core.previous_entries(day, 7, &options).unwrap();
/// assert_eq!(week.len(), 7);
/// assert_eq!(week.last().unwrap().key, day);
/// assert_eq!(core.window_snapshot(), week);
/// ```
pub struct CachedQueryCore<V> {
    delegate: DefaultQueryCore<V>,
    refresh: RefreshManager,
    state: Mutex<WindowState<V>>,
    bypassed: AtomicU64,
}

impl<V: Clone + Send + Sync> CachedQueryCore<V> {
    /// Creates a core over `store` with an initial window size
    /// (`None` for unbounded).
    pub fn new(
        store: Arc<dyn TimeKeyedStore<V>>,
        adjust: Arc<dyn AdjustKeyProvider>,
        refresh: RefreshManager,
        maximum_size: Option<NonZeroUsize>,
    ) -> Self {
        let state = WindowState {
            window: Window::new(),
            maximum_size: maximum_size.map(NonZeroUsize::get),
            epoch: refresh.epoch(),
            metrics: WindowMetrics::default(),
        };
        Self {
            delegate: DefaultQueryCore::new(store, adjust),
            refresh,
            state: Mutex::new(state),
            bypassed: AtomicU64::new(0),
        }
    }

    /// Copy of the window, oldest first.
    pub fn window_snapshot(&self) -> Vec<HistoricalEntry<V>> {
        self.state.lock().window.snapshot()
    }

    /// Adjusted key the window was last shaped for.
    pub fn anchor_key(&self) -> Option<TimeKey> {
        self.state.lock().window.anchor()
    }

    /// Whether the window is strictly ascending and anchored exactly when
    /// non-empty.
    pub fn window_is_consistent(&self) -> bool {
        self.state.lock().window.is_consistent()
    }

    fn record_bypass(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    fn sync(&self, state: &mut WindowState<V>) {
        let epoch = self.refresh.epoch();
        if epoch != state.epoch {
            debug!(from = state.epoch, to = epoch, "window invalidated by refresh");
            state.window.clear();
            state.epoch = epoch;
            state.metrics.refresh_invalidations += 1;
        }
    }

    // Trailing entries at the adjusted key, ascending; `count` is at least 2.
    fn trailing_entries(
        &self,
        key: TimeKey,
        count: usize,
        options: &QueryOptions,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        let adjusted = self.delegate.adjusted_key(key, options);
        let mut guard = self.state.lock();
        let state = &mut *guard;
        self.sync(state);

        let shape = match (state.window.first(), state.window.last(), state.window.anchor()) {
            (Some(first), Some(last), Some(anchor)) => Some((first.key, last.key, anchor)),
            _ => None,
        };

        let mut trailing = match shape {
            Some((_, last, anchor)) if adjusted == anchor || adjusted == last => {
                trace!(key = %adjusted, count, "same key");
                self.same_key(state, adjusted, count)?
            }
            Some((_, last, anchor)) if (adjusted > anchor || adjusted > last) && count > 1 => {
                trace!(key = %adjusted, count, "incremented key");
                self.incremented(state, adjusted, last, count)?
            }
            Some((first, last, anchor))
                if adjusted <= anchor && first <= adjusted && adjusted <= last =>
            {
                trace!(key = %adjusted, count, "decremented key");
                self.decremented(state, adjusted, count)?
            }
            _ => {
                trace!(key = %adjusted, count, "outside window");
                state.metrics.core.record_miss();
                let trailing = self.delegate.walk_trailing(adjusted, count)?;
                state.replace(adjusted, &trailing);
                trailing
            }
        };

        debug_assert!(state.window.is_consistent());
        trailing.reverse();
        Ok(trailing)
    }

    fn same_key(
        &self,
        state: &mut WindowState<V>,
        adjusted: TimeKey,
        count: usize,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        let mut trailing = Vec::with_capacity(count);
        state.fill(&mut trailing, count, None);
        if trailing.len() < count {
            let older = self.load_further(&trailing, adjusted, count)?;
            if older.is_empty() {
                state.metrics.core.record_hit();
            } else {
                state.metrics.record_partial_hit();
                trailing.extend(older);
                state.replace(adjusted, &trailing);
            }
        } else {
            state.metrics.core.record_hit();
        }
        Ok(trailing)
    }

    fn incremented(
        &self,
        state: &mut WindowState<V>,
        adjusted: TimeKey,
        last_cached: TimeKey,
        count: usize,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        let mut newer = Vec::new();
        let mut reached_window = false;
        for entry in PreviousEntryWalk::new(self.delegate.store(), adjusted, count) {
            let entry = entry?;
            if entry.key == last_cached {
                reached_window = true;
                break;
            }
            newer.push(entry);
            if newer.len() == count {
                break;
            }
        }

        if !reached_window {
            state.metrics.core.record_miss();
            state.replace(adjusted, &newer);
            return Ok(newer);
        }

        let mut trailing = newer.clone();
        state.fill(&mut trailing, count, None);
        if trailing.len() < count {
            let older = self.load_further(&trailing, adjusted, count)?;
            trailing.extend(older);
            state.metrics.record_partial_hit();
            state.replace(adjusted, &trailing);
        } else {
            if newer.is_empty() {
                state.metrics.core.record_hit();
            } else {
                state.metrics.record_partial_hit();
            }
            state.append(adjusted, &newer, trailing.len());
        }
        Ok(trailing)
    }

    fn decremented(
        &self,
        state: &mut WindowState<V>,
        adjusted: TimeKey,
        count: usize,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        let mut trailing = Vec::with_capacity(count);
        state.fill(&mut trailing, count, Some(adjusted));
        if trailing.len() < count {
            let older = self.load_further(&trailing, adjusted, count)?;
            if older.is_empty() {
                state.metrics.core.record_hit();
            } else {
                state.metrics.record_partial_hit();
                trailing.extend(older.iter().cloned());
                state.prepend(&older, trailing.len());
            }
        } else {
            state.metrics.core.record_hit();
        }
        Ok(trailing)
    }

    // Older entries continuing a newest-first trailing list.
    fn load_further(
        &self,
        trailing: &[HistoricalEntry<V>],
        adjusted: TimeKey,
        count: usize,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        let oldest = trailing.last().ok_or_else(|| {
            QueryError::invariant(adjusted, count, "no trailing entry to continue from")
        })?;
        PreviousEntryWalk::before(self.delegate.store(), oldest.key, count)
            .take(count - trailing.len())
            .collect()
    }
}

impl<V: Clone + Send + Sync> QueryCore<V> for CachedQueryCore<V> {
    fn entry(&self, key: TimeKey, options: &QueryOptions) -> QueryResult<Option<HistoricalEntry<V>>> {
        self.record_bypass();
        self.delegate.entry(key, options)
    }

    fn previous_entry(
        &self,
        key: TimeKey,
        shift: usize,
        options: &QueryOptions,
    ) -> QueryResult<Option<HistoricalEntry<V>>> {
        if shift == 0 {
            self.record_bypass();
            return self.delegate.previous_entry(key, 0, options);
        }
        let trailing = self.trailing_entries(key, shift.saturating_add(1), options)?;
        Ok(trailing.into_iter().next())
    }

    fn previous_entries(
        &self,
        key: TimeKey,
        count: usize,
        options: &QueryOptions,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        match count {
            0 => Ok(Vec::new()),
            1 => {
                self.record_bypass();
                Ok(self
                    .delegate
                    .previous_entry(key, 0, options)?
                    .into_iter()
                    .collect())
            }
            _ => self.trailing_entries(key, count, options),
        }
    }

    fn next_entry(
        &self,
        key: TimeKey,
        shift: usize,
        options: &QueryOptions,
    ) -> QueryResult<Option<HistoricalEntry<V>>> {
        self.delegate.next_entry(key, shift, options)
    }

    fn next_entries(
        &self,
        key: TimeKey,
        count: usize,
        options: &QueryOptions,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        self.delegate.next_entries(key, count, options)
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        debug!(entries = state.window.len(), "window cleared");
        state.window.clear();
    }

    fn increase_maximum_size(&self, size: usize) {
        let mut state = self.state.lock();
        if let Some(maximum) = state.maximum_size {
            if size > maximum {
                state.maximum_size = Some(size);
            }
        }
    }

    fn maximum_size(&self) -> Option<usize> {
        self.state.lock().maximum_size
    }
}

impl<V> CacheMetrics for CachedQueryCore<V> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let state = self.state.lock();
        let mut metrics = state.metrics.to_btreemap();
        metrics.insert(
            "bypassed".to_string(),
            self.bypassed.load(Ordering::Relaxed) as f64,
        );
        metrics.insert("window_entries".to_string(), state.window.len() as f64);
        if let Some(maximum) = state.maximum_size {
            metrics.insert("maximum_size".to_string(), maximum as f64);
        }
        metrics
    }

    fn component_name(&self) -> &'static str {
        "CachedQueryCore"
    }
}

impl<V> fmt::Debug for CachedQueryCore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CachedQueryCore")
            .field("window_entries", &state.window.len())
            .field("maximum_size", &state.maximum_size)
            .field("anchor", &state.window.anchor())
            .finish_non_exhaustive()
    }
}
