//! Historical Query Front End
//!
//! [`HistoricalQuery`] is the per-request facade handed out by
//! [`HistoricalCache::query`](crate::HistoricalCache::query). Options are set
//! with consuming builder methods and the query is then run with one of the
//! `get_*` operations:
//!
//! ```text
//!   cache.query()
//!        .with_future(false)                  clamp to the allowed bound
//!        .with_filter_duplicate_keys(false)   pad short trailing results
//!        .with_assert_value(Required)         missing value is an error
//!        .get_previous_values(key, 20)
//! ```
//!
//! # Duplicate Filtering
//!
//! With filtering on (the default) trailing and leading requests return only
//! distinct entries and may come back shorter than requested. With filtering
//! off, a short result is padded to the requested count by repeating the
//! entry at the exhausted end: the oldest one for `get_previous_*` and the
//! newest one for `get_next_*`.
//!
//! # Range Scans
//!
//! `get_entries`, `get_keys` and `get_values` stream straight from the store,
//! never touch the sliding window and honor `max_results`.

use crate::adjust::AdjustKeyProvider;
use crate::entry::{HistoricalEntry, TimeKey};
use crate::error::QueryResult;
use crate::query_core::{AssertValue, QueryCore, QueryOptions};
use crate::store::TimeKeyedStore;
use core::fmt;
use core::iter;

/// A configured query against one [`HistoricalCache`](crate::HistoricalCache).
pub struct HistoricalQuery<'a, V> {
    core: &'a dyn QueryCore<V>,
    store: &'a dyn TimeKeyedStore<V>,
    adjust: &'a dyn AdjustKeyProvider,
    options: QueryOptions,
}

impl<'a, V: Clone + 'a> HistoricalQuery<'a, V> {
    pub(crate) fn new(
        core: &'a dyn QueryCore<V>,
        store: &'a dyn TimeKeyedStore<V>,
        adjust: &'a dyn AdjustKeyProvider,
    ) -> Self {
        Self {
            core,
            store,
            adjust,
            options: QueryOptions::default(),
        }
    }

    /// Allows keys beyond the highest allowed key.
    pub fn with_future(mut self, future: bool) -> Self {
        self.options.future = future;
        self
    }

    /// Returns distinct entries only (`true`, the default) or pads short
    /// trailing results (`false`).
    pub fn with_filter_duplicate_keys(mut self, filter: bool) -> Self {
        self.options.filter_duplicate_keys = filter;
        self
    }

    /// Sets the policy for single-value results.
    pub fn with_assert_value(mut self, assert_value: AssertValue) -> Self {
        self.options.assert_value = assert_value;
        self
    }

    /// Caps the number of results of range scans.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.options.max_results = Some(max_results);
        self
    }

    /// The options this query runs with.
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    // ------------------------------------------------------------------
    // Single entries
    // ------------------------------------------------------------------

    /// Entry in effect at `key`.
    pub fn get_entry(&self, key: TimeKey) -> QueryResult<Option<HistoricalEntry<V>>> {
        self.core.entry(key, &self.options)
    }

    /// Value in effect at `key`.
    pub fn get_value(&self, key: TimeKey) -> QueryResult<Option<V>> {
        Ok(self.get_entry(key)?.map(HistoricalEntry::into_value))
    }

    /// Entry `distance` positions before the one in effect at `key`.
    pub fn get_previous_entry(
        &self,
        key: TimeKey,
        distance: usize,
    ) -> QueryResult<Option<HistoricalEntry<V>>> {
        let found = self.core.previous_entry(key, distance, &self.options)?;
        self.options.assert_value.require(key, distance, found)
    }

    /// Value `distance` positions before the one in effect at `key`.
    pub fn get_previous_value(&self, key: TimeKey, distance: usize) -> QueryResult<Option<V>> {
        Ok(self
            .get_previous_entry(key, distance)?
            .map(HistoricalEntry::into_value))
    }

    /// Key `distance` positions before the one in effect at `key`.
    pub fn get_previous_key(&self, key: TimeKey, distance: usize) -> QueryResult<Option<TimeKey>> {
        Ok(self.get_previous_entry(key, distance)?.map(|e| e.key))
    }

    /// Entry `distance` positions after the first one at or after `key`.
    pub fn get_next_entry(
        &self,
        key: TimeKey,
        distance: usize,
    ) -> QueryResult<Option<HistoricalEntry<V>>> {
        let found = self.core.next_entry(key, distance, &self.options)?;
        self.options.assert_value.require(key, distance, found)
    }

    /// Value `distance` positions after the first one at or after `key`.
    pub fn get_next_value(&self, key: TimeKey, distance: usize) -> QueryResult<Option<V>> {
        Ok(self
            .get_next_entry(key, distance)?
            .map(HistoricalEntry::into_value))
    }

    /// Key `distance` positions after the first one at or after `key`.
    pub fn get_next_key(&self, key: TimeKey, distance: usize) -> QueryResult<Option<TimeKey>> {
        Ok(self.get_next_entry(key, distance)?.map(|e| e.key))
    }

    // ------------------------------------------------------------------
    // Trailing and leading lists
    // ------------------------------------------------------------------

    /// Up to `count` entries ending with the one in effect at `key`, ascending.
    pub fn get_previous_entries(
        &self,
        key: TimeKey,
        count: usize,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        let mut entries = self.core.previous_entries(key, count, &self.options)?;
        if !self.options.filter_duplicate_keys && entries.len() < count {
            if let Some(oldest) = entries.first().cloned() {
                let missing = count - entries.len();
                entries.splice(0..0, iter::repeat(oldest).take(missing));
            }
        }
        Ok(entries)
    }

    /// Values of [`get_previous_entries`](Self::get_previous_entries).
    pub fn get_previous_values(&self, key: TimeKey, count: usize) -> QueryResult<Vec<V>> {
        Ok(self
            .get_previous_entries(key, count)?
            .into_iter()
            .map(HistoricalEntry::into_value)
            .collect())
    }

    /// Keys of [`get_previous_entries`](Self::get_previous_entries).
    pub fn get_previous_keys(&self, key: TimeKey, count: usize) -> QueryResult<Vec<TimeKey>> {
        Ok(self
            .get_previous_entries(key, count)?
            .into_iter()
            .map(|e| e.key)
            .collect())
    }

    /// Up to `count` entries starting with the first one at or after `key`.
    pub fn get_next_entries(
        &self,
        key: TimeKey,
        count: usize,
    ) -> QueryResult<Vec<HistoricalEntry<V>>> {
        let mut entries = self.core.next_entries(key, count, &self.options)?;
        if !self.options.filter_duplicate_keys && entries.len() < count {
            if let Some(newest) = entries.last().cloned() {
                let missing = count - entries.len();
                entries.extend(iter::repeat(newest).take(missing));
            }
        }
        Ok(entries)
    }

    /// Values of [`get_next_entries`](Self::get_next_entries).
    pub fn get_next_values(&self, key: TimeKey, count: usize) -> QueryResult<Vec<V>> {
        Ok(self
            .get_next_entries(key, count)?
            .into_iter()
            .map(HistoricalEntry::into_value)
            .collect())
    }

    // ------------------------------------------------------------------
    // Range scans
    // ------------------------------------------------------------------

    /// Entries with keys in `from..=to`, ascending and lazily loaded.
    pub fn get_entries(
        &self,
        from: TimeKey,
        to: TimeKey,
    ) -> impl Iterator<Item = QueryResult<HistoricalEntry<V>>> + 'a {
        let to = if self.options.future {
            to
        } else {
            self.adjust.adjust_key(to)
        };
        let limit = self.options.max_results.unwrap_or(usize::MAX);
        let store = self.store;
        store
            .entries_ascending_from(from)
            .take_while(move |found| found.as_ref().map_or(true, |entry| entry.key <= to))
            .take(limit)
    }

    /// Keys in `from..=to`, ascending and lazily loaded.
    pub fn get_keys(
        &self,
        from: TimeKey,
        to: TimeKey,
    ) -> impl Iterator<Item = QueryResult<TimeKey>> + 'a {
        self.get_entries(from, to).map(|found| found.map(|e| e.key))
    }

    /// Values with keys in `from..=to`, ascending and lazily loaded.
    pub fn get_values(
        &self,
        from: TimeKey,
        to: TimeKey,
    ) -> impl Iterator<Item = QueryResult<V>> + 'a {
        self.get_entries(from, to)
            .map(|found| found.map(HistoricalEntry::into_value))
    }
}

impl<V> fmt::Debug for HistoricalQuery<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoricalQuery")
            .field("core", &self.core.component_name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
