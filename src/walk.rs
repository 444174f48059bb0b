//! Backward walk over a store.
//!
//! The walk is the reference definition of "the entries at or before a key":
//! look up the key, then repeatedly look up `previous_key_of` the entry just
//! found. It ends when the store has nothing older or when a step makes no
//! progress (the stride landed on the same entry again).

use crate::entry::{HistoricalEntry, TimeKey};
use crate::error::{QueryError, QueryResult};
use crate::store::TimeKeyedStore;

/// Iterator yielding entries newest first.
pub(crate) struct PreviousEntryWalk<'a, V> {
    store: &'a dyn TimeKeyedStore<V>,
    next_key: Option<TimeKey>,
    last: Option<TimeKey>,
    units: usize,
}

impl<'a, V> PreviousEntryWalk<'a, V> {
    /// Walk starting with the entry in effect at `from`.
    pub(crate) fn new(store: &'a dyn TimeKeyedStore<V>, from: TimeKey, units: usize) -> Self {
        Self {
            store,
            next_key: Some(from),
            last: None,
            units,
        }
    }

    /// Walk starting one position before the entry keyed `entry_key`.
    pub(crate) fn before(
        store: &'a dyn TimeKeyedStore<V>,
        entry_key: TimeKey,
        units: usize,
    ) -> Self {
        Self {
            store,
            next_key: Some(store.previous_key_of(entry_key)),
            last: Some(entry_key),
            units,
        }
    }
}

impl<V> Iterator for PreviousEntryWalk<'_, V> {
    type Item = QueryResult<HistoricalEntry<V>>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next_key.take()?;
        let entry = match self.store.adjusted_lookup(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => return Some(Err(err)),
        };
        if entry.key > key {
            return Some(Err(QueryError::invariant(
                key,
                self.units,
                "store returned an entry after the requested key",
            )));
        }
        if self.last.map_or(false, |last| entry.key >= last) {
            return None;
        }
        self.last = Some(entry.key);
        self.next_key = Some(self.store.previous_key_of(entry.key));
        Some(Ok(entry))
    }
}
