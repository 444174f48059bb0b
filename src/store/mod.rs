//! Time-Keyed Stores
//!
//! The query cores never talk to a database directly. They resolve keys
//! through a [`TimeKeyedStore`], which answers one question: *which entry is in
//! effect at this key?* ("adjusted lookup": the newest entry whose key is at or
//! before the requested one).
//!
//! # Stride Contract
//!
//! Walking backwards through a series works by repeatedly looking up
//! `previous_key_of(entry.key)`. A store must therefore guarantee that the
//! lookup of the previous key of an entry returns that entry's immediate
//! predecessor, i.e. the stride never jumps over a stored key. The same holds
//! for `next_key_of` when paging forwards.
//!
//! ```text
//!   stored:      1990        1991        1992
//!                  ▲           ▲           │
//!                  │ lookup    │ lookup    │ previous_key_of(1992) = 1991-12-31
//!                  │           └───────────┘ ──▶ adjusted_lookup ──▶ 1991
//! ```
//!
//! # Implementations
//!
//! [`GapStore`] turns any [`GapLoader`] (a bulk "load ascending from" query plus
//! a "latest at or before" probe) into a `TimeKeyedStore` that keeps the loaded
//! range in memory and only calls the loader to fill gaps.

use crate::entry::{HistoricalEntry, TimeKey};
use crate::error::{BoxError, QueryResult};
use crate::listener::ValueLoadedListener;
use crate::metrics::CacheMetrics;
use core::num::NonZeroUsize;
use std::sync::Arc;

mod coverage;
mod gap;

pub use gap::GapStore;

/// Lazily evaluated ascending scan over a store.
pub type EntryScan<'a, V> = Box<dyn Iterator<Item = QueryResult<HistoricalEntry<V>>> + 'a>;

/// Key-ordered store consumed by the query cores.
pub trait TimeKeyedStore<V>: CacheMetrics + Send + Sync {
    /// Key that steps one position back from `key`.
    fn previous_key_of(&self, key: TimeKey) -> TimeKey;

    /// Key that steps one position forward from `key`.
    fn next_key_of(&self, key: TimeKey) -> TimeKey;

    /// Newest entry whose key is at or before `key`.
    fn adjusted_lookup(&self, key: TimeKey) -> QueryResult<Option<HistoricalEntry<V>>>;

    /// Every entry with a key at or after `from`, ascending.
    ///
    /// The scan loads lazily; dropping it early stops loading.
    fn entries_ascending_from(&self, from: TimeKey) -> EntryScan<'_, V>;

    /// Drops every cached entry.
    fn clear(&self);

    /// Registers the listener told about newly loaded entries, replacing any
    /// earlier one. Stores that never load from a backend ignore it.
    fn set_value_loaded_listener(&self, _listener: Arc<dyn ValueLoadedListener<V>>) {}
}

/// Data source behind a [`GapStore`].
///
/// Errors are boxed and reach the caller unchanged as the `source` of
/// [`QueryError::Load`](crate::QueryError::Load).
pub trait GapLoader<V>: Send + Sync {
    /// Entries with a key at or after `from`, ascending.
    ///
    /// May return fewer entries than exist; a batch of exactly
    /// [`batch_limit`](Self::batch_limit) entries means more may follow.
    fn load_ascending_from(&self, from: TimeKey) -> Result<Vec<HistoricalEntry<V>>, BoxError>;

    /// Newest entry whose key is at or before `key`.
    fn load_latest_at_or_before(&self, key: TimeKey)
        -> Result<Option<HistoricalEntry<V>>, BoxError>;

    /// Key that steps one position back from `key`. Must not skip stored keys.
    fn previous_key_of(&self, key: TimeKey) -> TimeKey;

    /// Key that steps one position forward from `key`. Must not skip stored keys.
    fn next_key_of(&self, key: TimeKey) -> TimeKey;

    /// Maximum batch size returned by [`load_ascending_from`](Self::load_ascending_from),
    /// `None` when batches are never truncated.
    fn batch_limit(&self) -> Option<NonZeroUsize> {
        None
    }
}
