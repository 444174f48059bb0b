//! Query Cores
//!
//! A query core answers point-in-time questions about one series on top of a
//! [`TimeKeyedStore`](crate::store::TimeKeyedStore). Two interchangeable cores
//! exist, selected by [`QueryCoreKind`](crate::config::QueryCoreKind):
//!
//! | Core | Trailing requests |
//! |------|-------------------|
//! | [`DefaultQueryCore`] | walk the store on every call |
//! | [`CachedQueryCore`] | reuse a sliding window of the last request's entries |
//!
//! Both return identical results for identical store contents; the cached
//! core only changes how many store lookups are needed.
//!
//! # Key Adjustment
//!
//! Unless [`QueryOptions::future`] is set, every requested key is first
//! clamped to the highest key allowed by the
//! [`AdjustKeyProvider`](crate::adjust::AdjustKeyProvider). All further
//! semantics refer to that *adjusted key*.
//!
//! # Trailing Semantics
//!
//! ```text
//!   entries:   1990   1991   1992   1993   1994   1995
//!                                    ▲ adjusted key 1993-07-01
//!   previous_entry(shift 0) = 1993
//!   previous_entry(shift 2) = 1991
//!   previous_entries(3)     = [1991, 1992, 1993]
//!   next_entry(shift 0)     = 1994
//! ```
//!
//! Past the start of the series `previous_entry` returns the oldest entry
//! reached and `previous_entries` returns fewer entries than requested.

use crate::entry::{HistoricalEntry, TimeKey};
use crate::error::{QueryError, QueryResult};
use crate::metrics::CacheMetrics;

mod cached;
mod default;
mod window;

pub use cached::CachedQueryCore;
pub use default::DefaultQueryCore;

/// What a single-value request demands of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssertValue {
    /// Nearest entry at or before the key, `None` when there is none.
    #[default]
    Lenient,
    /// Only an entry exactly at the key, otherwise `None`.
    Exact,
    /// Nearest entry at or before the key, an error when there is none.
    Required,
    /// Only an entry exactly at the key, an error otherwise.
    RequiredExact,
}

impl AssertValue {
    /// Whether a missing result is an error.
    pub fn is_required(self) -> bool {
        matches!(self, AssertValue::Required | AssertValue::RequiredExact)
    }

    /// Whether only an exact key match counts.
    pub fn is_exact(self) -> bool {
        matches!(self, AssertValue::Exact | AssertValue::RequiredExact)
    }

    /// Applies the policy to the nearest entry found for `key`.
    pub fn apply<V>(
        self,
        key: TimeKey,
        found: Option<HistoricalEntry<V>>,
    ) -> QueryResult<Option<HistoricalEntry<V>>> {
        match found {
            Some(entry) if self.is_exact() && entry.key != key => {
                if self.is_required() {
                    Err(QueryError::KeyMismatch {
                        requested: key,
                        found: entry.key,
                    })
                } else {
                    Ok(None)
                }
            }
            Some(entry) => Ok(Some(entry)),
            None => self.require(key, 0, None),
        }
    }

    /// Turns a missing result into an error when the policy demands a value.
    pub fn require<T>(self, key: TimeKey, units: usize, found: Option<T>) -> QueryResult<Option<T>> {
        match found {
            None if self.is_required() => Err(QueryError::NoDataAvailable { key, units }),
            found => Ok(found),
        }
    }
}

/// Per-request options.
///
/// Cores read `future` and `assert_value`; the remaining fields shape the
/// results of [`HistoricalQuery`](crate::HistoricalQuery).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Skip clamping the key to the highest allowed key.
    pub future: bool,
    /// Return only distinct entries instead of padding trailing results.
    pub filter_duplicate_keys: bool,
    /// Policy for single-value results.
    pub assert_value: AssertValue,
    /// Cap on the number of results of range scans.
    pub max_results: Option<usize>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            future: false,
            filter_duplicate_keys: true,
            assert_value: AssertValue::Lenient,
            max_results: None,
        }
    }
}

/// Point-in-time query operations over one series.
pub trait QueryCore<V>: CacheMetrics + Send + Sync {
    /// Entry in effect at the adjusted key, filtered by the assert-value policy.
    fn entry(&self, key: TimeKey, options: &QueryOptions) -> QueryResult<Option<HistoricalEntry<V>>>;

    /// The entry `shift` positions before the one in effect at the adjusted key.
    fn previous_entry(
        &self,
        key: TimeKey,
        shift: usize,
        options: &QueryOptions,
    ) -> QueryResult<Option<HistoricalEntry<V>>>;

    /// Up to `count` entries ending with the one in effect at the adjusted
    /// key, ascending.
    fn previous_entries(
        &self,
        key: TimeKey,
        count: usize,
        options: &QueryOptions,
    ) -> QueryResult<Vec<HistoricalEntry<V>>>;

    /// The entry `shift` positions after the first one at or after the
    /// adjusted key.
    fn next_entry(
        &self,
        key: TimeKey,
        shift: usize,
        options: &QueryOptions,
    ) -> QueryResult<Option<HistoricalEntry<V>>>;

    /// Up to `count` entries starting with the first one at or after the
    /// adjusted key, ascending.
    fn next_entries(
        &self,
        key: TimeKey,
        count: usize,
        options: &QueryOptions,
    ) -> QueryResult<Vec<HistoricalEntry<V>>>;

    /// Drops any reusable state.
    fn clear(&self);

    /// Grows the reusable state's maximum size; never shrinks it.
    fn increase_maximum_size(&self, size: usize);

    /// Current maximum size of the reusable state, `None` when unbounded or
    /// when the core keeps no state.
    fn maximum_size(&self) -> Option<usize>;
}
