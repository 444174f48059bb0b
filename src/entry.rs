//! Time-Keyed Entry Type
//!
//! This module provides the `HistoricalEntry<V>` structure used everywhere a
//! point in a time series changes hands: loaders return it, the gap store keeps
//! it, the sliding window holds it, and the query front end hands out copies of
//! it.
//!
//! # Keys
//!
//! Every series is keyed by [`TimeKey`], a UTC timestamp. Entries that share a
//! timestamp are considered the same logical record, so stores keep at most one
//! entry per key.
//!
//! # Ordering
//!
//! Entries compare by key only when sorting collections. Value equality is
//! still part of `PartialEq` so tests can assert on complete entries.
//!
//! ```text
//!   older ──────────────────────────────────────────▶ newer
//!   ┌────────────┐  ┌────────────┐  ┌────────────┐
//!   │ 1990-01-01 │  │ 1991-01-01 │  │ 1992-01-01 │   ascending, newest last
//!   └────────────┘  └────────────┘  └────────────┘
//! ```

use chrono::{DateTime, Utc};
use core::fmt;

/// The ordered key of every series handled by this crate.
pub type TimeKey = DateTime<Utc>;

/// A single point of a time series: the key it is valid from and its value.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use historical_cache::HistoricalEntry;
///
/// let key = Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap();
/// let entry = HistoricalEntry::new(key, "first");
/// assert_eq!(entry.key, key);
/// assert_eq!(entry.value, "first");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct HistoricalEntry<V> {
    /// Timestamp from which the value is valid.
    pub key: TimeKey,
    /// The stored value.
    pub value: V,
}

impl<V> HistoricalEntry<V> {
    /// Creates a new entry.
    pub fn new(key: TimeKey, value: V) -> Self {
        Self { key, value }
    }

    /// Consumes the entry and returns its value.
    pub fn into_value(self) -> V {
        self.value
    }

    /// Maps the value while keeping the key.
    pub fn map<U, F>(self, f: F) -> HistoricalEntry<U>
    where
        F: FnOnce(V) -> U,
    {
        HistoricalEntry {
            key: self.key,
            value: f(self.value),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for HistoricalEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoricalEntry")
            .field("key", &self.key.to_rfc3339())
            .field("value", &self.value)
            .finish()
    }
}
