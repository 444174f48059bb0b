//! Adjust-Key Providers
//!
//! An adjust-key provider knows the highest key a query may observe. Queries
//! that are not flagged as `future` clamp their key down to that bound before
//! anything is looked up, so a live series never leaks entries that are not
//! yet published.
//!
//! # Variants
//!
//! | Provider | Bound comes from |
//! |----------|------------------|
//! | [`UnboundedAdjustKeyProvider`] | nowhere, keys are never clamped |
//! | [`PullingAdjustKeyProvider`] | a closure evaluated on every call |
//! | [`PushingAdjustKeyProvider`] | the last value pushed by the data source |
//!
//! The pulling variant always reflects the data source at call time. The
//! pushing variant trades that for a lock-guarded read of a cached value and
//! relies on the data source to push every new bound.
//!
//! # Examples
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use historical_cache::adjust::{AdjustKeyProvider, PushingAdjustKeyProvider};
//!
//! let provider = PushingAdjustKeyProvider::new(None);
//! let bound = Utc.with_ymd_and_hms(1995, 1, 1, 0, 0, 0).unwrap();
//! let later = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
//!
//! assert_eq!(provider.adjust_key(later), later);
//! provider.push_highest_allowed_key(Some(bound));
//! assert_eq!(provider.adjust_key(later), bound);
//! ```

use crate::entry::TimeKey;
use core::fmt;
use parking_lot::RwLock;

/// Supplies the highest key a non-future query may observe.
pub trait AdjustKeyProvider: Send + Sync {
    /// Highest allowed key, or `None` when every key is allowed.
    fn highest_allowed_key(&self) -> Option<TimeKey>;

    /// Clamps `key` to [`highest_allowed_key`](Self::highest_allowed_key).
    fn adjust_key(&self, key: TimeKey) -> TimeKey {
        match self.highest_allowed_key() {
            Some(bound) if key > bound => bound,
            _ => key,
        }
    }
}

/// Provider that never clamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnboundedAdjustKeyProvider;

impl AdjustKeyProvider for UnboundedAdjustKeyProvider {
    fn highest_allowed_key(&self) -> Option<TimeKey> {
        None
    }
}

/// Provider that asks a closure for the bound on every call.
///
/// The closure should be cheap; it runs once per query and once per store
/// lookup.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use historical_cache::adjust::{AdjustKeyProvider, PullingAdjustKeyProvider};
///
/// let newest = Utc.with_ymd_and_hms(1995, 1, 1, 0, 0, 0).unwrap();
/// let provider = PullingAdjustKeyProvider::new(move || Some(newest));
/// assert_eq!(provider.highest_allowed_key(), Some(newest));
/// ```
pub struct PullingAdjustKeyProvider<F> {
    pull: F,
}

impl<F> PullingAdjustKeyProvider<F>
where
    F: Fn() -> Option<TimeKey> + Send + Sync,
{
    /// Creates a provider backed by `pull`.
    pub fn new(pull: F) -> Self {
        Self { pull }
    }
}

impl<F> AdjustKeyProvider for PullingAdjustKeyProvider<F>
where
    F: Fn() -> Option<TimeKey> + Send + Sync,
{
    fn highest_allowed_key(&self) -> Option<TimeKey> {
        (self.pull)()
    }
}

impl<F> fmt::Debug for PullingAdjustKeyProvider<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PullingAdjustKeyProvider").finish_non_exhaustive()
    }
}

/// Provider holding the last bound pushed by the data source.
#[derive(Debug, Default)]
pub struct PushingAdjustKeyProvider {
    highest: RwLock<Option<TimeKey>>,
}

impl PushingAdjustKeyProvider {
    /// Creates a provider with an initial bound (`None` means unbounded).
    pub fn new(initial: Option<TimeKey>) -> Self {
        Self {
            highest: RwLock::new(initial),
        }
    }

    /// Publishes a new bound. Readers see it on their next call.
    pub fn push_highest_allowed_key(&self, key: Option<TimeKey>) {
        *self.highest.write() = key;
    }
}

impl AdjustKeyProvider for PushingAdjustKeyProvider {
    fn highest_allowed_key(&self) -> Option<TimeKey> {
        *self.highest.read()
    }
}
