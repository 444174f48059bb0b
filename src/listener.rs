//! Load Notifications
//!
//! A [`ValueLoadedListener`] hears about every entry a
//! [`GapStore`](crate::store::GapStore) brings in from its loader, once per
//! newly stored key. Notifications are delivered after the store lock is
//! released, in the order the entries were stored.
//!
//! Closures taking `(TimeKey, &V)` are listeners:
//!
//! ```
//! use historical_cache::listener::ValueLoadedListener;
//! use historical_cache::TimeKey;
//! use std::sync::Arc;
//!
//! let listener: Arc<dyn ValueLoadedListener<f64>> =
//!     Arc::new(|key: TimeKey, value: &f64| println!("{key}: {value}"));
//! # let _ = listener;
//! ```

use crate::entry::TimeKey;

/// Callback for entries newly loaded into a store.
pub trait ValueLoadedListener<V>: Send + Sync {
    /// Called once for each key the store did not hold before.
    fn on_value_loaded(&self, key: TimeKey, value: &V);
}

impl<V, F> ValueLoadedListener<V> for F
where
    F: Fn(TimeKey, &V) + Send + Sync,
{
    fn on_value_loaded(&self, key: TimeKey, value: &V) {
        self(key, value)
    }
}
