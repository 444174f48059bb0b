//! Historical Cache
//!
//! [`HistoricalCache`] wires one series together: a
//! [`TimeKeyedStore`], the [`AdjustKeyProvider`] bounding non-future queries,
//! the [`RefreshManager`] that invalidates cached state, and the query core
//! selected by [`HistoricalCacheConfig::core`].
//!
//! ```text
//!   HistoricalCache
//!     ├── query() ──▶ HistoricalQuery ──▶ QueryCore ──▶ TimeKeyedStore ──▶ GapLoader
//!     │                                      │                │
//!     ├── AdjustKeyProvider ─────────────────┴────────────────┘
//!     └── RefreshManager ────────────────────┴────────────────┘
//! ```
//!
//! The cache is `Send + Sync`; share it behind an `Arc` to query one series
//! from several threads.

use crate::adjust::{AdjustKeyProvider, UnboundedAdjustKeyProvider};
use crate::config::{HistoricalCacheConfig, QueryCoreKind};
use crate::listener::ValueLoadedListener;
use crate::query::HistoricalQuery;
use crate::query_core::{CachedQueryCore, DefaultQueryCore, QueryCore};
use crate::refresh::RefreshManager;
use crate::store::{GapLoader, GapStore, TimeKeyedStore};
use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Point-in-time query engine over one time-keyed series.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use historical_cache::store::GapLoader;
/// use historical_cache::{BoxError, HistoricalCache, HistoricalEntry, TimeKey};
///
/// struct Yearly(Vec<TimeKey>);
///
/// impl GapLoader<usize> for Yearly {
///     fn load_ascending_from(&self, from: TimeKey) -> Result<Vec<HistoricalEntry<usize>>, BoxError> {
///         Ok(self.0.iter().enumerate().filter(|(_, k)| **k >= from)
///             .map(|(i, k)| HistoricalEntry::new(*k, i)).collect())
///     }
///     fn load_latest_at_or_before(&self, key: TimeKey) -> Result<Option<HistoricalEntry<usize>>, BoxError> {
///         Ok(self.0.iter().enumerate().rev().find(|(_, k)| **k <= key)
///             .map(|(i, k)| HistoricalEntry::new(*k, i)))
///     }
///     fn previous_key_of(&self, key: TimeKey) -> TimeKey { key - Duration::days(1) }
///     fn next_key_of(&self, key: TimeKey) -> TimeKey { key + Duration::days(1) }
/// }
///
/// let keys: Vec<TimeKey> = (1990..1996)
///     .map(|y| Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).unwrap())
///     .collect();
/// let cache = HistoricalCache::new(Yearly(keys.clone()));
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
///
/// assert_eq!(cache.query().get_value(now).unwrap(), Some(5));
/// assert_eq!(cache.query().get_previous_values(now, 3).unwrap(), vec![3, 4, 5]);
/// assert_eq!(cache.query().get_previous_key(now, 1).unwrap(), Some(keys[4]));
/// ```
pub struct HistoricalCache<V> {
    store: Arc<dyn TimeKeyedStore<V>>,
    core: Box<dyn QueryCore<V>>,
    adjust: Arc<dyn AdjustKeyProvider>,
    refresh: RefreshManager,
    config: HistoricalCacheConfig,
}

impl<V: Clone + Send + Sync + 'static> HistoricalCache<V> {
    /// Creates a cache with default configuration over a gap store for
    /// `loader`, with no key bound and a private refresh manager.
    pub fn new<L>(loader: L) -> Self
    where
        L: GapLoader<V> + 'static,
    {
        Self::init(
            HistoricalCacheConfig::default(),
            loader,
            None,
            RefreshManager::new(),
        )
    }

    /// Creates a cache over a gap store for `loader`.
    ///
    /// # Arguments
    ///
    /// * `config` - Core selection, window size and store settings
    /// * `loader` - Data source of the series
    /// * `adjust` - Bound for non-future queries, `None` for unbounded
    /// * `refresh` - Invalidation handle, possibly shared with other caches
    pub fn init<L>(
        config: HistoricalCacheConfig,
        loader: L,
        adjust: Option<Arc<dyn AdjustKeyProvider>>,
        refresh: RefreshManager,
    ) -> Self
    where
        L: GapLoader<V> + 'static,
    {
        let adjust = adjust.unwrap_or_else(|| Arc::new(UnboundedAdjustKeyProvider));
        let store: Arc<dyn TimeKeyedStore<V>> = Arc::new(GapStore::<V, L>::init(
            config.store,
            loader,
            Arc::clone(&adjust),
            refresh.clone(),
        ));
        Self::with_store(config, store, Some(adjust), refresh)
    }

    /// Creates a cache over an existing store.
    pub fn with_store(
        config: HistoricalCacheConfig,
        store: Arc<dyn TimeKeyedStore<V>>,
        adjust: Option<Arc<dyn AdjustKeyProvider>>,
        refresh: RefreshManager,
    ) -> Self {
        let adjust = adjust.unwrap_or_else(|| Arc::new(UnboundedAdjustKeyProvider));
        let core: Box<dyn QueryCore<V>> = match config.core {
            QueryCoreKind::Default => Box::new(DefaultQueryCore::new(
                Arc::clone(&store),
                Arc::clone(&adjust),
            )),
            QueryCoreKind::Cached => Box::new(CachedQueryCore::new(
                Arc::clone(&store),
                Arc::clone(&adjust),
                refresh.clone(),
                config.maximum_size,
            )),
        };
        Self {
            store,
            core,
            adjust,
            refresh,
            config,
        }
    }

    /// Starts a query with default options.
    pub fn query(&self) -> HistoricalQuery<'_, V> {
        HistoricalQuery::new(&*self.core, &*self.store, &*self.adjust)
    }

    /// Drops the sliding window and everything the store has loaded.
    ///
    /// The window's maximum size is kept.
    pub fn clear(&self) {
        self.core.clear();
        self.store.clear();
    }

    /// Registers the listener told about every entry the store newly loads,
    /// replacing any earlier one.
    pub fn set_value_loaded_listener(&self, listener: Arc<dyn ValueLoadedListener<V>>) {
        self.store.set_value_loaded_listener(listener);
    }

    /// Grows the window's maximum size; never shrinks it.
    pub fn increase_maximum_size(&self, size: usize) {
        self.core.increase_maximum_size(size);
    }

    /// Current maximum window size, `None` when unbounded or when the
    /// default core is in use.
    pub fn maximum_size(&self) -> Option<usize> {
        self.core.maximum_size()
    }

    /// The refresh handle this cache watches.
    pub fn refresh_manager(&self) -> &RefreshManager {
        &self.refresh
    }

    /// The provider bounding non-future queries.
    pub fn adjust_key_provider(&self) -> &dyn AdjustKeyProvider {
        &*self.adjust
    }

    /// The store queries resolve against.
    pub fn store(&self) -> &dyn TimeKeyedStore<V> {
        &*self.store
    }

    /// The configuration the cache was built with.
    pub fn config(&self) -> &HistoricalCacheConfig {
        &self.config
    }
}

impl<V> HistoricalCache<V> {
    /// Store and core metrics, prefixed with `store.` and `query.`.
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        for (name, value) in self.store.metrics() {
            metrics.insert(format!("store.{name}"), value);
        }
        for (name, value) in self.core.metrics() {
            metrics.insert(format!("query.{name}"), value);
        }
        metrics
    }
}

impl<V> fmt::Debug for HistoricalCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoricalCache")
            .field("config", &self.config)
            .field("store", &self.store.component_name())
            .field("core", &self.core.component_name())
            .field("epoch", &self.refresh.epoch())
            .finish_non_exhaustive()
    }
}
