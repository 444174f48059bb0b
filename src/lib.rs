#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                             HistoricalCache                              │
//! │                                                                          │
//! │   query() ──▶ HistoricalQuery                                            │
//! │                 │  options: future, filter duplicates, assert value      │
//! │                 ▼                                                        │
//! │           ┌───────────────┐         ┌──────────────────┐                 │
//! │           │   QueryCore   │────────▶│  TimeKeyedStore  │──▶ GapLoader    │
//! │           │ Default/Cached│ lookups │   (GapStore)     │    (your data)  │
//! │           └───────┬───────┘         └────────┬─────────┘                 │
//! │                   │                          │                           │
//! │           ┌───────┴──────────────────────────┴───────┐                   │
//! │           │ AdjustKeyProvider       RefreshManager   │                   │
//! │           │ (highest allowed key)   (epoch counter)  │                   │
//! │           └──────────────────────────────────────────┘                   │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Reference
//!
//! | Operation | Returns |
//! |-----------|---------|
//! | [`get_value`](HistoricalQuery::get_value) | value in effect at a key |
//! | [`get_previous_value`](HistoricalQuery::get_previous_value) | value n positions back |
//! | [`get_previous_values`](HistoricalQuery::get_previous_values) | last n values, ascending |
//! | [`get_next_value`](HistoricalQuery::get_next_value) | value n positions forward |
//! | [`get_keys`](HistoricalQuery::get_keys) | lazily loaded keys in a range |
//!
//! ## Choosing a Query Core
//!
//! | Core | Best Use Case |
//! |------|---------------|
//! | [`DefaultQueryCore`](query_core::DefaultQueryCore) | random access, single values |
//! | [`CachedQueryCore`](query_core::CachedQueryCore) | "last N values" stepping forward through time |
//!
//! ## Code Example
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use historical_cache::config::{HistoricalCacheConfig, QueryCoreKind};
//! use historical_cache::store::GapLoader;
//! use historical_cache::{BoxError, HistoricalCache, HistoricalEntry, RefreshManager, TimeKey};
//! use core::num::NonZeroUsize;
//!
//! struct Monthly;
//!
//! impl GapLoader<u32> for Monthly {
//!     fn load_ascending_from(&self, from: TimeKey) -> Result<Vec<HistoricalEntry<u32>>, BoxError> {
//!         let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
//!         Ok((0..12u32)
//!             .map(|m| HistoricalEntry::new(start + Duration::days(30 * i64::from(m)), m))
//!             .filter(|e| e.key >= from)
//!             .collect())
//!     }
//!     fn load_latest_at_or_before(&self, key: TimeKey) -> Result<Option<HistoricalEntry<u32>>, BoxError> {
//!         Ok(self.load_ascending_from(TimeKey::MIN_UTC)?.into_iter().rev().find(|e| e.key <= key))
//!     }
//!     fn previous_key_of(&self, key: TimeKey) -> TimeKey { key - Duration::days(1) }
//!     fn next_key_of(&self, key: TimeKey) -> TimeKey { key + Duration::days(1) }
//! }
//!
//! let config = HistoricalCacheConfig {
//!     core: QueryCoreKind::Cached,
//!     maximum_size: NonZeroUsize::new(4),
//!     ..HistoricalCacheConfig::default()
//! };
//! let cache = HistoricalCache::init(config, Monthly, None, RefreshManager::new());
//! let day = Utc.with_ymd_and_hms(2020, 6, 15, 0, 0, 0).unwrap();
//!
//! assert_eq!(cache.query().get_previous_values(day, 3).unwrap(), vec![3, 4, 5]);
//! // the window grew to twice the request
//! assert_eq!(cache.maximum_size(), Some(4));
//! assert_eq!(cache.query().get_previous_values(day, 6).unwrap(), vec![0, 1, 2, 3, 4, 5]);
//! assert_eq!(cache.maximum_size(), Some(12));
//! ```

/// Time-keyed entry type.
///
/// Provides `HistoricalEntry<V>` and the `TimeKey` alias shared by every
/// other module.
pub mod entry;

/// Error taxonomy and result alias.
pub mod error;

/// Configuration structures.
///
/// Provides configuration for the cache front end and the gap store.
pub mod config;

/// Query and store metrics.
///
/// BTreeMap-based counters reported through the common `CacheMetrics` trait.
pub mod metrics;

/// Highest-allowed-key providers.
///
/// Bound the keys non-future queries may observe, for live series.
pub mod adjust;

/// Refresh epochs for cache invalidation.
pub mod refresh;

/// Notifications for entries loaded into a store.
pub mod listener;

/// Key-ordered stores and the gap-filling store implementation.
pub mod store;

/// Backward walk shared by the query cores.
pub(crate) mod walk;

/// Query cores.
///
/// The stateless core and the sliding window core, plus the per-request
/// options both understand.
pub mod query_core;

/// Per-request query front end.
pub mod query;

/// The cache owning store, provider, refresh handle and core.
pub mod cache;

pub use adjust::{
    AdjustKeyProvider, PullingAdjustKeyProvider, PushingAdjustKeyProvider,
    UnboundedAdjustKeyProvider,
};
pub use cache::HistoricalCache;
pub use entry::{HistoricalEntry, TimeKey};
pub use error::{BoxError, QueryError, QueryResult};
pub use listener::ValueLoadedListener;
pub use query::HistoricalQuery;
pub use query_core::{AssertValue, QueryOptions};
pub use refresh::RefreshManager;
