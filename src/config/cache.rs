//! Configuration for the historical cache front end.
//!
//! # Examples
//!
//! ```
//! use historical_cache::config::{HistoricalCacheConfig, QueryCoreKind};
//! use core::num::NonZeroUsize;
//!
//! // Windowed core that starts small and grows on demand
//! let config = HistoricalCacheConfig {
//!     maximum_size: NonZeroUsize::new(1),
//!     ..HistoricalCacheConfig::default()
//! };
//! assert_eq!(config.core, QueryCoreKind::Cached);
//!
//! // Stateless core, every request goes to the store
//! let config = HistoricalCacheConfig {
//!     core: QueryCoreKind::Default,
//!     ..HistoricalCacheConfig::default()
//! };
//! assert_eq!(config.core, QueryCoreKind::Default);
//! ```

use super::store::GapStoreConfig;
use core::fmt;
use core::num::NonZeroUsize;

/// Which query core a [`HistoricalCache`](crate::HistoricalCache) runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryCoreKind {
    /// [`DefaultQueryCore`](crate::query_core::DefaultQueryCore): every request walks the store.
    Default,
    /// [`CachedQueryCore`](crate::query_core::CachedQueryCore): trailing requests reuse a sliding window.
    #[default]
    Cached,
}

/// Configuration for a [`HistoricalCache`](crate::HistoricalCache).
///
/// # Fields
///
/// - `core`: Query core selection.
/// - `maximum_size`: Initial window size for the cached core, `None` for an
///   unbounded window. Ignored by the default core.
/// - `store`: Settings for the gap store created by
///   [`HistoricalCache::init`](crate::HistoricalCache::init).
#[derive(Clone, Copy, Default)]
pub struct HistoricalCacheConfig {
    /// Query core selection.
    pub core: QueryCoreKind,
    /// Initial maximum number of entries in the sliding window.
    pub maximum_size: Option<NonZeroUsize>,
    /// Gap store settings.
    pub store: GapStoreConfig,
}

impl fmt::Debug for HistoricalCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoricalCacheConfig")
            .field("core", &self.core)
            .field("maximum_size", &self.maximum_size)
            .field("store", &self.store)
            .finish()
    }
}
