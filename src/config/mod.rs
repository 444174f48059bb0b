//! Historical Cache Configuration Module
//!
//! This module provides the configuration structures for the historical query
//! engine. Like every config in this crate, they are plain structs with public
//! fields:
//!
//! - **Simple**: Just create the struct with all fields set
//! - **Type safety**: All parameters must be provided at construction
//! - **No boilerplate**: `Default` covers the common setup
//!
//! # Sizing Guidelines
//!
//! ## Understanding `maximum_size`
//!
//! The sliding window keeps the trailing entries of the most recent request.
//! `maximum_size` is the number of entries it may hold. The window grows on
//! its own when a request needs more than the current maximum, always to twice
//! the requested count, so an undersized start only costs one rebuild.
//!
//! ```text
//! request needs 12 entries, maximum is 5  ──▶  maximum becomes 24
//! ```
//!
//! Leave it at `None` for an unbounded window when the trailing counts of the
//! workload are small and known.
//!
//! ## Understanding `lookup_memo_capacity`
//!
//! The gap store remembers the result of every resolved lookup. Each memo slot
//! costs one key plus one cloned entry. The memo is dropped wholesale when it
//! fills up, so size it to the number of distinct query keys in a hot working
//! set.
//!
//! # Configs
//!
//! | Config | Used by | Description |
//! |--------|---------|-------------|
//! | `HistoricalCacheConfig` | [`HistoricalCache`](crate::HistoricalCache) | Core selection, window size, store settings |
//! | `GapStoreConfig` | [`GapStore`](crate::store::GapStore) | Lookup memo sizing |
//!
//! # Examples
//!
//! ```
//! use historical_cache::config::{GapStoreConfig, HistoricalCacheConfig, QueryCoreKind};
//! use core::num::NonZeroUsize;
//!
//! let config = HistoricalCacheConfig {
//!     core: QueryCoreKind::Cached,
//!     maximum_size: NonZeroUsize::new(64),
//!     store: GapStoreConfig {
//!         lookup_memo_capacity: NonZeroUsize::new(1024).unwrap(),
//!     },
//! };
//! assert_eq!(config.maximum_size.map(|n| n.get()), Some(64));
//! ```

pub mod cache;
pub mod store;

pub use cache::{HistoricalCacheConfig, QueryCoreKind};
pub use store::GapStoreConfig;
