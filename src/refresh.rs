//! Refresh epochs.
//!
//! A [`RefreshManager`] is a cheap, cloneable handle around a shared counter.
//! Calling [`refresh`](RefreshManager::refresh) bumps the counter; every store
//! and query core constructed with a clone of the handle compares the counter
//! with the value it last saw before touching cached state, and drops that
//! state when they differ.
//!
//! ```text
//!   refresh()          epoch 0 ──▶ 1
//!      │
//!      ├──▶ GapStore         sees 1 ≠ 0, clears loaded data and memo
//!      └──▶ CachedQueryCore  sees 1 ≠ 0, clears its window
//! ```
//!
//! Handles are injected, so independent caches may share one manager or use
//! separate ones.

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared invalidation signal for every cache built with a clone of it.
#[derive(Debug, Clone, Default)]
pub struct RefreshManager {
    epoch: Arc<AtomicU64>,
}

impl RefreshManager {
    /// Creates a manager at epoch zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates every cache that shares this manager.
    ///
    /// Returns the new epoch.
    pub fn refresh(&self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(epoch, "refresh requested");
        epoch
    }

    /// Current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }
}
