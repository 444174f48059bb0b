//! Configuration for the gap-filling store.

use core::fmt;
use core::num::NonZeroUsize;

/// Memo slots used when nothing else is configured.
pub const DEFAULT_LOOKUP_MEMO_CAPACITY: usize = 4096;

/// Configuration for a [`GapStore`](crate::store::GapStore).
///
/// # Fields
///
/// - `lookup_memo_capacity`: Number of resolved lookups remembered before the
///   memo is cleared and starts over.
///
/// # Examples
///
/// ```
/// use historical_cache::config::GapStoreConfig;
/// use core::num::NonZeroUsize;
///
/// let config = GapStoreConfig {
///     lookup_memo_capacity: NonZeroUsize::new(128).unwrap(),
/// };
/// assert_eq!(config.lookup_memo_capacity.get(), 128);
/// ```
#[derive(Clone, Copy)]
pub struct GapStoreConfig {
    /// Maximum number of memoized lookups.
    pub lookup_memo_capacity: NonZeroUsize,
}

impl Default for GapStoreConfig {
    fn default() -> Self {
        Self {
            lookup_memo_capacity: NonZeroUsize::new(DEFAULT_LOOKUP_MEMO_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl fmt::Debug for GapStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GapStoreConfig")
            .field("lookup_memo_capacity", &self.lookup_memo_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_memo_capacity() {
        let config = GapStoreConfig::default();
        assert_eq!(
            config.lookup_memo_capacity.get(),
            DEFAULT_LOOKUP_MEMO_CAPACITY
        );
    }

    #[test]
    fn test_store_config_debug() {
        let config = GapStoreConfig {
            lookup_memo_capacity: NonZeroUsize::new(8).unwrap(),
        };
        assert!(format!("{:?}", config).contains("lookup_memo_capacity: 8"));
    }
}
