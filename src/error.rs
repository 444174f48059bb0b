//! Error types for historical queries.
//!
//! Every fallible operation in this crate returns [`QueryResult`]. Absence of
//! data is not an error by default; it only becomes [`QueryError::NoDataAvailable`]
//! or [`QueryError::KeyMismatch`] when the caller asks for it through
//! [`AssertValue`](crate::AssertValue). Loader failures are carried through
//! unchanged as the `source` of [`QueryError::Load`].

use crate::entry::TimeKey;

/// Boxed error produced by a [`GapLoader`](crate::store::GapLoader).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised by stores, query cores and the query front end.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A value was required but the series has nothing at or before the key.
    #[error("no data available at {key} (distance {units})")]
    NoDataAvailable {
        /// The adjusted key of the request.
        key: TimeKey,
        /// Requested shift distance or count.
        units: usize,
    },

    /// An exact match was required but the nearest entry has another key.
    #[error("no entry exactly at {requested}, nearest is {found}")]
    KeyMismatch {
        /// The adjusted key of the request.
        requested: TimeKey,
        /// Key of the nearest entry at or before it.
        found: TimeKey,
    },

    /// A store or the window broke one of its ordering contracts.
    #[error("invariant violated at {key} (count {units}): {reason}")]
    InvariantViolation {
        /// The key being resolved when the violation was detected.
        key: TimeKey,
        /// Requested shift distance or count.
        units: usize,
        /// What went wrong.
        reason: &'static str,
    },

    /// The underlying loader failed.
    #[error("loading data for {key} failed")]
    Load {
        /// Key whose resolution triggered the load.
        key: TimeKey,
        /// The loader's own error.
        #[source]
        source: BoxError,
    },
}

impl QueryError {
    pub(crate) fn invariant(key: TimeKey, units: usize, reason: &'static str) -> Self {
        QueryError::InvariantViolation { key, units, reason }
    }

    pub(crate) fn load(key: TimeKey, source: BoxError) -> Self {
        QueryError::Load { key, source }
    }
}
