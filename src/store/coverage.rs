//! Contiguous key ranges known to be completely loaded.

use crate::entry::TimeKey;
use core::ops::Bound;

/// A key interval `[from, until]` inside which every stored entry is loaded.
///
/// `from` is always the key of a loaded entry. `until` is exclusive when it is
/// the key of the newest entry of a bulk load, since a live series may still
/// gain entries at that instant, and inclusive when a probe proved nothing
/// exists between the newest entry and a queried key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Coverage {
    pub(crate) from: TimeKey,
    pub(crate) until: Bound<TimeKey>,
}

impl Coverage {
    pub(crate) fn new(from: TimeKey, until: Bound<TimeKey>) -> Self {
        Self { from, until }
    }

    pub(crate) fn contains(&self, key: TimeKey) -> bool {
        key >= self.from && below_upper(key, self.until)
    }

    /// Key of the upper bound, `None` when unbounded.
    pub(crate) fn upper_key(&self) -> Option<TimeKey> {
        match self.until {
            Bound::Included(key) | Bound::Excluded(key) => Some(key),
            Bound::Unbounded => None,
        }
    }

    /// Union of two overlapping or adjacent intervals.
    pub(crate) fn union(self, other: Coverage) -> Option<Coverage> {
        let touches = reaches(other.from, self.until) && reaches(self.from, other.until);
        touches.then(|| Coverage {
            from: self.from.min(other.from),
            until: upper_max(self.until, other.until),
        })
    }

    /// Bounds usable with `BTreeMap::range`.
    pub(crate) fn range(&self) -> (Bound<TimeKey>, Bound<TimeKey>) {
        (Bound::Included(self.from), self.until)
    }
}

fn below_upper(key: TimeKey, until: Bound<TimeKey>) -> bool {
    match until {
        Bound::Included(upper) => key <= upper,
        Bound::Excluded(upper) => key < upper,
        Bound::Unbounded => true,
    }
}

// An interval starting at `start` touches one ending at `until`.
fn reaches(start: TimeKey, until: Bound<TimeKey>) -> bool {
    match until {
        Bound::Included(upper) | Bound::Excluded(upper) => start <= upper,
        Bound::Unbounded => true,
    }
}

fn upper_max(a: Bound<TimeKey>, b: Bound<TimeKey>) -> Bound<TimeKey> {
    match (a, b) {
        (Bound::Unbounded, _) | (_, Bound::Unbounded) => Bound::Unbounded,
        (Bound::Included(x), Bound::Excluded(y)) if x == y => a,
        (Bound::Excluded(x), Bound::Included(y)) if x == y => b,
        (Bound::Included(x) | Bound::Excluded(x), Bound::Included(y) | Bound::Excluded(y)) => {
            if x >= y {
                a
            } else {
                b
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn key(year: i32) -> TimeKey {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_contains_respects_bound_kind() {
        let open = Coverage::new(key(1990), Bound::Excluded(key(1995)));
        assert!(open.contains(key(1990)));
        assert!(open.contains(key(1994)));
        assert!(!open.contains(key(1995)));
        assert!(!open.contains(key(1989)));

        let closed = Coverage::new(key(1990), Bound::Included(key(1995)));
        assert!(closed.contains(key(1995)));
    }

    #[test]
    fn test_union_of_adjacent_intervals() {
        let lower = Coverage::new(key(1990), Bound::Excluded(key(1995)));
        let upper = Coverage::new(key(1995), Bound::Included(key(1997)));
        let merged = lower.union(upper).unwrap();
        assert_eq!(merged.from, key(1990));
        assert_eq!(merged.until, Bound::Included(key(1997)));
        assert_eq!(upper.union(lower), Some(merged));
    }

    #[test]
    fn test_union_prefers_included_at_same_key() {
        let a = Coverage::new(key(1990), Bound::Excluded(key(1995)));
        let b = Coverage::new(key(1995), Bound::Included(key(1995)));
        assert_eq!(a.union(b).unwrap().until, Bound::Included(key(1995)));
    }

    #[test]
    fn test_disjoint_intervals_do_not_merge() {
        let a = Coverage::new(key(1990), Bound::Included(key(1991)));
        let b = Coverage::new(key(1993), Bound::Excluded(key(1995)));
        assert!(a.union(b).is_none());
        assert!(b.union(a).is_none());
    }

    #[test]
    fn test_upper_key() {
        let c = Coverage::new(key(1990), Bound::Excluded(key(1992)));
        assert_eq!(c.upper_key(), Some(key(1992)));
        assert_eq!(c.range(), (Bound::Included(key(1990)), Bound::Excluded(key(1992))));
    }
}
