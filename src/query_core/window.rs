//! Ordered deque of trailing entries.
//!
//! ```text
//!   front (oldest)                              back (newest)
//!   ┌──────┬──────┬──────┬──────┐
//!   │ 1991 │ 1992 │ 1993 │ 1994 │   anchor = 1994-06-30
//!   └──────┴──────┴──────┴──────┘
//!     ▲ trim_oldest                 ▲ append_newer
//!     ▲ prepend_older               ▲ trim_newest
//! ```
//!
//! The entries are a contiguous chain of the store: no stored key between
//! the first and last entry is missing. The anchor is the adjusted key of the
//! request the window was last shaped for; the newest entry is the store's
//! answer at the anchor.

use crate::entry::{HistoricalEntry, TimeKey};
use std::collections::VecDeque;

#[derive(Debug)]
pub(crate) struct Window<V> {
    entries: VecDeque<HistoricalEntry<V>>,
    anchor: Option<TimeKey>,
}

impl<V> Window<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            anchor: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn first(&self) -> Option<&HistoricalEntry<V>> {
        self.entries.front()
    }

    pub(crate) fn last(&self) -> Option<&HistoricalEntry<V>> {
        self.entries.back()
    }

    pub(crate) fn anchor(&self) -> Option<TimeKey> {
        self.anchor
    }

    /// Entries newest first.
    pub(crate) fn newest_first(&self) -> impl Iterator<Item = &HistoricalEntry<V>> {
        self.entries.iter().rev()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.anchor = None;
    }

    pub(crate) fn replace<I>(&mut self, anchor: TimeKey, newest_first: I)
    where
        I: IntoIterator<Item = HistoricalEntry<V>>,
    {
        self.entries.clear();
        for entry in newest_first {
            self.entries.push_front(entry);
        }
        self.anchor = Some(anchor);
    }

    pub(crate) fn append_newer<I>(&mut self, anchor: TimeKey, ascending: I)
    where
        I: IntoIterator<Item = HistoricalEntry<V>>,
    {
        self.entries.extend(ascending);
        self.anchor = Some(anchor);
    }

    pub(crate) fn prepend_older<I>(&mut self, newest_first: I)
    where
        I: IntoIterator<Item = HistoricalEntry<V>>,
    {
        for entry in newest_first {
            self.entries.push_front(entry);
        }
    }

    /// Drops oldest entries beyond `max`. Returns how many were dropped.
    pub(crate) fn trim_oldest(&mut self, max: usize) -> usize {
        let excess = self.entries.len().saturating_sub(max);
        self.entries.drain(..excess);
        excess
    }

    /// Drops newest entries beyond `max` and re-anchors on the new newest
    /// entry. Returns how many were dropped.
    pub(crate) fn trim_newest(&mut self, max: usize) -> usize {
        let excess = self.entries.len().saturating_sub(max);
        if excess > 0 {
            self.entries.truncate(max);
            self.anchor = self.entries.back().map(|e| e.key);
        }
        excess
    }

    /// Strictly ascending keys, and an anchor exactly when non-empty.
    pub(crate) fn is_consistent(&self) -> bool {
        let ordered = self
            .entries
            .iter()
            .zip(self.entries.iter().skip(1))
            .all(|(a, b)| a.key < b.key);
        let anchored = match (self.entries.back(), self.anchor) {
            (Some(last), Some(anchor)) => last.key <= anchor,
            (None, None) => true,
            _ => false,
        };
        ordered && anchored
    }
}

impl<V: Clone> Window<V> {
    pub(crate) fn snapshot(&self) -> Vec<HistoricalEntry<V>> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(year: i32) -> HistoricalEntry<i32> {
        HistoricalEntry::new(Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(), year)
    }

    fn years(window: &Window<i32>) -> Vec<i32> {
        window.snapshot().into_iter().map(|e| e.value).collect()
    }

    #[test]
    fn test_replace_reverses_newest_first_input() {
        let mut window = Window::new();
        window.replace(entry(1993).key, vec![entry(1993), entry(1992), entry(1991)]);
        assert_eq!(years(&window), vec![1991, 1992, 1993]);
        assert_eq!(window.anchor(), Some(entry(1993).key));
        assert!(window.is_consistent());
    }

    #[test]
    fn test_append_and_trim_oldest() {
        let mut window = Window::new();
        window.replace(entry(1991).key, vec![entry(1991), entry(1990)]);
        window.append_newer(entry(1993).key, vec![entry(1992), entry(1993)]);
        assert_eq!(window.trim_oldest(3), 1);
        assert_eq!(years(&window), vec![1991, 1992, 1993]);
        assert!(window.is_consistent());
    }

    #[test]
    fn test_prepend_and_trim_newest_reanchors() {
        let mut window = Window::new();
        window.replace(entry(1994).key, vec![entry(1994), entry(1993)]);
        window.prepend_older(vec![entry(1992), entry(1991)]);
        assert_eq!(years(&window), vec![1991, 1992, 1993, 1994]);
        assert_eq!(window.trim_newest(3), 1);
        assert_eq!(window.anchor(), Some(entry(1993).key));
        assert!(window.is_consistent());
    }

    #[test]
    fn test_clear_drops_anchor() {
        let mut window = Window::new();
        window.replace(entry(1990).key, vec![entry(1990)]);
        window.clear();
        assert_eq!(window.len(), 0);
        assert!(window.anchor().is_none());
        assert!(window.is_consistent());
    }
}
