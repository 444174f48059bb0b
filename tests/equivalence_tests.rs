//! Property Tests: Cached vs Default Query Core
//!
//! The sliding window must never change an answer. For random series and
//! random request sequences (forward steps, backward jumps, repeats, forward
//! scans, any count) the cached core has to return exactly what the stateless
//! core returns, while its window stays ordered and within its maximum size.
//! Both are also checked against the keys computed directly from the series.

mod common;

use chrono::Duration;
use common::{key, CountingLoader};
use historical_cache::adjust::UnboundedAdjustKeyProvider;
use historical_cache::query_core::{CachedQueryCore, DefaultQueryCore, QueryCore, QueryOptions};
use historical_cache::store::{GapStore, TimeKeyedStore};
use historical_cache::{AdjustKeyProvider, HistoricalEntry, RefreshManager, TimeKey};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Trailing { hours: i64, count: usize },
    Shift { hours: i64, shift: usize },
    Leading { hours: i64, count: usize },
}

fn at(hours: i64) -> TimeKey {
    key(2000) + Duration::hours(hours)
}

fn series_keys(days: &BTreeSet<i64>) -> Vec<TimeKey> {
    days.iter().map(|d| key(2000) + Duration::days(*d)).collect()
}

// Up to `count` keys at or before `at`, ascending.
fn expected_trailing(keys: &[TimeKey], at: TimeKey, count: usize) -> Vec<TimeKey> {
    let end = keys.partition_point(|k| *k <= at);
    keys[end.saturating_sub(count)..end].to_vec()
}

// Up to `count` keys at or after `at`, ascending.
fn expected_leading(keys: &[TimeKey], at: TimeKey, count: usize) -> Vec<TimeKey> {
    let start = keys.partition_point(|k| *k < at);
    keys[start..].iter().take(count).copied().collect()
}

fn keys_of(entries: &[HistoricalEntry<i64>]) -> Vec<TimeKey> {
    entries.iter().map(|e| e.key).collect()
}

fn make_cores(
    days: &BTreeSet<i64>,
    maximum_size: Option<usize>,
) -> (DefaultQueryCore<i64>, CachedQueryCore<i64>) {
    let keys = series_keys(days);
    let adjust: Arc<dyn AdjustKeyProvider> = Arc::new(UnboundedAdjustKeyProvider);
    let reference: Arc<dyn TimeKeyedStore<i64>> =
        Arc::new(GapStore::<i64, _>::new(CountingLoader::with_keys(&keys)));
    let windowed: Arc<dyn TimeKeyedStore<i64>> =
        Arc::new(GapStore::<i64, _>::new(CountingLoader::with_keys(&keys)));
    (
        DefaultQueryCore::new(reference, Arc::clone(&adjust)),
        CachedQueryCore::new(
            windowed,
            adjust,
            RefreshManager::new(),
            maximum_size.and_then(NonZeroUsize::new),
        ),
    )
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-240i64..10_000, 0usize..12).prop_map(|(hours, count)| Op::Trailing { hours, count }),
        (-240i64..10_000, 0usize..12).prop_map(|(hours, shift)| Op::Shift { hours, shift }),
        (-240i64..10_000, 0usize..6).prop_map(|(hours, count)| Op::Leading { hours, count }),
    ]
}

fn check_window(cached: &CachedQueryCore<i64>) -> Result<(), TestCaseError> {
    prop_assert!(cached.window_is_consistent());
    if let Some(maximum) = cached.maximum_size() {
        prop_assert!(cached.window_snapshot().len() <= maximum);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn cached_core_matches_default_core(
        days in prop::collection::btree_set(0i64..400, 0..40),
        ops in prop::collection::vec(op_strategy(), 1..40),
        maximum_size in prop::option::of(1usize..6),
    ) {
        let (reference, cached) = make_cores(&days, maximum_size);
        let keys = series_keys(&days);
        let options = QueryOptions::default();

        for op in ops {
            match op {
                Op::Trailing { hours, count } => {
                    let expected = reference.previous_entries(at(hours), count, &options).unwrap();
                    let actual = cached.previous_entries(at(hours), count, &options).unwrap();
                    prop_assert_eq!(keys_of(&expected), expected_trailing(&keys, at(hours), count));
                    prop_assert_eq!(actual, expected);
                }
                Op::Shift { hours, shift } => {
                    let expected = reference.previous_entry(at(hours), shift, &options).unwrap();
                    let actual = cached.previous_entry(at(hours), shift, &options).unwrap();
                    let oldest = expected_trailing(&keys, at(hours), shift + 1).first().copied();
                    prop_assert_eq!(expected.as_ref().map(|e| e.key), oldest);
                    prop_assert_eq!(actual, expected);
                }
                Op::Leading { hours, count } => {
                    let expected = reference.next_entries(at(hours), count, &options).unwrap();
                    let actual = cached.next_entries(at(hours), count, &options).unwrap();
                    prop_assert_eq!(keys_of(&expected), expected_leading(&keys, at(hours), count));
                    prop_assert_eq!(actual, expected);
                }
            }
            check_window(&cached)?;
        }
    }

    #[test]
    fn stepping_forward_matches_default_core(
        days in prop::collection::btree_set(0i64..200, 1..60),
        steps in prop::collection::vec(1i64..96, 1..60),
        count in 2usize..10,
        maximum_size in prop::option::of(1usize..12),
    ) {
        let (reference, cached) = make_cores(&days, maximum_size);
        let keys = series_keys(&days);
        let options = QueryOptions::default();

        let mut hours = 0;
        for step in steps {
            hours += step;
            let expected = reference.previous_entries(at(hours), count, &options).unwrap();
            let actual = cached.previous_entries(at(hours), count, &options).unwrap();
            prop_assert_eq!(keys_of(&expected), expected_trailing(&keys, at(hours), count));
            prop_assert_eq!(actual, expected);
            check_window(&cached)?;
        }
    }
}
