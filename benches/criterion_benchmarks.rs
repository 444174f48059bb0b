use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use historical_cache::config::{HistoricalCacheConfig, QueryCoreKind};
use historical_cache::store::GapLoader;
use historical_cache::{BoxError, HistoricalCache, HistoricalEntry, RefreshManager, TimeKey};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;

const SERIES_DAYS: i64 = 5_000;
const TRAILING: usize = 20;

/// In-memory daily series, one entry per business day.
struct DailySeries {
    entries: BTreeMap<TimeKey, f64>,
}

impl DailySeries {
    fn new(days: i64) -> Self {
        let start = Utc.with_ymd_and_hms(2000, 1, 3, 0, 0, 0).unwrap();
        let entries = (0..days)
            .filter(|d| d % 7 < 5)
            .map(|d| (start + Duration::days(d), d as f64 * 0.5))
            .collect();
        Self { entries }
    }

    fn first_key(&self) -> TimeKey {
        *self.entries.keys().next().unwrap()
    }
}

impl GapLoader<f64> for DailySeries {
    fn load_ascending_from(&self, from: TimeKey) -> Result<Vec<HistoricalEntry<f64>>, BoxError> {
        Ok(self
            .entries
            .range(from..)
            .map(|(k, v)| HistoricalEntry::new(*k, *v))
            .collect())
    }

    fn load_latest_at_or_before(
        &self,
        key: TimeKey,
    ) -> Result<Option<HistoricalEntry<f64>>, BoxError> {
        Ok(self
            .entries
            .range(..=key)
            .next_back()
            .map(|(k, v)| HistoricalEntry::new(*k, *v)))
    }

    fn previous_key_of(&self, key: TimeKey) -> TimeKey {
        key - Duration::days(1)
    }

    fn next_key_of(&self, key: TimeKey) -> TimeKey {
        key + Duration::days(1)
    }
}

fn make_cache(core: QueryCoreKind) -> (HistoricalCache<f64>, TimeKey) {
    let series = DailySeries::new(SERIES_DAYS);
    let first = series.first_key();
    let config = HistoricalCacheConfig {
        core,
        maximum_size: NonZeroUsize::new(TRAILING),
        ..HistoricalCacheConfig::default()
    };
    (
        HistoricalCache::init(config, series, None, RefreshManager::new()),
        first,
    )
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sliding Window");

    for (name, core) in [
        ("default", QueryCoreKind::Default),
        ("cached", QueryCoreKind::Cached),
    ] {
        let (cache, first) = make_cache(core);

        group.bench_function(format!("{name} trailing values, hourly steps"), |b| {
            let mut hours = 0i64;
            b.iter(|| {
                hours = (hours + 1) % (SERIES_DAYS * 24);
                let at = first + Duration::hours(hours);
                black_box(cache.query().get_previous_values(at, TRAILING).unwrap());
            });
        });

        group.bench_function(format!("{name} trailing values, daily steps"), |b| {
            let mut days = 0i64;
            b.iter(|| {
                days = (days + 1) % SERIES_DAYS;
                let at = first + Duration::days(days);
                black_box(cache.query().get_previous_values(at, TRAILING).unwrap());
            });
        });

        group.bench_function(format!("{name} shifted value"), |b| {
            let mut days = 0i64;
            b.iter(|| {
                days = (days + 1) % SERIES_DAYS;
                let at = first + Duration::days(days);
                black_box(cache.query().get_previous_value(at, 5).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
