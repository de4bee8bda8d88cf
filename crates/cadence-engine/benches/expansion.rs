use cadence_engine::conflict::{find_conflicts, BufferedInterval, BufferedIntervalIndex};
use cadence_engine::expander::{generate, OccurrenceSeries};
use cadence_engine::interval::Interval;
use cadence_engine::rule::parse;
use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

fn anchor() -> Interval {
    Interval::try_new("bench", start(), start() + Duration::minutes(45)).unwrap()
}

/// A working year of half-hour meetings with 10-minute trailing buffers.
fn busy_calendar() -> Vec<BufferedInterval> {
    (0..2000)
        .map(|i| {
            let s = start() + Duration::minutes(i * 97);
            BufferedInterval::new(Interval::try_new(format!("m{}", i), s, s + Duration::minutes(30)).unwrap())
                .with_buffers(Duration::zero(), Duration::minutes(10))
        })
        .collect()
}

fn bench_generate(c: &mut Criterion) {
    let daily = parse("FREQ=DAILY;COUNT=365").unwrap();
    let monthly = parse("FREQ=MONTHLY;COUNT=120").unwrap();
    let from = start();
    let to = start() + Duration::days(3650);

    c.bench_function("generate_daily_year", |b| {
        b.iter(|| generate(black_box(&daily), black_box(&anchor()), from, to))
    });
    c.bench_function("generate_monthly_decade", |b| {
        b.iter(|| generate(black_box(&monthly), black_box(&anchor()), from, to))
    });
}

fn bench_conflicts(c: &mut Criterion) {
    let calendar = busy_calendar();
    let series = OccurrenceSeries::new(parse("FREQ=DAILY;COUNT=120").unwrap(), anchor());
    let occurrences: Vec<_> = series
        .occurrences(start(), start() + Duration::days(365))
        .collect();

    c.bench_function("linear_scan_series", |b| {
        b.iter(|| {
            occurrences
                .iter()
                .map(|o| find_conflicts(o, None, black_box(&calendar)).len())
                .sum::<usize>()
        })
    });
    c.bench_function("index_series", |b| {
        b.iter(|| {
            let index = BufferedIntervalIndex::new(black_box(&calendar));
            occurrences
                .iter()
                .map(|o| index.find_conflicts(o, None).len())
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, bench_generate, bench_conflicts);
criterion_main!(benches);
