//! Statistic evaluation benchmarks for mileage-core
//!
//! Measures:
//! - Full catalog evaluation over growing fill-up histories
//! - Cache upsert throughput (in-memory SQLite)
//!
//! Run with:
//! ```bash
//! cargo bench --bench catalog_bench
//! ```

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mileage_core::models::{Fillup, StatGroup, Vehicle, VehicleId};
use mileage_core::{CacheStore, StatisticRegistry};
use std::time::Duration;

fn history(count: usize) -> Vec<Fillup> {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            let fillup = Fillup::new(
                start + chrono::Days::new(i as u64 * 7),
                10_000.0 + i as f64 * 310.0,
                9.5 + (i % 5) as f64 * 0.4,
                2.8 + (i % 11) as f64 * 0.05,
            );
            // Every tenth tank is topped up only partially
            if i % 10 == 9 {
                fillup.partial()
            } else {
                fillup
            }
        })
        .collect()
}

/// Evaluate every built-in statistic against one history
fn bench_catalog_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_evaluation");
    group.measurement_time(Duration::from_secs(5));

    let registry = StatisticRegistry::builtin();
    let vehicle = Vehicle::new(VehicleId::new(1), "Bench");

    for size in [10, 100, 1_000, 10_000] {
        let fillups = history(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &fillups, |b, fillups| {
            b.iter(|| {
                for definition in registry.all() {
                    let _ = black_box(definition.compute(&vehicle, fillups));
                }
            });
        });
    }

    group.finish();
}

/// Write a full statistic set for one vehicle
fn bench_cache_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_upsert");

    let store = CacheStore::in_memory().unwrap();
    let registry = StatisticRegistry::builtin();
    let vehicle_id = VehicleId::new(1);

    group.bench_function("full_statistic_set", |b| {
        b.iter(|| {
            for (i, definition) in registry.all().iter().enumerate() {
                store
                    .upsert(
                        vehicle_id,
                        definition.key(),
                        i as f64,
                        definition.group(),
                        definition.order(),
                    )
                    .unwrap();
            }
        });
    });

    group.bench_function("invalidate_and_read", |b| {
        b.iter(|| {
            store.invalidate_all(vehicle_id).unwrap();
            store.upsert(vehicle_id, "total_cost", 1.0, StatGroup::Cost, 0).unwrap();
            black_box(store.valid_entries_for(vehicle_id).unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_catalog_evaluation, bench_cache_upsert);
criterion_main!(benches);
