//! # Filter and Readiness Table Benchmarks
//!
//! | Path | Operation | Expected |
//! |------|-----------|----------|
//! | Level change | segment lookup in a sorted chain | O(log n) |
//! | Control check | bitset test | O(1) |
//! | Injection check | whitelist scan | O(whitelist) |
//! | Table churn | enable plus compacting disable | O(nfds) |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dlt_event_handler::{PollFlags, ReadinessTable};
use dlt_filter::{MessageFilter, StaticFilterConfig};
use dlt_types::service::{GET_FILTER_STATUS, SET_LOG_LEVEL};
use dlt_types::LEVEL_MAX;

fn chain_filter(segments: u32) -> MessageFilter {
    let step = (LEVEL_MAX / segments).max(1);
    let mut provider = StaticFilterConfig::new("Bench", 0)
        .with_injection("Diag", "APP1", "CTX1", "ECU1", "4096,4097,4098");
    for i in 1..=segments {
        let level = if i == segments { LEVEL_MAX } else { i * step };
        provider = provider.with_filter(&format!("S{i}"), i64::from(level), "TCP", "*", "Diag");
    }
    MessageFilter::from_provider(&provider).expect("benchmark filter is valid")
}

fn bench_change_level(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter-change-level");
    for segments in [2u32, 10, 50] {
        let mut filter = chain_filter(segments);
        group.bench_with_input(BenchmarkId::from_parameter(segments), &segments, |b, _| {
            let mut level = 0;
            b.iter(|| {
                level = (level + 37) % (LEVEL_MAX + 1);
                black_box(filter.change_level(level).is_ok())
            })
        });
    }
    group.finish();
}

fn bench_permission_checks(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter-permissions");
    let filter = chain_filter(10);

    group.bench_function("control_allowed", |b| {
        b.iter(|| {
            black_box(filter.control_allowed(black_box(SET_LOG_LEVEL)).ok());
            black_box(filter.control_allowed(black_box(GET_FILTER_STATUS)).ok())
        })
    });
    group.bench_function("injection_allowed", |b| {
        b.iter(|| black_box(filter.injection_allowed("APP1", "CTX1", "ECU1", black_box(4098)).ok()))
    });
    group.finish();
}

fn bench_table_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("readiness-table");
    for size in [8usize, 64, 512] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("enable_disable", size), &size, |b, &size| {
            b.iter(|| {
                let mut table = ReadinessTable::new();
                for fd in 0..size as i32 {
                    table.enable(fd, PollFlags::POLLIN).expect("fresh fd");
                }
                for fd in (0..size as i32).step_by(2) {
                    table.disable(fd);
                }
                black_box(table.nfds())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_change_level,
    bench_permission_checks,
    bench_table_churn
);
criterion_main!(benches);
