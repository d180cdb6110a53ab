//! Benchmarks for the per-frame estimation path
//!
//! Measures:
//! - One closed-form filter step on a warmed-up state
//! - Batch processing of a synthetic physical-clock sequence
//! - Registry lookup plus update as the monitor performs it per frame
//!
//! Platform: Cross-platform (synthetic data, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sentinel::test_utils::{SyntheticTraffic, frames_from_intervals};
use sentinel::{CanId, ClockState, DetectorConfig, IdentityRegistry, Monitor};
use std::hint::black_box;

fn warmed_state() -> ClockState {
    let mut state = ClockState::new(&DetectorConfig::default());
    let intervals = SyntheticTraffic::seeded(1_000, 1).real_ecu();
    state.process_stream(intervals).expect("default parameters are valid");
    state
}

fn bench_single_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimator_step");

    group.bench_function("update", |b| {
        let mut state = warmed_state();
        b.iter(|| black_box(state.update(black_box(0.010_003)).unwrap()));
    });

    group.finish();
}

fn bench_process_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimator_batch");

    for samples in [1_000usize, 10_000] {
        let intervals = SyntheticTraffic::seeded(samples, 42).real_ecu();
        group.throughput(Throughput::Elements(samples as u64));
        group.bench_with_input(BenchmarkId::new("process_stream", samples), &intervals, |b, intervals| {
            b.iter(|| {
                let mut state = ClockState::new(&DetectorConfig::default());
                black_box(state.process_stream(intervals.iter().copied()).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_registry_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    for senders in [1u32, 64, 512] {
        let mut registry = IdentityRegistry::new(DetectorConfig::default());
        for id in 0..senders {
            registry.resolve(CanId::new(id, false));
        }

        group.bench_function(BenchmarkId::new("resolve_and_update", senders), |b| {
            let mut id = 0u32;
            b.iter(|| {
                id = (id + 1) % senders;
                let state = registry.resolve(CanId::new(black_box(id), false));
                black_box(state.update(0.010).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_monitor_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("monitor");
    let intervals = SyntheticTraffic::seeded(5_000, 9).smart_attacker(50e-6);
    let frames = frames_from_intervals(0x123, 1_700_000_000_000_000_000, &intervals);

    group.throughput(Throughput::Elements(frames.len() as u64));
    group.bench_function("observe_5000_frames", |b| {
        b.iter(|| {
            let mut monitor = Monitor::new(DetectorConfig::default());
            for frame in &frames {
                black_box(monitor.observe(frame).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_update,
    bench_process_stream,
    bench_registry_resolve,
    bench_monitor_observe
);
criterion_main!(benches);
