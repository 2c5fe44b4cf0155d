//! Criterion benchmarks for whole runs and single blocks.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_bench::{decay_profile, system_profile};
use strata_core::{BlockIndex, SlotIndex};
use strata_engine::{BlockScheduler, ChannelKind, Controller};

fn bench_single_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_block");
    for levels in 1..=3 {
        let mut controller = Controller::new(decay_profile(8, levels)).unwrap();
        let active: Vec<SlotIndex> = (0..8).map(SlotIndex).collect();
        let times: Vec<f64> = (0..8).map(|p| f64::from(p) * 0.25).collect();
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, _| {
            b.iter(|| {
                controller.restart(&active, &times, &[1.0]).unwrap();
                let stats = controller.run_block(BlockIndex(0)).unwrap();
                black_box(&stats);
            });
        });
    }
    group.finish();
}

fn bench_decay_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("decay_run_64_windows");
    for kind in [ChannelKind::TagTable, ChannelKind::Mailbox] {
        let mut cfg = decay_profile(8, 2);
        cfg.channel = kind;
        let mut scheduler = BlockScheduler::new(cfg).unwrap();
        group.bench_function(format!("{kind:?}"), |b| {
            b.iter(|| {
                let report = scheduler.run(&[1.0], 0.0, 16.0).unwrap();
                black_box(&report);
            });
        });
    }
    group.finish();
}

fn bench_system_run(c: &mut Criterion) {
    let mut scheduler = BlockScheduler::new(system_profile(16)).unwrap();
    let u0 = [1.0; 8];
    c.bench_function("system_run_16_slots", |b| {
        b.iter(|| {
            let report = scheduler.run(&u0, 0.0, 4.0).unwrap();
            black_box(&report);
        });
    });
}

criterion_group!(benches, bench_single_block, bench_decay_run, bench_system_run);
criterion_main!(benches);
