//! Criterion benchmarks for the two channel backends.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use strata_comm::{Channel, MailboxChannel, TagTable};
use strata_core::{IterationId, LevelIndex, SlotIndex, Tag};

const SLOTS: u32 = 32;

/// One full round: every slot sends, then every successor receives.
fn round(channel: &mut dyn Channel, iteration: IterationId) {
    let payload = [1.0, 2.0, 3.0];
    for p in 0..SLOTS - 1 {
        let tag = Tag::new(LevelIndex(0), iteration, SlotIndex(p));
        channel.send(tag, &payload).unwrap();
    }
    for p in 0..SLOTS - 1 {
        let tag = Tag::new(LevelIndex(0), iteration, SlotIndex(p));
        black_box(channel.receive(tag).unwrap());
    }
}

fn bench_tag_table(c: &mut Criterion) {
    let mut table = TagTable::new(SLOTS as usize);
    let mut iteration = IterationId::FIRST;
    c.bench_function("tag_table_round_32", |b| {
        b.iter(|| {
            round(&mut table, iteration);
            iteration = iteration.next();
        });
    });
}

fn bench_mailbox(c: &mut Criterion) {
    let mut mailbox = MailboxChannel::new(SLOTS as usize);
    let mut iteration = IterationId::FIRST;
    c.bench_function("mailbox_round_32", |b| {
        b.iter(|| {
            round(&mut mailbox, iteration);
            iteration = iteration.next();
        });
    });
}

criterion_group!(benches, bench_tag_table, bench_mailbox);
criterion_main!(benches);
