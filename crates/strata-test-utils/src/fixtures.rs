//! Pre-built level stacks for controller tests.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use strata_core::{Level, LevelStack, Transfer};

use crate::{CascadeLevel, CopyTransfer};

/// One stack of `levels` [`CascadeLevel`]s joined by [`CopyTransfer`]s.
pub fn copy_stack(levels: usize) -> LevelStack {
    let boxed: Vec<Box<dyn Level>> = (0..levels)
        .map(|l| Box::new(CascadeLevel::new(format!("cascade_l{l}"))) as Box<dyn Level>)
        .collect();
    let transfers: Vec<Box<dyn Transfer>> = (1..levels)
        .map(|_| Box::new(CopyTransfer::new()) as Box<dyn Transfer>)
        .collect();
    LevelStack::new(boxed, transfers)
}

/// `slots` identical cascade stacks with `levels` levels each.
pub fn cascade_stacks(slots: usize, levels: usize) -> Vec<LevelStack> {
    (0..slots).map(|_| copy_stack(levels)).collect()
}

/// Cascade stacks whose transfers all count into one shared counter.
pub fn counting_stacks(slots: usize, levels: usize, calls: &Arc<AtomicUsize>) -> Vec<LevelStack> {
    (0..slots)
        .map(|_| {
            let mut stack = copy_stack(levels);
            stack.transfers = (1..levels)
                .map(|_| Box::new(CopyTransfer::counting(calls.clone())) as Box<dyn Transfer>)
                .collect();
            stack
        })
        .collect()
}

/// Cascade stacks where the finest level of `slot` fails after
/// `succeed` sweeps.
pub fn failing_stacks(slots: usize, levels: usize, slot: usize, succeed: usize) -> Vec<LevelStack> {
    let mut stacks = cascade_stacks(slots, levels);
    stacks[slot].levels[0] = Box::new(CascadeLevel::failing_after("failing_l0", succeed));
    stacks
}
