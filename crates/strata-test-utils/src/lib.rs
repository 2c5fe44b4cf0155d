//! Test utilities and mock types for Strata development.
//!
//! Provides a mock [`Level`] whose state counts upstream sweeps
//! ([`CascadeLevel`]), a copying [`Transfer`] ([`CopyTransfer`]),
//! recording hooks, and a channel wrapper that drops messages to
//! provoke tag-discipline failures.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use strata_comm::{Channel, TagTable};
use strata_core::{
    CommError, Endpoint, Hooks, IterationEvent, Level, LevelError, RunEvent, SlotIndex,
    StepEvent, SweepEvent, Tag, Transfer,
};

pub use fixtures::{cascade_stacks, copy_stack, counting_stacks, failing_stacks};

/// Two-node, one-component level whose end point is `initial + 1`
/// after a sweep.
///
/// Chaining slots through their end points therefore makes slot `p`'s
/// end point equal to the number of sweeps that fed into it, which is
/// how tests observe causal ordering.
pub struct CascadeLevel {
    name: String,
    nodes: [f64; 2],
    values: [f64; 2],
    initial: [f64; 1],
    sweeps: usize,
    fail_after: Option<usize>,
}

impl CascadeLevel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: [0.0, 1.0],
            values: [0.0, 0.0],
            initial: [0.0],
            sweeps: 0,
            fail_after: None,
        }
    }

    /// A level whose sweep fails once it has succeeded `n` times.
    pub fn failing_after(name: impl Into<String>, n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new(name)
        }
    }

    /// Sweeps performed since construction.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }
}

impl Level for CascadeLevel {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        1
    }

    fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    fn values(&self) -> &[f64] {
        &self.values
    }

    fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    fn initial_value(&self) -> &[f64] {
        &self.initial
    }

    fn set_initial_value(&mut self, value: &[f64]) {
        self.initial[0] = value[0];
    }

    fn set_window(&mut self, _t0: f64, _dt: f64) {}

    fn sweep(&mut self) -> Result<(), LevelError> {
        if self.fail_after.is_some_and(|n| self.sweeps >= n) {
            return Err(LevelError::ExecutionFailed {
                reason: format!("{} scripted to fail after {} sweeps", self.name, self.sweeps),
            });
        }
        self.values = [self.initial[0], self.initial[0] + 1.0];
        self.sweeps += 1;
        Ok(())
    }

    fn residual(&self) -> f64 {
        (self.values[0] - self.initial[0]).abs()
            + (self.values[1] - self.values[0] - 1.0).abs()
    }
}

/// Transfer between levels that share the same node set.
///
/// Restriction copies the fine state (and initial value) into the
/// coarse level; prolongation adds the coarse change back and adopts the
/// coarse initial value. Counts its
/// invocations through a shared counter.
#[derive(Clone, Default)]
pub struct CopyTransfer {
    calls: Arc<AtomicUsize>,
}

impl CopyTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transfer that increments `calls` on every restrict or prolong.
    pub fn counting(calls: Arc<AtomicUsize>) -> Self {
        Self { calls }
    }
}

impl Transfer for CopyTransfer {
    fn name(&self) -> &str {
        "copy"
    }

    fn restrict(&self, fine: &dyn Level, coarse: &mut dyn Level) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        coarse.set_initial_value(fine.initial_value());
        coarse.values_mut().copy_from_slice(fine.values());
    }

    fn prolong(&self, coarse: &dyn Level, fine: &mut dyn Level) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let correction: Vec<f64> = coarse
            .values()
            .iter()
            .zip(fine.values())
            .map(|(c, f)| c - f)
            .collect();
        for (f, d) in fine.values_mut().iter_mut().zip(correction) {
            *f += d;
        }
        fine.set_initial_value(coarse.initial_value());
    }
}

// ── Hooks ───────────────────────────────────────────────────────

/// One recorded hook invocation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HookRecord {
    PreRun(RunEvent),
    PostRun(RunEvent),
    PreStep(StepEvent),
    PostStep(StepEvent),
    PreIteration(IterationEvent),
    PostIteration(IterationEvent),
    PreSweep(SweepEvent),
    PostSweep(SweepEvent),
}

/// Shared view of everything a [`RecordingHooks`] saw.
#[derive(Clone, Default)]
pub struct HookLog(Arc<Mutex<Vec<HookRecord>>>);

impl HookLog {
    pub fn records(&self) -> MutexGuard<'_, Vec<HookRecord>> {
        self.0.lock().expect("hook log poisoned")
    }

    /// Completed sweeps in invocation order.
    pub fn sweeps(&self) -> Vec<SweepEvent> {
        self.records()
            .iter()
            .filter_map(|r| match r {
                HookRecord::PostSweep(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    /// Completed iterations in invocation order.
    pub fn iterations(&self) -> Vec<IterationEvent> {
        self.records()
            .iter()
            .filter_map(|r| match r {
                HookRecord::PostIteration(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    /// Completed blocks in invocation order.
    pub fn steps(&self) -> Vec<StepEvent> {
        self.records()
            .iter()
            .filter_map(|r| match r {
                HookRecord::PostStep(e) => Some(*e),
                _ => None,
            })
            .collect()
    }
}

/// [`Hooks`] implementation that appends every event to a [`HookLog`].
#[derive(Default)]
pub struct RecordingHooks {
    log: HookLog,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that stays readable after the hooks move into a controller.
    pub fn log(&self) -> HookLog {
        self.log.clone()
    }

    fn push(&self, record: HookRecord) {
        self.log.records().push(record);
    }
}

impl Hooks for RecordingHooks {
    fn pre_run(&mut self, event: RunEvent) {
        self.push(HookRecord::PreRun(event));
    }
    fn post_run(&mut self, event: RunEvent) {
        self.push(HookRecord::PostRun(event));
    }
    fn pre_step(&mut self, event: StepEvent) {
        self.push(HookRecord::PreStep(event));
    }
    fn post_step(&mut self, event: StepEvent) {
        self.push(HookRecord::PostStep(event));
    }
    fn pre_iteration(&mut self, event: IterationEvent) {
        self.push(HookRecord::PreIteration(event));
    }
    fn post_iteration(&mut self, event: IterationEvent) {
        self.push(HookRecord::PostIteration(event));
    }
    fn pre_sweep(&mut self, event: SweepEvent) {
        self.push(HookRecord::PreSweep(event));
    }
    fn post_sweep(&mut self, event: SweepEvent) {
        self.push(HookRecord::PostSweep(event));
    }
}

// ── Channels ────────────────────────────────────────────────────

/// [`TagTable`] wrapper that silently discards every send from one slot.
///
/// The matching receive then fails, which is how tests drive the
/// controller into a communication error.
pub struct DroppingChannel {
    inner: TagTable,
    drop_from: SlotIndex,
    dropped: u64,
}

impl DroppingChannel {
    pub fn new(slot_count: usize, drop_from: SlotIndex) -> Self {
        Self {
            inner: TagTable::new(slot_count),
            drop_from,
            dropped: 0,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Channel for DroppingChannel {
    fn send(&mut self, tag: Tag, payload: &[f64]) -> Result<(), CommError> {
        if tag.slot == self.drop_from {
            self.dropped += 1;
            return Ok(());
        }
        self.inner.send(tag, payload)
    }

    fn receive(&mut self, expected: Tag) -> Result<Endpoint, CommError> {
        self.inner.receive(expected)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn messages_sent(&self) -> u64 {
        self.inner.messages_sent()
    }
}

/// [`TagTable`] wrapper that stamps every send one iteration ahead.
///
/// Models a sender that runs out of step with its receiver.
pub struct SkewedChannel {
    inner: TagTable,
}

impl SkewedChannel {
    pub fn new(slot_count: usize) -> Self {
        Self {
            inner: TagTable::new(slot_count),
        }
    }
}

impl Channel for SkewedChannel {
    fn send(&mut self, tag: Tag, payload: &[f64]) -> Result<(), CommError> {
        let skewed = Tag {
            iteration: tag.iteration.next(),
            ..tag
        };
        self.inner.send(skewed, payload)
    }

    fn receive(&mut self, expected: Tag) -> Result<Endpoint, CommError> {
        self.inner.receive(expected)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn messages_sent(&self) -> u64 {
        self.inner.messages_sent()
    }
}
