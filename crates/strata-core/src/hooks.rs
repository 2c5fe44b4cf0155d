//! Instrumentation hooks invoked by the controller and scheduler.
//!
//! Hooks are pure notifications: they observe progress but cannot
//! influence control flow. Every method has an empty default body, so
//! an implementation overrides only the events it cares about.

use crate::id::{BlockIndex, IterationId, LevelIndex, SlotIndex};

/// Bracket of a whole scheduler run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunEvent {
    /// Global start time.
    pub t_start: f64,
    /// Global end time.
    pub t_end: f64,
}

/// Bracket of one block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepEvent {
    /// Block being processed.
    pub block: BlockIndex,
    /// Window start of the block's first slot.
    pub t0: f64,
    /// Number of active slots in the block.
    pub active_slots: usize,
}

/// Bracket of one main-loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IterationEvent {
    /// Block being processed.
    pub block: BlockIndex,
    /// The iteration.
    pub iteration: IterationId,
}

/// Bracket of one sweep on one level of one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepEvent {
    /// Block being processed.
    pub block: BlockIndex,
    /// Iteration the sweep belongs to ([`IterationId::PREDICTOR`] during
    /// the predictor).
    pub iteration: IterationId,
    /// Level being swept.
    pub level: LevelIndex,
    /// Slot being swept.
    pub slot: SlotIndex,
}

/// Observer of solver progress.
pub trait Hooks: Send + 'static {
    /// Before the first block of a run.
    fn pre_run(&mut self, _event: RunEvent) {}
    /// After the last block of a run, or after the run failed.
    fn post_run(&mut self, _event: RunEvent) {}
    /// Before a block starts.
    fn pre_step(&mut self, _event: StepEvent) {}
    /// After a block converged.
    fn post_step(&mut self, _event: StepEvent) {}
    /// Before a main-loop iteration.
    fn pre_iteration(&mut self, _event: IterationEvent) {}
    /// After a main-loop iteration, including its convergence check.
    fn post_iteration(&mut self, _event: IterationEvent) {}
    /// Before a single sweep.
    fn pre_sweep(&mut self, _event: SweepEvent) {}
    /// After a single sweep succeeded.
    fn post_sweep(&mut self, _event: SweepEvent) {}
}

/// Hooks that ignore every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl Hooks for NoopHooks {}
