//! Per-block multilevel iteration across all active slices.
//!
//! [`Controller`] owns every [`Slice`], the cross-slice [`Channel`] and
//! the instrumentation hooks. A block is driven in two calls:
//! [`restart()`](Controller::restart) seeds the active slots, then
//! [`run_block()`](Controller::run_block) runs the predictor followed by
//! main-loop iterations until every active slot is done.
//!
//! # Iteration structure
//!
//! With one level, an iteration is a single smoothing sweep across the
//! active slots followed by the convergence check. With `L > 1` levels:
//!
//! 1. down: restrict level `l` to `l + 1`, smoothing every intermediate
//!    level on the way;
//! 2. coarse solve: one sweep of the coarsest level;
//! 3. up: prolong level `l` to `l - 1` and smooth level `l - 1`;
//! 4. convergence check: a final level-0 exchange, then one residual per
//!    active slot.
//!
//! The coarsest level is swept exactly once per iteration, whatever the
//! sweep counts of the finer levels.

use std::time::Instant;

use strata_comm::Channel;
use strata_core::{
    BlockIndex, Endpoint, Hooks, IterationEvent, IterationId, LevelIndex, NoopHooks,
    SlotIndex, StepEvent,
};

use crate::config::{ConfigError, SolverConfig};
use crate::convergence::ConvergenceChecker;
use crate::error::{NonTermination, RunError};
use crate::metrics::{BlockStats, RunReport};
use crate::predictor;
use crate::round::{BlockContext, Phase};
use crate::slice::Slice;

/// Drives one block of slices to convergence.
///
/// # Examples
///
/// ```
/// use strata_core::SlotIndex;
/// use strata_engine::{Controller, SolverConfig};
/// use strata_problems::linear_ode_stack;
///
/// let stacks = (0..3)
///     .map(|_| linear_ode_stack(&[-1.0], &[5, 3]).unwrap())
///     .collect();
/// let mut controller = Controller::new(SolverConfig::new(stacks, 0.5)).unwrap();
///
/// let active = [SlotIndex(0), SlotIndex(1), SlotIndex(2)];
/// controller.restart(&active, &[0.0, 0.5, 1.0], &[1.0]).unwrap();
/// let stats = controller.run_block(Default::default()).unwrap();
///
/// assert!(stats.iterations >= 1);
/// let end = controller.result().unwrap();
/// assert!((end[0] - (-1.5f64).exp()).abs() < 1e-12);
/// ```
pub struct Controller {
    slices: Vec<Slice>,
    active: Vec<SlotIndex>,
    levels: usize,
    sweeps: Vec<u32>,
    dt: f64,
    max_iterations: u32,
    checker: ConvergenceChecker,
    channel: Box<dyn Channel>,
    hooks: Box<dyn Hooks>,
    ready: bool,
}

impl Controller {
    /// Validate `config` and build one slice per level stack.
    pub fn new(config: SolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let levels = config.level_count();
        let slot_count = config.slot_count();
        let SolverConfig {
            stacks,
            dt,
            sweeps,
            tolerance,
            max_iterations,
            convergence,
            channel,
        } = config;
        let slices = stacks
            .into_iter()
            .enumerate()
            .map(|(p, stack)| {
                // Slot count checked against u32::MAX in validate().
                Slice::new(SlotIndex(p as u32), stack, &sweeps, dt)
            })
            .collect();
        tracing::debug!(
            slots = slot_count,
            levels,
            dt,
            tolerance,
            max_iterations,
            channel = ?channel,
            "controller configured"
        );
        Ok(Self {
            slices,
            active: Vec::new(),
            levels,
            sweeps,
            dt,
            max_iterations,
            checker: ConvergenceChecker::new(convergence, tolerance),
            channel: channel.build(slot_count),
            hooks: Box::new(NoopHooks),
            ready: false,
        })
    }

    /// Replace the instrumentation hooks.
    pub fn with_hooks(mut self, hooks: impl Hooks) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Replace the cross-slice channel.
    ///
    /// The channel must accept every slot in `0..slot_count()`.
    pub fn with_channel(mut self, channel: Box<dyn Channel>) -> Self {
        self.channel = channel;
        self
    }

    /// Number of slots `P`.
    pub fn slot_count(&self) -> usize {
        self.slices.len()
    }

    /// Levels per slot.
    pub fn level_count(&self) -> usize {
        self.levels
    }

    /// Width of every slice's window.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Iteration cap per block.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// The convergence checker in use.
    pub fn checker(&self) -> &ConvergenceChecker {
        &self.checker
    }

    /// Slots seeded by the last restart, in order.
    pub fn active_slots(&self) -> &[SlotIndex] {
        &self.active
    }

    /// The slice in `slot`, or `None` if out of range.
    pub fn slice(&self, slot: SlotIndex) -> Option<&Slice> {
        self.slices.get(slot.index())
    }

    /// Mutable access to the slice in `slot`, or `None` if out of range.
    pub fn slice_mut(&mut self, slot: SlotIndex) -> Option<&mut Slice> {
        self.slices.get_mut(slot.index())
    }

    pub(crate) fn hooks_mut(&mut self) -> &mut dyn Hooks {
        &mut *self.hooks
    }

    /// Seed a new block.
    ///
    /// `active` must be the slot prefix `0..n` in order, with `times[i]`
    /// the window start of `active[i]`. Every active slot gets iteration
    /// 0, `done = false`, fresh predecessor/successor links, and its own
    /// copy of `value` as the finest level's initial value. All other
    /// slots become inactive and the channel forgets every message.
    pub fn restart(
        &mut self,
        active: &[SlotIndex],
        times: &[f64],
        value: &[f64],
    ) -> Result<(), RunError> {
        self.ready = false;
        self.check_restart(active, times, value)?;
        for (i, &slot) in active.iter().enumerate() {
            let prev = i.checked_sub(1).map(|j| active[j]);
            let next = active.get(i + 1).copied();
            self.slices[slot.index()].restart(times[i], prev, next, value);
        }
        for slice in &mut self.slices[active.len()..] {
            slice.deactivate();
        }
        self.channel.reset();
        self.active = active.to_vec();
        self.ready = true;
        tracing::trace!(slots = active.len(), t0 = times[0], "restart");
        Ok(())
    }

    /// Reject restarts the slices cannot take.
    ///
    /// The carried value is checked against slot 0 only; `validate`
    /// guarantees every slot's levels share that component count.
    fn check_restart(
        &self,
        active: &[SlotIndex],
        times: &[f64],
        value: &[f64],
    ) -> Result<(), RunError> {
        let invalid = |reason: String| -> Result<(), RunError> {
            Err(RunError::InvalidRestart { reason })
        };
        if active.is_empty() {
            return invalid("no active slots".to_string());
        }
        if active.len() > self.slot_count() {
            return invalid(format!(
                "{} active slots for {} configured",
                active.len(),
                self.slot_count()
            ));
        }
        if times.len() != active.len() {
            return invalid(format!(
                "{} window starts for {} active slots",
                times.len(),
                active.len()
            ));
        }
        if let Some((i, slot)) = active
            .iter()
            .enumerate()
            .find(|(i, slot)| slot.index() != *i)
        {
            return invalid(format!("active slots must be 0..n in order; position {i} holds {slot}"));
        }
        if let Some(t) = times.iter().find(|t| !t.is_finite()) {
            return invalid(format!("window start {t} is not finite"));
        }
        let dim = self.slices[0].finest().dim();
        if value.len() != dim {
            return invalid(format!(
                "initial value has {} components, levels expect {dim}",
                value.len()
            ));
        }
        Ok(())
    }

    /// End point of the finest level of the last active slot.
    ///
    /// `None` before the first restart.
    pub fn result(&self) -> Option<Endpoint> {
        let last = self.active.last()?;
        Some(self.slices[last.index()].end_point())
    }

    /// Run the predictor and main loop for the slots seeded by the last
    /// [`restart()`](Self::restart).
    ///
    /// Any error aborts the block; the controller then refuses another
    /// `run_block` until the next successful restart.
    ///
    /// # Errors
    ///
    /// [`RunError::Comm`] on a tag mismatch, [`RunError::Level`] when a
    /// sweep fails, [`RunError::NonTermination`] when `max_iterations`
    /// iterations leave some slot not done, and
    /// [`RunError::InvalidRestart`] without a preceding restart.
    pub fn run_block(&mut self, block: BlockIndex) -> Result<BlockStats, RunError> {
        if !self.ready {
            return Err(RunError::InvalidRestart {
                reason: "run_block requires a successful restart".to_string(),
            });
        }
        self.ready = false;
        let start = Instant::now();

        let Self {
            slices,
            active,
            levels,
            sweeps,
            dt,
            max_iterations,
            checker,
            channel,
            hooks,
            ..
        } = self;
        let (levels, dt, max_iterations) = (*levels, *dt, *max_iterations);
        let active: &[SlotIndex] = active;
        let t0 = slices[active[0].index()].t0();
        let step = StepEvent {
            block,
            t0,
            active_slots: active.len(),
        };
        hooks.pre_step(step);
        tracing::info!(%block, t0, slots = active.len(), levels, "block started");

        let mut stats = BlockStats {
            block,
            t0,
            active_slots: active.len(),
            level_sweeps: vec![0; levels],
            ..BlockStats::default()
        };
        let sent_before = channel.messages_sent();
        let mut ctx = BlockContext {
            block,
            phase: Phase::Predictor,
            channel: &mut **channel,
            hooks: &mut **hooks,
            stats: &mut stats,
        };

        for &slot in active {
            slices[slot.index()].finest_mut().spread();
        }
        if levels > 1 {
            let predictor_us = predictor::predict(&mut ctx, slices, active, levels)?;
            ctx.stats.predictor_us = predictor_us;
        }

        ctx.phase = Phase::Main;
        let coarsest = LevelIndex((levels - 1) as u32);
        let mut iteration = IterationId::FIRST;
        loop {
            for &slot in active {
                slices[slot.index()].set_iteration(iteration);
            }
            let event = IterationEvent { block, iteration };
            ctx.hooks.pre_iteration(event);

            if levels == 1 {
                ctx.smooth(slices, active, LevelIndex::FINEST, sweeps[0])?;
            } else {
                for l in 0..levels - 1 {
                    for &slot in active {
                        slices[slot.index()].restrict(LevelIndex(l as u32));
                    }
                    if l + 1 < levels - 1 {
                        ctx.smooth(slices, active, LevelIndex(l as u32 + 1), sweeps[l + 1])?;
                    }
                }
                ctx.smooth(slices, active, coarsest, sweeps[levels - 1])?;
                for l in (1..levels).rev() {
                    for &slot in active {
                        slices[slot.index()].prolong(LevelIndex(l as u32));
                    }
                    ctx.smooth(slices, active, LevelIndex(l as u32 - 1), sweeps[l - 1])?;
                }
            }

            let all_done = check_convergence(&mut ctx, slices, active, checker)?;
            ctx.stats.iterations = iteration.0;
            ctx.hooks.post_iteration(event);
            tracing::debug!(
                %block,
                %iteration,
                max_residual = ctx.stats.max_residual(),
                done = active.iter().filter(|s| slices[s.index()].is_done()).count(),
                "iteration finished"
            );
            if all_done {
                break;
            }
            if iteration.0 >= max_iterations {
                let pending: Vec<SlotIndex> = active
                    .iter()
                    .copied()
                    .filter(|s| !slices[s.index()].is_done())
                    .collect();
                stats.messages = channel.messages_sent() - sent_before;
                stats.total_us = start.elapsed().as_micros() as u64;
                tracing::warn!(
                    %block,
                    iterations = max_iterations,
                    pending = pending.len(),
                    max_residual = stats.max_residual(),
                    "block did not converge"
                );
                let last = &slices[active[active.len() - 1].index()];
                let report = RunReport {
                    final_value: last.end_point(),
                    final_time: last.t0() + dt,
                    blocks: Vec::new(),
                };
                let residuals = stats.residuals.clone();
                let mut nt = NonTermination {
                    block,
                    iterations: max_iterations,
                    pending,
                    residuals,
                    report,
                };
                nt.report.blocks.push(stats);
                return Err(nt.into());
            }
            iteration = iteration.next();
        }

        stats.messages = channel.messages_sent() - sent_before;
        stats.total_us = start.elapsed().as_micros() as u64;
        hooks.post_step(step);
        tracing::info!(
            %block,
            iterations = stats.iterations,
            max_residual = stats.max_residual(),
            messages = stats.messages,
            elapsed_us = stats.total_us,
            "block converged"
        );
        Ok(stats)
    }
}

/// Final level-0 exchange, then a residual and `done` flag per slot.
///
/// Returns whether every active slot is done. `done` is recomputed from
/// scratch at every check.
fn check_convergence(
    ctx: &mut BlockContext<'_>,
    slices: &mut [Slice],
    active: &[SlotIndex],
    checker: &ConvergenceChecker,
) -> Result<bool, RunError> {
    ctx.exchange(slices, active, LevelIndex::FINEST)?;
    let mut residuals = Vec::with_capacity(active.len());
    let mut all_done = true;
    for &slot in active {
        let slice = &mut slices[slot.index()];
        let residual = checker.residual(slice.finest());
        let done = checker.is_done(residual);
        slice.state_mut(LevelIndex::FINEST).record_residual(residual);
        slice.set_done(done);
        all_done &= done;
        residuals.push(residual);
    }
    ctx.stats.residuals = residuals;
    Ok(all_done)
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("slots", &self.slices.len())
            .field("levels", &self.levels)
            .field("sweeps", &self.sweeps)
            .field("dt", &self.dt)
            .field("max_iterations", &self.max_iterations)
            .field("active", &self.active.len())
            .field("ready", &self.ready)
            .finish()
    }
}
