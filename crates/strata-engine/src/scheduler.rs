//! Time-horizon partitioning into blocks of slices.
//!
//! [`BlockScheduler::run`] covers `[t_start, t_end)` with consecutive
//! blocks of `P` windows of width `dt`. Within a block, slot `p` of block
//! `k` starts at `t_start + (p + k·P)·dt`; slots whose window would start
//! at or after `t_end` sit the block out. Each block is seeded with the
//! previous block's final end point.

use strata_core::{BlockIndex, Endpoint, Hooks, RunEvent, SlotIndex};

use crate::config::{ConfigError, SolverConfig};
use crate::controller::Controller;
use crate::error::RunError;
use crate::metrics::RunReport;

/// Drives a [`Controller`] block by block across a time horizon.
///
/// # Examples
///
/// ```
/// use strata_engine::{BlockScheduler, SolverConfig};
/// use strata_problems::linear_ode_stack;
///
/// let stacks = (0..4)
///     .map(|_| linear_ode_stack(&[-1.0], &[5, 3]).unwrap())
///     .collect();
/// let mut scheduler = BlockScheduler::new(SolverConfig::new(stacks, 1.0)).unwrap();
///
/// let report = scheduler.run(&[1.0], 0.0, 4.0).unwrap();
/// assert_eq!(report.final_time, 4.0);
/// assert!((report.final_value[0] - (-4.0f64).exp()).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct BlockScheduler {
    controller: Controller,
    t_start: f64,
    blocks_done: u64,
}

impl BlockScheduler {
    /// Validate `config` and build the underlying controller.
    pub fn new(config: SolverConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_controller(Controller::new(config)?))
    }

    /// Schedule blocks on an existing controller.
    pub fn from_controller(controller: Controller) -> Self {
        Self {
            controller,
            t_start: 0.0,
            blocks_done: 0,
        }
    }

    /// Replace the instrumentation hooks.
    pub fn with_hooks(self, hooks: impl Hooks) -> Self {
        Self {
            controller: self.controller.with_hooks(hooks),
            ..self
        }
    }

    /// The controller running each block.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Mutable access to the controller.
    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    /// Window start of `slot` in the next block, or `None` if the slot
    /// does not exist.
    ///
    /// After a run of `k` blocks this is `t_start + (p + k·P)·dt`:
    /// every slot's time has advanced by `k·P·dt`.
    pub fn slot_time(&self, slot: SlotIndex) -> Option<f64> {
        (slot.index() < self.controller.slot_count()).then(|| self.window_start(slot.index()))
    }

    fn window_start(&self, p: usize) -> f64 {
        let slots = self.controller.slot_count() as u64;
        let offset = p as u64 + self.blocks_done * slots;
        self.t_start + offset as f64 * self.controller.dt()
    }

    /// Integrate from `initial` over `[t_start, t_end)`.
    ///
    /// An empty interval (`t_end <= t_start`) runs no block and returns
    /// `initial` at `t_start`. The last window may end past `t_end`;
    /// [`RunReport::final_time`] reports where it actually ends.
    ///
    /// # Errors
    ///
    /// [`RunError::InvalidInterval`] if either bound is not finite,
    /// [`RunError::InvalidRestart`] if `initial` has the wrong number of
    /// components, and any error of [`Controller::run_block`]. On
    /// [`RunError::NonTermination`] the carried report holds every block
    /// run so far.
    pub fn run(&mut self, initial: &[f64], t_start: f64, t_end: f64) -> Result<RunReport, RunError> {
        if !t_start.is_finite() || !t_end.is_finite() {
            return Err(RunError::InvalidInterval { t_start, t_end });
        }
        self.t_start = t_start;
        self.blocks_done = 0;
        let event = RunEvent { t_start, t_end };
        self.controller.hooks_mut().pre_run(event);
        tracing::info!(
            t_start,
            t_end,
            slots = self.controller.slot_count(),
            levels = self.controller.level_count(),
            dt = self.controller.dt(),
            "run started"
        );

        let result = self.run_blocks(initial, t_end);

        self.controller.hooks_mut().post_run(event);
        match &result {
            Ok(report) => tracing::info!(
                blocks = report.blocks.len(),
                iterations = report.total_iterations(),
                final_time = report.final_time,
                "run finished"
            ),
            Err(e) => tracing::warn!(error = %e, "run failed"),
        }
        result
    }

    fn run_blocks(&mut self, initial: &[f64], t_end: f64) -> Result<RunReport, RunError> {
        let dt = self.controller.dt();
        let mut report = RunReport {
            final_value: Endpoint::from_slice(initial),
            final_time: self.t_start,
            blocks: Vec::new(),
        };
        let mut block = BlockIndex(0);
        loop {
            let times: Vec<f64> = (0..self.controller.slot_count())
                .map(|p| self.window_start(p))
                .take_while(|&t| t < t_end)
                .collect();
            let Some(&last_t0) = times.last() else {
                break;
            };
            let active: Vec<SlotIndex> = (0..times.len() as u32).map(SlotIndex).collect();
            self.controller
                .restart(&active, &times, &report.final_value)?;
            match self.controller.run_block(block) {
                Ok(stats) => report.blocks.push(stats),
                Err(RunError::NonTermination(mut nt)) => {
                    report.blocks.append(&mut nt.report.blocks);
                    nt.report.blocks = report.blocks;
                    return Err(RunError::NonTermination(nt));
                }
                Err(e) => return Err(e),
            }
            if let Some(value) = self.controller.result() {
                report.final_value = value;
            }
            report.final_time = last_t0 + dt;
            self.blocks_done += 1;
            block = block.next();
        }
        Ok(report)
    }
}
