//! Per-block statistics and the run report.
//!
//! [`BlockStats`] captures the work one block performed; the scheduler
//! collects them into a [`RunReport`] together with the final value.

use strata_core::{BlockIndex, Endpoint};

/// Work and timing collected while running one block.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockStats {
    /// The block.
    pub block: BlockIndex,
    /// Window start of the block's first slot.
    pub t0: f64,
    /// Slots that took part in the block.
    pub active_slots: usize,
    /// Main-loop iterations performed.
    pub iterations: u32,
    /// Residual of each active slot at the last convergence check.
    pub residuals: Vec<f64>,
    /// Main-loop sweeps per level, summed over slots.
    pub level_sweeps: Vec<u64>,
    /// Coarsest-level sweeps performed by the predictor.
    pub predictor_sweeps: u64,
    /// Cross-slice messages sent, predictor included.
    pub messages: u64,
    /// Wall-clock time of the predictor.
    pub predictor_us: u64,
    /// Wall-clock time of the whole block.
    pub total_us: u64,
}

impl BlockStats {
    /// Largest residual at the last check. NaN if any residual is NaN.
    pub fn max_residual(&self) -> f64 {
        self.residuals.iter().fold(0.0, |acc: f64, &r| {
            if r.is_nan() || acc.is_nan() {
                f64::NAN
            } else {
                acc.max(r)
            }
        })
    }

    /// Sweeps of every kind in this block.
    pub fn total_sweeps(&self) -> u64 {
        self.level_sweeps.iter().sum::<u64>() + self.predictor_sweeps
    }
}

/// Outcome of a [`BlockScheduler`](crate::BlockScheduler) run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    /// End point of the finest level of the last active slot in the
    /// last block.
    pub final_value: Endpoint,
    /// End of the last active slot's window.
    pub final_time: f64,
    /// Per-block statistics in run order.
    pub blocks: Vec<BlockStats>,
}

impl RunReport {
    /// Main-loop iterations across all blocks.
    pub fn total_iterations(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.iterations)).sum()
    }

    /// Sweeps across all blocks.
    pub fn total_sweeps(&self) -> u64 {
        self.blocks.iter().map(BlockStats::total_sweeps).sum()
    }

    /// Messages across all blocks.
    pub fn total_messages(&self) -> u64 {
        self.blocks.iter().map(|b| b.messages).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let s = BlockStats::default();
        assert_eq!(s.iterations, 0);
        assert_eq!(s.total_sweeps(), 0);
        assert_eq!(s.max_residual(), 0.0);
    }

    #[test]
    fn max_residual_propagates_nan() {
        let s = BlockStats {
            residuals: vec![1e-3, f64::NAN, 2e-3],
            ..BlockStats::default()
        };
        assert!(s.max_residual().is_nan());
    }

    #[test]
    fn report_totals_sum_blocks() {
        let block = |iterations, sweeps: Vec<u64>| BlockStats {
            iterations,
            level_sweeps: sweeps,
            predictor_sweeps: 3,
            messages: 5,
            ..BlockStats::default()
        };
        let report = RunReport {
            blocks: vec![block(2, vec![4, 2]), block(3, vec![6, 3])],
            ..RunReport::default()
        };
        assert_eq!(report.total_iterations(), 5);
        assert_eq!(report.total_sweeps(), 15 + 6);
        assert_eq!(report.total_messages(), 10);
    }
}
