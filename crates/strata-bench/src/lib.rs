//! Benchmark profiles for the Strata solver.
//!
//! - [`decay_profile`]: scalar exponential decay, configurable slots and levels
//! - [`system_profile`]: eight uncoupled rates on a fine 33-node grid

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_core::LevelStack;
use strata_engine::{SolverConfig, SweepSchedule};
use strata_problems::linear_ode_stack;

/// Node counts halving from 17 down to 3, one entry per level.
fn node_counts(levels: usize) -> Vec<usize> {
    (0..levels)
        .map(|l| ((16usize >> l.min(3)) + 1).max(3))
        .collect()
}

fn stacks(slots: usize, rates: &[f64], nodes: &[usize]) -> Vec<LevelStack> {
    (0..slots)
        .map(|_| linear_ode_stack(rates, nodes).expect("benchmark profile shapes are valid"))
        .collect()
}

/// Scalar decay `u' = -u` with `slots` slices of `levels` levels, dt=0.25.
///
/// # Panics
///
/// Panics if `slots` or `levels` is zero.
pub fn decay_profile(slots: usize, levels: usize) -> SolverConfig {
    assert!(slots > 0 && levels > 0, "profile needs at least one slot and level");
    let mut cfg = SolverConfig::new(stacks(slots, &[-1.0], &node_counts(levels)), 0.25);
    cfg.tolerance = 1e-12;
    cfg
}

/// Eight decoupled rates on 33/17/9 nodes with two finer sweeps per level.
pub fn system_profile(slots: usize) -> SolverConfig {
    let rates = [-2.0, -1.5, -1.0, -0.5, -0.25, 0.1, 0.2, 0.3];
    let mut cfg = SolverConfig::new(stacks(slots, &rates, &[33, 17, 9]), 0.125);
    cfg.sweeps = SweepSchedule::with_finer(&[2, 2]).into();
    cfg.tolerance = 1e-12;
    cfg
}
