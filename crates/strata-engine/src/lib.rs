//! Block scheduler and multilevel controller for the Strata solver.
//!
//! A run partitions `[t_start, t_end)` into blocks of `P` contiguous
//! slices. Within a block the [`Controller`] seeds every slice's coarsest
//! level with a causal predictor cascade, then iterates
//! restrict → coarse solve → prolong → smooth across all slices until
//! every slice's residual is within tolerance. The [`BlockScheduler`]
//! carries each block's final end point into the next block.
//!
//! Slices never touch each other's state. Every cross-slice value moves
//! through a [`Channel`](strata_comm::Channel) under an exact
//! `(level, iteration, slot)` tag check, so the same control flow holds
//! whether slices run in order on one thread or on separate workers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod convergence;
pub mod error;
pub mod metrics;
mod predictor;
mod round;
pub mod scheduler;
pub mod slice;

pub use config::{ChannelKind, ConfigError, SolverConfig, SweepSchedule};
pub use controller::Controller;
pub use convergence::{AbsoluteTolerance, ConvergenceChecker};
pub use error::{NonTermination, RunError};
pub use metrics::{BlockStats, RunReport};
pub use scheduler::BlockScheduler;
pub use slice::{LevelState, Slice};
