//! Strata: a time-parallel multilevel solver for initial-value problems.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Strata sub-crates. For most users, adding `strata` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! // u' = rate, integrated exactly on two nodes per window.
//! struct Drift {
//!     rate: f64,
//!     dt: f64,
//!     initial: [f64; 1],
//!     values: [f64; 2],
//! }
//!
//! impl Level for Drift {
//!     fn name(&self) -> &str { "drift" }
//!     fn dim(&self) -> usize { 1 }
//!     fn nodes(&self) -> &[f64] { &[0.0, 1.0] }
//!     fn values(&self) -> &[f64] { &self.values }
//!     fn values_mut(&mut self) -> &mut [f64] { &mut self.values }
//!     fn initial_value(&self) -> &[f64] { &self.initial }
//!     fn set_initial_value(&mut self, value: &[f64]) { self.initial.copy_from_slice(value) }
//!     fn set_window(&mut self, _t0: f64, dt: f64) { self.dt = dt }
//!     fn sweep(&mut self) -> Result<(), LevelError> {
//!         self.values = [self.initial[0], self.initial[0] + self.rate * self.dt];
//!         Ok(())
//!     }
//!     fn residual(&self) -> f64 {
//!         (self.values[0] - self.initial[0]).abs()
//!             + (self.values[1] - self.values[0] - self.rate * self.dt).abs()
//!     }
//! }
//!
//! let stacks = (0..2)
//!     .map(|_| {
//!         LevelStack::single(Box::new(Drift {
//!             rate: 0.5,
//!             dt: 1.0,
//!             initial: [0.0],
//!             values: [0.0; 2],
//!         }))
//!     })
//!     .collect();
//! let mut scheduler = BlockScheduler::new(SolverConfig::new(stacks, 1.0)).unwrap();
//! let report = scheduler.run(&[0.0], 0.0, 4.0).unwrap();
//! assert_eq!(report.final_value.as_slice(), &[2.0]);
//! assert_eq!(report.blocks.len(), 2);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strata-core` | IDs, tags, errors, level and transfer traits, hooks |
//! | [`comm`] | `strata-comm` | Tagged channels (`TagTable`, `MailboxChannel`) |
//! | [`engine`] | `strata-engine` | Controller, predictor, scheduler, configuration |
//! | [`problems`] | `strata-problems` | Reference linear ODE and node interpolation |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`strata-core`).
///
/// Contains slot, level and iteration indices, message tags, error types,
/// and the [`types::Level`] and [`types::Transfer`] extension points.
pub use strata_core as types;

/// Tagged cross-slice channels (`strata-comm`).
///
/// [`comm::TagTable`] for the sequential schedule,
/// [`comm::MailboxChannel`] for one inbox per slot.
pub use strata_comm as comm;

/// Block scheduling and the multilevel controller (`strata-engine`).
///
/// [`engine::BlockScheduler`] covers a time horizon block by block;
/// [`engine::Controller`] runs a single block.
pub use strata_engine as engine;

/// Reference problems (`strata-problems`).
///
/// Includes [`problems::LinearOde`] and [`problems::NodeInterpolation`].
pub use strata_problems as problems;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use strata_core::{
        BlockIndex, ConvergencePolicy, Endpoint, Hooks, IterationId, Level, LevelIndex,
        LevelStack, SlotIndex, Tag, Transfer,
    };

    // Errors
    pub use strata_core::{CommError, LevelError};
    pub use strata_engine::{ConfigError, NonTermination, RunError};

    // Engine
    pub use strata_engine::{
        BlockScheduler, BlockStats, ChannelKind, Controller, RunReport, SolverConfig,
        SweepSchedule,
    };

    // Problems
    pub use strata_problems::{linear_ode_stack, LinearOde, NodeInterpolation};
}
