//! Core types and traits for the Strata time-parallel solver.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Strata workspace:
//! slot and level indices, message tags, error types, and the traits
//! through which the controller talks to problem-specific numerics.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod hooks;
pub mod id;
pub mod tag;
pub mod traits;

pub use error::{CommError, LevelError};
pub use hooks::{Hooks, IterationEvent, NoopHooks, RunEvent, StepEvent, SweepEvent};
pub use id::{BlockIndex, IterationId, LevelIndex, SlotIndex};
pub use tag::{Endpoint, Message, Tag};
pub use traits::{ConvergencePolicy, Level, LevelStack, Transfer};
