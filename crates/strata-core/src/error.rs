//! Error types shared across the Strata workspace.
//!
//! Split by subsystem: [`LevelError`] for failures inside the numerics
//! behind a [`Level`](crate::Level), [`CommError`] for tag-discipline
//! violations in the cross-slice channel.

use std::error::Error;
use std::fmt;

use crate::id::SlotIndex;
use crate::tag::Tag;

/// Errors raised by a [`Level`](crate::Level) implementation.
///
/// Returned by `Level::sweep()` and wrapped with slot/level context by
/// the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum LevelError {
    /// The sweep failed for a problem-specific reason.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// A sweep produced a NaN or infinite value.
    NonFinite {
        /// Node at which the first non-finite value appeared.
        node: usize,
    },
    /// A value handed to the level has the wrong number of components.
    DimensionMismatch {
        /// Components the level expects per node.
        expected: usize,
        /// Components that were supplied.
        found: usize,
    },
    /// The level was constructed with an unusable shape.
    InvalidShape {
        /// Description of the shape problem.
        reason: String,
    },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "sweep failed: {reason}"),
            Self::NonFinite { node } => write!(f, "non-finite value at node {node}"),
            Self::DimensionMismatch { expected, found } => {
                write!(f, "expected {expected} components, got {found}")
            }
            Self::InvalidShape { reason } => write!(f, "invalid level shape: {reason}"),
        }
    }
}

impl Error for LevelError {}

/// Errors from the cross-slice channel.
///
/// Every variant signals a sequencing defect, never a transient fault:
/// the controller aborts the current block and does not retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommError {
    /// No send matches the tag the receiver expected.
    NoMatchingSend {
        /// Tag the receiver asked for.
        expected: Tag,
        /// Most recent tag the expected sender actually stamped, if any.
        latest_from_sender: Option<Tag>,
    },
    /// A tag names a slot outside the channel's slot range.
    UnknownSlot {
        /// The offending slot.
        slot: SlotIndex,
        /// Number of slots the channel was built for.
        slot_count: usize,
    },
    /// The transport behind a slot's inbox has gone away.
    Disconnected {
        /// Slot whose inbox is unreachable.
        slot: SlotIndex,
    },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatchingSend {
                expected,
                latest_from_sender,
            } => {
                write!(f, "no send matches {expected}")?;
                if let Some(latest) = latest_from_sender {
                    write!(f, "; sender last stamped {latest}")?;
                }
                Ok(())
            }
            Self::UnknownSlot { slot, slot_count } => {
                write!(f, "slot {slot} out of range (slot_count={slot_count})")
            }
            Self::Disconnected { slot } => write!(f, "inbox of slot {slot} disconnected"),
        }
    }
}

impl Error for CommError {}
