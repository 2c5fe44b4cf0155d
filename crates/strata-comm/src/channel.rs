//! The [`Channel`] trait.

use strata_core::{CommError, Endpoint, Tag};

/// Tagged point-to-point transport between adjacent slots.
///
/// # Contract
///
/// - `send()` stores an owned copy of `payload` stamped with `tag`. A
///   later send with the same tag replaces the earlier one.
/// - `receive()` returns a fresh copy of the most recent payload stamped
///   with exactly `expected`, where `expected.slot` is the *sender*.
///   If no such send exists it fails with
///   [`CommError::NoMatchingSend`] and has no other effect.
/// - `reset()` forgets every message; called when a block restarts.
///
/// # Object safety
///
/// This trait is object-safe; the controller holds a `Box<dyn Channel>`.
pub trait Channel: Send {
    /// Stamp and store a copy of `payload`.
    fn send(&mut self, tag: Tag, payload: &[f64]) -> Result<(), CommError>;

    /// Copy out the payload stamped with exactly `expected`.
    fn receive(&mut self, expected: Tag) -> Result<Endpoint, CommError>;

    /// Drop every stored message.
    fn reset(&mut self);

    /// Number of sends accepted since construction.
    fn messages_sent(&self) -> u64;
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send(&mut self, tag: Tag, payload: &[f64]) -> Result<(), CommError> {
        (**self).send(tag, payload)
    }

    fn receive(&mut self, expected: Tag) -> Result<Endpoint, CommError> {
        (**self).receive(expected)
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn messages_sent(&self) -> u64 {
        (**self).messages_sent()
    }
}
