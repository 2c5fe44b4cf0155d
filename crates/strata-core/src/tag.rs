//! Message tags and payloads exchanged between slices.

use smallvec::SmallVec;
use std::fmt;

use crate::id::{IterationId, LevelIndex, SlotIndex};

/// Representative state transmitted from one slice to its successor.
///
/// Uses `SmallVec<[f64; 4]>` so small ODE systems travel without heap
/// allocation. Every message boundary copies the endpoint; a receiver
/// never aliases the sender's level storage.
pub type Endpoint = SmallVec<[f64; 4]>;

/// The `(level, iteration, sender)` triple that identifies a message.
///
/// A receive names the tag it expects; the channel must hand back the
/// payload stamped with exactly that tag or fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    /// Level the endpoint was extracted from.
    pub level: LevelIndex,
    /// Iteration during which the sender produced the endpoint.
    pub iteration: IterationId,
    /// Slot of the sender.
    pub slot: SlotIndex,
}

impl Tag {
    /// Build a tag from its three components.
    pub fn new(level: LevelIndex, iteration: IterationId, slot: SlotIndex) -> Self {
        Self {
            level,
            iteration,
            slot,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(level {}, iteration {}, slot {})",
            self.level, self.iteration, self.slot
        )
    }
}

/// A stamped endpoint in flight between two slots.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Tag stamped by the sender.
    pub tag: Tag,
    /// Owned copy of the sender's endpoint.
    pub payload: Endpoint,
}

impl Message {
    /// Stamp a copy of `payload` with `tag`.
    pub fn new(tag: Tag, payload: &[f64]) -> Self {
        Self {
            tag,
            payload: Endpoint::from_slice(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_order_by_level_then_iteration_then_slot() {
        let a = Tag::new(LevelIndex(0), IterationId(5), SlotIndex(3));
        let b = Tag::new(LevelIndex(1), IterationId(0), SlotIndex(0));
        let c = Tag::new(LevelIndex(1), IterationId(0), SlotIndex(1));
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn message_copies_payload() {
        let mut source = vec![1.0, 2.0];
        let msg = Message::new(
            Tag::new(LevelIndex(0), IterationId(1), SlotIndex(0)),
            &source,
        );
        source[0] = 99.0;
        assert_eq!(msg.payload.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn tag_display_names_all_components() {
        let tag = Tag::new(LevelIndex(2), IterationId(7), SlotIndex(1));
        assert_eq!(tag.to_string(), "(level 2, iteration 7, slot 1)");
    }
}
