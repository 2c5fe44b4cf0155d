//! Keyed message store for the sequential reference schedule.

use indexmap::IndexMap;
use strata_core::{CommError, Endpoint, LevelIndex, Message, SlotIndex, Tag};

use crate::channel::Channel;

/// Single-threaded [`Channel`] backed by a table of latest sends.
///
/// Each `(sender, level)` pair holds only its most recent message: a
/// receive for an older or newer iteration than the one stored is a
/// sequencing defect and fails. Under the sequential schedule every
/// receive finds its message already present, so nothing ever blocks.
#[derive(Debug)]
pub struct TagTable {
    slot_count: usize,
    latest: IndexMap<(SlotIndex, LevelIndex), Message>,
    last_stamp: IndexMap<SlotIndex, Tag>,
    sent: u64,
}

impl TagTable {
    /// Create an empty table for slots `0..slot_count`.
    pub fn new(slot_count: usize) -> Self {
        Self {
            slot_count,
            latest: IndexMap::new(),
            last_stamp: IndexMap::new(),
            sent: 0,
        }
    }

    /// Number of slots the table accepts.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Number of `(sender, level)` pairs with a stored message.
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    /// Whether no message is stored.
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    fn check_slot(&self, slot: SlotIndex) -> Result<(), CommError> {
        if slot.index() < self.slot_count {
            Ok(())
        } else {
            Err(CommError::UnknownSlot {
                slot,
                slot_count: self.slot_count,
            })
        }
    }
}

impl Channel for TagTable {
    fn send(&mut self, tag: Tag, payload: &[f64]) -> Result<(), CommError> {
        self.check_slot(tag.slot)?;
        tracing::trace!(%tag, "send");
        self.latest
            .insert((tag.slot, tag.level), Message::new(tag, payload));
        self.last_stamp.insert(tag.slot, tag);
        self.sent += 1;
        Ok(())
    }

    fn receive(&mut self, expected: Tag) -> Result<Endpoint, CommError> {
        self.check_slot(expected.slot)?;
        match self.latest.get(&(expected.slot, expected.level)) {
            Some(msg) if msg.tag == expected => {
                tracing::trace!(tag = %expected, "receive");
                Ok(msg.payload.clone())
            }
            _ => Err(CommError::NoMatchingSend {
                expected,
                latest_from_sender: self.last_stamp.get(&expected.slot).copied(),
            }),
        }
    }

    fn reset(&mut self) {
        self.latest.clear();
        self.last_stamp.clear();
    }

    fn messages_sent(&self) -> u64 {
        self.sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::IterationId;

    fn tag(level: u32, iteration: u32, slot: u32) -> Tag {
        Tag::new(LevelIndex(level), IterationId(iteration), SlotIndex(slot))
    }

    #[test]
    fn receive_returns_matching_payload() {
        let mut table = TagTable::new(4);
        table.send(tag(0, 1, 2), &[1.5, -2.5]).unwrap();
        let got = table.receive(tag(0, 1, 2)).unwrap();
        assert_eq!(got.as_slice(), &[1.5, -2.5]);
    }

    #[test]
    fn receive_can_be_repeated() {
        let mut table = TagTable::new(2);
        table.send(tag(0, 1, 0), &[3.0]).unwrap();
        assert_eq!(table.receive(tag(0, 1, 0)).unwrap().as_slice(), &[3.0]);
        assert_eq!(table.receive(tag(0, 1, 0)).unwrap().as_slice(), &[3.0]);
    }

    #[test]
    fn later_send_replaces_earlier_one() {
        let mut table = TagTable::new(2);
        table.send(tag(1, 2, 0), &[1.0]).unwrap();
        table.send(tag(1, 2, 0), &[2.0]).unwrap();
        assert_eq!(table.receive(tag(1, 2, 0)).unwrap().as_slice(), &[2.0]);
        assert_eq!(table.messages_sent(), 2);
    }

    #[test]
    fn iteration_mismatch_is_an_error() {
        let mut table = TagTable::new(2);
        table.send(tag(0, 2, 0), &[1.0]).unwrap();
        match table.receive(tag(0, 3, 0)) {
            Err(CommError::NoMatchingSend {
                expected,
                latest_from_sender,
            }) => {
                assert_eq!(expected, tag(0, 3, 0));
                assert_eq!(latest_from_sender, Some(tag(0, 2, 0)));
            }
            other => panic!("expected NoMatchingSend, got {other:?}"),
        }
    }

    #[test]
    fn newer_send_hides_older_iteration() {
        let mut table = TagTable::new(2);
        table.send(tag(0, 1, 0), &[1.0]).unwrap();
        table.send(tag(0, 2, 0), &[2.0]).unwrap();
        assert!(table.receive(tag(0, 1, 0)).is_err());
    }

    #[test]
    fn level_mismatch_is_an_error() {
        let mut table = TagTable::new(2);
        table.send(tag(1, 1, 0), &[1.0]).unwrap();
        match table.receive(tag(0, 1, 0)) {
            Err(CommError::NoMatchingSend {
                latest_from_sender, ..
            }) => assert_eq!(latest_from_sender, Some(tag(1, 1, 0))),
            other => panic!("expected NoMatchingSend, got {other:?}"),
        }
    }

    #[test]
    fn sender_mismatch_is_an_error() {
        let mut table = TagTable::new(3);
        table.send(tag(0, 1, 1), &[1.0]).unwrap();
        match table.receive(tag(0, 1, 0)) {
            Err(CommError::NoMatchingSend {
                latest_from_sender, ..
            }) => assert_eq!(latest_from_sender, None),
            other => panic!("expected NoMatchingSend, got {other:?}"),
        }
    }

    #[test]
    fn unknown_slot_rejected() {
        let mut table = TagTable::new(2);
        assert_eq!(
            table.send(tag(0, 1, 2), &[1.0]),
            Err(CommError::UnknownSlot {
                slot: SlotIndex(2),
                slot_count: 2,
            })
        );
        assert_eq!(table.messages_sent(), 0);
    }

    #[test]
    fn reset_forgets_messages() {
        let mut table = TagTable::new(2);
        table.send(tag(0, 1, 0), &[1.0]).unwrap();
        table.reset();
        assert!(table.is_empty());
        assert!(table.receive(tag(0, 1, 0)).is_err());
    }

    #[test]
    fn received_payload_is_independent_copy() {
        let mut table = TagTable::new(2);
        table.send(tag(0, 1, 0), &[4.0]).unwrap();
        let mut first = table.receive(tag(0, 1, 0)).unwrap();
        first[0] = -1.0;
        assert_eq!(table.receive(tag(0, 1, 0)).unwrap().as_slice(), &[4.0]);
    }
}
