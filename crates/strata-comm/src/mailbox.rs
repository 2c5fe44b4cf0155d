//! Per-slot inboxes over `crossbeam-channel`.
//!
//! Each slot owns an unbounded inbox; a send from slot `p` lands in the
//! inbox of slot `p + 1`. A receive first drains everything that has
//! arrived into the receiver's local table, then looks up the expected
//! tag. Nothing here depends on the controller running slots in order,
//! which is what lets the same protocol move onto one thread per slot.

use crossbeam_channel::{Receiver, Sender};
use indexmap::IndexMap;
use strata_core::{CommError, Endpoint, LevelIndex, Message, SlotIndex, Tag};

use crate::channel::Channel;

#[derive(Debug)]
struct Inbox {
    rx: Receiver<Message>,
    latest: IndexMap<LevelIndex, Message>,
    last_arrival: Option<Tag>,
}

impl Inbox {
    fn drain(&mut self) {
        for msg in self.rx.try_iter() {
            self.last_arrival = Some(msg.tag);
            self.latest.insert(msg.tag.level, msg);
        }
    }
}

/// [`Channel`] with one `crossbeam-channel` inbox per slot.
#[derive(Debug)]
pub struct MailboxChannel {
    senders: Vec<Sender<Message>>,
    inboxes: Vec<Inbox>,
    sent: u64,
}

impl MailboxChannel {
    /// Create inboxes for slots `0..slot_count`.
    pub fn new(slot_count: usize) -> Self {
        let mut senders = Vec::with_capacity(slot_count);
        let mut inboxes = Vec::with_capacity(slot_count);
        for _ in 0..slot_count {
            let (tx, rx) = crossbeam_channel::unbounded();
            senders.push(tx);
            inboxes.push(Inbox {
                rx,
                latest: IndexMap::new(),
                last_arrival: None,
            });
        }
        Self {
            senders,
            inboxes,
            sent: 0,
        }
    }

    /// Number of slots with an inbox.
    pub fn slot_count(&self) -> usize {
        self.inboxes.len()
    }

    /// Messages sitting in `slot`'s inbox that no receive has drained yet.
    pub fn pending(&self, slot: SlotIndex) -> usize {
        self.inboxes
            .get(slot.index())
            .map_or(0, |inbox| inbox.rx.len())
    }

    fn receiver_of(&self, sender: SlotIndex) -> Result<SlotIndex, CommError> {
        let slot_count = self.slot_count();
        match sender.successor() {
            Some(receiver) if receiver.index() < slot_count => Ok(receiver),
            _ => Err(CommError::UnknownSlot {
                slot: sender,
                slot_count,
            }),
        }
    }
}

impl Channel for MailboxChannel {
    fn send(&mut self, tag: Tag, payload: &[f64]) -> Result<(), CommError> {
        let receiver = self.receiver_of(tag.slot)?;
        self.senders[receiver.index()]
            .send(Message::new(tag, payload))
            .map_err(|_| CommError::Disconnected { slot: receiver })?;
        tracing::trace!(%tag, %receiver, "mailbox send");
        self.sent += 1;
        Ok(())
    }

    fn receive(&mut self, expected: Tag) -> Result<Endpoint, CommError> {
        let receiver = self.receiver_of(expected.slot)?;
        let inbox = &mut self.inboxes[receiver.index()];
        inbox.drain();
        match inbox.latest.get(&expected.level) {
            Some(msg) if msg.tag == expected => Ok(msg.payload.clone()),
            _ => Err(CommError::NoMatchingSend {
                expected,
                latest_from_sender: inbox.last_arrival,
            }),
        }
    }

    fn reset(&mut self) {
        for inbox in &mut self.inboxes {
            inbox.drain();
            inbox.latest.clear();
            inbox.last_arrival = None;
        }
    }

    fn messages_sent(&self) -> u64 {
        self.sent
    }
}
