//! Tagged cross-slice message channels for the Strata solver.
//!
//! The controller expresses every interaction between slices as a
//! tagged send followed by a receive that names the exact tag it
//! expects. This crate defines that contract ([`Channel`]) and two
//! backends:
//!
//! - [`TagTable`]: a keyed store for the sequential reference schedule.
//! - [`MailboxChannel`]: one inbox per slot over `crossbeam-channel`,
//!   the shape a backend with one worker per slot takes.
//!
//! Both enforce the same tag discipline, so swapping one for the other
//! never changes the result of a run.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod mailbox;
pub mod table;

pub use channel::Channel;
pub use mailbox::MailboxChannel;
pub use table::TagTable;
