//! Strongly-typed indices for slots, levels, iterations and blocks.
//!
//! Slots and levels are both small integers, and mixing them up is the
//! classic first/last boundary defect. Each gets its own newtype so the
//! compiler keeps them apart; lookups through these types go via
//! `get()`-style accessors that return `Option` instead of panicking.

use std::fmt;

/// Position of a slice within the current block (`0..P`).
///
/// Slot 0 always covers the earliest time window of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub u32);

impl SlotIndex {
    /// The first slot of every block.
    pub const FIRST: Self = Self(0);

    /// The slot as a `usize` for indexing into per-slot storage.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The slot immediately before this one, or `None` for slot 0.
    pub fn predecessor(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    /// The slot immediately after this one.
    ///
    /// Returns `None` only on `u32` overflow; whether the successor is
    /// actually active is decided by the block, not by the index.
    pub fn successor(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SlotIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Position of a level within a slice's stack. Level 0 is the finest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelIndex(pub u32);

impl LevelIndex {
    /// The finest level of every slice.
    pub const FINEST: Self = Self(0);

    /// The level as a `usize` for indexing into per-level storage.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The next coarser level (index + 1).
    pub fn coarser(self) -> Self {
        Self(self.0 + 1)
    }

    /// The next finer level, or `None` at the finest level.
    pub fn finer(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    /// The coarsest level of a stack with `level_count` levels.
    ///
    /// Returns `None` for an empty stack.
    pub fn coarsest(level_count: usize) -> Option<Self> {
        let last = level_count.checked_sub(1)?;
        u32::try_from(last).ok().map(Self)
    }
}

impl fmt::Display for LevelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LevelIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Main-loop iteration counter within one block.
///
/// Iteration 0 is reserved for the predictor; the main loop counts
/// from [`IterationId::FIRST`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IterationId(pub u32);

impl IterationId {
    /// Iteration stamped on every predictor message.
    pub const PREDICTOR: Self = Self(0);

    /// First main-loop iteration.
    pub const FIRST: Self = Self(1);

    /// The following iteration.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for IterationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for IterationId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Sequential index of a block within one scheduler run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockIndex(pub u32);

impl BlockIndex {
    /// The following block.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BlockIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
