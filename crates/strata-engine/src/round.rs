//! Per-slot building blocks shared by the predictor and the main loop.
//!
//! Every sweep, send and receive in a block goes through a
//! [`BlockContext`], which attaches hook notifications, statistics and
//! error context in one place.

use strata_comm::Channel;
use strata_core::{BlockIndex, Hooks, LevelIndex, SlotIndex, SweepEvent, Tag};

use crate::error::RunError;
use crate::metrics::BlockStats;
use crate::slice::Slice;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Predictor,
    Main,
}

pub(crate) struct BlockContext<'a> {
    pub block: BlockIndex,
    pub phase: Phase,
    pub channel: &'a mut dyn Channel,
    pub hooks: &'a mut dyn Hooks,
    pub stats: &'a mut BlockStats,
}

impl BlockContext<'_> {
    /// One sweep of `level` on `slice`.
    pub fn sweep(&mut self, slice: &mut Slice, level: LevelIndex) -> Result<(), RunError> {
        let event = SweepEvent {
            block: self.block,
            iteration: slice.iteration(),
            level,
            slot: slice.slot(),
        };
        self.hooks.pre_sweep(event);
        let state = slice.state_mut(level);
        state
            .level_mut()
            .sweep()
            .map_err(|source| RunError::Level {
                block: self.block,
                slot: event.slot,
                level,
                source,
            })?;
        state.record_sweep();
        match self.phase {
            Phase::Predictor => self.stats.predictor_sweeps += 1,
            Phase::Main => self.stats.level_sweeps[level.index()] += 1,
        }
        self.hooks.post_sweep(event);
        Ok(())
    }

    /// Send `slice`'s end point at `level` to its successor, if any.
    pub fn send(&mut self, slice: &mut Slice, level: LevelIndex) -> Result<(), RunError> {
        if slice.is_last() {
            return Ok(());
        }
        let tag = Tag::new(level, slice.iteration(), slice.slot());
        let state = slice.state_mut(level);
        let payload = state.level().end_point();
        self.channel.send(tag, &payload).map_err(|source| RunError::Comm {
            block: self.block,
            source,
        })?;
        state.record_send(tag);
        Ok(())
    }

    /// Receive the predecessor's end point at `level`, if any, and make
    /// it the level's initial value.
    ///
    /// The level is touched only after the tag check passed.
    pub fn receive(&mut self, slice: &mut Slice, level: LevelIndex) -> Result<(), RunError> {
        let Some(prev) = slice.prev() else {
            return Ok(());
        };
        let expected = Tag::new(level, slice.iteration(), prev);
        let payload = self
            .channel
            .receive(expected)
            .map_err(|source| RunError::Comm {
                block: self.block,
                source,
            })?;
        slice
            .state_mut(level)
            .level_mut()
            .set_initial_value(&payload);
        Ok(())
    }

    /// `sweeps` rounds over `active`, each slot sweeping, sending, then
    /// receiving its predecessor's fresh end point.
    pub fn smooth(
        &mut self,
        slices: &mut [Slice],
        active: &[SlotIndex],
        level: LevelIndex,
        sweeps: u32,
    ) -> Result<(), RunError> {
        for _ in 0..sweeps {
            for &slot in active {
                let slice = &mut slices[slot.index()];
                self.sweep(slice, level)?;
                self.send(slice, level)?;
                self.receive(slice, level)?;
            }
        }
        Ok(())
    }

    /// One send/receive round at `level` without sweeping.
    pub fn exchange(
        &mut self,
        slices: &mut [Slice],
        active: &[SlotIndex],
        level: LevelIndex,
    ) -> Result<(), RunError> {
        for &slot in active {
            let slice = &mut slices[slot.index()];
            self.send(slice, level)?;
            self.receive(slice, level)?;
        }
        Ok(())
    }
}
