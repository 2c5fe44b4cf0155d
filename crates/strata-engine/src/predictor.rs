//! Causal bootstrap of the coarsest level across all active slots.
//!
//! Before the first main-loop iteration every slot's finest state is
//! restricted to the coarsest level. The cascade then runs one step per
//! active slot: at step `q`, slots `q..` sweep once and send, after which
//! slots `q + 1..` take their predecessor's end point. Slot `p` ends up
//! having swept `p + 1` times, each sweep fed by one more upstream
//! sweep than its predecessor's, and the corrected coarsest state is
//! prolonged back up to the finest level.
//!
//! All predictor traffic is tagged with [`IterationId::PREDICTOR`].

use std::time::Instant;

use strata_core::{IterationId, LevelIndex, SlotIndex};

use crate::error::RunError;
use crate::round::BlockContext;
use crate::slice::Slice;

/// Run the predictor over `active` slots with `levels` levels each.
///
/// Returns the wall-clock time spent, in microseconds.
pub(crate) fn predict(
    ctx: &mut BlockContext<'_>,
    slices: &mut [Slice],
    active: &[SlotIndex],
    levels: usize,
) -> Result<u64, RunError> {
    let start = Instant::now();
    let coarsest = LevelIndex((levels - 1) as u32);
    debug_assert!(active
        .iter()
        .all(|&s| slices[s.index()].iteration() == IterationId::PREDICTOR));

    for &slot in active {
        let slice = &mut slices[slot.index()];
        for l in 0..levels - 1 {
            slice.restrict(LevelIndex(l as u32));
        }
    }

    for q in 0..active.len() {
        for &slot in &active[q..] {
            let slice = &mut slices[slot.index()];
            ctx.sweep(slice, coarsest)?;
            ctx.send(slice, coarsest)?;
        }
        for &slot in &active[q + 1..] {
            ctx.receive(&mut slices[slot.index()], coarsest)?;
        }
    }

    for &slot in active {
        let slice = &mut slices[slot.index()];
        for l in (1..levels).rev() {
            slice.prolong(LevelIndex(l as u32));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    tracing::debug!(
        block = %ctx.block,
        slots = active.len(),
        sweeps = ctx.stats.predictor_sweeps,
        elapsed_us = elapsed,
        "predictor finished"
    );
    Ok(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BlockStats;
    use crate::round::Phase;
    use strata_comm::TagTable;
    use strata_core::NoopHooks;
    use strata_test_utils::cascade_stacks;

    fn slices(n: usize, levels: usize) -> Vec<Slice> {
        let sweeps = vec![1; levels];
        let mut out: Vec<Slice> = cascade_stacks(n, levels)
            .into_iter()
            .enumerate()
            .map(|(p, stack)| Slice::new(SlotIndex(p as u32), stack, &sweeps, 1.0))
            .collect();
        for p in 0..n {
            let prev = (p > 0).then(|| SlotIndex(p as u32 - 1));
            let next = (p + 1 < n).then(|| SlotIndex(p as u32 + 1));
            out[p].restart(p as f64, prev, next, &[0.0]);
        }
        out
    }

    fn run(n: usize, levels: usize) -> (Vec<Slice>, BlockStats) {
        let mut slices = slices(n, levels);
        let active: Vec<SlotIndex> = (0..n as u32).map(SlotIndex).collect();
        let mut channel = TagTable::new(n);
        let mut hooks = NoopHooks;
        let mut stats = BlockStats {
            level_sweeps: vec![0; levels],
            ..BlockStats::default()
        };
        let mut ctx = BlockContext {
            block: Default::default(),
            phase: Phase::Predictor,
            channel: &mut channel,
            hooks: &mut hooks,
            stats: &mut stats,
        };
        predict(&mut ctx, &mut slices, &active, levels).unwrap();
        (slices, stats)
    }

    #[test]
    fn slot_p_sweeps_p_plus_one_times() {
        let (slices, stats) = run(5, 2);
        for (p, s) in slices.iter().enumerate() {
            assert_eq!(s.level(LevelIndex(1)).unwrap().sweeps_done(), p as u64 + 1);
            assert_eq!(s.level(LevelIndex(1)).unwrap().sweep_count(), p as u32 + 1);
            assert_eq!(s.level(LevelIndex(0)).unwrap().sweeps_done(), 0);
        }
        assert_eq!(stats.predictor_sweeps, 15);
    }

    #[test]
    fn cascade_reaches_finest_level() {
        let (slices, _) = run(4, 3);
        for (p, s) in slices.iter().enumerate() {
            assert_eq!(s.end_point().as_slice(), &[p as f64 + 1.0]);
        }
    }

    #[test]
    fn predictor_tags_use_iteration_zero() {
        let (slices, _) = run(3, 2);
        let sent = slices[1].level(LevelIndex(1)).unwrap().last_sent().unwrap();
        assert_eq!(sent.iteration, IterationId::PREDICTOR);
        assert!(slices[2].level(LevelIndex(1)).unwrap().last_sent().is_none());
    }
}
