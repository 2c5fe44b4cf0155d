//! One time slice: its level stack plus iteration status.

use strata_core::{
    Endpoint, IterationId, Level, LevelIndex, LevelStack, SlotIndex, Tag, Transfer,
};

/// One level of a slice together with its bookkeeping.
pub struct LevelState {
    level: Box<dyn Level>,
    sweeps: u32,
    sweep_count: u32,
    sweeps_done: u64,
    residual: Option<f64>,
    last_sent: Option<Tag>,
}

impl LevelState {
    fn new(level: Box<dyn Level>, sweeps: u32) -> Self {
        Self {
            level,
            sweeps,
            sweep_count: 0,
            sweeps_done: 0,
            residual: None,
            last_sent: None,
        }
    }

    /// The level itself.
    pub fn level(&self) -> &dyn Level {
        &*self.level
    }

    /// Mutable access to the level.
    pub fn level_mut(&mut self) -> &mut dyn Level {
        &mut *self.level
    }

    /// Sweeps per smoothing step.
    pub fn configured_sweeps(&self) -> u32 {
        self.sweeps
    }

    /// Sweeps performed in the slice's current iteration.
    ///
    /// Reset whenever the slice moves to a new iteration.
    pub fn sweep_count(&self) -> u32 {
        self.sweep_count
    }

    /// Cumulative sweeps since the last restart, predictor included.
    pub fn sweeps_done(&self) -> u64 {
        self.sweeps_done
    }

    /// Residual recorded at the last convergence check, if any.
    pub fn residual(&self) -> Option<f64> {
        self.residual
    }

    /// Tag of this level's most recent send.
    pub fn last_sent(&self) -> Option<Tag> {
        self.last_sent
    }

    pub(crate) fn record_sweep(&mut self) {
        self.sweep_count += 1;
        self.sweeps_done += 1;
    }

    pub(crate) fn record_send(&mut self, tag: Tag) {
        self.last_sent = Some(tag);
    }

    pub(crate) fn record_residual(&mut self, residual: f64) {
        self.residual = Some(residual);
    }

    fn reset(&mut self) {
        self.sweep_count = 0;
        self.sweeps_done = 0;
        self.residual = None;
        self.last_sent = None;
    }
}

/// A virtual worker covering the window `[t0, t0 + dt)`.
///
/// Owns its levels outright; the only way another slice learns anything
/// about this one is a message on the channel.
pub struct Slice {
    slot: SlotIndex,
    levels: Vec<LevelState>,
    transfers: Vec<Box<dyn Transfer>>,
    prev: Option<SlotIndex>,
    next: Option<SlotIndex>,
    iteration: IterationId,
    done: bool,
    active: bool,
    t0: f64,
    dt: f64,
}

impl Slice {
    pub(crate) fn new(slot: SlotIndex, stack: LevelStack, sweeps: &[u32], dt: f64) -> Self {
        let levels = stack
            .levels
            .into_iter()
            .zip(sweeps)
            .map(|(level, &s)| LevelState::new(level, s))
            .collect();
        Self {
            slot,
            levels,
            transfers: stack.transfers,
            prev: None,
            next: None,
            iteration: IterationId::PREDICTOR,
            done: false,
            active: false,
            t0: 0.0,
            dt,
        }
    }

    /// The slot this slice occupies.
    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    /// Active predecessor, `None` for the first active slot.
    pub fn prev(&self) -> Option<SlotIndex> {
        self.prev
    }

    /// Active successor, `None` for the last active slot.
    pub fn next(&self) -> Option<SlotIndex> {
        self.next
    }

    /// Whether this is the first active slot.
    pub fn is_first(&self) -> bool {
        self.prev.is_none()
    }

    /// Whether this is the last active slot.
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    /// Current iteration; [`IterationId::PREDICTOR`] until the main loop starts.
    pub fn iteration(&self) -> IterationId {
        self.iteration
    }

    /// Whether the residual met the tolerance at the last check.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Whether the slice takes part in the current block.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start of the slice's time window.
    pub fn t0(&self) -> f64 {
        self.t0
    }

    /// Width of the slice's time window.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Level `index` with its bookkeeping, or `None` if out of range.
    pub fn level(&self, index: LevelIndex) -> Option<&LevelState> {
        self.levels.get(index.index())
    }

    /// Mutable access to level `index`, or `None` if out of range.
    pub fn level_mut(&mut self, index: LevelIndex) -> Option<&mut LevelState> {
        self.levels.get_mut(index.index())
    }

    /// The finest level.
    pub fn finest(&self) -> &dyn Level {
        self.levels[0].level()
    }

    /// Mutable access to the finest level.
    pub fn finest_mut(&mut self) -> &mut dyn Level {
        self.levels[0].level_mut()
    }

    /// End point of the finest level.
    pub fn end_point(&self) -> Endpoint {
        self.finest().end_point()
    }

    pub(crate) fn state_mut(&mut self, level: LevelIndex) -> &mut LevelState {
        &mut self.levels[level.index()]
    }

    pub(crate) fn set_iteration(&mut self, iteration: IterationId) {
        self.iteration = iteration;
        for state in &mut self.levels {
            state.sweep_count = 0;
        }
    }

    pub(crate) fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    /// Reseed for a new block.
    pub(crate) fn restart(
        &mut self,
        t0: f64,
        prev: Option<SlotIndex>,
        next: Option<SlotIndex>,
        value: &[f64],
    ) {
        self.t0 = t0;
        self.prev = prev;
        self.next = next;
        self.iteration = IterationId::PREDICTOR;
        self.done = false;
        self.active = true;
        for state in &mut self.levels {
            state.reset();
            state.level.set_window(t0, self.dt);
        }
        self.levels[0].level.set_initial_value(value);
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.done = false;
        self.prev = None;
        self.next = None;
    }

    /// Restrict level `fine` onto the next coarser level.
    pub(crate) fn restrict(&mut self, fine: LevelIndex) {
        let l = fine.index();
        let (finer, coarser) = self.levels.split_at_mut(l + 1);
        self.transfers[l].restrict(&*finer[l].level, &mut *coarser[0].level);
    }

    /// Prolong level `coarse` onto the next finer level.
    pub(crate) fn prolong(&mut self, coarse: LevelIndex) {
        let l = coarse.index();
        let (finer, coarser) = self.levels.split_at_mut(l);
        self.transfers[l - 1].prolong(&*coarser[0].level, &mut *finer[l - 1].level);
    }
}

impl std::fmt::Debug for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.levels.iter().map(|s| s.level.name()).collect();
        f.debug_struct("Slice")
            .field("slot", &self.slot)
            .field("levels", &names)
            .field("iteration", &self.iteration)
            .field("done", &self.done)
            .field("active", &self.active)
            .field("t0", &self.t0)
            .finish()
    }
}
