//! Capability traits consumed by the controller.
//!
//! The controller never does numerics itself. A [`Level`] advances one
//! resolution of one slice, a [`Transfer`] moves state between two
//! adjacent levels of the same slice, and a [`ConvergencePolicy`]
//! decides when a residual is small enough.

use crate::error::LevelError;
use crate::tag::Endpoint;

/// One discretization resolution within a slice.
///
/// State is exposed as a flat `f64` buffer of `node_count() * dim()`
/// values, node-major: the components of node `m` live at
/// `values()[m * dim .. (m + 1) * dim]`. Node positions are normalized
/// to the slice window, with the first node at `0.0` and the last at
/// `1.0`.
///
/// # Contract
///
/// - `residual()` is a pure function of current state: two calls with
///   no intervening `sweep()` or mutation return the same value.
/// - `set_initial_value()` may trigger dependent recomputation (for
///   example re-evaluating a right-hand side at the new boundary); the
///   controller calls it for every received endpoint.
/// - `end_point()` returns an owned copy; the controller relies on it
///   never aliasing the level's storage.
///
/// # Object safety
///
/// This trait is object-safe; slices store levels as
/// `Vec<Box<dyn Level>>`.
pub trait Level: Send + 'static {
    /// Human-readable name for error reporting and logging.
    fn name(&self) -> &str;

    /// Number of state components per node.
    fn dim(&self) -> usize;

    /// Normalized node positions, ascending, from `0.0` to `1.0`.
    fn nodes(&self) -> &[f64];

    /// Current iterate at every node, node-major.
    fn values(&self) -> &[f64];

    /// Mutable access to the current iterate.
    fn values_mut(&mut self) -> &mut [f64];

    /// The value the level currently integrates from.
    fn initial_value(&self) -> &[f64];

    /// Replace the value the level integrates from.
    fn set_initial_value(&mut self, value: &[f64]);

    /// Bind the level to the time window `[t0, t0 + dt)`.
    fn set_window(&mut self, t0: f64, dt: f64);

    /// Perform one relaxation sweep over the nodes.
    fn sweep(&mut self) -> Result<(), LevelError>;

    /// Residual of the current iterate against the level's equations.
    fn residual(&self) -> f64;

    /// Copy the initial value into every node.
    fn spread(&mut self) {
        let initial = Endpoint::from_slice(self.initial_value());
        let dim = self.dim().max(1);
        for node in self.values_mut().chunks_exact_mut(dim) {
            node.copy_from_slice(&initial);
        }
    }

    /// Representative value transmitted to the successor slice.
    ///
    /// Default: the components of the last node.
    fn end_point(&self) -> Endpoint {
        let values = self.values();
        let start = values.len().saturating_sub(self.dim());
        Endpoint::from_slice(&values[start..])
    }
}

/// Restriction and prolongation between two adjacent levels of a slice.
///
/// Bound to one `(fine, coarse)` pair; a slice with `L` levels carries
/// `L - 1` transfers, `transfers[l]` mapping between `levels[l]` and
/// `levels[l + 1]`.
pub trait Transfer: Send + 'static {
    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "transfer"
    }

    /// Overwrite the coarse level's state with a restriction of the fine
    /// level's state, including its initial value.
    fn restrict(&self, fine: &dyn Level, coarse: &mut dyn Level);

    /// Correct the fine level with the change the coarse level underwent
    /// since the last restriction, initial value included.
    fn prolong(&self, coarse: &dyn Level, fine: &mut dyn Level);
}

/// Maps a residual and a tolerance to a stop decision.
///
/// Closures of shape `Fn(f64, f64) -> bool` implement this trait, so a
/// one-off policy needs no named type.
pub trait ConvergencePolicy: Send + 'static {
    /// Whether `residual` is small enough under `tolerance`.
    fn is_done(&self, residual: f64, tolerance: f64) -> bool;
}

impl<F> ConvergencePolicy for F
where
    F: Fn(f64, f64) -> bool + Send + 'static,
{
    fn is_done(&self, residual: f64, tolerance: f64) -> bool {
        self(residual, tolerance)
    }
}

/// The levels and transfers owned by one slice, finest first.
pub struct LevelStack {
    /// Levels ordered finest (index 0) to coarsest.
    pub levels: Vec<Box<dyn Level>>,
    /// `transfers[l]` maps between `levels[l]` and `levels[l + 1]`.
    pub transfers: Vec<Box<dyn Transfer>>,
}

impl LevelStack {
    /// Build a stack from its parts.
    pub fn new(levels: Vec<Box<dyn Level>>, transfers: Vec<Box<dyn Transfer>>) -> Self {
        Self { levels, transfers }
    }

    /// A single-level stack with no transfers.
    pub fn single(level: Box<dyn Level>) -> Self {
        Self {
            levels: vec![level],
            transfers: Vec::new(),
        }
    }

    /// Number of levels in the stack.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the stack has no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl std::fmt::Debug for LevelStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.levels.iter().map(|l| l.name()).collect();
        f.debug_struct("LevelStack")
            .field("levels", &names)
            .field("transfers", &self.transfers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        initial: Vec<f64>,
        nodes: Vec<f64>,
        values: Vec<f64>,
    }

    impl Level for Pair {
        fn name(&self) -> &str {
            "pair"
        }
        fn dim(&self) -> usize {
            2
        }
        fn nodes(&self) -> &[f64] {
            &self.nodes
        }
        fn values(&self) -> &[f64] {
            &self.values
        }
        fn values_mut(&mut self) -> &mut [f64] {
            &mut self.values
        }
        fn initial_value(&self) -> &[f64] {
            &self.initial
        }
        fn set_initial_value(&mut self, value: &[f64]) {
            self.initial = value.to_vec();
        }
        fn set_window(&mut self, _t0: f64, _dt: f64) {}
        fn sweep(&mut self) -> Result<(), LevelError> {
            Ok(())
        }
        fn residual(&self) -> f64 {
            0.0
        }
    }

    fn pair() -> Pair {
        Pair {
            initial: vec![1.0, -1.0],
            nodes: vec![0.0, 0.5, 1.0],
            values: vec![0.0; 6],
        }
    }

    #[test]
    fn spread_fills_every_node() {
        let mut level = pair();
        level.spread();
        assert_eq!(level.values, vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn end_point_is_last_node() {
        let mut level = pair();
        level.values = vec![0.0, 0.0, 0.0, 0.0, 3.0, 4.0];
        assert_eq!(level.end_point().as_slice(), &[3.0, 4.0]);
    }

    #[test]
    fn closures_are_policies() {
        let policy = |r: f64, tol: f64| r < tol * 0.5;
        assert!(policy.is_done(0.1, 1.0));
        assert!(!policy.is_done(0.6, 1.0));
    }

    #[test]
    fn single_stack_has_no_transfers() {
        let stack = LevelStack::single(Box::new(pair()));
        assert_eq!(stack.len(), 1);
        assert!(stack.transfers.is_empty());
    }
}
