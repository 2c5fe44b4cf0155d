//! Residual evaluation and the stop decision.

use strata_core::{ConvergencePolicy, Level};

/// Stops once the residual is at most the tolerance.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbsoluteTolerance;

impl ConvergencePolicy for AbsoluteTolerance {
    fn is_done(&self, residual: f64, tolerance: f64) -> bool {
        residual <= tolerance
    }
}

/// Pairs a [`ConvergencePolicy`] with the configured tolerance.
///
/// Both operations are pure: [`residual`](Self::residual) only reads the
/// level, so repeated calls without an intervening sweep agree.
pub struct ConvergenceChecker {
    policy: Box<dyn ConvergencePolicy>,
    tolerance: f64,
}

impl ConvergenceChecker {
    /// Check against `tolerance` using `policy`.
    pub fn new(policy: Box<dyn ConvergencePolicy>, tolerance: f64) -> Self {
        Self { policy, tolerance }
    }

    /// Check with [`AbsoluteTolerance`].
    pub fn absolute(tolerance: f64) -> Self {
        Self::new(Box::new(AbsoluteTolerance), tolerance)
    }

    /// The configured tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Residual of the level's current state.
    pub fn residual(&self, level: &dyn Level) -> f64 {
        level.residual()
    }

    /// Whether `residual` ends iteration for its slot.
    ///
    /// A NaN residual is never done, whatever the policy says.
    pub fn is_done(&self, residual: f64) -> bool {
        !residual.is_nan() && self.policy.is_done(residual, self.tolerance)
    }
}

impl std::fmt::Debug for ConvergenceChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvergenceChecker")
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_test_utils::CascadeLevel;

    #[test]
    fn absolute_tolerance_is_inclusive() {
        let c = ConvergenceChecker::absolute(1e-8);
        assert!(c.is_done(1e-8));
        assert!(c.is_done(0.0));
        assert!(!c.is_done(1.1e-8));
    }

    #[test]
    fn nan_is_never_done() {
        let lenient = ConvergenceChecker::new(Box::new(|_: f64, _: f64| true), 1.0);
        assert!(!lenient.is_done(f64::NAN));
        assert!(lenient.is_done(1e9));
    }

    #[test]
    fn residual_is_idempotent() {
        let mut level = CascadeLevel::new("l");
        level.set_initial_value(&[2.0]);
        let c = ConvergenceChecker::absolute(0.0);
        let first = c.residual(&level);
        assert_eq!(first, c.residual(&level));
        level.sweep().unwrap();
        assert_eq!(c.residual(&level), 0.0);
        assert_eq!(c.residual(&level), 0.0);
    }
}
