//! Solver configuration, validation, and error types.
//!
//! [`SolverConfig`] is the builder-input for constructing a
//! [`Controller`](crate::Controller). [`validate()`](SolverConfig::validate)
//! checks every structural invariant up front so that a run never starts
//! from an inconsistent slice layout.

use std::error::Error;
use std::fmt;

use strata_comm::{Channel, MailboxChannel, TagTable};
use strata_core::{ConvergencePolicy, LevelStack};

use crate::convergence::AbsoluteTolerance;

// ── ChannelKind ────────────────────────────────────────────────────

/// Which [`Channel`] backend carries cross-slice messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelKind {
    /// Keyed table of latest sends. The reference backend.
    #[default]
    TagTable,
    /// Per-slot `crossbeam-channel` inboxes.
    Mailbox,
}

impl ChannelKind {
    pub(crate) fn build(self, slot_count: usize) -> Box<dyn Channel> {
        match self {
            Self::TagTable => Box::new(TagTable::new(slot_count)),
            Self::Mailbox => Box::new(MailboxChannel::new(slot_count)),
        }
    }
}

// ── SweepSchedule ──────────────────────────────────────────────────

/// Per-level sweep counts, finest first, with the coarsest level fixed
/// at a single sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepSchedule(Vec<u32>);

impl SweepSchedule {
    /// `sweeps` on every level except the coarsest, which gets 1.
    pub fn uniform(levels: usize, sweeps: u32) -> Self {
        let mut table = vec![sweeps; levels];
        if let Some(last) = table.last_mut() {
            *last = 1;
        }
        Self(table)
    }

    /// The given counts for the finer levels, followed by 1 for the
    /// coarsest level.
    pub fn with_finer(finer: &[u32]) -> Self {
        let mut table = finer.to_vec();
        table.push(1);
        Self(table)
    }

    /// The table as a slice.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl From<SweepSchedule> for Vec<u32> {
    fn from(s: SweepSchedule) -> Self {
        s.0
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SolverConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// No slot stacks were supplied.
    NoSlots,
    /// Slot count exceeds `u32::MAX`.
    TooManySlots {
        /// The configured count.
        value: usize,
    },
    /// The first slot has no levels.
    NoLevels,
    /// A slot's level count differs from slot 0's.
    LevelCountMismatch {
        /// The offending slot.
        slot: usize,
        /// Level count of slot 0.
        expected: usize,
        /// Level count of the offending slot.
        found: usize,
    },
    /// A slot does not carry exactly one transfer per adjacent level pair.
    TransferCountMismatch {
        /// The offending slot.
        slot: usize,
        /// Required transfer count (`levels - 1`).
        expected: usize,
        /// Supplied transfer count.
        found: usize,
    },
    /// The sweep table length differs from the level count.
    SweepTableMismatch {
        /// Levels per slot.
        levels: usize,
        /// Entries in the sweep table.
        entries: usize,
    },
    /// The coarsest level is not configured for exactly one sweep.
    CoarseSweeps {
        /// The configured count.
        configured: u32,
    },
    /// A finer level is configured for zero sweeps.
    ZeroSweeps {
        /// The offending level.
        level: usize,
    },
    /// `dt` is NaN, infinite, zero, or negative.
    InvalidDt {
        /// The invalid value.
        value: f64,
    },
    /// `tolerance` is NaN, infinite, or negative.
    InvalidTolerance {
        /// The invalid value.
        value: f64,
    },
    /// `max_iterations` is zero.
    ZeroMaxIterations,
    /// A level's storage is inconsistent with its node count or dimension.
    LevelShape {
        /// The offending slot.
        slot: usize,
        /// The offending level.
        level: usize,
        /// Description of the inconsistency.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSlots => write!(f, "no slots configured"),
            Self::TooManySlots { value } => write!(f, "slot count {value} exceeds u32::MAX"),
            Self::NoLevels => write!(f, "slots have zero levels"),
            Self::LevelCountMismatch {
                slot,
                expected,
                found,
            } => write!(
                f,
                "slot {slot} has {found} levels, slot 0 has {expected}"
            ),
            Self::TransferCountMismatch {
                slot,
                expected,
                found,
            } => write!(
                f,
                "slot {slot} has {found} transfers, {expected} required"
            ),
            Self::SweepTableMismatch { levels, entries } => write!(
                f,
                "sweep table has {entries} entries for {levels} levels"
            ),
            Self::CoarseSweeps { configured } => write!(
                f,
                "coarsest level must sweep exactly once per iteration, configured {configured}"
            ),
            Self::ZeroSweeps { level } => write!(f, "level {level} configured for zero sweeps"),
            Self::InvalidDt { value } => write!(f, "dt must be finite and positive, got {value}"),
            Self::InvalidTolerance { value } => {
                write!(f, "tolerance must be finite and non-negative, got {value}")
            }
            Self::ZeroMaxIterations => write!(f, "max_iterations must be at least 1"),
            Self::LevelShape {
                slot,
                level,
                reason,
            } => write!(f, "slot {slot} level {level}: {reason}"),
        }
    }
}

impl Error for ConfigError {}

// ── SolverConfig ───────────────────────────────────────────────────

/// Complete configuration for constructing a [`Controller`](crate::Controller).
///
/// Immutable once handed over: the controller consumes it, so no
/// per-level setting can change between or during runs.
pub struct SolverConfig {
    /// One level stack per slot. `stacks[p]` belongs to slot `p`.
    pub stacks: Vec<LevelStack>,
    /// Width of every slice's time window.
    pub dt: f64,
    /// Sweeps per smoothing step, finest level first. The coarsest entry
    /// must be 1.
    pub sweeps: Vec<u32>,
    /// Residual threshold handed to the convergence policy.
    pub tolerance: f64,
    /// Main-loop iteration cap per block.
    pub max_iterations: u32,
    /// Maps `(residual, tolerance)` to a stop decision.
    pub convergence: Box<dyn ConvergencePolicy>,
    /// Cross-slice channel backend.
    pub channel: ChannelKind,
}

impl SolverConfig {
    /// A config with one sweep per level, tolerance `1e-10`, at most 50
    /// iterations per block, absolute-tolerance convergence and the
    /// tag-table channel.
    pub fn new(stacks: Vec<LevelStack>, dt: f64) -> Self {
        let levels = stacks.first().map_or(0, LevelStack::len);
        Self {
            stacks,
            dt,
            sweeps: SweepSchedule::uniform(levels, 1).into(),
            tolerance: 1e-10,
            max_iterations: 50,
            convergence: Box::new(AbsoluteTolerance),
            channel: ChannelKind::TagTable,
        }
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.stacks.len()
    }

    /// Levels per slot, taken from slot 0.
    pub fn level_count(&self) -> usize {
        self.stacks.first().map_or(0, LevelStack::len)
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Slots.
        if self.stacks.is_empty() {
            return Err(ConfigError::NoSlots);
        }
        if u32::try_from(self.stacks.len()).is_err() {
            return Err(ConfigError::TooManySlots {
                value: self.stacks.len(),
            });
        }
        // 2. Uniform level and transfer counts.
        let levels = self.level_count();
        if levels == 0 {
            return Err(ConfigError::NoLevels);
        }
        let dim = self.stacks[0].levels[0].dim();
        for (slot, stack) in self.stacks.iter().enumerate() {
            if stack.len() != levels {
                return Err(ConfigError::LevelCountMismatch {
                    slot,
                    expected: levels,
                    found: stack.len(),
                });
            }
            if stack.transfers.len() != levels - 1 {
                return Err(ConfigError::TransferCountMismatch {
                    slot,
                    expected: levels - 1,
                    found: stack.transfers.len(),
                });
            }
            validate_shapes(slot, stack, dim)?;
        }
        // 3. Sweep table.
        if self.sweeps.len() != levels {
            return Err(ConfigError::SweepTableMismatch {
                levels,
                entries: self.sweeps.len(),
            });
        }
        let coarsest = self.sweeps[levels - 1];
        if coarsest != 1 {
            return Err(ConfigError::CoarseSweeps {
                configured: coarsest,
            });
        }
        if let Some(level) = self.sweeps.iter().position(|&s| s == 0) {
            return Err(ConfigError::ZeroSweeps { level });
        }
        // 4. Scalars.
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidDt { value: self.dt });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance {
                value: self.tolerance,
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroMaxIterations);
        }
        Ok(())
    }
}

/// Every level of every slot must have `dim` components per node, and
/// each level's buffers must match its own node count.
fn validate_shapes(slot: usize, stack: &LevelStack, dim: usize) -> Result<(), ConfigError> {
    for (level, l) in stack.levels.iter().enumerate() {
        let shape_err = |reason: String| ConfigError::LevelShape {
            slot,
            level,
            reason,
        };
        if l.dim() == 0 {
            return Err(shape_err("zero components per node".to_string()));
        }
        if l.dim() != dim {
            return Err(shape_err(format!(
                "{} components per node, slot 0 finest level has {dim}",
                l.dim()
            )));
        }
        if l.nodes().is_empty() {
            return Err(shape_err("no nodes".to_string()));
        }
        if l.values().len() != l.nodes().len() * dim {
            return Err(shape_err(format!(
                "{} values for {} nodes of {dim} components",
                l.values().len(),
                l.nodes().len()
            )));
        }
        if l.initial_value().len() != dim {
            return Err(shape_err(format!(
                "initial value has {} components, expected {dim}",
                l.initial_value().len()
            )));
        }
    }
    Ok(())
}

impl fmt::Debug for SolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverConfig")
            .field("slots", &self.stacks.len())
            .field("levels", &self.level_count())
            .field("dt", &self.dt)
            .field("sweeps", &self.sweeps)
            .field("tolerance", &self.tolerance)
            .field("max_iterations", &self.max_iterations)
            .field("channel", &self.channel)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_test_utils::cascade_stacks;

    fn valid_config() -> SolverConfig {
        let mut cfg = SolverConfig::new(cascade_stacks(4, 3), 0.5);
        cfg.sweeps = SweepSchedule::with_finer(&[2, 3]).into();
        cfg
    }

    #[test]
    fn validate_valid_config_succeeds() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn default_sweeps_end_in_one() {
        let cfg = SolverConfig::new(cascade_stacks(2, 3), 1.0);
        assert_eq!(cfg.sweeps, vec![1, 1, 1]);
        assert_eq!(SweepSchedule::uniform(3, 4).as_slice(), &[4, 4, 1]);
    }

    #[test]
    fn validate_no_slots_fails() {
        let cfg = SolverConfig::new(Vec::new(), 1.0);
        assert_eq!(cfg.validate(), Err(ConfigError::NoSlots));
    }

    #[test]
    fn validate_no_levels_fails() {
        let cfg = SolverConfig::new(cascade_stacks(2, 0), 1.0);
        assert_eq!(cfg.validate(), Err(ConfigError::NoLevels));
    }

    #[test]
    fn validate_level_count_mismatch_fails() {
        let mut cfg = valid_config();
        cfg.stacks[2] = strata_test_utils::copy_stack(2);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::LevelCountMismatch {
                slot: 2,
                expected: 3,
                found: 2,
            })
        );
    }

    #[test]
    fn validate_missing_transfer_fails() {
        let mut cfg = valid_config();
        cfg.stacks[1].transfers.pop();
        match cfg.validate() {
            Err(ConfigError::TransferCountMismatch { slot: 1, .. }) => {}
            other => panic!("expected TransferCountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn validate_coarse_sweeps_fails() {
        let mut cfg = valid_config();
        cfg.sweeps = vec![2, 2, 2];
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::CoarseSweeps { configured: 2 })
        );
    }

    #[test]
    fn validate_zero_sweeps_fails() {
        let mut cfg = valid_config();
        cfg.sweeps = vec![1, 0, 1];
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroSweeps { level: 1 }));
    }

    #[test]
    fn validate_sweep_table_length_fails() {
        let mut cfg = valid_config();
        cfg.sweeps = vec![1, 1];
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::SweepTableMismatch {
                levels: 3,
                entries: 2,
            })
        );
    }

    #[test]
    fn validate_invalid_dt_fails() {
        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut cfg = valid_config();
            cfg.dt = dt;
            assert!(matches!(cfg.validate(), Err(ConfigError::InvalidDt { .. })));
        }
    }

    #[test]
    fn validate_invalid_tolerance_fails() {
        let mut cfg = valid_config();
        cfg.tolerance = -1e-3;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidTolerance { .. })
        ));
    }

    #[test]
    fn validate_zero_max_iterations_fails() {
        let mut cfg = valid_config();
        cfg.max_iterations = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroMaxIterations));
    }

    #[test]
    fn validate_mixed_dimensions_fails() {
        let mut cfg = valid_config();
        let odd = strata_problems::LinearOde::builder()
            .rates(&[-1.0, -1.0])
            .node_count(2)
            .build()
            .unwrap();
        cfg.stacks[3].levels[1] = Box::new(odd);
        match cfg.validate() {
            Err(ConfigError::LevelShape {
                slot: 3, level: 1, ..
            }) => {}
            other => panic!("expected LevelShape, got {other:?}"),
        }
    }

    #[test]
    fn validate_cross_slot_dim_mismatch_fails() {
        let stacks = vec![
            strata_problems::linear_ode_stack(&[-1.0], &[3]).unwrap(),
            strata_problems::linear_ode_stack(&[-1.0, -2.0], &[3]).unwrap(),
        ];
        let cfg = SolverConfig::new(stacks, 1.0);
        match cfg.validate() {
            Err(ConfigError::LevelShape {
                slot: 1, level: 0, ..
            }) => {}
            other => panic!("expected LevelShape, got {other:?}"),
        }
    }

    #[test]
    fn debug_reports_summary() {
        let text = format!("{:?}", valid_config());
        assert!(text.contains("slots: 4"));
        assert!(text.contains("levels: 3"));
    }

    #[test]
    fn error_display_mentions_values() {
        let e = ConfigError::CoarseSweeps { configured: 3 };
        assert!(e.to_string().contains("configured 3"));
    }
}
