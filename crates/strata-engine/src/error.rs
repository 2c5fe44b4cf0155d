//! Errors raised while running blocks.

use std::error::Error;
use std::fmt;

use strata_core::{BlockIndex, CommError, LevelError, LevelIndex, SlotIndex};

use crate::metrics::RunReport;

/// A block hit its iteration cap with slots still not done.
///
/// Carries everything a caller needs to decide whether the partially
/// converged result is acceptable.
#[derive(Clone, Debug, PartialEq)]
pub struct NonTermination {
    /// The block that did not converge.
    pub block: BlockIndex,
    /// Iterations performed (the configured cap).
    pub iterations: u32,
    /// Active slots that were not done at the last check.
    pub pending: Vec<SlotIndex>,
    /// Residual of every active slot at the last check.
    pub residuals: Vec<f64>,
    /// Statistics of every block run so far, this one last; its
    /// `final_value` is the unconverged end point of this block.
    pub report: RunReport,
}

/// Errors from [`Controller`](crate::Controller) and
/// [`BlockScheduler`](crate::BlockScheduler) runs.
///
/// Every variant aborts the current block. None is retried: each signals
/// a sequencing defect or a numerical failure, never a transient fault.
#[derive(Clone, Debug, PartialEq)]
pub enum RunError {
    /// A receive found no send with the expected tag.
    Comm {
        /// The block being run.
        block: BlockIndex,
        /// The channel's report.
        source: CommError,
    },
    /// A level's sweep failed.
    Level {
        /// The block being run.
        block: BlockIndex,
        /// The slot whose level failed.
        slot: SlotIndex,
        /// The failing level.
        level: LevelIndex,
        /// The level's report.
        source: LevelError,
    },
    /// The iteration cap was reached with slots still pending.
    NonTermination(Box<NonTermination>),
    /// `t_start` or `t_end` is not finite.
    InvalidInterval {
        /// Requested start.
        t_start: f64,
        /// Requested end.
        t_end: f64,
    },
    /// `restart` arguments are inconsistent, or a block was run without
    /// a successful restart.
    InvalidRestart {
        /// What was wrong.
        reason: String,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comm { block, source } => write!(f, "block {block}: {source}"),
            Self::Level {
                block,
                slot,
                level,
                source,
            } => write!(f, "block {block}, slot {slot}, level {level}: {source}"),
            Self::NonTermination(nt) => write!(
                f,
                "block {} did not converge in {} iterations; {} slot(s) pending",
                nt.block,
                nt.iterations,
                nt.pending.len()
            ),
            Self::InvalidInterval { t_start, t_end } => {
                write!(f, "invalid time interval [{t_start}, {t_end})")
            }
            Self::InvalidRestart { reason } => write!(f, "invalid restart: {reason}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Comm { source, .. } => Some(source),
            Self::Level { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<NonTermination> for RunError {
    fn from(nt: NonTermination) -> Self {
        Self::NonTermination(Box::new(nt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{IterationId, Tag};

    #[test]
    fn comm_error_is_source() {
        let tag = Tag::new(LevelIndex(1), IterationId(2), SlotIndex(0));
        let e = RunError::Comm {
            block: BlockIndex(3),
            source: CommError::NoMatchingSend {
                expected: tag,
                latest_from_sender: None,
            },
        };
        assert!(e.source().is_some());
        assert!(e.to_string().starts_with("block 3:"));
    }

    #[test]
    fn non_termination_display_counts_pending() {
        let e = RunError::from(NonTermination {
            block: BlockIndex(0),
            iterations: 20,
            pending: vec![SlotIndex(2), SlotIndex(3)],
            residuals: vec![0.0, 0.0, 1.0, 1.0],
            report: RunReport::default(),
        });
        assert_eq!(
            e.to_string(),
            "block 0 did not converge in 20 iterations; 2 slot(s) pending"
        );
        assert!(e.source().is_none());
    }
}
