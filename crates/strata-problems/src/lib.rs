//! Reference levels and transfers for the Strata time-parallel solver.
//!
//! Provides a small but complete problem that exercises the whole
//! controller: a diagonal linear ODE `u' = λ u` discretized on a set of
//! normalized nodes per slice, and a linear-interpolation transfer
//! between node sets of different resolution.
//!
//! # Building a two-level stack
//!
//! ```
//! use strata_problems::linear_ode_stack;
//!
//! let stack = linear_ode_stack(&[-1.0], &[5, 3]).unwrap();
//! assert_eq!(stack.len(), 2);
//! assert_eq!(stack.transfers.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod interpolation;
pub mod linear_ode;

pub use interpolation::NodeInterpolation;
pub use linear_ode::{exact_solution, LinearOde, LinearOdeBuilder};

use strata_core::{Level, LevelError, LevelStack, Transfer};

/// Build one slice's stack of [`LinearOde`] levels joined by
/// [`NodeInterpolation`] transfers.
///
/// `node_counts[l]` is the node count of level `l`, finest first.
///
/// # Errors
///
/// Returns [`LevelError::InvalidShape`] if `node_counts` is empty or any
/// level rejects its parameters.
pub fn linear_ode_stack(rates: &[f64], node_counts: &[usize]) -> Result<LevelStack, LevelError> {
    if node_counts.is_empty() {
        return Err(LevelError::InvalidShape {
            reason: "a stack needs at least one level".to_string(),
        });
    }
    let mut levels: Vec<Box<dyn Level>> = Vec::with_capacity(node_counts.len());
    for (l, &nodes) in node_counts.iter().enumerate() {
        let level = LinearOde::builder()
            .name(format!("ode_l{l}"))
            .rates(rates)
            .node_count(nodes)
            .build()?;
        levels.push(Box::new(level));
    }
    let transfers: Vec<Box<dyn Transfer>> = (1..node_counts.len())
        .map(|_| Box::new(NodeInterpolation) as Box<dyn Transfer>)
        .collect();
    Ok(LevelStack::new(levels, transfers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_orders_levels_finest_first() {
        let stack = linear_ode_stack(&[-1.0, -2.0], &[9, 5, 2]).unwrap();
        let counts: Vec<usize> = stack.levels.iter().map(|l| l.nodes().len()).collect();
        assert_eq!(counts, vec![9, 5, 2]);
        assert!(stack.levels.iter().all(|l| l.dim() == 2));
        assert_eq!(stack.levels[1].name(), "ode_l1");
    }

    #[test]
    fn empty_stack_rejected() {
        assert!(matches!(
            linear_ode_stack(&[-1.0], &[]),
            Err(LevelError::InvalidShape { .. })
        ));
    }

    #[test]
    fn bad_level_rejected() {
        assert!(linear_ode_stack(&[-1.0], &[5, 1]).is_err());
    }
}
