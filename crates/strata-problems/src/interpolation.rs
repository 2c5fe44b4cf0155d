//! Linear interpolation between node sets of two levels.

use strata_core::{Level, Transfer};

/// [`Transfer`] that maps node values by piecewise-linear interpolation.
///
/// Restriction samples the fine iterate at the coarse nodes. Prolongation
/// is correction-based: it interpolates only the change the coarse level
/// made relative to the restricted fine state, so a fine iterate that the
/// coarse level left alone comes back bit-for-bit unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeInterpolation;

impl Transfer for NodeInterpolation {
    fn name(&self) -> &str {
        "node_interpolation"
    }

    fn restrict(&self, fine: &dyn Level, coarse: &mut dyn Level) {
        let sampled = interpolate(fine.nodes(), fine.values(), fine.dim(), coarse.nodes());
        coarse.set_initial_value(fine.initial_value());
        coarse.values_mut().copy_from_slice(&sampled);
    }

    fn prolong(&self, coarse: &dyn Level, fine: &mut dyn Level) {
        let dim = fine.dim();
        let restricted = interpolate(fine.nodes(), fine.values(), dim, coarse.nodes());
        let delta: Vec<f64> = coarse
            .values()
            .iter()
            .zip(&restricted)
            .map(|(c, r)| c - r)
            .collect();
        let correction = interpolate(coarse.nodes(), &delta, dim, fine.nodes());
        for (v, d) in fine.values_mut().iter_mut().zip(correction) {
            *v += d;
        }
        fine.set_initial_value(coarse.initial_value());
    }
}

/// Sample `values` (node-major, `dim` components, over `from` nodes) at
/// the positions `to`.
///
/// Positions outside `from` clamp to the nearest end node.
pub fn interpolate(from: &[f64], values: &[f64], dim: usize, to: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(to.len() * dim);
    for &x in to {
        let right = from.partition_point(|&node| node < x).min(from.len() - 1);
        if right == 0 || from[right] <= x {
            out.extend_from_slice(&values[right * dim..(right + 1) * dim]);
            continue;
        }
        let left = right - 1;
        let w = (x - from[left]) / (from[right] - from[left]);
        for i in 0..dim {
            let a = values[left * dim + i];
            let b = values[right * dim + i];
            out.push(a + w * (b - a));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinearOde;

    fn ode(nodes: usize) -> LinearOde {
        LinearOde::builder()
            .rates(&[-1.0])
            .node_count(nodes)
            .build()
            .unwrap()
    }

    #[test]
    fn interpolate_hits_nodes_exactly() {
        let from = [0.0, 0.5, 1.0];
        let values = [1.0, 3.0, 7.0];
        assert_eq!(interpolate(&from, &values, 1, &[0.0, 0.5, 1.0]), vec![1.0, 3.0, 7.0]);
        assert_eq!(interpolate(&from, &values, 1, &[0.25, 0.75]), vec![2.0, 5.0]);
    }

    #[test]
    fn interpolate_handles_components() {
        let from = [0.0, 1.0];
        let values = [0.0, 10.0, 2.0, 20.0];
        assert_eq!(interpolate(&from, &values, 2, &[0.5]), vec![1.0, 15.0]);
    }

    #[test]
    fn restrict_copies_initial_value_and_samples() {
        let mut fine = ode(5);
        let mut coarse = ode(3);
        fine.set_initial_value(&[1.0]);
        fine.sweep().unwrap();
        NodeInterpolation.restrict(&fine, &mut coarse);
        assert_eq!(coarse.initial_value(), &[1.0]);
        assert_eq!(coarse.values(), &[fine.values()[0], fine.values()[2], fine.values()[4]]);
    }

    #[test]
    fn prolong_without_coarse_change_is_identity() {
        let mut fine = ode(5);
        let mut coarse = ode(3);
        fine.set_initial_value(&[1.0]);
        fine.sweep().unwrap();
        let before = fine.values().to_vec();
        NodeInterpolation.restrict(&fine, &mut coarse);
        NodeInterpolation.prolong(&coarse, &mut fine);
        assert_eq!(fine.values(), before.as_slice());
    }

    #[test]
    fn prolong_carries_coarse_correction() {
        let mut fine = ode(5);
        let mut coarse = ode(3);
        NodeInterpolation.restrict(&fine, &mut coarse);
        coarse.set_initial_value(&[2.0]);
        coarse.sweep().unwrap();
        NodeInterpolation.prolong(&coarse, &mut fine);
        assert_eq!(fine.initial_value(), &[2.0]);
        assert_eq!(fine.values()[0], coarse.values()[0]);
        assert_eq!(fine.values()[4], coarse.values()[2]);
        let mid = 0.5 * (coarse.values()[0] + coarse.values()[1]);
        assert!((fine.values()[1] - mid).abs() < 1e-15);
    }
}
