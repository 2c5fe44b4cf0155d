//! Diagonal linear ODE `u_i' = λ_i u_i` on one slice.
//!
//! The level stores the iterate at every node of the slice window and
//! advances it with the exact exponential propagator between nodes, so
//! a single sweep from a correct initial value reproduces the analytic
//! solution. Convergence of the surrounding iteration therefore depends
//! only on how fast correct initial values travel across slices.

use smallvec::SmallVec;
use strata_core::{Endpoint, Level, LevelError};

/// A [`Level`] for `u' = diag(λ) u` on uniformly spaced nodes.
///
/// State layout is node-major with one component per rate. Per-node
/// growth factors `exp(λ_i · (x_{m+1} - x_m) · dt)` are cached by
/// [`set_window`](Level::set_window).
///
/// # Construction
///
/// ```
/// use strata_core::Level;
/// use strata_problems::LinearOde;
///
/// let level = LinearOde::builder()
///     .rates(&[-1.0])
///     .node_count(3)
///     .build()
///     .unwrap();
/// assert_eq!(level.nodes(), &[0.0, 0.5, 1.0]);
/// ```
#[derive(Debug)]
pub struct LinearOde {
    name: String,
    rates: SmallVec<[f64; 4]>,
    nodes: Vec<f64>,
    values: Vec<f64>,
    initial: Endpoint,
    factors: Vec<f64>,
    t0: f64,
    dt: f64,
}

/// Builder for [`LinearOde`].
///
/// Required: `rates`. Defaults: two nodes, name `"linear_ode"`.
pub struct LinearOdeBuilder {
    name: String,
    rates: SmallVec<[f64; 4]>,
    node_count: usize,
}

impl LinearOde {
    /// Create a new builder.
    pub fn builder() -> LinearOdeBuilder {
        LinearOdeBuilder {
            name: "linear_ode".to_string(),
            rates: SmallVec::new(),
            node_count: 2,
        }
    }

    /// Decay or growth rate of every component.
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Start of the bound time window.
    pub fn t0(&self) -> f64 {
        self.t0
    }

    /// Length of the bound time window.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    fn recompute_factors(&mut self) {
        let dim = self.rates.len();
        self.factors.clear();
        for pair in self.nodes.windows(2) {
            let h = (pair[1] - pair[0]) * self.dt;
            self.factors
                .extend(self.rates.iter().map(|&rate| (rate * h).exp()));
        }
        debug_assert_eq!(self.factors.len(), (self.nodes.len() - 1) * dim);
    }
}

impl LinearOdeBuilder {
    /// Set the level name used in logs and errors.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the per-component rates `λ`.
    pub fn rates(mut self, rates: &[f64]) -> Self {
        self.rates = SmallVec::from_slice(rates);
        self
    }

    /// Set the number of nodes, endpoints included.
    pub fn node_count(mut self, n: usize) -> Self {
        self.node_count = n;
        self
    }

    /// Build the level, bound to the window `[0, 1)` with zero state.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::InvalidShape`] if no rate was given, a rate
    /// is not finite, or fewer than two nodes were requested.
    pub fn build(self) -> Result<LinearOde, LevelError> {
        if self.rates.is_empty() {
            return Err(LevelError::InvalidShape {
                reason: format!("{}: at least one rate is required", self.name),
            });
        }
        if let Some(bad) = self.rates.iter().find(|r| !r.is_finite()) {
            return Err(LevelError::InvalidShape {
                reason: format!("{}: rate {bad} is not finite", self.name),
            });
        }
        if self.node_count < 2 {
            return Err(LevelError::InvalidShape {
                reason: format!(
                    "{}: need at least 2 nodes, got {}",
                    self.name, self.node_count
                ),
            });
        }
        let dim = self.rates.len();
        let last = (self.node_count - 1) as f64;
        let nodes: Vec<f64> = (0..self.node_count).map(|m| m as f64 / last).collect();
        let mut level = LinearOde {
            name: self.name,
            initial: SmallVec::from_elem(0.0, dim),
            values: vec![0.0; self.node_count * dim],
            factors: Vec::with_capacity((self.node_count - 1) * dim),
            rates: self.rates,
            nodes,
            t0: 0.0,
            dt: 1.0,
        };
        level.recompute_factors();
        Ok(level)
    }
}

impl Level for LinearOde {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        self.rates.len()
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
        self.initial = SmallVec::from_slice(value);
    }

    fn set_window(&mut self, t0: f64, dt: f64) {
        let rescale = dt != self.dt;
        self.t0 = t0;
        self.dt = dt;
        if rescale {
            self.recompute_factors();
        }
    }

    fn sweep(&mut self) -> Result<(), LevelError> {
        let dim = self.dim();
        if self.initial.len() != dim {
            return Err(LevelError::DimensionMismatch {
                expected: dim,
                found: self.initial.len(),
            });
        }
        if self.initial.iter().any(|v| !v.is_finite()) {
            return Err(LevelError::NonFinite { node: 0 });
        }
        self.values[..dim].copy_from_slice(&self.initial);
        for m in 0..self.nodes.len() - 1 {
            for i in 0..dim {
                let next = self.factors[m * dim + i] * self.values[m * dim + i];
                if !next.is_finite() {
                    return Err(LevelError::NonFinite { node: m + 1 });
                }
                self.values[(m + 1) * dim + i] = next;
            }
        }
        Ok(())
    }

    fn residual(&self) -> f64 {
        let dim = self.dim();
        let mut worst = self.values[..dim]
            .iter()
            .zip(&self.initial)
            .map(|(v, u0)| (v - u0).abs())
            .fold(0.0, f64::max);
        for m in 0..self.nodes.len() - 1 {
            for i in 0..dim {
                let step = self.factors[m * dim + i] * self.values[m * dim + i];
                worst = worst.max((self.values[(m + 1) * dim + i] - step).abs());
            }
        }
        worst
    }
}

/// Analytic solution `u0_i · exp(λ_i · t)` of the linear ODE.
pub fn exact_solution(rates: &[f64], u0: &[f64], t: f64) -> Vec<f64> {
    rates
        .iter()
        .zip(u0)
        .map(|(rate, u)| u * (rate * t).exp())
        .collect()
}
