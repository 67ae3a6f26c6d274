//! Trait-based advection schemes.
//!
//! Particles are advanced by explicit Runge-Kutta recurrences over a shared
//! sub-step count. Each particle carries its own `dt = (t0 - t) / N`, so a
//! batch mixing forward and backward advection steps in lockstep.
//!
//! The pieces:
//! - [`Positions`]: the integrated state (particle `x`, `y`)
//! - [`StepClock`]: per-particle time cursor and step size
//! - [`ButcherTableau`]: stage coefficients shared by every scheme
//! - [`IntegratorInfo`] / [`TimeIntegrator`]: scheme metadata and the step operation
//! - [`Scheme`]: enum dispatch for runtime selection
//!
//! # Example
//! ```
//! use advect_rs::field::{Interpolation, UniformField, VelocitySampler};
//! use advect_rs::time::{ClassicalRk4, Positions, StepClock, run_fixed};
//!
//! let field = UniformField::new(1.0, 0.5);
//! let sampler = VelocitySampler::new(&field, Interpolation::Linear);
//!
//! let mut state = Positions::new(vec![0.0], vec![0.0]);
//! let mut clock = StepClock::spanning(&[0.0], &[4.0], 8).unwrap();
//! run_fixed(&ClassicalRk4, &mut state, &mut clock, 8, &sampler).unwrap();
//!
//! assert!((state.x[0] - 4.0).abs() < 1e-12);
//! assert!((state.y[0] - 2.0).abs() < 1e-12);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AdvectError, Result};
use crate::field::{VelocityField, VelocitySample, VelocitySampler};

// =============================================================================
// State and Clock
// =============================================================================

/// Particle positions advanced by the integrators.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Positions {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Positions {
    /// # Panics
    ///
    /// Panics if `x` and `y` differ in length.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have the same length");
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Add a per-particle displacement: `self_i <- self_i + c * dt_i * vel_i`.
    pub fn axpy(&mut self, c: f64, dt: &[f64], vel: &VelocitySample) {
        for i in 0..self.len() {
            self.x[i] += c * dt[i] * vel.u[i];
            self.y[i] += c * dt[i] * vel.v[i];
        }
    }

    /// Whether particle `i` has finite coordinates.
    #[inline]
    pub fn is_finite(&self, i: usize) -> bool {
        self.x[i].is_finite() && self.y[i].is_finite()
    }
}

/// Per-particle time cursor and sub-step size.
#[derive(Clone, Debug, PartialEq)]
pub struct StepClock {
    t: Vec<f64>,
    dt: Vec<f64>,
}

impl StepClock {
    /// # Panics
    ///
    /// Panics if `t` and `dt` differ in length.
    pub fn new(t: Vec<f64>, dt: Vec<f64>) -> Self {
        assert_eq!(t.len(), dt.len(), "t and dt must have the same length");
        Self { t, dt }
    }

    /// Clock that reaches `t0` from `t` in `n_steps` equal sub-steps.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if `t0` and `t` differ in length.
    pub fn spanning(t: &[f64], t0: &[f64], n_steps: usize) -> Result<Self> {
        if t0.len() != t.len() {
            return Err(AdvectError::ShapeMismatch {
                what: "t0",
                expected: t.len(),
                actual: t0.len(),
            });
        }
        let n = n_steps as f64;
        let dt = t.iter().zip(t0).map(|(&a, &b)| (b - a) / n).collect();
        Ok(Self::new(t.to_vec(), dt))
    }

    /// Current time of every particle.
    pub fn time(&self) -> &[f64] {
        &self.t
    }

    /// Sub-step size of every particle.
    pub fn dt(&self) -> &[f64] {
        &self.dt
    }

    /// Times `t + c * dt` for a stage at fraction `c` of the sub-step.
    pub fn stage_times(&self, c: f64) -> Vec<f64> {
        if c == 0.0 {
            return self.t.clone();
        }
        self.t
            .iter()
            .zip(&self.dt)
            .map(|(&t, &dt)| t + c * dt)
            .collect()
    }

    /// Move the cursor forward by one sub-step.
    pub fn advance(&mut self) {
        for (t, dt) in self.t.iter_mut().zip(&self.dt) {
            *t += dt;
        }
    }
}

// =============================================================================
// Butcher Tableau
// =============================================================================

/// Coefficients of an explicit Runge-Kutta method.
///
/// ```text
/// k_s = V(x + dt * Σ_{j<s} a[s][j] k_j,  t + c[s] dt)
/// x  <- x + dt * Σ_s b[s] k_s
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ButcherTableau {
    /// Strictly lower-triangular stage matrix, one row per stage
    pub a: &'static [&'static [f64]],
    /// Stage nodes (fractions of the sub-step)
    pub c: &'static [f64],
}

impl ButcherTableau {
    pub fn n_stages(&self) -> usize {
        self.c.len()
    }

    /// Sample every stage velocity starting from `state`.
    pub fn stages<F: VelocityField + ?Sized>(
        &self,
        state: &Positions,
        clock: &StepClock,
        sampler: &VelocitySampler<'_, F>,
    ) -> Result<Vec<VelocitySample>> {
        let dt = clock.dt();
        let mut k: Vec<VelocitySample> = Vec::with_capacity(self.n_stages());

        for (s, &c) in self.c.iter().enumerate() {
            let vel = if s == 0 {
                sampler.sample(&state.x, &state.y, clock.time())?
            } else {
                let mut predicted = state.clone();
                for (j, &a_sj) in self.a[s].iter().enumerate() {
                    if a_sj != 0.0 {
                        predicted.axpy(a_sj, dt, &k[j]);
                    }
                }
                sampler.sample(&predicted.x, &predicted.y, &clock.stage_times(c))?
            };
            k.push(vel);
        }

        Ok(k)
    }
}

/// Combine stage velocities with weights `b`: `x_i <- x_i + dt_i * Σ b_s k_s,i`.
pub fn combine(state: &mut Positions, b: &[f64], k: &[VelocitySample], dt: &[f64]) {
    for i in 0..state.len() {
        let mut du = 0.0;
        let mut dv = 0.0;
        for (&b_s, k_s) in b.iter().zip(k) {
            if b_s != 0.0 {
                du += b_s * k_s.u[i];
                dv += b_s * k_s.v[i];
            }
        }
        state.x[i] += dt[i] * du;
        state.y[i] += dt[i] * dv;
    }
}

/// Forward Euler: one stage at the sub-step start.
pub const EULER_TABLEAU: ButcherTableau = ButcherTableau {
    a: &[&[]],
    c: &[0.0],
};
const EULER_WEIGHTS: [f64; 1] = [1.0];

/// Classical RK4: half-step, half-step, full-step predictors.
pub const RK4_TABLEAU: ButcherTableau = ButcherTableau {
    a: &[&[], &[0.5], &[0.0, 0.5], &[0.0, 0.0, 1.0]],
    c: &[0.0, 0.5, 0.5, 1.0],
};
const RK4_WEIGHTS: [f64; 4] = [1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0];

// =============================================================================
// Integrator Traits
// =============================================================================

/// Non-generic information about an advection scheme (dyn-compatible).
pub trait IntegratorInfo: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Order of the local truncation error.
    fn order(&self) -> usize;

    /// Velocity samples per sub-step (per trajectory).
    fn n_stages(&self) -> usize;

    /// Whether the scheme refines its step count to meet a tolerance.
    fn is_adaptive(&self) -> bool;

    /// Offsets from the sub-step start at which velocities are sampled.
    fn stage_times(&self, dt: f64) -> Vec<f64>;
}

/// Advance a state by one sub-step.
///
/// `S` is [`Positions`] for the single-trajectory schemes and
/// [`EmbeddedPair`](super::EmbeddedPair) for RKF45.
pub trait TimeIntegrator<S>: IntegratorInfo {
    /// Advance `state` from `clock.time()` to `clock.time() + clock.dt()`.
    ///
    /// The clock is not advanced; the caller does that after the step.
    fn step<F: VelocityField + ?Sized>(
        &self,
        state: &mut S,
        clock: &StepClock,
        sampler: &VelocitySampler<'_, F>,
    ) -> Result<()>;
}

/// Run `n_steps` sub-steps of `integrator`, advancing `clock` after each.
pub fn run_fixed<S, I, F>(
    integrator: &I,
    state: &mut S,
    clock: &mut StepClock,
    n_steps: usize,
    sampler: &VelocitySampler<'_, F>,
) -> Result<()>
where
    I: TimeIntegrator<S>,
    F: VelocityField + ?Sized,
{
    for _ in 0..n_steps {
        integrator.step(state, clock, sampler)?;
        clock.advance();
    }
    Ok(())
}

// =============================================================================
// Forward Euler
// =============================================================================

/// Explicit Euler (1st order, one sample per sub-step).
///
/// ```text
/// x <- x + dt * V(x, t)
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardEuler;

impl IntegratorInfo for ForwardEuler {
    fn name(&self) -> &'static str {
        "euler"
    }

    fn order(&self) -> usize {
        1
    }

    fn n_stages(&self) -> usize {
        1
    }

    fn is_adaptive(&self) -> bool {
        false
    }

    fn stage_times(&self, _dt: f64) -> Vec<f64> {
        vec![0.0]
    }
}

impl TimeIntegrator<Positions> for ForwardEuler {
    fn step<F: VelocityField + ?Sized>(
        &self,
        state: &mut Positions,
        clock: &StepClock,
        sampler: &VelocitySampler<'_, F>,
    ) -> Result<()> {
        let k = EULER_TABLEAU.stages(state, clock, sampler)?;
        combine(state, &EULER_WEIGHTS, &k, clock.dt());
        Ok(())
    }
}

// =============================================================================
// Classical RK4
// =============================================================================

/// Classical fourth-order Runge-Kutta (four samples per sub-step).
///
/// ```text
/// k1 = V(x, t)
/// k2 = V(x + dt/2 k1, t + dt/2)
/// k3 = V(x + dt/2 k2, t + dt/2)
/// k4 = V(x + dt k3,   t + dt)
/// x <- x + dt (k1 + 2 k2 + 2 k3 + k4) / 6
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassicalRk4;

impl IntegratorInfo for ClassicalRk4 {
    fn name(&self) -> &'static str {
        "rk4"
    }

    fn order(&self) -> usize {
        4
    }

    fn n_stages(&self) -> usize {
        4
    }

    fn is_adaptive(&self) -> bool {
        false
    }

    fn stage_times(&self, dt: f64) -> Vec<f64> {
        RK4_TABLEAU.c.iter().map(|c| c * dt).collect()
    }
}

impl TimeIntegrator<Positions> for ClassicalRk4 {
    fn step<F: VelocityField + ?Sized>(
        &self,
        state: &mut Positions,
        clock: &StepClock,
        sampler: &VelocitySampler<'_, F>,
    ) -> Result<()> {
        let k = RK4_TABLEAU.stages(state, clock, sampler)?;
        combine(state, &RK4_WEIGHTS, &k, clock.dt());
        Ok(())
    }
}

// =============================================================================
// Scheme Enum (Runtime Selection)
// =============================================================================

/// Advection scheme selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Explicit Euler, fixed step
    #[serde(alias = "Euler")]
    Euler,
    /// Classical 4th-order Runge-Kutta, fixed step (default)
    #[default]
    #[serde(alias = "RK4")]
    RK4,
    /// Runge-Kutta-Fehlberg 4(5) with step-doubling refinement
    #[serde(alias = "RKF45")]
    RKF45,
}

impl Scheme {
    fn info(&self) -> &'static dyn IntegratorInfo {
        match self {
            Scheme::Euler => &ForwardEuler,
            Scheme::RK4 => &ClassicalRk4,
            Scheme::RKF45 => &super::Fehlberg45,
        }
    }
}

impl IntegratorInfo for Scheme {
    fn name(&self) -> &'static str {
        self.info().name()
    }

    fn order(&self) -> usize {
        self.info().order()
    }

    fn n_stages(&self) -> usize {
        self.info().n_stages()
    }

    fn is_adaptive(&self) -> bool {
        self.info().is_adaptive()
    }

    fn stage_times(&self, dt: f64) -> Vec<f64> {
        self.info().stage_times(dt)
    }
}

impl FromStr for Scheme {
    type Err = AdvectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euler" => Ok(Scheme::Euler),
            "rk4" => Ok(Scheme::RK4),
            "rkf45" => Ok(Scheme::RKF45),
            _ => Err(AdvectError::InvalidScheme(s.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
