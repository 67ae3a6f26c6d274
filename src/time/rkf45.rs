//! Runge-Kutta-Fehlberg 4(5) with step-doubling refinement.
//!
//! Two trajectories are advanced side by side from the same start: one with
//! the 4th-order weights, one with the 5th-order weights, each evaluating its
//! own six stages. Their RMS separation at the end of the run is the error
//! estimate. While it exceeds the tolerance, the whole run is repeated from
//! the starting positions with twice as many sub-steps.
//!
//! ```text
//! N_k = 2^k N,  k = 0, 1, ..., max_refinements
//! σ_k = sqrt( mean_i [ (x4_i - x5_i)^2 + (y4_i - y5_i)^2 ] )   (finite particles only)
//! ```

use serde::{Deserialize, Serialize};

use super::integrator::{
    combine, run_fixed, ButcherTableau, IntegratorInfo, Positions, StepClock, TimeIntegrator,
};
use crate::error::{AdvectError, Result};
use crate::field::{VelocityField, VelocitySampler};

/// Fehlberg stage matrix and nodes.
pub const FEHLBERG_TABLEAU: ButcherTableau = ButcherTableau {
    a: &[
        &[],
        &[1.0 / 4.0],
        &[3.0 / 32.0, 9.0 / 32.0],
        &[1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0],
        &[439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0],
        &[
            -8.0 / 27.0,
            2.0,
            -3544.0 / 2565.0,
            1859.0 / 4104.0,
            -11.0 / 40.0,
        ],
    ],
    c: &[0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0],
};

/// 4th-order solution weights.
pub const FEHLBERG_B4: [f64; 6] = [
    25.0 / 216.0,
    0.0,
    1408.0 / 2565.0,
    2197.0 / 4104.0,
    -1.0 / 5.0,
    0.0,
];

/// 5th-order solution weights.
pub const FEHLBERG_B5: [f64; 6] = [
    16.0 / 135.0,
    0.0,
    6656.0 / 12825.0,
    28561.0 / 56430.0,
    -9.0 / 50.0,
    2.0 / 55.0,
];

/// The 4th- and 5th-order trajectories integrated together.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedPair {
    pub fourth: Positions,
    pub fifth: Positions,
}

impl EmbeddedPair {
    /// Both trajectories starting at `start`.
    pub fn from_start(start: &Positions) -> Self {
        Self {
            fourth: start.clone(),
            fifth: start.clone(),
        }
    }

    /// RMS separation over particles finite in both trajectories.
    ///
    /// Returns the discrepancy (`None` when no particle qualifies) and the
    /// number of particles that entered it.
    pub fn rms_discrepancy(&self) -> (Option<f64>, usize) {
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..self.fourth.len() {
            if self.fourth.is_finite(i) && self.fifth.is_finite(i) {
                let dx = self.fourth.x[i] - self.fifth.x[i];
                let dy = self.fourth.y[i] - self.fifth.y[i];
                sum += dx * dx + dy * dy;
                count += 1;
            }
        }
        if count == 0 {
            (None, 0)
        } else {
            (Some((sum / count as f64).sqrt()), count)
        }
    }
}

/// Fehlberg's embedded 4(5) pair (six samples per trajectory per sub-step).
#[derive(Clone, Copy, Debug, Default)]
pub struct Fehlberg45;

impl IntegratorInfo for Fehlberg45 {
    fn name(&self) -> &'static str {
        "rkf45"
    }

    fn order(&self) -> usize {
        4
    }

    fn n_stages(&self) -> usize {
        6
    }

    fn is_adaptive(&self) -> bool {
        true
    }

    fn stage_times(&self, dt: f64) -> Vec<f64> {
        FEHLBERG_TABLEAU.c.iter().map(|c| c * dt).collect()
    }
}

impl TimeIntegrator<EmbeddedPair> for Fehlberg45 {
    fn step<F: VelocityField + ?Sized>(
        &self,
        state: &mut EmbeddedPair,
        clock: &StepClock,
        sampler: &VelocitySampler<'_, F>,
    ) -> Result<()> {
        let k4 = FEHLBERG_TABLEAU.stages(&state.fourth, clock, sampler)?;
        combine(&mut state.fourth, &FEHLBERG_B4, &k4, clock.dt());

        let k5 = FEHLBERG_TABLEAU.stages(&state.fifth, clock, sampler)?;
        combine(&mut state.fifth, &FEHLBERG_B5, &k5, clock.dt());
        Ok(())
    }
}

/// One RKF45 pass of `n_steps` sub-steps from `start` (times `t`) to `t0`.
///
/// # Arguments
/// * `start` - Starting positions of every particle
/// * `t` - Starting time of each particle (days since J2000)
/// * `t0` - Target time of each particle
/// * `n_steps` - Sub-steps shared by all particles
/// * `sampler` - Velocity lookup used for every stage
///
/// # Errors
///
/// `ShapeMismatch` if `t` or `t0` does not have one entry per particle.
pub fn run_embedded<F: VelocityField + ?Sized>(
    start: &Positions,
    t: &[f64],
    t0: &[f64],
    n_steps: usize,
    sampler: &VelocitySampler<'_, F>,
) -> Result<EmbeddedPair> {
    if t.len() != start.len() {
        return Err(AdvectError::ShapeMismatch {
            what: "t",
            expected: start.len(),
            actual: t.len(),
        });
    }
    let mut pair = EmbeddedPair::from_start(start);
    let mut clock = StepClock::spanning(t, t0, n_steps)?;
    run_fixed(&Fehlberg45, &mut pair, &mut clock, n_steps, sampler)?;
    Ok(pair)
}

/// Outcome of the RKF45 acceptance test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEstimate {
    /// Step multiplier of the accepted pass (`2^k`)
    pub scale: usize,
    /// Sub-steps actually taken (`scale * N`)
    pub n_steps: usize,
    /// RMS 4th/5th-order separation, `None` if no particle stayed finite
    pub sigma: Option<f64>,
    /// Particles that entered the RMS
    pub finite_particles: usize,
    /// Tolerance the estimate was accepted against
    pub tolerance: f64,
}

/// Adaptive RKF45 controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepDoubling {
    pub tolerance: f64,
    pub max_refinements: u32,
}

impl StepDoubling {
    pub fn new(tolerance: f64, max_refinements: u32) -> Self {
        Self {
            tolerance,
            max_refinements,
        }
    }

    /// Integrate from `start` to `t0`, doubling the sub-step count until the
    /// embedded error estimate is within tolerance.
    ///
    /// Every pass restarts from `start`. The accepted positions are the
    /// 4th-order trajectory.
    ///
    /// # Arguments
    /// * `start` - Starting positions of every particle
    /// * `t` - Starting time of each particle (days since J2000)
    /// * `t0` - Target time of each particle
    /// * `n_steps` - Sub-step count of the first pass, doubled on each refinement
    /// * `sampler` - Velocity lookup used for every stage
    ///
    /// # Errors
    ///
    /// - [`AdvectError::ShapeMismatch`] when `t` or `t0` does not have one entry
    ///   per particle
    /// - [`AdvectError::NonConvergence`] when the estimate is still above
    ///   tolerance after `max_refinements` doublings
    /// - any sampling error from the velocity field
    pub fn integrate<F: VelocityField + ?Sized>(
        &self,
        start: &Positions,
        t: &[f64],
        t0: &[f64],
        n_steps: usize,
        sampler: &VelocitySampler<'_, F>,
    ) -> Result<(Positions, ErrorEstimate)> {
        let mut scale = 1usize;
        let mut refinement = 0u32;

        loop {
            let steps = scale.checked_mul(n_steps).ok_or_else(|| {
                AdvectError::InvalidConfig(format!("RKF45 step count overflow at scale {}", scale))
            })?;
            let pair = run_embedded(start, t, t0, steps, sampler)?;
            let (sigma, finite_particles) = pair.rms_discrepancy();

            tracing::debug!(
                scale,
                n_steps = steps,
                ?sigma,
                finite_particles,
                tolerance = self.tolerance,
                "RKF45 pass"
            );

            let estimate = ErrorEstimate {
                scale,
                n_steps: steps,
                sigma,
                finite_particles,
                tolerance: self.tolerance,
            };

            match sigma {
                None => {
                    tracing::warn!(
                        particles = start.len(),
                        "No particle stayed finite in both RKF45 trajectories; accepting without an error estimate"
                    );
                    return Ok((pair.fourth, estimate));
                }
                Some(s) if s <= self.tolerance => return Ok((pair.fourth, estimate)),
                Some(s) => {
                    if refinement >= self.max_refinements {
                        tracing::warn!(
                            scale,
                            sigma = s,
                            tolerance = self.tolerance,
                            "RKF45 did not converge"
                        );
                        return Err(AdvectError::NonConvergence {
                            scale,
                            sigma: s,
                            tolerance: self.tolerance,
                        });
                    }
                    refinement += 1;
                    scale *= 2;
                }
            }
        }
    }
}
