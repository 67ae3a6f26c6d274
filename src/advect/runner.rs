//! The pure integration entry point.

use crate::error::Result;
use crate::field::{VelocityField, VelocitySampler};
use crate::time::{
    plan_steps, run_fixed, ClassicalRk4, ForwardEuler, IntegratorInfo, Positions, Scheme,
    StepClock, StepDoubling, TimeIntegrator,
};

use super::{IntegratorConfig, ParticleSet, TrajectoryResult};

/// Advect `particles` through `field` from their source to their target times.
///
/// Pure: no state survives the call, so repeated calls with the same inputs
/// give bit-identical positions. An empty particle set returns an empty
/// result without sampling the field.
///
/// # Errors
///
/// - `InvalidConfig` if `config` fails validation
/// - `Sampling` if the field provider fails
/// - `NonConvergence` if RKF45 exhausts `max_refinements`
///
/// # Example
///
/// ```
/// use advect_rs::advect::{integrate, IntegratorConfig, ParticleSet};
/// use advect_rs::field::UniformField;
/// use advect_rs::time::Scheme;
///
/// let field = UniformField::new(2.0, -1.0);
/// let particles = ParticleSet::new(vec![0.0, 1.0], vec![0.0, 0.0], 0.0, 3.0).unwrap();
/// let config = IntegratorConfig::new(Scheme::Euler);
///
/// let result = integrate(&field, &particles, &config).unwrap();
/// assert_eq!(result.n_steps, 3);
/// assert!((result.x0[1] - 7.0).abs() < 1e-12);
/// assert!((result.y0[0] + 3.0).abs() < 1e-12);
/// ```
pub fn integrate<F: VelocityField + ?Sized>(
    field: &F,
    particles: &ParticleSet,
    config: &IntegratorConfig,
) -> Result<TrajectoryResult> {
    config.validate()?;

    if particles.is_empty() {
        return Ok(TrajectoryResult {
            x: Vec::new(),
            y: Vec::new(),
            x0: Vec::new(),
            y0: Vec::new(),
            scheme: config.scheme,
            n_steps: 0,
            error_estimate: None,
        });
    }

    let plan = plan_steps(
        particles.t(),
        particles.t0(),
        config.step_days(),
        config.step_count,
    );
    let sampler = VelocitySampler::new(field, config.interpolation);
    let start = particles.positions();
    let (t, t0) = particles.times();

    tracing::debug!(
        scheme = config.scheme.name(),
        particles = particles.len(),
        n_steps = plan.n_steps,
        "Starting advection"
    );

    let (end, n_steps, error_estimate) = match config.scheme {
        Scheme::Euler => {
            let end = advance_fixed(&ForwardEuler, start, &t, &t0, plan.n_steps, &sampler)?;
            (end, plan.n_steps, None)
        }
        Scheme::RK4 => {
            let end = advance_fixed(&ClassicalRk4, start, &t, &t0, plan.n_steps, &sampler)?;
            (end, plan.n_steps, None)
        }
        Scheme::RKF45 => {
            let (end, estimate) = StepDoubling::new(config.tolerance, config.max_refinements)
                .integrate(&start, &t, &t0, plan.n_steps, &sampler)?;
            (end, estimate.n_steps, Some(estimate))
        }
    };

    Ok(TrajectoryResult {
        x: particles.x().to_vec(),
        y: particles.y().to_vec(),
        x0: end.x,
        y0: end.y,
        scheme: config.scheme,
        n_steps,
        error_estimate,
    })
}

fn advance_fixed<I, F>(
    integrator: &I,
    mut state: Positions,
    t: &[f64],
    t0: &[f64],
    n_steps: usize,
    sampler: &VelocitySampler<'_, F>,
) -> Result<Positions>
where
    I: TimeIntegrator<Positions>,
    F: VelocityField + ?Sized,
{
    let mut clock = StepClock::spanning(t, t0, n_steps)?;
    run_fixed(integrator, &mut state, &mut clock, n_steps, sampler)?;
    Ok(state)
}
