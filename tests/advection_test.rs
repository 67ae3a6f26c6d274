//! End-to-end advection tests through the public API.
//!
//! Covers exactness on uniform flow, scheme ordering and observed order on
//! solid-body rotation, the RKF45 error bound, NaN handling for particles
//! leaving a grid, and the request lifecycle.

use advect_rs::advect::{integrate, Advection, IntegratorConfig, ParticleSet, RunState};
use advect_rs::field::{
    FnField, GriddedVelocityField, Interpolation, SolidBodyRotation, UniformField,
    VelocitySampler,
};
use advect_rs::time::{run_embedded, Positions, Scheme};
use advect_rs::AdvectError;
use approx::assert_abs_diff_eq;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};

const SCHEMES: [Scheme; 3] = [Scheme::Euler, Scheme::RK4, Scheme::RKF45];

/// Max position error against the exact rotation after `elapsed` days.
fn rotation_error(scheme: Scheme, n_steps: usize, elapsed: f64) -> f64 {
    let field = SolidBodyRotation::new(1.0);
    let x = vec![1.0, 0.0, -0.5];
    let y = vec![0.0, 2.0, 0.5];
    let particles = ParticleSet::new(x.clone(), y.clone(), 0.0, elapsed).unwrap();
    let config = IntegratorConfig::new(scheme).with_step_count(n_steps);

    let result = integrate(&field, &particles, &config).unwrap();
    (0..x.len())
        .map(|i| {
            let (xe, ye) = field.exact(x[i], y[i], elapsed);
            (result.x0[i] - xe).hypot(result.y0[i] - ye)
        })
        .fold(0.0, f64::max)
}

fn unit_grid(u: f64, v: f64) -> GriddedVelocityField {
    let axis: Vec<f64> = (0..=10).map(|i| i as f64).collect();
    GriddedVelocityField::from_fn(axis.clone(), axis, None, move |_x, _y, _t| (u, v)).unwrap()
}

#[test]
fn test_uniform_field_exact_for_all_schemes() {
    let (u, v) = (0.75, -1.25);
    let field = UniformField::new(u, v);
    let x = vec![0.0, 10.0, -3.5];
    let y = vec![1.0, -2.0, 4.0];
    let t = vec![0.0, 2.0, 7.0];
    let t0 = 5.0;

    for scheme in SCHEMES {
        for n_steps in [1, 2, 7, 50] {
            let particles = ParticleSet::new(x.clone(), y.clone(), t.clone(), t0).unwrap();
            let config = IntegratorConfig::new(scheme).with_step_count(n_steps);
            let result = integrate(&field, &particles, &config).unwrap();

            for i in 0..x.len() {
                let elapsed = t0 - t[i];
                assert_abs_diff_eq!(result.x0[i], x[i] + u * elapsed, epsilon = 1e-10);
                assert_abs_diff_eq!(result.y0[i], y[i] + v * elapsed, epsilon = 1e-10);
            }
        }
    }
}

#[test]
fn test_rk4_beats_euler_on_rotation() {
    for n_steps in [8, 32, 128] {
        let euler = rotation_error(Scheme::Euler, n_steps, PI);
        let rk4 = rotation_error(Scheme::RK4, n_steps, PI);
        assert!(
            rk4 < euler,
            "N={}: RK4 error {:.3e} should be below Euler error {:.3e}",
            n_steps,
            rk4,
            euler
        );
    }
}

#[test]
fn test_observed_order_on_rotation() {
    let elapsed = 2.0;

    let e1 = rotation_error(Scheme::Euler, 200, elapsed);
    let e2 = rotation_error(Scheme::Euler, 400, elapsed);
    let euler_order = (e1 / e2).log2();
    assert!(
        (euler_order - 1.0).abs() < 0.2,
        "Euler observed order {:.2}, expected ~1",
        euler_order
    );

    let e1 = rotation_error(Scheme::RK4, 10, elapsed);
    let e2 = rotation_error(Scheme::RK4, 20, elapsed);
    let rk4_order = (e1 / e2).log2();
    assert!(
        (rk4_order - 4.0).abs() < 0.5,
        "RK4 observed order {:.2}, expected ~4",
        rk4_order
    );
}

#[test]
fn test_rkf45_error_bound_holds_on_recheck() {
    let field = SolidBodyRotation::new(0.8).with_center(1.0, -1.0);
    let x = vec![2.0, 0.0, 1.0, 3.0];
    let y = vec![-1.0, 0.0, 1.0, 2.0];
    let t = vec![0.0, 1.0, 2.0, 0.5];
    let t0 = 10.0;
    let tolerance = 1e-7;

    let particles = ParticleSet::new(x.clone(), y.clone(), t.clone(), t0).unwrap();
    let config = IntegratorConfig::new(Scheme::RKF45).with_tolerance(tolerance);
    let result = integrate(&field, &particles, &config).unwrap();
    let estimate = result.error_estimate.unwrap();

    assert!(estimate.sigma.unwrap() <= tolerance);
    assert_eq!(estimate.n_steps, result.n_steps);
    assert_eq!(estimate.finite_particles, x.len());

    let sampler = VelocitySampler::new(&field, Interpolation::Linear);
    let (pt, pt0) = particles.times();
    let pair = run_embedded(
        &Positions::new(x.clone(), y.clone()),
        &pt,
        &pt0,
        estimate.n_steps,
        &sampler,
    )
    .unwrap();

    assert_eq!(pair.fourth.x, result.x0);
    assert_eq!(pair.fourth.y, result.y0);
    let (sigma, _) = pair.rms_discrepancy();
    assert!(sigma.unwrap() <= tolerance);

    for i in 0..x.len() {
        let (xe, ye) = field.exact(x[i], y[i], t0 - t[i]);
        assert_abs_diff_eq!(result.x0[i], xe, epsilon = 1e-4);
        assert_abs_diff_eq!(result.y0[i], ye, epsilon = 1e-4);
    }
}

#[test]
fn test_rkf45_refines_coarse_plan() {
    let field = SolidBodyRotation::new(1.0);
    let particles = ParticleSet::new(vec![1.0], vec![0.0], 0.0, 2.0 * PI).unwrap();
    let config = IntegratorConfig::new(Scheme::RKF45)
        .with_step_count(1)
        .with_tolerance(1e-6);

    let result = integrate(&field, &particles, &config).unwrap();
    let estimate = result.error_estimate.unwrap();
    assert!(estimate.scale > 1);
    assert!(estimate.scale.is_power_of_two());
    assert_eq!(result.n_steps, estimate.scale);

    // Full turn returns to the start
    assert_abs_diff_eq!(result.x0[0], 1.0, epsilon = 1e-4);
    assert_abs_diff_eq!(result.y0[0], 0.0, epsilon = 1e-4);
}

#[test]
fn test_particle_leaving_grid_is_excluded() {
    let field = unit_grid(1.0, 0.0);
    // Second particle exits through x = 10 after one day
    let particles = ParticleSet::new(vec![1.0, 9.0], vec![5.0, 5.0], 0.0, 4.0).unwrap();

    let config = IntegratorConfig::new(Scheme::RKF45).with_tolerance(1e-9);
    let result = integrate(&field, &particles, &config).unwrap();
    let estimate = result.error_estimate.unwrap();

    assert_abs_diff_eq!(result.x0[0], 5.0, epsilon = 1e-10);
    assert!(result.x0[1].is_nan());
    assert_eq!(estimate.finite_particles, 1);
    assert!(estimate.sigma.unwrap() <= 1e-9);

    for scheme in [Scheme::Euler, Scheme::RK4] {
        let result = integrate(&field, &particles, &IntegratorConfig::new(scheme)).unwrap();
        assert!(result.x0[1].is_nan(), "{} should propagate NaN", scheme);
        assert_abs_diff_eq!(result.x0[0], 5.0, epsilon = 1e-10);
    }
}

#[test]
fn test_all_particles_lost_is_accepted() {
    let field = unit_grid(1.0, 0.0);
    let particles = ParticleSet::new(vec![20.0, -4.0], vec![5.0, 5.0], 0.0, 1.0).unwrap();
    let result = integrate(&field, &particles, &IntegratorConfig::new(Scheme::RKF45)).unwrap();
    let estimate = result.error_estimate.unwrap();
    assert_eq!(estimate.sigma, None);
    assert_eq!(estimate.finite_particles, 0);
    assert!(result.x0.iter().all(|x| x.is_nan()));
}

#[test]
fn test_non_convergence_is_reported() {
    // Converging jump at x = 0.5 traps the parcel on the discontinuity
    let field = FnField::new(|x, _y, _t| (if x < 0.5 { 1.0 } else { -3.0 }, 0.0));
    let particles = ParticleSet::new(vec![0.0], vec![0.0], 0.0, 2.0).unwrap();
    let config = IntegratorConfig::new(Scheme::RKF45)
        .with_step_count(1)
        .with_tolerance(1e-12)
        .with_max_refinements(1);

    match integrate(&field, &particles, &config) {
        Err(AdvectError::NonConvergence {
            scale,
            sigma,
            tolerance,
        }) => {
            assert_eq!(scale, 2);
            assert!(sigma > tolerance);
        }
        other => panic!("Expected NonConvergence, got {:?}", other),
    }
}

#[test]
fn test_repeated_runs_are_bit_identical() {
    let field = SolidBodyRotation::new(0.3);
    let x: Vec<f64> = (0..64).map(|i| (i as f64 * 0.37).sin() * 5.0).collect();
    let y: Vec<f64> = (0..64).map(|i| (i as f64 * 0.91).cos() * 5.0).collect();

    for scheme in SCHEMES {
        let mut advection = Advection::builder(&field)
            .positions(x.clone(), y.clone())
            .source_time(0.0)
            .target_time(7.5)
            .time_units("days since 2000-01-01T12:00:00")
            .scheme(scheme)
            .step_seconds(21_600.0)
            .tolerance(1e-6)
            .build()
            .unwrap();

        let first = advection.run().unwrap().clone();
        let second = advection.run().unwrap().clone();
        assert_eq!(first, second, "{} runs differ", scheme);

        let third = integrate(&field, advection.particles(), advection.config()).unwrap();
        assert_eq!(first, third);
    }
}

#[test]
fn test_distance_and_availability() {
    let field = UniformField::new(3.0, 4.0);
    let mut advection = Advection::builder(&field)
        .positions(vec![0.0, 1.0], vec![0.0, 1.0])
        .source_time(0.0)
        .target_time(1.0)
        .time_units("days since 2000-01-01T12:00:00")
        .scheme_name("euler")
        .build()
        .unwrap();

    assert_eq!(advection.distance(), None);
    assert_eq!(advection.state(), RunState::NotStarted);

    let result = advection.run().unwrap();
    assert_eq!(result.x0, vec![3.0, 4.0]);
    assert_eq!(result.y0, vec![4.0, 5.0]);

    let distance = advection.distance().unwrap();
    assert_eq!(distance, vec![5.0, 5.0]);
}

#[test]
fn test_failed_run_clears_result() {
    let calls = AtomicUsize::new(0);
    // Smooth on the first run, discontinuous afterwards
    let field = FnField::new(|x, _y, _t| {
        if calls.load(Ordering::Relaxed) == 0 || x < 0.5 {
            (1.0, 0.0)
        } else {
            (-3.0, 0.0)
        }
    });

    let mut advection = Advection::builder(&field)
        .positions(vec![0.0], vec![0.0])
        .source_time(0.0)
        .target_time(2.0)
        .time_units("days since 2000-01-01T12:00:00")
        .scheme(Scheme::RKF45)
        .step_count(1)
        .tolerance(1e-12)
        .max_refinements(1)
        .build()
        .unwrap();

    advection.run().unwrap();
    assert!(advection.distance().is_some());

    calls.store(1, Ordering::Relaxed);
    assert!(advection.run().is_err());
    assert_eq!(advection.state(), RunState::Failed);
    assert!(advection.distance().is_none());
}

#[test]
fn test_sampler_calls_per_step() {
    let calls = AtomicUsize::new(0);
    let field = FnField::new(|_x, _y, _t| {
        calls.fetch_add(1, Ordering::Relaxed);
        (1.0, 0.0)
    });
    let n_particles = 3;
    let n_steps = 5;
    let particles = ParticleSet::new(vec![0.0; n_particles], vec![0.0; n_particles], 0.0, 1.0)
        .unwrap();

    // Per-point calls = particles * samples per step * steps
    // (RKF45: six per trajectory, two trajectories, no refinement on uniform flow)
    for (scheme, per_step) in [(Scheme::Euler, 1), (Scheme::RK4, 4), (Scheme::RKF45, 12)] {
        calls.store(0, Ordering::Relaxed);
        let config = IntegratorConfig::new(scheme).with_step_count(n_steps);
        integrate(&field, &particles, &config).unwrap();
        assert_eq!(
            calls.load(Ordering::Relaxed),
            n_particles * per_step * n_steps,
            "{} sample count",
            scheme
        );
    }
}

#[test]
fn test_unsteady_grid_time_clamped() {
    let x: Vec<f64> = (0..=20).map(|i| i as f64).collect();
    let y = vec![0.0, 1.0];
    let t = vec![0.0, 1.0, 2.0];
    // u = t + 1 inside the time axis
    let field =
        GriddedVelocityField::from_fn(x, y, Some(t), |_x, _y, t| (t.unwrap_or(0.0) + 1.0, 0.0))
            .unwrap();

    let sampler = VelocitySampler::new(&field, Interpolation::Linear);
    let inside = sampler.sample(&[3.0], &[0.5], &[2.0]).unwrap();
    let beyond = sampler.sample(&[3.0], &[0.5], &[7.5]).unwrap();
    assert_eq!(inside, beyond);

    // Advect from t = 2 to t = 4: velocity held at 3 beyond the last slice
    let particles = ParticleSet::new(vec![1.0], vec![0.5], 2.0, 4.0).unwrap();
    let result = integrate(&field, &particles, &IntegratorConfig::new(Scheme::RK4)).unwrap();
    assert_abs_diff_eq!(result.x0[0], 7.0, epsilon = 1e-10);
}
