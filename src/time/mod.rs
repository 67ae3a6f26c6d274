//! Time handling and time integration.
//!
//! - [`units`](TimeUnits): `"<unit> since <epoch>"` strings to days since J2000
//! - [`plan_steps`]: how many sub-steps an advection request takes
//! - [`ForwardEuler`], [`ClassicalRk4`], [`Fehlberg45`]: explicit schemes behind
//!   the [`TimeIntegrator`] trait, selected at runtime through [`Scheme`]
//! - [`StepDoubling`]: RKF45 error control by repeated step doubling

mod integrator;
mod planner;
mod rkf45;
mod units;

pub use integrator::{
    combine, run_fixed, ButcherTableau, ClassicalRk4, ForwardEuler, IntegratorInfo, Positions,
    Scheme, StepClock, TimeIntegrator, EULER_TABLEAU, RK4_TABLEAU,
};
pub use planner::{plan_steps, PlanBranch, StepPlan};
pub use rkf45::{
    run_embedded, EmbeddedPair, ErrorEstimate, Fehlberg45, StepDoubling, FEHLBERG_B4,
    FEHLBERG_B5, FEHLBERG_TABLEAU,
};
pub use units::{
    normalize_time, TimeUnit, TimeUnits, DEFAULT_EPOCH, DEFAULT_TIME_UNITS, J2000_UNIX_SECONDS,
    SECONDS_PER_DAY,
};
