//! # advect-rs
//!
//! Lagrangian parcel advection through time-varying 2D velocity fields.
//!
//! This crate provides the building blocks for moving point parcels along
//! `dx/dt = U(x, y, t)`, `dy/dt = V(x, y, t)`:
//! - Time normalization of CF-style `"<unit> since <epoch>"` values to days since J2000
//! - Velocity sampling against pluggable field providers (gridded, analytic, closures)
//! - Step planning that picks one shared sub-step count per particle batch
//! - Explicit schemes: forward Euler, classical RK4, and RKF45 with step-doubling
//!   error control
//! - Trajectory results with per-particle displacement
//!
//! # Example
//!
//! ```
//! use advect_rs::{Advection, GriddedVelocityField, Scheme};
//!
//! // Uniform 1 km/day eastward flow on a 10 km grid
//! let x: Vec<f64> = (0..=10).map(|i| i as f64).collect();
//! let y = x.clone();
//! let field = GriddedVelocityField::from_fn(x, y, None, |_x, _y, _t| (1.0, 0.0)).unwrap();
//!
//! let mut advection = Advection::builder(&field)
//!     .positions(vec![2.0, 5.0], vec![5.0, 5.0])
//!     .source_time(0.0)
//!     .target_time(3.0)
//!     .time_units("days since 2018-01-01")
//!     .scheme(Scheme::Euler)
//!     .build()
//!     .unwrap();
//!
//! let result = advection.run().unwrap();
//! assert!((result.x0[0] - 5.0).abs() < 1e-12);
//! assert!((result.x0[1] - 8.0).abs() < 1e-12);
//! ```

pub mod advect;
pub mod error;
pub mod field;
pub mod time;
pub mod types;

// Re-export main types for convenience
pub use advect::{
    integrate, Advection, AdvectionBuilder, IntegratorConfig, ParticleSet, RunState,
    TrajectoryResult,
};
pub use error::{AdvectError, Result};
pub use field::{
    FieldError, FnField, GriddedVelocityField, InpaintConfig, Interpolation, SolidBodyRotation,
    TimeDomain, UniformField, VelocityField, VelocitySampler,
};
pub use time::{normalize_time, plan_steps, ErrorEstimate, Scheme, TimeUnits};
pub use types::{Bounds2D, TimeValues};
