//! Parcel advection: configuration, particle sets, results and the entry points.
//!
//! Two ways in:
//! - [`integrate`]: pure function over a [`ParticleSet`] already on the
//!   canonical time axis (days since J2000)
//! - [`Advection`]: request object built from raw coordinates, times with
//!   unit strings and string selectors; keeps the last result for
//!   [`Advection::distance`]
//!
//! # Example
//!
//! ```
//! use advect_rs::advect::Advection;
//! use advect_rs::field::SolidBodyRotation;
//! use std::f64::consts::PI;
//!
//! // Quarter turn per day about the origin
//! let field = SolidBodyRotation::new(PI / 2.0);
//! let mut advection = Advection::builder(&field)
//!     .positions(vec![1.0], vec![0.0])
//!     .source_time(0.0)
//!     .target_time(1.0)
//!     .time_units("days since 2000-01-01T12:00:00")
//!     .scheme_name("rkf45")
//!     .tolerance(1e-8)
//!     .build()
//!     .unwrap();
//!
//! let result = advection.run().unwrap();
//! assert!(result.x0[0].abs() < 1e-6);
//! assert!((result.y0[0] - 1.0).abs() < 1e-6);
//! ```

mod config;
mod particles;
mod request;
mod result;
mod runner;

pub use config::{IntegratorConfig, MAX_REFINEMENT_CEILING};
pub use particles::ParticleSet;
pub use request::{Advection, AdvectionBuilder, RunState};
pub use result::TrajectoryResult;
pub use runner::integrate;
