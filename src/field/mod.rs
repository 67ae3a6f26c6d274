//! Velocity field providers and the sampling adapter.
//!
//! The integrator never touches gridded data directly. It asks a
//! [`VelocityField`] for `(U, V)` at a batch of particle coordinates through
//! a [`VelocitySampler`], which clips query times into the provider's time
//! domain before delegating.
//!
//! Providers shipped with the crate:
//! - [`GriddedVelocityField`]: regular `x`/`y` grid with an optional time axis,
//!   with gap filling through [`GriddedVelocityField::inpaint`]
//! - [`UniformField`]: constant velocity everywhere
//! - [`SolidBodyRotation`]: rigid rotation about a centre, with an exact solution
//! - [`FnField`]: any closure `(x, y, t) -> (u, v)`
//!
//! Out-of-domain spatial queries yield NaN, not an error. NaN velocities
//! propagate into NaN positions, which the RKF45 error estimate filters out.
//!
//! # Example
//!
//! ```
//! use advect_rs::field::{Interpolation, UniformField, VelocityField, VelocitySampler};
//!
//! let field = UniformField::new(0.1, -0.2);
//! let sampler = VelocitySampler::new(&field, Interpolation::Linear);
//! let vel = sampler.sample(&[0.0, 1.0], &[0.0, 1.0], &[0.0, 0.0]).unwrap();
//! assert_eq!(vel.u, vec![0.1, 0.1]);
//! assert_eq!(vel.v, vec![-0.2, -0.2]);
//! ```

mod analytic;
mod grid;
mod inpaint;
mod sampler;

pub use analytic::{FnField, SolidBodyRotation, UniformField};
pub use grid::GriddedVelocityField;
pub use inpaint::InpaintConfig;
pub use sampler::VelocitySampler;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AdvectError;

/// Error raised by a velocity field provider.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    /// Coordinate arrays passed to `sample` disagree in length
    #[error("Coordinate length mismatch: {what} has {actual} values, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Time-dependent provider queried without a time coordinate
    #[error("Time-dependent velocity field queried without a time coordinate")]
    MissingTime,

    /// Grid axis has too few points
    #[error("Axis '{axis}' has {len} points, need at least {min}")]
    AxisTooShort {
        axis: &'static str,
        len: usize,
        min: usize,
    },

    /// Grid axis is not strictly increasing
    #[error("Axis '{axis}' is not strictly increasing at index {index}")]
    NonMonotonicAxis { axis: &'static str, index: usize },

    /// Velocity array does not match the axis lengths
    #[error("Grid shape mismatch for {what}: expected {expected} values, got {actual}")]
    GridShape {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A slice to inpaint has no finite value to fill from
    #[error("No valid {what} values found in time slice {slice}")]
    NoValidValues { what: &'static str, slice: usize },

    /// Failure reported by an external provider
    #[error("Velocity provider error: {0}")]
    Provider(String),
}

/// Spatial interpolation method used by providers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Multilinear interpolation between bracketing nodes
    #[default]
    Linear,
    /// Value of the closest node
    Nearest,
}

impl Interpolation {
    pub fn name(&self) -> &'static str {
        match self {
            Interpolation::Linear => "linear",
            Interpolation::Nearest => "nearest",
        }
    }
}

impl FromStr for Interpolation {
    type Err = AdvectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Interpolation::Linear),
            "nearest" => Ok(Interpolation::Nearest),
            _ => Err(AdvectError::InvalidInterpolation(s.to_string())),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed time interval `[t_min, t_max]` covered by a provider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeDomain {
    pub t_min: f64,
    pub t_max: f64,
}

impl TimeDomain {
    /// Create a time domain.
    ///
    /// # Panics
    ///
    /// Panics if `t_max < t_min`.
    pub fn new(t_min: f64, t_max: f64) -> Self {
        assert!(
            t_max >= t_min,
            "t_max ({}) must not be less than t_min ({})",
            t_max,
            t_min
        );
        Self { t_min, t_max }
    }

    /// Clamp `t` into the domain. NaN passes through.
    #[inline]
    pub fn clip(&self, t: f64) -> f64 {
        if t < self.t_min {
            self.t_min
        } else if t > self.t_max {
            self.t_max
        } else {
            t
        }
    }

    /// Check if `t` lies inside (inclusive).
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.t_min && t <= self.t_max
    }
}

/// Velocity components at a batch of points, same order as the query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VelocitySample {
    pub u: Vec<f64>,
    pub v: Vec<f64>,
}

impl VelocitySample {
    pub fn len(&self) -> usize {
        self.u.len()
    }

    pub fn is_empty(&self) -> bool {
        self.u.is_empty()
    }
}

/// A source of interpolated velocities.
///
/// Implementors provide a per-point query; the provided batch [`sample`](Self::sample)
/// maps it over the particles (in parallel with the `parallel` feature).
/// Velocities are expected in distance per day so that they pair with the
/// canonical time axis.
pub trait VelocityField: Sync {
    /// Valid time interval, or `None` for a time-independent field.
    fn time_domain(&self) -> Option<TimeDomain>;

    /// Velocity at one point.
    ///
    /// `t` is `None` exactly when [`time_domain`](Self::time_domain) is `None`.
    /// Points outside the spatial domain return `(NaN, NaN)`.
    fn velocity_at(
        &self,
        x: f64,
        y: f64,
        t: Option<f64>,
        method: Interpolation,
    ) -> Result<(f64, f64), FieldError>;

    /// Velocities at a batch of points.
    fn sample(
        &self,
        x: &[f64],
        y: &[f64],
        t: Option<&[f64]>,
        method: Interpolation,
    ) -> Result<VelocitySample, FieldError> {
        let n = x.len();
        if y.len() != n {
            return Err(FieldError::LengthMismatch {
                what: "y",
                expected: n,
                actual: y.len(),
            });
        }
        if let Some(t) = t {
            if t.len() != n {
                return Err(FieldError::LengthMismatch {
                    what: "t",
                    expected: n,
                    actual: t.len(),
                });
            }
        }

        let point = |i: usize| self.velocity_at(x[i], y[i], t.map(|t| t[i]), method);

        #[cfg(feature = "parallel")]
        let pairs: Vec<(f64, f64)> = {
            use rayon::prelude::*;
            (0..n)
                .into_par_iter()
                .map(point)
                .collect::<Result<_, _>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let pairs: Vec<(f64, f64)> = (0..n).map(point).collect::<Result<_, _>>()?;

        let (u, v) = pairs.into_iter().unzip();
        Ok(VelocitySample { u, v })
    }
}
