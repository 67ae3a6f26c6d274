//! Closed-form velocity fields.

use std::fmt;

use super::{FieldError, Interpolation, TimeDomain, VelocityField};

/// Spatially and temporally constant velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformField {
    pub u: f64,
    pub v: f64,
}

impl UniformField {
    pub fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

impl VelocityField for UniformField {
    fn time_domain(&self) -> Option<TimeDomain> {
        None
    }

    fn velocity_at(
        &self,
        _x: f64,
        _y: f64,
        _t: Option<f64>,
        _method: Interpolation,
    ) -> Result<(f64, f64), FieldError> {
        Ok((self.u, self.v))
    }
}

/// Rigid rotation `U = -ω (y - y_c)`, `V = ω (x - x_c)`.
///
/// Trajectories are circles about `(x_c, y_c)`, which makes this the
/// standard check for integrator accuracy on curved paths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidBodyRotation {
    /// Angular velocity (radians per day, counter-clockwise positive)
    pub omega: f64,
    pub x_c: f64,
    pub y_c: f64,
}

impl SolidBodyRotation {
    /// Rotation about the origin.
    pub fn new(omega: f64) -> Self {
        Self {
            omega,
            x_c: 0.0,
            y_c: 0.0,
        }
    }

    /// Move the rotation centre.
    pub fn with_center(mut self, x_c: f64, y_c: f64) -> Self {
        self.x_c = x_c;
        self.y_c = y_c;
        self
    }

    /// Exact position after `elapsed` time units.
    pub fn exact(&self, x: f64, y: f64, elapsed: f64) -> (f64, f64) {
        let (s, c) = (self.omega * elapsed).sin_cos();
        let dx = x - self.x_c;
        let dy = y - self.y_c;
        (self.x_c + c * dx - s * dy, self.y_c + s * dx + c * dy)
    }
}

impl VelocityField for SolidBodyRotation {
    fn time_domain(&self) -> Option<TimeDomain> {
        None
    }

    fn velocity_at(
        &self,
        x: f64,
        y: f64,
        _t: Option<f64>,
        _method: Interpolation,
    ) -> Result<(f64, f64), FieldError> {
        Ok((-self.omega * (y - self.y_c), self.omega * (x - self.x_c)))
    }
}

/// Velocity field defined by a closure `(x, y, t) -> (u, v)`.
///
/// Without a time domain the closure always receives `t = None`.
/// With one, it receives the (already clipped) query time.
///
/// # Example
///
/// ```
/// use advect_rs::field::{FnField, Interpolation, TimeDomain, VelocityField};
///
/// // Shear flow accelerating in time
/// let field = FnField::new(|_x, y, t: Option<f64>| (y * t.unwrap_or(0.0), 0.0))
///     .with_time_domain(TimeDomain::new(0.0, 10.0));
/// let (u, v) = field.velocity_at(0.0, 2.0, Some(3.0), Interpolation::Linear).unwrap();
/// assert_eq!((u, v), (6.0, 0.0));
/// ```
#[derive(Clone)]
pub struct FnField<F> {
    f: F,
    domain: Option<TimeDomain>,
}

impl<F> FnField<F>
where
    F: Fn(f64, f64, Option<f64>) -> (f64, f64) + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f, domain: None }
    }

    /// Make the field time-dependent over `domain`.
    pub fn with_time_domain(mut self, domain: TimeDomain) -> Self {
        self.domain = Some(domain);
        self
    }
}

impl<F> fmt::Debug for FnField<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnField")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl<F> VelocityField for FnField<F>
where
    F: Fn(f64, f64, Option<f64>) -> (f64, f64) + Sync,
{
    fn time_domain(&self) -> Option<TimeDomain> {
        self.domain
    }

    fn velocity_at(
        &self,
        x: f64,
        y: f64,
        t: Option<f64>,
        _method: Interpolation,
    ) -> Result<(f64, f64), FieldError> {
        match (self.domain, t) {
            (Some(_), None) => Err(FieldError::MissingTime),
            (Some(_), Some(t)) => Ok((self.f)(x, y, Some(t))),
            (None, _) => Ok((self.f)(x, y, None)),
        }
    }
}
