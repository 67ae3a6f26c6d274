//! Bridge between particle coordinates and provider queries.

use super::{FieldError, Interpolation, TimeDomain, VelocityField, VelocitySample};

/// Read-only adapter that samples a [`VelocityField`] for the integrator.
///
/// - Time-dependent providers: query times are clipped element-wise into
///   `[t_min, t_max]` (held constant beyond the data, never extrapolated).
/// - Time-independent providers: the time coordinate is dropped.
///
/// Provider errors and NaN velocities pass through untouched.
pub struct VelocitySampler<'a, F: VelocityField + ?Sized> {
    field: &'a F,
    method: Interpolation,
    domain: Option<TimeDomain>,
}

impl<'a, F: VelocityField + ?Sized> VelocitySampler<'a, F> {
    pub fn new(field: &'a F, method: Interpolation) -> Self {
        Self {
            field,
            method,
            domain: field.time_domain(),
        }
    }

    /// Interpolation method forwarded to the provider.
    pub fn method(&self) -> Interpolation {
        self.method
    }

    /// Time domain of the underlying provider.
    pub fn time_domain(&self) -> Option<TimeDomain> {
        self.domain
    }

    /// Sample `(U, V)` at `(x, y, t)`.
    pub fn sample(&self, x: &[f64], y: &[f64], t: &[f64]) -> Result<VelocitySample, FieldError> {
        match self.domain {
            Some(domain) => {
                let clipped: Vec<f64> = t.iter().map(|&ti| domain.clip(ti)).collect();
                self.field.sample(x, y, Some(&clipped), self.method)
            }
            None => self.field.sample(x, y, None, self.method),
        }
    }
}
