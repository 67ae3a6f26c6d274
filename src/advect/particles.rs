//! Particle sets on the canonical time axis.

use crate::error::{AdvectError, Result};
use crate::time::Positions;
use crate::types::TimeValues;

/// Source coordinates with their source and target times (days since J2000).
///
/// Invariant: `x`, `y` and an array `t` share one cardinality; `t0` is a
/// scalar or matches it too.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleSet {
    x: Vec<f64>,
    y: Vec<f64>,
    t: TimeValues,
    t0: TimeValues,
}

impl ParticleSet {
    /// Validate and assemble a particle set.
    ///
    /// # Arguments
    /// * `x` - Easting of each particle
    /// * `y` - Northing of each particle, same length as `x`
    /// * `t` - Source time (days since J2000), scalar or one per particle
    /// * `t0` - Target time (days since J2000), scalar or one per particle
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the cardinality invariant is violated.
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        t: impl Into<TimeValues>,
        t0: impl Into<TimeValues>,
    ) -> Result<Self> {
        let t = t.into();
        let t0 = t0.into();
        let n = x.len();

        let check = |what: &'static str, actual: usize| {
            if actual == n {
                Ok(())
            } else {
                Err(AdvectError::ShapeMismatch {
                    what,
                    expected: n,
                    actual,
                })
            }
        };
        check("y", y.len())?;
        if !t.is_scalar() {
            check("t", t.len())?;
        }
        if !t0.is_scalar() {
            check("t0", t0.len())?;
        }

        Ok(Self { x, y, t, t0 })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Source times.
    pub fn t(&self) -> &TimeValues {
        &self.t
    }

    /// Target times.
    pub fn t0(&self) -> &TimeValues {
        &self.t0
    }

    /// Source coordinates as an integrator state.
    pub fn positions(&self) -> Positions {
        Positions::new(self.x.clone(), self.y.clone())
    }

    /// Per-particle `(t, t0)` after broadcasting scalars.
    pub fn times(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.len();
        (self.t.broadcast(n), self.t0.broadcast(n))
    }
}
