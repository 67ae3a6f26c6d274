//! Scalar-or-array time inputs.

use serde::{Deserialize, Serialize};

/// A time coordinate that is either shared by every particle or given per particle.
///
/// The distinction matters to the step planner: when either the source or
/// the target time is a scalar, the planner sizes the step count on the
/// largest per-particle span instead of the mean span.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValues {
    /// One value applying to all particles (0-dimensional)
    Scalar(f64),
    /// One value per particle
    Array(Vec<f64>),
}

impl TimeValues {
    /// Whether this is a 0-dimensional scalar.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self, TimeValues::Scalar(_))
    }

    /// Number of stored values (1 for a scalar).
    pub fn len(&self) -> usize {
        match self {
            TimeValues::Scalar(_) => 1,
            TimeValues::Array(v) => v.len(),
        }
    }

    /// True for an empty array.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored values as a slice.
    pub fn as_slice(&self) -> &[f64] {
        match self {
            TimeValues::Scalar(v) => std::slice::from_ref(v),
            TimeValues::Array(v) => v,
        }
    }

    /// Value for particle `i`; scalars broadcast.
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        match self {
            TimeValues::Scalar(v) => *v,
            TimeValues::Array(v) => v[i],
        }
    }

    /// Expand to one value per particle.
    pub fn broadcast(&self, n: usize) -> Vec<f64> {
        match self {
            TimeValues::Scalar(v) => vec![*v; n],
            TimeValues::Array(v) => v.clone(),
        }
    }

    /// Apply `f` to every value, keeping the scalar/array shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            TimeValues::Scalar(v) => TimeValues::Scalar(f(*v)),
            TimeValues::Array(v) => TimeValues::Array(v.iter().map(|&x| f(x)).collect()),
        }
    }

    /// Minimum value (`+inf` for an empty array).
    pub fn min(&self) -> f64 {
        self.as_slice().iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Maximum value (`-inf` for an empty array).
    pub fn max(&self) -> f64 {
        self.as_slice()
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Arithmetic mean (NaN for an empty array).
    pub fn mean(&self) -> f64 {
        let values = self.as_slice();
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl From<f64> for TimeValues {
    fn from(v: f64) -> Self {
        TimeValues::Scalar(v)
    }
}

impl From<Vec<f64>> for TimeValues {
    fn from(v: Vec<f64>) -> Self {
        TimeValues::Array(v)
    }
}

impl From<&[f64]> for TimeValues {
    fn from(v: &[f64]) -> Self {
        TimeValues::Array(v.to_vec())
    }
}
