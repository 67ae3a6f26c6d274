//! Error types for parcel advection.

use thiserror::Error;

use crate::field::FieldError;

/// Errors raised while setting up or running an advection request.
///
/// Every error surfaces synchronously to the caller; no partial trajectory
/// is returned alongside an error.
#[derive(Debug, Error)]
pub enum AdvectError {
    /// Unit or epoch string could not be parsed.
    #[error("Invalid time specification '{units}': {reason}")]
    InvalidTimeSpecification { units: String, reason: String },

    /// Unrecognized integration scheme selector.
    #[error("Invalid advection scheme: '{0}' (expected euler, rk4 or rkf45)")]
    InvalidScheme(String),

    /// Unrecognized spatial interpolation selector.
    #[error("Invalid interpolation method: '{0}' (expected linear or nearest)")]
    InvalidInterpolation(String),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Particle arrays have inconsistent cardinality.
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Velocity field provider failed.
    #[error("Sampling failure: {0}")]
    Sampling(#[from] FieldError),

    /// RKF45 step doubling reached its ceiling without meeting the tolerance.
    #[error(
        "RKF45 did not converge: sigma={sigma:.3e} > tolerance={tolerance:.3e} at scale {scale}"
    )]
    NonConvergence {
        scale: usize,
        sigma: f64,
        tolerance: f64,
    },
}

impl AdvectError {
    /// Create a time specification error.
    pub fn invalid_time(units: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimeSpecification {
            units: units.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AdvectError>;
