//! Integrator configuration.

use serde::{Deserialize, Serialize};

use crate::error::{AdvectError, Result};
use crate::field::Interpolation;
use crate::time::{Scheme, SECONDS_PER_DAY};

/// Largest accepted refinement ceiling (scale up to 2^32).
pub const MAX_REFINEMENT_CEILING: u32 = 32;

/// Fully specified settings for one advection call.
///
/// Validated once by [`validate`](Self::validate) before integration starts.
///
/// # Example
///
/// ```
/// use advect_rs::advect::IntegratorConfig;
/// use advect_rs::time::Scheme;
///
/// let config = IntegratorConfig::default()
///     .with_scheme(Scheme::RKF45)
///     .with_step_seconds(3600.0)
///     .with_tolerance(1e-3);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.step_days(), 1.0 / 24.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Integration scheme
    pub scheme: Scheme,
    /// Spatial interpolation requested from the field provider
    pub interpolation: Interpolation,
    /// Desired sub-step length in seconds
    pub step_seconds: f64,
    /// Explicit sub-step count, bypassing the planner
    pub step_count: Option<usize>,
    /// RMS acceptance threshold for RKF45 (position units)
    pub tolerance: f64,
    /// Maximum number of RKF45 step doublings
    pub max_refinements: u32,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::RK4,
            interpolation: Interpolation::Linear,
            step_seconds: SECONDS_PER_DAY,
            step_count: None,
            tolerance: 0.05,
            max_refinements: 16,
        }
    }
}

impl IntegratorConfig {
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            ..Self::default()
        }
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_step_seconds(mut self, step_seconds: f64) -> Self {
        self.step_seconds = step_seconds;
        self
    }

    /// Fix the sub-step count instead of deriving it from `step_seconds`.
    pub fn with_step_count(mut self, step_count: usize) -> Self {
        self.step_count = Some(step_count);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_refinements(mut self, max_refinements: u32) -> Self {
        self.max_refinements = max_refinements;
        self
    }

    /// Sub-step length on the canonical (days) time axis.
    pub fn step_days(&self) -> f64 {
        self.step_seconds / SECONDS_PER_DAY
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_seconds.is_finite() && self.step_seconds > 0.0) {
            return Err(AdvectError::InvalidConfig(format!(
                "step_seconds must be positive and finite, got {}",
                self.step_seconds
            )));
        }
        if self.step_count == Some(0) {
            return Err(AdvectError::InvalidConfig(
                "step_count must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(AdvectError::InvalidConfig(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.max_refinements > MAX_REFINEMENT_CEILING {
            return Err(AdvectError::InvalidConfig(format!(
                "max_refinements must be at most {}, got {}",
                MAX_REFINEMENT_CEILING, self.max_refinements
            )));
        }
        Ok(())
    }
}
