//! Advection request API.
//!
//! Collects raw inputs (coordinates, times with their unit strings, string
//! selectors), normalizes and validates them once in
//! [`AdvectionBuilder::build`], then runs the pure [`integrate`] on demand.

use crate::error::{AdvectError, Result};
use crate::field::{Interpolation, VelocityField};
use crate::time::{Scheme, TimeUnits, DEFAULT_TIME_UNITS};
use crate::types::TimeValues;

use super::{integrate, IntegratorConfig, ParticleSet, TrajectoryResult};

/// Lifecycle of an [`Advection`] request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    /// No integration has run yet
    #[default]
    NotStarted,
    /// Last run produced positions
    Converged,
    /// Last run returned an error
    Failed,
}

/// A validated advection request bound to a velocity field.
///
/// # Example
///
/// ```
/// use advect_rs::advect::Advection;
/// use advect_rs::field::UniformField;
///
/// let field = UniformField::new(3.0, 4.0);
/// let mut advection = Advection::builder(&field)
///     .positions(vec![0.0], vec![0.0])
///     .source_time(0.0)
///     .target_time(86_400.0)
///     .time_units("seconds since 2000-01-01T12:00:00")
///     .scheme_name("rk4")
///     .build()
///     .unwrap();
///
/// assert!(advection.distance().is_none());
/// advection.run().unwrap();
/// let d = advection.distance().unwrap();
/// assert!((d[0] - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct Advection<'a, F: VelocityField + ?Sized> {
    field: &'a F,
    particles: ParticleSet,
    config: IntegratorConfig,
    state: RunState,
    result: Option<TrajectoryResult>,
}

impl<'a, F: VelocityField + ?Sized> Advection<'a, F> {
    /// Start building a request against `field`.
    pub fn builder(field: &'a F) -> AdvectionBuilder<'a, F> {
        AdvectionBuilder::new(field)
    }

    /// Assemble a request from already-validated parts.
    pub fn new(field: &'a F, particles: ParticleSet, config: IntegratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            field,
            particles,
            config,
            state: RunState::NotStarted,
            result: None,
        })
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Integrate from scratch.
    ///
    /// Nothing from a previous run is reused. On failure the previous result
    /// is discarded, so [`distance`](Self::distance) reports unavailable.
    pub fn run(&mut self) -> Result<&TrajectoryResult> {
        match integrate(self.field, &self.particles, &self.config) {
            Ok(result) => {
                self.state = RunState::Converged;
                Ok(&*self.result.insert(result))
            }
            Err(err) => {
                self.state = RunState::Failed;
                self.result = None;
                Err(err)
            }
        }
    }

    /// Result of the last successful run.
    pub fn result(&self) -> Option<&TrajectoryResult> {
        self.result.as_ref()
    }

    /// Per-particle displacement, or `None` until a run has succeeded.
    pub fn distance(&self) -> Option<Vec<f64>> {
        self.result.as_ref().map(TrajectoryResult::distance)
    }
}

/// Builder for [`Advection`].
///
/// Times are given in `time_units` (CF-style `"<unit> since <epoch>"`). When no
/// units are set they are read as [`DEFAULT_TIME_UNITS`], seconds since
/// 2018-01-01T00:00:00.
#[derive(Debug)]
pub struct AdvectionBuilder<'a, F: VelocityField + ?Sized> {
    field: &'a F,
    x: Vec<f64>,
    y: Vec<f64>,
    t: Option<TimeValues>,
    t0: Option<TimeValues>,
    time_units: Option<String>,
    scheme_name: Option<String>,
    interpolation_name: Option<String>,
    config: IntegratorConfig,
}

impl<'a, F: VelocityField + ?Sized> AdvectionBuilder<'a, F> {
    pub fn new(field: &'a F) -> Self {
        Self {
            field,
            x: Vec::new(),
            y: Vec::new(),
            t: None,
            t0: None,
            time_units: None,
            scheme_name: None,
            interpolation_name: None,
            config: IntegratorConfig::default(),
        }
    }

    /// Source coordinates.
    pub fn positions(mut self, x: Vec<f64>, y: Vec<f64>) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Source time, scalar or one per particle.
    pub fn source_time(mut self, t: impl Into<TimeValues>) -> Self {
        self.t = Some(t.into());
        self
    }

    /// Target time, scalar or one per particle.
    pub fn target_time(mut self, t0: impl Into<TimeValues>) -> Self {
        self.t0 = Some(t0.into());
        self
    }

    /// Unit string shared by source and target times.
    pub fn time_units(mut self, units: impl Into<String>) -> Self {
        self.time_units = Some(units.into());
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: IntegratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.config.scheme = scheme;
        self.scheme_name = None;
        self
    }

    /// Scheme by name (`euler`, `rk4`, `rkf45`), resolved in [`build`](Self::build).
    pub fn scheme_name(mut self, name: impl Into<String>) -> Self {
        self.scheme_name = Some(name.into());
        self
    }

    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.config.interpolation = interpolation;
        self.interpolation_name = None;
        self
    }

    /// Interpolation by name (`linear`, `nearest`), resolved in [`build`](Self::build).
    pub fn interpolation_name(mut self, name: impl Into<String>) -> Self {
        self.interpolation_name = Some(name.into());
        self
    }

    pub fn step_seconds(mut self, step_seconds: f64) -> Self {
        self.config.step_seconds = step_seconds;
        self
    }

    pub fn step_count(mut self, step_count: usize) -> Self {
        self.config.step_count = Some(step_count);
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    pub fn max_refinements(mut self, max_refinements: u32) -> Self {
        self.config.max_refinements = max_refinements;
        self
    }

    /// Normalize times, resolve selectors and validate.
    ///
    /// # Errors
    ///
    /// - `InvalidTimeSpecification` for an unparsable unit string
    /// - `InvalidScheme` / `InvalidInterpolation` for unknown selectors
    /// - `InvalidConfig` for missing times or out-of-range settings
    /// - `ShapeMismatch` for inconsistent particle arrays
    pub fn build(self) -> Result<Advection<'a, F>> {
        let mut config = self.config;
        if let Some(name) = &self.scheme_name {
            config.scheme = name.parse()?;
        }
        if let Some(name) = &self.interpolation_name {
            config.interpolation = name.parse()?;
        }

        let t = self
            .t
            .ok_or_else(|| AdvectError::InvalidConfig("source time not set".to_string()))?;
        let t0 = self
            .t0
            .ok_or_else(|| AdvectError::InvalidConfig("target time not set".to_string()))?;

        let units = TimeUnits::parse(self.time_units.as_deref().unwrap_or(DEFAULT_TIME_UNITS))?;
        let (t, t0) = (units.normalize(&t), units.normalize(&t0));

        let particles = ParticleSet::new(self.x, self.y, t, t0)?;
        Advection::new(self.field, particles, config)
    }
}
