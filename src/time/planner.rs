//! Sub-step count planning for the fixed-step schemes.
//!
//! Every particle in a batch advances with the same number of sub-steps, so
//! the planner picks a single count that covers the largest temporal span
//! the batch needs. Per-particle step sizes then follow as
//! `dt_i = (t0_i - t_i) / N`.

use crate::types::TimeValues;

/// Which planning rule produced the step count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanBranch {
    /// Caller supplied the count.
    Explicit,
    /// Earliest target precedes every source: `|max(t) - min(t0)|`.
    Backward,
    /// Latest target follows every source: `|max(t0) - min(t)|`.
    Forward,
    /// One side is a scalar: `max(|t0 - t|)`.
    MaxSpan,
    /// Both sides per-particle and straddling: `|mean(t0) - mean(t)|`.
    MeanSpan,
}

/// Output of [`plan_steps`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepPlan {
    /// Number of sub-steps (always at least 1)
    pub n_steps: usize,
    /// Rule that fired
    pub branch: PlanBranch,
}

/// Compute the shared sub-step count.
///
/// `step` is the desired sub-step length in the same units as `t` and `t0`.
/// The span is divided by `step` and floored; a result of zero (span shorter
/// than one step, or no span at all) is raised to one so `dt` stays finite.
///
/// # Arguments
/// * `t` - Source times, scalar or one per particle
/// * `t0` - Target times, scalar or one per particle
/// * `step` - Desired sub-step length
/// * `explicit` - Caller-fixed step count; used as given when present
///
/// # Example
///
/// ```
/// use advect_rs::time::{PlanBranch, plan_steps};
/// use advect_rs::types::TimeValues;
///
/// let plan = plan_steps(&TimeValues::from(0.0), &TimeValues::from(10.0), 2.0, None);
/// assert_eq!(plan.n_steps, 5);
///
/// let plan = plan_steps(&TimeValues::from(vec![0.0, 5.0]), &TimeValues::from(10.0), 2.0, None);
/// assert_eq!(plan.n_steps, 5);
/// assert_eq!(plan.branch, PlanBranch::Forward);
/// ```
pub fn plan_steps(
    t: &TimeValues,
    t0: &TimeValues,
    step: f64,
    explicit: Option<usize>,
) -> StepPlan {
    if let Some(n_steps) = explicit {
        return StepPlan {
            n_steps: n_steps.max(1),
            branch: PlanBranch::Explicit,
        };
    }

    let (span, branch) = if t0.min() < t.min() {
        ((t.max() - t0.min()).abs(), PlanBranch::Backward)
    } else if t0.max() > t.max() {
        ((t0.max() - t.min()).abs(), PlanBranch::Forward)
    } else if t0.is_scalar() || t.is_scalar() {
        (max_abs_span(t, t0), PlanBranch::MaxSpan)
    } else {
        ((t0.mean() - t.mean()).abs(), PlanBranch::MeanSpan)
    };

    // NaN and negative ratios saturate to zero in the cast
    let n_steps = ((span / step).floor() as usize).max(1);

    tracing::debug!(n_steps, ?branch, span, step, "Advecting {} steps", n_steps);

    StepPlan { n_steps, branch }
}

fn max_abs_span(t: &TimeValues, t0: &TimeValues) -> f64 {
    let n = if t.is_empty() || t0.is_empty() {
        0
    } else {
        t.len().max(t0.len())
    };
    (0..n)
        .map(|i| (t0.get(i) - t.get(i)).abs())
        .fold(0.0, f64::max)
}
