//! Final positions and displacement.

use crate::time::{ErrorEstimate, Scheme};

/// Output of one integration.
///
/// `x`, `y` are the source coordinates, `x0`, `y0` the final ones (same
/// order and length).
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectoryResult {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub x0: Vec<f64>,
    pub y0: Vec<f64>,
    /// Scheme that produced the positions
    pub scheme: Scheme,
    /// Sub-steps actually taken (includes RKF45 refinement)
    pub n_steps: usize,
    /// RKF45 acceptance diagnostics, `None` for fixed-step schemes
    pub error_estimate: Option<ErrorEstimate>,
}

impl TrajectoryResult {
    pub fn len(&self) -> usize {
        self.x0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x0.is_empty()
    }

    /// Euclidean displacement `sqrt((x0 - x)^2 + (y0 - y)^2)` per particle.
    pub fn distance(&self) -> Vec<f64> {
        self.x
            .iter()
            .zip(&self.y)
            .zip(self.x0.iter().zip(&self.y0))
            .map(|((&x, &y), (&x0, &y0))| (x0 - x).hypot(y0 - y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_three_four_five() {
        let result = TrajectoryResult {
            x: vec![0.0, 1.0],
            y: vec![0.0, 1.0],
            x0: vec![3.0, 1.0],
            y0: vec![4.0, f64::NAN],
            scheme: Scheme::Euler,
            n_steps: 1,
            error_estimate: None,
        };
        let d = result.distance();
        assert_eq!(d[0], 5.0);
        assert!(d[1].is_nan());
    }
}
