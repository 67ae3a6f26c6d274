//! Gap filling for gridded velocity slices.
//!
//! Missing (non-finite) nodes are first given the value of the nearest valid
//! node, measured in grid coordinates. Optional relaxation iterations then
//! replace that fill with a smooth one: a penalized least-squares fit solved in
//! the discrete cosine domain, with the smoothing weight decreasing
//! logarithmically from `10^smoothing` to `10^-6`.
//!
//! ```text
//! Λ_jk = (2 (2 - cos(π j / ny) - cos(π k / nx)))^power
//! Γ    = 1 / (1 + s_n Λ)
//! z   <- ε · IDCT(Γ · DCT(W·z_valid + (1 - W)·z)) + (1 - ε) · z
//! ```
//!
//! Valid nodes are restored unchanged at the end.

use std::sync::Arc;

use rustdct::{Dct2, Dct3, DctPlanner, TransformType2And3};
use serde::{Deserialize, Serialize};

/// Smallest smoothing exponent reached by the last iteration.
const FINAL_SMOOTHING: f64 = -6.0;

/// Settings for [`GriddedVelocityField::inpaint_with`](super::GriddedVelocityField::inpaint_with).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InpaintConfig {
    /// Relaxation iterations; 0 keeps the nearest-node fill
    pub iterations: usize,
    /// Base-10 exponent of the first smoothing weight
    pub smoothing: f64,
    /// Exponent applied to the Laplacian eigenvalues
    pub power: f64,
    /// Over-relaxation factor
    pub relaxation: f64,
}

impl Default for InpaintConfig {
    fn default() -> Self {
        Self {
            iterations: 0,
            smoothing: 3.0,
            power: 2.0,
            relaxation: 2.0,
        }
    }
}

impl InpaintConfig {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.power = power;
        self
    }

    pub fn with_relaxation(mut self, relaxation: f64) -> Self {
        self.relaxation = relaxation;
        self
    }

    /// Smoothing weight of iteration `n`.
    fn weight(&self, n: usize) -> f64 {
        if self.iterations <= 1 {
            return 10f64.powf(self.smoothing);
        }
        let frac = n as f64 / (self.iterations - 1) as f64;
        10f64.powf(self.smoothing + (FINAL_SMOOTHING - self.smoothing) * frac)
    }
}

/// Separable 2D DCT-II / DCT-III pair on an `ny x nx` plane (x fastest).
pub(crate) struct CosineTransform {
    nx: usize,
    ny: usize,
    rows: Arc<dyn TransformType2And3<f64>>,
    cols: Arc<dyn TransformType2And3<f64>>,
}

impl CosineTransform {
    pub(crate) fn new(nx: usize, ny: usize) -> Self {
        let mut planner = DctPlanner::new();
        Self {
            nx,
            ny,
            rows: planner.plan_dct2(nx),
            cols: planner.plan_dct2(ny),
        }
    }

    fn forward(&self, plane: &mut [f64]) {
        for row in plane.chunks_exact_mut(self.nx) {
            self.rows.process_dct2(row);
        }
        self.by_column(plane, |col| self.cols.process_dct2(col));
    }

    /// Inverse of [`forward`](Self::forward), including the `4 / (nx ny)` scale.
    fn inverse(&self, plane: &mut [f64]) {
        for row in plane.chunks_exact_mut(self.nx) {
            self.rows.process_dct3(row);
        }
        self.by_column(plane, |col| self.cols.process_dct3(col));

        let scale = 4.0 / (self.nx * self.ny) as f64;
        plane.iter_mut().for_each(|z| *z *= scale);
    }

    fn by_column(&self, plane: &mut [f64], transform: impl Fn(&mut [f64])) {
        let mut col = vec![0.0; self.ny];
        for i in 0..self.nx {
            for (j, c) in col.iter_mut().enumerate() {
                *c = plane[j * self.nx + i];
            }
            transform(&mut col);
            for (j, c) in col.iter().enumerate() {
                plane[j * self.nx + i] = *c;
            }
        }
    }
}

/// Fill the non-finite nodes of one `[y][x]` plane.
///
/// Returns `None` when the plane holds no finite value.
pub(crate) fn inpaint_plane(
    x: &[f64],
    y: &[f64],
    values: &[f64],
    config: &InpaintConfig,
    transform: Option<&CosineTransform>,
) -> Option<Vec<f64>> {
    let nx = x.len();
    let valid: Vec<usize> = (0..values.len())
        .filter(|&p| values[p].is_finite())
        .collect();
    if valid.is_empty() {
        return None;
    }

    let mut z = nearest_fill(x, y, values, &valid);
    let transform = match transform {
        Some(transform) if config.iterations > 0 => transform,
        _ => return Some(z),
    };

    let lambda: Vec<f64> = (0..values.len())
        .map(|p| {
            let (i, j) = (p % nx, p / nx);
            let l = (std::f64::consts::PI * j as f64 / y.len() as f64).cos()
                + (std::f64::consts::PI * i as f64 / nx as f64).cos();
            (2.0 * (2.0 - l)).powf(config.power)
        })
        .collect();

    let mut work = vec![0.0; values.len()];
    for n in 0..config.iterations {
        let s = config.weight(n);
        for (p, w) in work.iter_mut().enumerate() {
            *w = if values[p].is_finite() { values[p] } else { z[p] };
        }
        transform.forward(&mut work);
        for (w, l) in work.iter_mut().zip(&lambda) {
            *w /= 1.0 + s * l;
        }
        transform.inverse(&mut work);
        for (zp, w) in z.iter_mut().zip(&work) {
            *zp = config.relaxation * w + (1.0 - config.relaxation) * *zp;
        }
    }

    for &p in &valid {
        z[p] = values[p];
    }
    Some(z)
}

/// Copy of `values` with every gap set to its nearest valid node.
fn nearest_fill(x: &[f64], y: &[f64], values: &[f64], valid: &[usize]) -> Vec<f64> {
    let nx = x.len();
    let dist2 = |p: usize, q: usize| {
        let dx = x[p % nx] - x[q % nx];
        let dy = y[p / nx] - y[q / nx];
        dx * dx + dy * dy
    };
    let nearest = |p: usize| {
        let mut best = valid[0];
        let mut best_d = dist2(p, best);
        for &q in &valid[1..] {
            let d = dist2(p, q);
            if d < best_d {
                best = q;
                best_d = d;
            }
        }
        values[best]
    };
    let fill = |p: usize| {
        if values[p].is_finite() {
            values[p]
        } else {
            nearest(p)
        }
    };

    #[cfg(feature = "parallel")]
    let filled: Vec<f64> = {
        use rayon::prelude::*;
        (0..values.len()).into_par_iter().map(fill).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let filled: Vec<f64> = (0..values.len()).map(fill).collect();

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_transform_round_trip() {
        let (nx, ny) = (5, 4);
        let original: Vec<f64> = (0..nx * ny).map(|p| ((p * 7) % 11) as f64 - 3.0).collect();
        let transform = CosineTransform::new(nx, ny);

        let mut plane = original.clone();
        transform.forward(&mut plane);
        transform.inverse(&mut plane);
        for (a, b) in plane.iter().zip(&original) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_weights_decrease_to_floor() {
        let config = InpaintConfig::new(10);
        assert_abs_diff_eq!(config.weight(0), 1e3, epsilon = 1e-9);
        assert_abs_diff_eq!(config.weight(9), 1e-6, epsilon = 1e-18);
        assert!(config.weight(4) < config.weight(3));
        assert_abs_diff_eq!(InpaintConfig::new(1).weight(0), 1e3, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_plane() {
        let plane = [f64::NAN; 4];
        let filled = inpaint_plane(&[0.0, 1.0], &[0.0, 1.0], &plane, &InpaintConfig::new(0), None);
        assert!(filled.is_none());
    }
}
