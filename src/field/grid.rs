//! Regular-grid velocity field.
//!
//! Stores `U`/`V` on ascending `x` and `y` axes with an optional ascending
//! time axis. Values are laid out `[t][y][x]` (x fastest), which is the
//! order gridded velocity products are usually stored in.
//!
//! # Example
//!
//! ```
//! use advect_rs::field::{GriddedVelocityField, Interpolation, VelocityField};
//!
//! let x = vec![0.0, 1.0, 2.0];
//! let y = vec![0.0, 1.0];
//! // U increases with x, V is zero
//! let u = vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
//! let v = vec![0.0; 6];
//! let field = GriddedVelocityField::steady(x, y, u, v).unwrap();
//!
//! let (u, _) = field.velocity_at(0.5, 0.5, None, Interpolation::Linear).unwrap();
//! assert!((u - 0.5).abs() < 1e-12);
//! ```

use super::inpaint::{inpaint_plane, CosineTransform, InpaintConfig};
use super::{FieldError, Interpolation, TimeDomain, VelocityField};
use crate::types::Bounds2D;

/// Velocity components on a regular (possibly time-varying) grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GriddedVelocityField {
    x: Vec<f64>,
    y: Vec<f64>,
    t: Option<Vec<f64>>,
    u: Vec<f64>,
    v: Vec<f64>,
}

impl GriddedVelocityField {
    /// Time-independent field with `u`, `v` of length `nx * ny`.
    ///
    /// # Errors
    /// - `AxisTooShort` if `x` or `y` has fewer than two points
    /// - `NonMonotonicAxis` if an axis is not strictly increasing
    /// - `GridShape` if `u` or `v` has the wrong length
    pub fn steady(x: Vec<f64>, y: Vec<f64>, u: Vec<f64>, v: Vec<f64>) -> Result<Self, FieldError> {
        Self::build(x, y, None, u, v)
    }

    /// Time-dependent field with `u`, `v` of length `nt * ny * nx`.
    ///
    /// # Arguments
    /// * `x` - Strictly increasing x coordinates of the grid columns
    /// * `y` - Strictly increasing y coordinates of the grid rows
    /// * `t` - Strictly increasing slice times (days since J2000)
    /// * `u` - Eastward velocity, laid out `[t][y][x]`
    /// * `v` - Northward velocity, laid out `[t][y][x]`
    ///
    /// # Errors
    /// Same as [`steady`](Self::steady), with `t` checked like the space axes.
    pub fn unsteady(
        x: Vec<f64>,
        y: Vec<f64>,
        t: Vec<f64>,
        u: Vec<f64>,
        v: Vec<f64>,
    ) -> Result<Self, FieldError> {
        Self::build(x, y, Some(t), u, v)
    }

    /// Evaluate `f(x, y, t)` at every node.
    ///
    /// # Arguments
    /// * `x`, `y` - Grid axes, as for [`steady`](Self::steady)
    /// * `t` - Slice times, or `None` for a steady grid
    /// * `f` - Returns `(u, v)` at a node; receives `t = None` on steady grids
    pub fn from_fn<F>(
        x: Vec<f64>,
        y: Vec<f64>,
        t: Option<Vec<f64>>,
        f: F,
    ) -> Result<Self, FieldError>
    where
        F: Fn(f64, f64, Option<f64>) -> (f64, f64),
    {
        let times: Vec<Option<f64>> = match &t {
            Some(t) => t.iter().copied().map(Some).collect(),
            None => vec![None],
        };

        let n = times.len() * y.len() * x.len();
        let mut u = Vec::with_capacity(n);
        let mut v = Vec::with_capacity(n);
        for &tk in &times {
            for &yj in &y {
                for &xi in &x {
                    let (ui, vi) = f(xi, yj, tk);
                    u.push(ui);
                    v.push(vi);
                }
            }
        }

        Self::build(x, y, t, u, v)
    }

    fn build(
        x: Vec<f64>,
        y: Vec<f64>,
        t: Option<Vec<f64>>,
        u: Vec<f64>,
        v: Vec<f64>,
    ) -> Result<Self, FieldError> {
        validate_axis("x", &x, 2)?;
        validate_axis("y", &y, 2)?;
        if let Some(t) = &t {
            validate_axis("t", t, 1)?;
        }

        let nt = t.as_ref().map_or(1, Vec::len);
        let expected = nt * y.len() * x.len();
        for (what, values) in [("U", &u), ("V", &v)] {
            if values.len() != expected {
                return Err(FieldError::GridShape {
                    what,
                    expected,
                    actual: values.len(),
                });
            }
        }

        Ok(Self { x, y, t, u, v })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Time axis, if the field is time-dependent.
    pub fn t(&self) -> Option<&[f64]> {
        self.t.as_deref()
    }

    /// Eastward component, `[t][y][x]`.
    pub fn u(&self) -> &[f64] {
        &self.u
    }

    /// Northward component, `[t][y][x]`.
    pub fn v(&self) -> &[f64] {
        &self.v
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.y.len()
    }

    /// Number of time slices (1 for a steady field).
    #[inline]
    pub fn nt(&self) -> usize {
        self.t.as_ref().map_or(1, Vec::len)
    }

    /// Spatial footprint of the grid.
    pub fn bounds(&self) -> Bounds2D {
        Bounds2D::new(
            self.x[0],
            self.x[self.nx() - 1],
            self.y[0],
            self.y[self.ny() - 1],
        )
    }

    #[inline]
    fn index(&self, k: usize, j: usize, i: usize) -> usize {
        (k * self.ny() + j) * self.nx() + i
    }

    /// Speed `sqrt(U² + V²)` at every node, same layout as `u`.
    pub fn speed(&self) -> Vec<f64> {
        self.u
            .iter()
            .zip(&self.v)
            .map(|(u, v)| u.hypot(*v))
            .collect()
    }

    /// Horizontal divergence `∂U/∂x + ∂V/∂y` at every node.
    ///
    /// Second-order central differences on the (possibly non-uniform)
    /// interior, first-order one-sided differences on the edges.
    pub fn divergence(&self) -> Vec<f64> {
        let (nx, ny) = (self.nx(), self.ny());
        let mut div = vec![0.0; self.u.len()];

        let mut row = vec![0.0; nx];
        let mut col = vec![0.0; ny];
        let mut d_row = vec![0.0; nx];
        let mut d_col = vec![0.0; ny];

        for k in 0..self.nt() {
            for j in 0..ny {
                for i in 0..nx {
                    row[i] = self.u[self.index(k, j, i)];
                }
                gradient(&self.x, &row, &mut d_row);
                for i in 0..nx {
                    div[self.index(k, j, i)] += d_row[i];
                }
            }
            for i in 0..nx {
                for j in 0..ny {
                    col[j] = self.v[self.index(k, j, i)];
                }
                gradient(&self.y, &col, &mut d_col);
                for j in 0..ny {
                    div[self.index(k, j, i)] += d_col[j];
                }
            }
        }

        div
    }

    /// Sub-grid covering `bounds` grown by `buffer`.
    ///
    /// Keeps every node whose coordinates fall inside the window.
    ///
    /// # Errors
    /// `AxisTooShort` if fewer than two nodes remain along x or y.
    pub fn crop(&self, bounds: &Bounds2D, buffer: f64) -> Result<Self, FieldError> {
        let window = bounds.buffered(buffer);
        let xr = axis_window(&self.x, window.x_min, window.x_max);
        let yr = axis_window(&self.y, window.y_min, window.y_max);

        let x = self.x[xr.clone()].to_vec();
        let y = self.y[yr.clone()].to_vec();
        validate_axis("x", &x, 2)?;
        validate_axis("y", &y, 2)?;

        let n = self.nt() * y.len() * x.len();
        let mut u = Vec::with_capacity(n);
        let mut v = Vec::with_capacity(n);
        for k in 0..self.nt() {
            for j in yr.clone() {
                let start = self.index(k, j, xr.start);
                let end = self.index(k, j, xr.end);
                u.extend_from_slice(&self.u[start..end]);
                v.extend_from_slice(&self.v[start..end]);
            }
        }

        Self::build(x, y, self.t.clone(), u, v)
    }

    /// Fill non-finite `U`/`V` nodes with default smoothing settings.
    ///
    /// `iterations == 0` gives each gap the value of its nearest valid node.
    /// Larger counts smooth the fill; see [`inpaint_with`](Self::inpaint_with).
    pub fn inpaint(&self, iterations: usize) -> Result<Self, FieldError> {
        self.inpaint_with(&InpaintConfig::new(iterations))
    }

    /// Fill non-finite `U`/`V` nodes slice by slice.
    ///
    /// Every component of every time slice is filled on its own. Finite nodes
    /// keep their exact values.
    ///
    /// # Arguments
    /// * `config` - Iteration count and smoothing parameters
    ///
    /// # Errors
    /// `NoValidValues` if a slice of `U` or `V` has no finite node.
    pub fn inpaint_with(&self, config: &InpaintConfig) -> Result<Self, FieldError> {
        let transform =
            (config.iterations > 0).then(|| CosineTransform::new(self.nx(), self.ny()));
        let plane = self.nx() * self.ny();

        let mut filled = [Vec::with_capacity(self.u.len()), Vec::with_capacity(self.v.len())];
        for (out, (what, data)) in filled.iter_mut().zip([("U", &self.u), ("V", &self.v)]) {
            for (slice, values) in data.chunks_exact(plane).enumerate() {
                let gaps = values.iter().filter(|z| !z.is_finite()).count();
                if gaps == 0 {
                    out.extend_from_slice(values);
                    continue;
                }
                let z = inpaint_plane(&self.x, &self.y, values, config, transform.as_ref())
                    .ok_or(FieldError::NoValidValues { what, slice })?;
                tracing::debug!(component = what, slice, gaps, "Inpainted velocity slice");
                out.extend(z);
            }
        }

        let [u, v] = filled;
        Self::build(self.x.clone(), self.y.clone(), self.t.clone(), u, v)
    }

    fn linear(&self, data: &[f64], sx: Stencil, sy: Stencil, st: Stencil) -> f64 {
        let mut acc = 0.0;
        for (k, wt) in st.taps() {
            for (j, wy) in sy.taps() {
                for (i, wx) in sx.taps() {
                    acc += wt * wy * wx * data[self.index(k, j, i)];
                }
            }
        }
        acc
    }
}

impl VelocityField for GriddedVelocityField {
    fn time_domain(&self) -> Option<TimeDomain> {
        self.t
            .as_ref()
            .map(|t| TimeDomain::new(t[0], t[t.len() - 1]))
    }

    fn velocity_at(
        &self,
        x: f64,
        y: f64,
        t: Option<f64>,
        method: Interpolation,
    ) -> Result<(f64, f64), FieldError> {
        const OUTSIDE: (f64, f64) = (f64::NAN, f64::NAN);

        let (Some(sx), Some(sy)) = (Stencil::locate(&self.x, x), Stencil::locate(&self.y, y))
        else {
            return Ok(OUTSIDE);
        };
        let st = match &self.t {
            None => Stencil::single(0),
            Some(axis) => {
                let t = t.ok_or(FieldError::MissingTime)?;
                match Stencil::locate(axis, t) {
                    Some(st) => st,
                    None => return Ok(OUTSIDE),
                }
            }
        };

        match method {
            Interpolation::Linear => Ok((
                self.linear(&self.u, sx, sy, st),
                self.linear(&self.v, sx, sy, st),
            )),
            Interpolation::Nearest => {
                let idx = self.index(st.nearest(), sy.nearest(), sx.nearest());
                Ok((self.u[idx], self.v[idx]))
            }
        }
    }
}

/// Bracketing pair along one axis: lower node and fractional offset toward the next.
#[derive(Clone, Copy, Debug)]
struct Stencil {
    lower: usize,
    upper: usize,
    weight: f64,
}

impl Stencil {
    fn single(index: usize) -> Self {
        Self {
            lower: index,
            upper: index,
            weight: 0.0,
        }
    }

    /// Find the cell containing `value`; `None` outside the axis or for NaN.
    fn locate(axis: &[f64], value: f64) -> Option<Self> {
        let n = axis.len();
        if !(value >= axis[0] && value <= axis[n - 1]) {
            return None;
        }
        if n == 1 {
            return Some(Self::single(0));
        }

        let upper = axis.partition_point(|&a| a <= value).clamp(1, n - 1);
        let lower = upper - 1;
        let weight = (value - axis[lower]) / (axis[upper] - axis[lower]);
        Some(Self {
            lower,
            upper,
            weight,
        })
    }

    /// Nodes with non-zero weight.
    fn taps(self) -> impl Iterator<Item = (usize, f64)> {
        [(self.lower, 1.0 - self.weight), (self.upper, self.weight)]
            .into_iter()
            .take(if self.lower == self.upper { 1 } else { 2 })
            .filter(|&(_, w)| w != 0.0)
    }

    fn nearest(self) -> usize {
        if self.weight > 0.5 {
            self.upper
        } else {
            self.lower
        }
    }
}

fn validate_axis(axis: &'static str, values: &[f64], min: usize) -> Result<(), FieldError> {
    if values.len() < min {
        return Err(FieldError::AxisTooShort {
            axis,
            len: values.len(),
            min,
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(FieldError::NonMonotonicAxis { axis, index });
    }
    match values.windows(2).position(|w| w[1] <= w[0]) {
        Some(i) => Err(FieldError::NonMonotonicAxis { axis, index: i + 1 }),
        None => Ok(()),
    }
}

fn axis_window(axis: &[f64], lo: f64, hi: f64) -> std::ops::Range<usize> {
    let start = axis.partition_point(|&a| a < lo);
    let end = axis.partition_point(|&a| a <= hi);
    start..end.max(start)
}

/// First derivative of `f` sampled at `coord` (`coord.len() >= 2`).
fn gradient(coord: &[f64], f: &[f64], out: &mut [f64]) {
    let n = coord.len();
    out[0] = (f[1] - f[0]) / (coord[1] - coord[0]);
    out[n - 1] = (f[n - 1] - f[n - 2]) / (coord[n - 1] - coord[n - 2]);
    for i in 1..n - 1 {
        let hs = coord[i] - coord[i - 1];
        let hd = coord[i + 1] - coord[i];
        out[i] = (hs * hs * f[i + 1] + (hd * hd - hs * hs) * f[i] - hd * hd * f[i - 1])
            / (hs * hd * (hd + hs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| a + (b - a) * i as f64 / (n - 1) as f64)
            .collect()
    }

    /// U = 2x + y, V = x - 3y on [0, 10]²: exactly reproduced by bilinear interpolation.
    fn affine_field() -> GriddedVelocityField {
        GriddedVelocityField::from_fn(linspace(0.0, 10.0, 11), linspace(0.0, 10.0, 6), None, |x, y, _| {
            (2.0 * x + y, x - 3.0 * y)
        })
        .unwrap()
    }

    #[test]
    fn test_linear_reproduces_affine() {
        let field = affine_field();
        for &(x, y) in &[(0.0, 0.0), (3.3, 7.1), (10.0, 10.0), (9.99, 0.01)] {
            let (u, v) = field
                .velocity_at(x, y, None, Interpolation::Linear)
                .unwrap();
            assert_abs_diff_eq!(u, 2.0 * x + y, epsilon = 1e-12);
            assert_abs_diff_eq!(v, x - 3.0 * y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_nearest_snaps_to_node() {
        let field = affine_field();
        // closest node to (3.3, 7.1) is (3, 8)
        let (u, v) = field
            .velocity_at(3.3, 7.1, None, Interpolation::Nearest)
            .unwrap();
        assert_eq!(u, 2.0 * 3.0 + 8.0);
        assert_eq!(v, 3.0 - 24.0);
    }

    #[test]
    fn test_outside_is_nan() {
        let field = affine_field();
        let (u, v) = field
            .velocity_at(-0.1, 5.0, None, Interpolation::Linear)
            .unwrap();
        assert!(u.is_nan() && v.is_nan());

        let (u, _) = field
            .velocity_at(5.0, f64::NAN, None, Interpolation::Nearest)
            .unwrap();
        assert!(u.is_nan());
    }

    #[test]
    fn test_time_interpolation() {
        // U = t, V = -t on two time slices
        let field = GriddedVelocityField::from_fn(
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            Some(vec![10.0, 20.0]),
            |_, _, t| (t.unwrap(), -t.unwrap()),
        )
        .unwrap();
        assert_eq!(field.nt(), 2);
        assert_eq!(field.time_domain(), Some(TimeDomain::new(10.0, 20.0)));

        let (u, v) = field
            .velocity_at(0.5, 0.5, Some(12.5), Interpolation::Linear)
            .unwrap();
        assert_abs_diff_eq!(u, 12.5, epsilon = 1e-12);
        assert_abs_diff_eq!(v, -12.5, epsilon = 1e-12);

        let (u, _) = field
            .velocity_at(0.5, 0.5, Some(16.0), Interpolation::Nearest)
            .unwrap();
        assert_eq!(u, 20.0);

        assert_eq!(
            field.velocity_at(0.5, 0.5, None, Interpolation::Linear),
            Err(FieldError::MissingTime)
        );
    }

    #[test]
    fn test_shape_validation() {
        let err = GriddedVelocityField::steady(vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0; 3], vec![0.0; 4])
            .unwrap_err();
        assert_eq!(
            err,
            FieldError::GridShape {
                what: "U",
                expected: 4,
                actual: 3
            }
        );

        let err = GriddedVelocityField::steady(vec![0.0, 0.0], vec![0.0, 1.0], vec![0.0; 4], vec![0.0; 4])
            .unwrap_err();
        assert_eq!(err, FieldError::NonMonotonicAxis { axis: "x", index: 1 });

        let err = GriddedVelocityField::steady(vec![0.0], vec![0.0, 1.0], vec![0.0; 2], vec![0.0; 2])
            .unwrap_err();
        assert!(matches!(err, FieldError::AxisTooShort { axis: "x", .. }));
    }

    #[test]
    fn test_speed() {
        let field = GriddedVelocityField::from_fn(vec![0.0, 1.0], vec![0.0, 1.0], None, |_, _, _| (3.0, 4.0))
            .unwrap();
        assert!(field.speed().iter().all(|&s| (s - 5.0).abs() < 1e-14));
    }

    #[test]
    fn test_divergence_of_affine_field() {
        // div = ∂(2x + y)/∂x + ∂(x - 3y)/∂y = 2 - 3
        let field = affine_field();
        for d in field.divergence() {
            assert_abs_diff_eq!(d, -1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_divergence_nonuniform_quadratic() {
        // U = x², non-uniform spacing: central difference is exact for quadratics
        let x = vec![0.0, 0.5, 1.5, 3.0, 5.0];
        let field = GriddedVelocityField::from_fn(x.clone(), vec![0.0, 1.0], None, |x, _, _| (x * x, 0.0))
            .unwrap();
        let div = field.divergence();
        for i in 1..x.len() - 1 {
            assert_abs_diff_eq!(div[i], 2.0 * x[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_crop() {
        let field = affine_field();
        let cropped = field
            .crop(&Bounds2D::new(2.0, 4.0, 3.0, 5.0), 1.5)
            .unwrap();
        assert_eq!(cropped.x(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(cropped.y(), &[2.0, 4.0, 6.0]);
        assert_eq!(cropped.bounds(), Bounds2D::new(1.0, 5.0, 2.0, 6.0));

        let full = field
            .velocity_at(3.3, 5.0, None, Interpolation::Linear)
            .unwrap();
        let sub = cropped
            .velocity_at(3.3, 5.0, None, Interpolation::Linear)
            .unwrap();
        assert_abs_diff_eq!(full.0, sub.0, epsilon = 1e-12);
        assert_abs_diff_eq!(full.1, sub.1, epsilon = 1e-12);
    }

    #[test]
    fn test_crop_too_small() {
        let field = affine_field();
        let err = field
            .crop(&Bounds2D::new(2.0, 4.0, 4.5, 5.0), 0.0)
            .unwrap_err();
        assert!(matches!(err, FieldError::AxisTooShort { axis: "y", .. }));
    }

    #[test]
    fn test_inpaint_nearest_fill() {
        // Centre node is missing; its closest neighbour is (0, 1.5)
        let x = vec![0.0, 1.0, 3.0];
        let y = vec![0.0, 1.5, 3.5];
        let mut u: Vec<f64> = (0..9).map(|p| p as f64).collect();
        u[4] = f64::NAN;
        let v = vec![-1.0; 9];
        let field = GriddedVelocityField::steady(x, y, u.clone(), v.clone()).unwrap();

        let filled = field.inpaint(0).unwrap();
        assert_eq!(filled.u()[4], 3.0);
        for p in (0..9).filter(|&p| p != 4) {
            assert_eq!(filled.u()[p], u[p]);
        }
        assert_eq!(filled.v(), v.as_slice());
    }

    #[test]
    fn test_inpaint_smooths_gap() {
        // U = x + y with a 2 x 2 hole; the nearest fill is off by up to 1
        let axis = linspace(0.0, 11.0, 12);
        let exact = |x: f64, y: f64| x + y;
        let hole = [(5, 5), (5, 6), (6, 5), (6, 6)];
        let mut field =
            GriddedVelocityField::from_fn(axis.clone(), axis, None, |x, y, _| (exact(x, y), 0.5))
                .unwrap();
        for &(j, i) in &hole {
            let idx = field.index(0, j, i);
            field.u[idx] = f64::NAN;
            field.v[idx] = f64::NAN;
        }

        let filled = field.inpaint(50).unwrap();
        for &(j, i) in &hole {
            let idx = filled.index(0, j, i);
            assert_abs_diff_eq!(filled.u()[idx], exact(i as f64, j as f64), epsilon = 1e-3);
            assert_abs_diff_eq!(filled.v()[idx], 0.5, epsilon = 1e-9);
        }
        for (p, (&a, &b)) in filled.u().iter().zip(field.u()).enumerate() {
            if b.is_finite() {
                assert_eq!(a, b, "valid node {} changed", p);
            }
        }
    }

    #[test]
    fn test_inpaint_per_slice() {
        // Second slice of U is entirely missing
        let mut field = GriddedVelocityField::from_fn(
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            Some(vec![0.0, 1.0]),
            |_, _, _| (1.0, 2.0),
        )
        .unwrap();
        field.u[4..].fill(f64::NAN);

        for iterations in [0, 5] {
            assert_eq!(
                field.inpaint(iterations).unwrap_err(),
                FieldError::NoValidValues {
                    what: "U",
                    slice: 1
                }
            );
        }

        field.u[5] = 4.0;
        let filled = field.inpaint(0).unwrap();
        assert_eq!(&filled.u()[..4], &[1.0; 4]);
        assert_eq!(&filled.u()[4..], &[4.0; 4]);
        assert_eq!(filled.t(), field.t());
    }
}
