//! 2D spatial bounds.

use std::fmt;

/// Rectangular spatial extent `[x_min, x_max] × [y_min, y_max]`.
///
/// Used to describe the footprint of a gridded velocity field and the
/// window passed to [`GriddedVelocityField::crop`](crate::field::GriddedVelocityField::crop).
///
/// # Example
///
/// ```
/// use advect_rs::types::Bounds2D;
///
/// // Glacier terminus window in projected metres
/// let bounds = Bounds2D::new(-200e3, -150e3, -2200e3, -2150e3);
/// assert_eq!(bounds.width(), 50e3);
/// assert!(bounds.contains(-175e3, -2175e3));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2D {
    /// Minimum x-coordinate
    pub x_min: f64,
    /// Maximum x-coordinate
    pub x_max: f64,
    /// Minimum y-coordinate
    pub y_min: f64,
    /// Maximum y-coordinate
    pub y_max: f64,
}

impl Bounds2D {
    /// Create new bounds.
    ///
    /// Degenerate extents (`x_max == x_min`) are allowed so that single
    /// points can be expressed; reversed extents are not.
    ///
    /// # Panics
    ///
    /// Panics if `x_max < x_min` or `y_max < y_min`.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        assert!(
            x_max >= x_min,
            "x_max ({}) must not be less than x_min ({})",
            x_max,
            x_min
        );
        assert!(
            y_max >= y_min,
            "y_max ({}) must not be less than y_min ({})",
            y_max,
            y_min
        );

        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Extent along x.
    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Extent along y.
    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Check if a point lies inside (inclusive).
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Grow every side outward by `buffer` (shrink if negative).
    pub fn buffered(&self, buffer: f64) -> Self {
        Self {
            x_min: self.x_min - buffer,
            x_max: self.x_max + buffer,
            y_min: self.y_min - buffer,
            y_max: self.y_max + buffer,
        }
    }
}

impl fmt::Display for Bounds2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.2}, {:.2}] × [{:.2}, {:.2}]",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let b = Bounds2D::new(0.0, 100.0, 0.0, 50.0);
        assert_eq!(b.width(), 100.0);
        assert_eq!(b.height(), 50.0);
    }

    #[test]
    fn test_contains_inclusive() {
        let b = Bounds2D::new(0.0, 100.0, 0.0, 50.0);
        assert!(b.contains(0.0, 0.0));
        assert!(b.contains(100.0, 50.0));
        assert!(!b.contains(-1.0, 25.0));
        assert!(!b.contains(50.0, 51.0));
    }

    #[test]
    fn test_buffered() {
        let b = Bounds2D::new(0.0, 10.0, 0.0, 10.0).buffered(2.0);
        assert_eq!(b, Bounds2D::new(-2.0, 12.0, -2.0, 12.0));
    }

    #[test]
    #[should_panic(expected = "x_max")]
    fn test_reversed_x() {
        Bounds2D::new(10.0, 0.0, 0.0, 5.0);
    }
}
