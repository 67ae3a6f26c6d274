//! Strongly-typed domain types shared across the crate.
//!
//! - [`Bounds2D`]: rectangular spatial extent of a velocity grid or crop window
//! - [`TimeValues`]: a time input that is either one scalar for every particle
//!   or one value per particle
//!
//! # Example
//!
//! ```
//! use advect_rs::types::{Bounds2D, TimeValues};
//!
//! let bounds = Bounds2D::new(0.0, 10.0, 0.0, 5.0);
//! assert!(bounds.contains(2.5, 2.5));
//!
//! let t = TimeValues::from(vec![0.0, 5.0]);
//! assert_eq!(t.max(), 5.0);
//! ```

mod bounds;
mod time_values;

pub use bounds::Bounds2D;
pub use time_values::TimeValues;
