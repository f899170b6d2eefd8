#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::many_single_char_names)]

//! 2D curve primitives for the plume tessellator, on top of euclid.
//!
//! This crate implements the small amount of geometry the fill pipeline
//! needs: line segments, quadratic and cubic bézier curves, and weighted
//! conic sections.
//!
//! # Flattening
//!
//! Flattening is the action of approximating a curve with a succession of
//! line segments. The tolerance threshold taken as input by the flattening
//! methods corresponds to the maximum distance between the curve and its
//! linear approximation.
//!
//! Curves are flattened by recursive midpoint subdivision: a curve whose
//! control points are within the tolerance of its chord is replaced by the
//! chord, otherwise it is split in half and both halves are examined in
//! turn. Each curve carries a subdivision budget derived from the distance
//! of its control points to the chord, so that flattening terminates even
//! when the tolerance test never passes (degenerate or non-finite input).

// Reexport dependencies.
pub use arrayvec;
pub use euclid;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

pub mod conic;
pub mod cubic_bezier;
pub mod line_segment;
pub mod quadratic_bezier;

#[doc(inline)]
pub use crate::conic::ConicSegment;
#[doc(inline)]
pub use crate::cubic_bezier::CubicBezierSegment;
#[doc(inline)]
pub use crate::line_segment::LineSegment;
#[doc(inline)]
pub use crate::quadratic_bezier::QuadraticBezierSegment;

pub mod math {
    //! f32 aliases for the euclid types used across the plume crates.

    /// Alias for `euclid::default::Point2D<f32>`.
    pub type Point = euclid::default::Point2D<f32>;

    /// Alias for `euclid::default::Vector2D<f32>`.
    pub type Vector = euclid::default::Vector2D<f32>;

    /// Alias for `euclid::default::Size2D<f32>`.
    pub type Size = euclid::default::Size2D<f32>;

    /// Alias for `euclid::default::Box2D<f32>`.
    pub type Box2D = euclid::default::Box2D<f32>;

    /// Shorthand for `Point::new(x, y)`.
    #[inline]
    pub fn point(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    /// Shorthand for `Vector::new(x, y)`.
    #[inline]
    pub fn vector(x: f32, y: f32) -> Vector {
        Vector::new(x, y)
    }
}

pub use crate::math::{point, vector, Box2D, Point, Vector};

/// Tolerance values smaller than this are clamped up before computing
/// subdivision budgets, so that a zero or denormal tolerance cannot
/// produce an unbounded point count.
pub const MIN_TOLERANCE: f32 = 1e-4;

/// Upper bound on the number of points a single curve may flatten to.
pub const MAX_POINTS_PER_CURVE: u32 = 1 << 10;

/// Number of points needed to approximate a curve whose control points are
/// `distance` away from the chord, within `tolerance`.
///
/// Subdividing a bézier curve divides the control point distance by four,
/// so `log4(distance / tolerance)` subdivisions are required, producing
/// `2^log4(d/tol) = sqrt(d/tol)` points, rounded up to a power of two.
pub(crate) fn subdivision_budget(distance: f32, tolerance: f32) -> u32 {
    let tolerance = tolerance.max(MIN_TOLERANCE);
    if !(distance > tolerance) {
        // Also covers NaN distances.
        return 1;
    }
    let div = (distance / tolerance).sqrt();
    if !div.is_finite() || div >= MAX_POINTS_PER_CURVE as f32 {
        return MAX_POINTS_PER_CURVE;
    }
    (div.ceil() as u32).next_power_of_two().min(MAX_POINTS_PER_CURVE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_bounds() {
        assert_eq!(subdivision_budget(0.0, 0.1), 1);
        assert_eq!(subdivision_budget(f32::NAN, 0.1), 1);
        assert_eq!(subdivision_budget(f32::INFINITY, 0.1), MAX_POINTS_PER_CURVE);
        // d/tol = 100, sqrt = 10, next power of two = 16.
        assert_eq!(subdivision_budget(10.0, 0.1), 16);
        // A zero tolerance is clamped instead of looping forever.
        assert!(subdivision_budget(1.0, 0.0) <= MAX_POINTS_PER_CURVE);
    }
}
