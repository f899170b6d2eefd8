#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::match_like_matches_macro)]

//! Path data structures for the plume tessellator.
//!
//! A [`Path`] is an immutable sequence of move / line / quadratic / conic /
//! cubic / close commands with an associated [`FillRule`], built through
//! [`Path::builder`] and consumed as an iterator of [`PathEvent`]s.
//!
//! # Examples
//!
//! ```
//! use plume_path::Path;
//! use plume_path::math::point;
//!
//! let mut builder = Path::builder();
//! builder.begin(point(0.0, 0.0));
//! builder.line_to(point(1.0, 2.0));
//! builder.line_to(point(2.0, 0.0));
//! builder.close();
//! let path = builder.build();
//!
//! for event in path.iter() {
//!     println!("{:?}", event);
//! }
//! ```

pub use plume_geom as geom;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

mod events;
pub mod path;

pub use crate::events::PathEvent;
#[doc(inline)]
pub use crate::path::{Builder, Path};

pub use crate::geom::math;

/// The fill rule defines how to determine what is inside and what is
/// outside of the shape.
///
/// The inverse rules select the complement of the shape within some clip
/// rectangle. They are implemented by tracing an extra contour around the
/// clip bounds, whose winding cancels against the path's; as a consequence
/// `InverseNonZero` holds for a winding number of exactly one (the clip
/// contour alone), not for "anything but one".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum FillRule {
    NonZero,
    EvenOdd,
    InverseNonZero,
    InverseEvenOdd,
}

impl Default for FillRule {
    fn default() -> Self {
        FillRule::NonZero
    }
}

impl FillRule {
    #[inline]
    pub fn is_in(self, winding_number: i32) -> bool {
        match self {
            FillRule::NonZero => winding_number != 0,
            FillRule::EvenOdd => (winding_number & 1) != 0,
            FillRule::InverseNonZero => winding_number == 1,
            FillRule::InverseEvenOdd => (winding_number & 1) == 1,
        }
    }

    #[inline]
    pub fn is_out(self, winding_number: i32) -> bool {
        !self.is_in(winding_number)
    }

    /// Whether this rule fills the complement of the wound region.
    #[inline]
    pub fn is_inverse(self) -> bool {
        match self {
            FillRule::InverseNonZero | FillRule::InverseEvenOdd => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FillRule;

    #[test]
    fn fill_rule_predicates() {
        assert!(!FillRule::NonZero.is_in(0));
        assert!(FillRule::NonZero.is_in(1));
        assert!(FillRule::NonZero.is_in(-2));

        assert!(!FillRule::EvenOdd.is_in(0));
        assert!(FillRule::EvenOdd.is_in(1));
        assert!(!FillRule::EvenOdd.is_in(2));
        assert!(FillRule::EvenOdd.is_in(3));

        // The inverse non-zero rule holds only for a winding of exactly
        // one: the clip contour with nothing of the path on top of it.
        assert!(FillRule::InverseNonZero.is_in(1));
        assert!(!FillRule::InverseNonZero.is_in(0));
        assert!(!FillRule::InverseNonZero.is_in(2));
        assert!(!FillRule::InverseNonZero.is_in(-1));

        assert!(FillRule::InverseEvenOdd.is_in(1));
        assert!(!FillRule::InverseEvenOdd.is_in(2));
    }

    #[test]
    fn inverse_detection() {
        assert!(!FillRule::NonZero.is_inverse());
        assert!(!FillRule::EvenOdd.is_inverse());
        assert!(FillRule::InverseNonZero.is_inverse());
        assert!(FillRule::InverseEvenOdd.is_inverse());
    }
}
