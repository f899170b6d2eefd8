use crate::math::{point, Point};
use crate::quadratic_bezier::QuadraticBezierSegment;

use arrayvec::ArrayVec;

/// Maximum number of halving levels when approximating a conic with
/// quadratic béziers (at most 32 quadratics per conic).
const MAX_CONIC_TO_QUAD_LEVELS: u32 = 5;

/// A weighted conic section (rational quadratic bézier).
///
/// With a weight of 1 the conic is an ordinary quadratic bézier; weights
/// below 1 describe elliptic arcs and weights above 1 hyperbolic ones.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ConicSegment {
    pub from: Point,
    pub ctrl: Point,
    pub to: Point,
    pub weight: f32,
}

impl ConicSegment {
    /// Splits the conic at its parametric midpoint using the rational
    /// de Casteljau construction. Both halves share the weight
    /// `sqrt((1 + w) / 2)`.
    pub fn subdivide(&self) -> (ConicSegment, ConicSegment) {
        let w = self.weight;
        let s = 1.0 / (1.0 + w);
        let left_ctrl = point(
            (self.from.x + w * self.ctrl.x) * s,
            (self.from.y + w * self.ctrl.y) * s,
        );
        let right_ctrl = point(
            (w * self.ctrl.x + self.to.x) * s,
            (w * self.ctrl.y + self.to.y) * s,
        );
        let mid = point(
            (self.from.x + 2.0 * w * self.ctrl.x + self.to.x) * s * 0.5,
            (self.from.y + 2.0 * w * self.ctrl.y + self.to.y) * s * 0.5,
        );
        let weight = ((1.0 + w) * 0.5).sqrt();
        (
            ConicSegment {
                from: self.from,
                ctrl: left_ctrl,
                to: mid,
                weight,
            },
            ConicSegment {
                from: mid,
                ctrl: right_ctrl,
                to: self.to,
                weight,
            },
        )
    }

    /// Number of halving levels needed for the quadratic approximation to
    /// stay within `tolerance` of the conic.
    ///
    /// The error of approximating this conic with a single quadratic is
    /// bounded by `||k (p0 - 2 p1 + p2)||` with `k = (w - 1) / (4 (w + 2))`,
    /// and each subdivision divides it by four.
    pub fn subdivision_levels(&self, tolerance: f32) -> u32 {
        if !(tolerance > 0.0) || !tolerance.is_finite() {
            return 0;
        }
        let a = self.weight - 1.0;
        let k = a / (4.0 * (2.0 + a));
        let x = k * (self.from.x - 2.0 * self.ctrl.x + self.to.x);
        let y = k * (self.from.y - 2.0 * self.ctrl.y + self.to.y);
        let mut error = (x * x + y * y).sqrt();
        let mut levels = 0;
        while levels < MAX_CONIC_TO_QUAD_LEVELS && error > tolerance {
            error *= 0.25;
            levels += 1;
        }
        levels
    }

    /// Number of quadratic béziers `for_each_quadratic` will produce.
    pub fn num_quadratics(&self, tolerance: f32) -> u32 {
        1 << self.subdivision_levels(tolerance)
    }

    /// Approximates the conic with a sequence of quadratic béziers, each
    /// leaf of the subdivision contributing its control polygon.
    pub fn for_each_quadratic<F: FnMut(&QuadraticBezierSegment)>(
        &self,
        tolerance: f32,
        callback: &mut F,
    ) {
        let mut stack: ArrayVec<(ConicSegment, u32), 8> = ArrayVec::new();
        stack.push((*self, self.subdivision_levels(tolerance)));
        while let Some((conic, levels)) = stack.pop() {
            if levels == 0 {
                callback(&QuadraticBezierSegment {
                    from: conic.from,
                    ctrl: conic.ctrl,
                    to: conic.to,
                });
                continue;
            }
            let (left, right) = conic.subdivide();
            stack.push((right, levels - 1));
            stack.push((left, levels - 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdivide_weight() {
        let conic = ConicSegment {
            from: point(0.0, 0.0),
            ctrl: point(1.0, 1.0),
            to: point(2.0, 0.0),
            weight: std::f32::consts::FRAC_1_SQRT_2,
        };
        let (a, b) = conic.subdivide();
        assert_eq!(a.to, b.from);
        let expected = ((1.0 + conic.weight) * 0.5_f32).sqrt();
        assert_eq!(a.weight, expected);
        assert_eq!(b.weight, expected);
    }

    #[test]
    fn unit_weight_needs_no_subdivision() {
        // With w == 1 the conic is exactly a quadratic.
        let conic = ConicSegment {
            from: point(0.0, 0.0),
            ctrl: point(5.0, 10.0),
            to: point(10.0, 0.0),
            weight: 1.0,
        };
        assert_eq!(conic.subdivision_levels(0.25), 0);
        let mut count = 0;
        conic.for_each_quadratic(0.25, &mut |quad| {
            assert_eq!(quad.ctrl, conic.ctrl);
            count += 1;
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn quarter_circle_subdivides() {
        let conic = ConicSegment {
            from: point(100.0, 0.0),
            ctrl: point(100.0, 100.0),
            to: point(0.0, 100.0),
            weight: std::f32::consts::FRAC_1_SQRT_2,
        };
        let levels = conic.subdivision_levels(0.01);
        assert!(levels >= 1);
        let mut count = 0;
        let mut last = conic.from;
        conic.for_each_quadratic(0.01, &mut |quad| {
            assert_eq!(quad.from, last);
            last = quad.to;
            count += 1;
        });
        assert_eq!(count, conic.num_quadratics(0.01));
        assert_eq!(last, conic.to);
    }
}
