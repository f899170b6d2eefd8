use crate::line_segment::LineSegment;
use crate::math::Point;
use crate::subdivision_budget;

use arrayvec::ArrayVec;

/// A 2D quadratic bézier curve defined by its start, control and end points.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct QuadraticBezierSegment {
    pub from: Point,
    pub ctrl: Point,
    pub to: Point,
}

impl QuadraticBezierSegment {
    /// Splits the curve at its parametric midpoint.
    pub fn split(&self) -> (QuadraticBezierSegment, QuadraticBezierSegment) {
        let q0 = self.from.lerp(self.ctrl, 0.5);
        let q1 = self.ctrl.lerp(self.to, 0.5);
        let mid = q0.lerp(q1, 0.5);
        (
            QuadraticBezierSegment {
                from: self.from,
                ctrl: q0,
                to: mid,
            },
            QuadraticBezierSegment {
                from: mid,
                ctrl: q1,
                to: self.to,
            },
        )
    }

    /// Upper bound on the number of points `for_each_flattened` will produce
    /// for this curve at the given tolerance.
    pub fn flattened_point_budget(&self, tolerance: f32) -> u32 {
        let chord = LineSegment {
            from: self.from,
            to: self.to,
        };
        subdivision_budget(chord.distance_to_point(self.ctrl), tolerance)
    }

    /// Approximates the curve with a sequence of line segments, invoking the
    /// callback with each successive endpoint.
    ///
    /// The start point is not reported; the last reported point is `to`.
    pub fn for_each_flattened<F: FnMut(Point)>(&self, tolerance: f32, callback: &mut F) {
        let tolerance_sq = tolerance * tolerance;
        // Subdivision halves the budget each level, so the stack depth is
        // bounded by log2 of the maximum budget.
        let mut stack: ArrayVec<(QuadraticBezierSegment, u32), 16> = ArrayVec::new();
        stack.push((*self, self.flattened_point_budget(tolerance)));
        while let Some((curve, budget)) = stack.pop() {
            let chord = LineSegment {
                from: curve.from,
                to: curve.to,
            };
            let d = chord.square_distance_to_point(curve.ctrl);
            if budget < 2 || !(d > tolerance_sq) {
                callback(curve.to);
                continue;
            }
            let (left, right) = curve.split();
            stack.push((right, budget / 2));
            stack.push((left, budget / 2));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::point;

    fn flatten_count(curve: &QuadraticBezierSegment, tolerance: f32) -> u32 {
        let mut count = 0;
        let mut last = curve.from;
        curve.for_each_flattened(tolerance, &mut |p| {
            count += 1;
            last = p;
        });
        assert_eq!(last, curve.to);
        count
    }

    #[test]
    fn split_midpoint() {
        let curve = QuadraticBezierSegment {
            from: point(0.0, 0.0),
            ctrl: point(1.0, 2.0),
            to: point(2.0, 0.0),
        };
        let (a, b) = curve.split();
        assert_eq!(a.to, b.from);
        assert_eq!(a.to, point(1.0, 1.0));
    }

    #[test]
    fn flatten_within_budget() {
        let curve = QuadraticBezierSegment {
            from: point(0.0, 0.0),
            ctrl: point(50.0, 100.0),
            to: point(100.0, 0.0),
        };
        let coarse = flatten_count(&curve, 10.0);
        let fine = flatten_count(&curve, 0.01);
        assert!(coarse < fine);
        assert!(fine <= curve.flattened_point_budget(0.01));
    }

    #[test]
    fn flatten_line_like() {
        // A degenerate curve flattens to a single segment.
        let curve = QuadraticBezierSegment {
            from: point(0.0, 0.0),
            ctrl: point(1.0, 1.0),
            to: point(2.0, 2.0),
        };
        assert_eq!(flatten_count(&curve, 0.1), 1);
    }
}
