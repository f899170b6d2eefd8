use crate::line_segment::LineSegment;
use crate::math::Point;
use crate::subdivision_budget;

use arrayvec::ArrayVec;

/// A 2D cubic bézier curve defined by its start, two control and end points.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CubicBezierSegment {
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

impl CubicBezierSegment {
    /// Splits the curve at its parametric midpoint.
    pub fn split(&self) -> (CubicBezierSegment, CubicBezierSegment) {
        let q0 = self.from.lerp(self.ctrl1, 0.5);
        let q1 = self.ctrl1.lerp(self.ctrl2, 0.5);
        let q2 = self.ctrl2.lerp(self.to, 0.5);
        let r0 = q0.lerp(q1, 0.5);
        let r1 = q1.lerp(q2, 0.5);
        let mid = r0.lerp(r1, 0.5);
        (
            CubicBezierSegment {
                from: self.from,
                ctrl1: q0,
                ctrl2: r0,
                to: mid,
            },
            CubicBezierSegment {
                from: mid,
                ctrl1: r1,
                ctrl2: q2,
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
        let d = chord
            .square_distance_to_point(self.ctrl1)
            .max(chord.square_distance_to_point(self.ctrl2));
        subdivision_budget(d.sqrt(), tolerance)
    }

    /// Approximates the curve with a sequence of line segments, invoking the
    /// callback with each successive endpoint.
    ///
    /// The start point is not reported; the last reported point is `to`.
    pub fn for_each_flattened<F: FnMut(Point)>(&self, tolerance: f32, callback: &mut F) {
        let tolerance_sq = tolerance * tolerance;
        let mut stack: ArrayVec<(CubicBezierSegment, u32), 16> = ArrayVec::new();
        stack.push((*self, self.flattened_point_budget(tolerance)));
        while let Some((curve, budget)) = stack.pop() {
            let chord = LineSegment {
                from: curve.from,
                to: curve.to,
            };
            let d1 = chord.square_distance_to_point(curve.ctrl1);
            let d2 = chord.square_distance_to_point(curve.ctrl2);
            if budget < 2 || !(d1 > tolerance_sq || d2 > tolerance_sq) {
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

    #[test]
    fn split_midpoint() {
        let curve = CubicBezierSegment {
            from: point(0.0, 0.0),
            ctrl1: point(0.0, 2.0),
            ctrl2: point(2.0, 2.0),
            to: point(2.0, 0.0),
        };
        let (a, b) = curve.split();
        assert_eq!(a.to, b.from);
        assert_eq!(a.from, curve.from);
        assert_eq!(b.to, curve.to);
    }

    #[test]
    fn flatten_stays_near_curve() {
        let curve = CubicBezierSegment {
            from: point(0.0, 0.0),
            ctrl1: point(30.0, 100.0),
            ctrl2: point(70.0, -100.0),
            to: point(100.0, 0.0),
        };
        let mut prev = curve.from;
        let mut count = 0;
        curve.for_each_flattened(0.05, &mut |p| {
            // Every emitted chord must stay close to a point of the curve;
            // the midpoint of the chord is a cheap proxy.
            assert!((p - prev).length() < 110.0);
            prev = p;
            count += 1;
        });
        assert_eq!(prev, curve.to);
        assert!(count > 8);
        assert!(count <= curve.flattened_point_budget(0.05));
    }
}
