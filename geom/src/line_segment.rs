use crate::math::Point;

/// A linear segment.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct LineSegment {
    pub from: Point,
    pub to: Point,
}

impl LineSegment {
    /// Computes the squared distance of a point to this segment.
    ///
    /// The distance is measured to the closest point of the segment, which
    /// may be one of the endpoints when the projection of `p` falls outside
    /// of the segment.
    pub fn square_distance_to_point(&self, p: Point) -> f32 {
        let v = self.to - self.from;
        let w = p - self.from;
        let c1 = w.dot(v);
        if c1 <= 0.0 {
            return w.square_length();
        }
        let c2 = v.square_length();
        if c2 <= c1 {
            return (p - self.to).square_length();
        }
        let projected = self.from + v * (c1 / c2);
        (p - projected).square_length()
    }

    /// Distance of a point to this segment.
    pub fn distance_to_point(&self, p: Point) -> f32 {
        self.square_distance_to_point(p).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::point;

    #[test]
    fn distance_to_point() {
        let seg = LineSegment {
            from: point(0.0, 0.0),
            to: point(10.0, 0.0),
        };
        assert_eq!(seg.square_distance_to_point(point(5.0, 2.0)), 4.0);
        // Clamped to the endpoints on either side.
        assert_eq!(seg.square_distance_to_point(point(-3.0, 0.0)), 9.0);
        assert_eq!(seg.square_distance_to_point(point(14.0, 3.0)), 25.0);
    }

    #[test]
    fn distance_to_degenerate_segment() {
        let seg = LineSegment {
            from: point(1.0, 1.0),
            to: point(1.0, 1.0),
        };
        assert_eq!(seg.square_distance_to_point(point(4.0, 5.0)), 25.0);
    }
}
