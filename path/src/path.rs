//! The default path data structure.

use crate::events::PathEvent;
use crate::math::{point, Box2D, Point};
use crate::FillRule;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
enum Verb {
    Begin,
    LineTo,
    QuadraticTo,
    ConicTo,
    CubicTo,
    Close,
    End,
}

/// A simple path data structure.
///
/// Points (endpoints and control points alike) are stored in a single
/// array, with a parallel array of verbs describing how to consume them.
/// Conic weights live in their own array, consumed in verb order.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Path {
    points: Vec<Point>,
    verbs: Vec<Verb>,
    weights: Vec<f32>,
    fill_rule: FillRule,
    bounds: Box2D,
}

impl Default for Path {
    fn default() -> Self {
        Path::new()
    }
}

impl Path {
    /// Creates a builder for this data structure.
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// An empty path with the default fill rule.
    pub fn new() -> Path {
        Path {
            points: Vec::new(),
            verbs: Vec::new(),
            weights: Vec::new(),
            fill_rule: FillRule::NonZero,
            bounds: Box2D::zero(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    /// Returns this path with a different fill rule.
    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Path {
        self.fill_rule = fill_rule;
        self
    }

    /// The bounding box of all endpoints and control points.
    ///
    /// This is conservative: a curve is contained in the convex hull of
    /// its control polygon, so the actual shape never extends beyond it.
    pub fn bounds(&self) -> Box2D {
        self.bounds
    }

    /// Iterates over the path commands.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            path: self,
            verb: 0,
            point: 0,
            weight: 0,
            first: point(0.0, 0.0),
            current: point(0.0, 0.0),
        }
    }
}

impl<'l> IntoIterator for &'l Path {
    type Item = PathEvent;
    type IntoIter = Iter<'l>;

    fn into_iter(self) -> Iter<'l> {
        self.iter()
    }
}

/// Builds a [`Path`].
///
/// Subpaths must be started with `begin` and finished with `close` or
/// `end`; `build` finishes an unterminated subpath as if `end` had been
/// called.
#[derive(Clone, Debug)]
pub struct Builder {
    points: Vec<Point>,
    verbs: Vec<Verb>,
    weights: Vec<f32>,
    fill_rule: FillRule,
    bounds: Option<Box2D>,
    in_subpath: bool,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            points: Vec::new(),
            verbs: Vec::new(),
            weights: Vec::new(),
            fill_rule: FillRule::NonZero,
            bounds: None,
            in_subpath: false,
        }
    }

    pub fn with_capacity(points: usize, verbs: usize) -> Builder {
        Builder {
            points: Vec::with_capacity(points),
            verbs: Vec::with_capacity(verbs),
            weights: Vec::new(),
            fill_rule: FillRule::NonZero,
            bounds: None,
            in_subpath: false,
        }
    }

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) {
        self.fill_rule = fill_rule;
    }

    pub fn begin(&mut self, at: Point) {
        if self.in_subpath {
            self.end(false);
        }
        self.in_subpath = true;
        self.grow_bounds(at);
        self.points.push(at);
        self.verbs.push(Verb::Begin);
    }

    pub fn line_to(&mut self, to: Point) {
        assert!(self.in_subpath, "line_to before begin");
        self.grow_bounds(to);
        self.points.push(to);
        self.verbs.push(Verb::LineTo);
    }

    pub fn quadratic_bezier_to(&mut self, ctrl: Point, to: Point) {
        assert!(self.in_subpath, "quadratic_bezier_to before begin");
        self.grow_bounds(ctrl);
        self.grow_bounds(to);
        self.points.push(ctrl);
        self.points.push(to);
        self.verbs.push(Verb::QuadraticTo);
    }

    pub fn conic_to(&mut self, ctrl: Point, to: Point, weight: f32) {
        assert!(self.in_subpath, "conic_to before begin");
        self.grow_bounds(ctrl);
        self.grow_bounds(to);
        self.points.push(ctrl);
        self.points.push(to);
        self.weights.push(weight);
        self.verbs.push(Verb::ConicTo);
    }

    pub fn cubic_bezier_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        assert!(self.in_subpath, "cubic_bezier_to before begin");
        self.grow_bounds(ctrl1);
        self.grow_bounds(ctrl2);
        self.grow_bounds(to);
        self.points.push(ctrl1);
        self.points.push(ctrl2);
        self.points.push(to);
        self.verbs.push(Verb::CubicTo);
    }

    /// Finishes the current subpath, closing it back to its first point.
    pub fn close(&mut self) {
        self.end(true);
    }

    /// Finishes the current subpath.
    pub fn end(&mut self, close: bool) {
        assert!(self.in_subpath, "end before begin");
        self.in_subpath = false;
        self.verbs.push(if close { Verb::Close } else { Verb::End });
    }

    pub fn build(mut self) -> Path {
        if self.in_subpath {
            self.end(false);
        }
        Path {
            points: self.points,
            verbs: self.verbs,
            weights: self.weights,
            fill_rule: self.fill_rule,
            bounds: self.bounds.unwrap_or_else(Box2D::zero),
        }
    }

    fn grow_bounds(&mut self, p: Point) {
        match &mut self.bounds {
            Some(b) => {
                b.min.x = b.min.x.min(p.x);
                b.min.y = b.min.y.min(p.y);
                b.max.x = b.max.x.max(p.x);
                b.max.y = b.max.y.max(p.y);
            }
            None => {
                self.bounds = Some(Box2D { min: p, max: p });
            }
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

/// An iterator over the events of a [`Path`].
#[derive(Clone)]
pub struct Iter<'l> {
    path: &'l Path,
    verb: usize,
    point: usize,
    weight: usize,
    first: Point,
    current: Point,
}

impl<'l> Iterator for Iter<'l> {
    type Item = PathEvent;

    fn next(&mut self) -> Option<PathEvent> {
        let verb = *self.path.verbs.get(self.verb)?;
        self.verb += 1;
        let event = match verb {
            Verb::Begin => {
                let at = self.path.points[self.point];
                self.point += 1;
                self.first = at;
                self.current = at;
                PathEvent::Begin { at }
            }
            Verb::LineTo => {
                let from = self.current;
                let to = self.path.points[self.point];
                self.point += 1;
                self.current = to;
                PathEvent::Line { from, to }
            }
            Verb::QuadraticTo => {
                let from = self.current;
                let ctrl = self.path.points[self.point];
                let to = self.path.points[self.point + 1];
                self.point += 2;
                self.current = to;
                PathEvent::Quadratic { from, ctrl, to }
            }
            Verb::ConicTo => {
                let from = self.current;
                let ctrl = self.path.points[self.point];
                let to = self.path.points[self.point + 1];
                self.point += 2;
                let weight = self.path.weights[self.weight];
                self.weight += 1;
                self.current = to;
                PathEvent::Conic {
                    from,
                    ctrl,
                    to,
                    weight,
                }
            }
            Verb::CubicTo => {
                let from = self.current;
                let ctrl1 = self.path.points[self.point];
                let ctrl2 = self.path.points[self.point + 1];
                let to = self.path.points[self.point + 2];
                self.point += 3;
                self.current = to;
                PathEvent::Cubic {
                    from,
                    ctrl1,
                    ctrl2,
                    to,
                }
            }
            Verb::Close => PathEvent::End {
                last: self.current,
                first: self.first,
                close: true,
            },
            Verb::End => PathEvent::End {
                last: self.current,
                first: self.first,
                close: false,
            },
        };
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::point;

    #[test]
    fn simple_path() {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(1.0, 0.0));
        builder.quadratic_bezier_to(point(2.0, 0.0), point(2.0, 1.0));
        builder.conic_to(point(2.0, 2.0), point(1.0, 2.0), 0.5);
        builder.cubic_bezier_to(point(0.5, 2.0), point(0.0, 1.5), point(0.0, 1.0));
        builder.close();
        let path = builder.build();

        let mut iter = path.iter();
        assert_eq!(iter.next(), Some(PathEvent::Begin { at: point(0.0, 0.0) }));
        assert_eq!(
            iter.next(),
            Some(PathEvent::Line {
                from: point(0.0, 0.0),
                to: point(1.0, 0.0)
            })
        );
        assert_eq!(
            iter.next(),
            Some(PathEvent::Quadratic {
                from: point(1.0, 0.0),
                ctrl: point(2.0, 0.0),
                to: point(2.0, 1.0)
            })
        );
        assert_eq!(
            iter.next(),
            Some(PathEvent::Conic {
                from: point(2.0, 1.0),
                ctrl: point(2.0, 2.0),
                to: point(1.0, 2.0),
                weight: 0.5
            })
        );
        assert_eq!(
            iter.next(),
            Some(PathEvent::Cubic {
                from: point(1.0, 2.0),
                ctrl1: point(0.5, 2.0),
                ctrl2: point(0.0, 1.5),
                to: point(0.0, 1.0)
            })
        );
        assert_eq!(
            iter.next(),
            Some(PathEvent::End {
                last: point(0.0, 1.0),
                first: point(0.0, 0.0),
                close: true
            })
        );
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn bounds_include_control_points() {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.quadratic_bezier_to(point(5.0, -10.0), point(10.0, 0.0));
        builder.end(false);
        let path = builder.build();

        let b = path.bounds();
        assert_eq!(b.min, point(0.0, -10.0));
        assert_eq!(b.max, point(10.0, 0.0));
    }

    #[test]
    fn implicit_end_on_begin() {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(1.0, 0.0));
        builder.begin(point(5.0, 5.0));
        builder.line_to(point(6.0, 5.0));
        let path = builder.build();

        let events: Vec<_> = path.iter().collect();
        assert_eq!(events.len(), 6);
        assert_eq!(
            events[2],
            PathEvent::End {
                last: point(1.0, 0.0),
                first: point(0.0, 0.0),
                close: false
            }
        );
    }

    #[test]
    fn empty_path() {
        let path = Path::new();
        assert!(path.is_empty());
        assert_eq!(path.iter().next(), None);
        assert_eq!(path.bounds(), Box2D::zero());
    }
}
