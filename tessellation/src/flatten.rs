//! Stage 1: linearize the path contours into rings of vertices.

use crate::geom::{ConicSegment, CubicBezierSegment, QuadraticBezierSegment};
use crate::math::{point, Box2D, Point};
use crate::mesh::{Arena, VertexId};
use crate::path::{Path, PathEvent};

/// Appends a linearization point to the contour under construction,
/// returning the new tail.
fn append_point_to_contour(
    arena: &mut Arena,
    p: Point,
    prev: Option<VertexId>,
    head: &mut Option<VertexId>,
) -> Option<VertexId> {
    let v = arena.add_vertex(p, 255);
    if let Some(prev) = prev {
        arena[prev].next = Some(v);
        arena[v].prev = Some(prev);
    } else {
        *head = Some(v);
    }
    Some(v)
}

fn close_contour(
    arena: &mut Arena,
    head: &mut Option<VertexId>,
    prev: &mut Option<VertexId>,
    contours: &mut Vec<Option<VertexId>>,
) {
    if let (Some(h), Some(p)) = (*head, *prev) {
        arena[h].prev = Some(p);
        arena[p].next = Some(h);
        contours.push(Some(h));
    }
    *head = None;
    *prev = None;
}

/// Converts the path to a set of closed linear contours, one ring of
/// vertices per subpath (open subpaths are closed implicitly).
///
/// When the fill is inverse, a clip-bounds rectangle is prepended as
/// contour zero, traced counter-clockwise so that its winding cancels
/// against the path's and the fill rule selects the complement.
///
/// Also reports whether the path contained no curve segments.
pub(crate) fn path_to_contours(
    arena: &mut Arena,
    path: &Path,
    tolerance: f32,
    clip_bounds: &Box2D,
) -> (Vec<Option<VertexId>>, bool) {
    let mut contours = Vec::new();
    let mut is_linear = true;
    let mut head: Option<VertexId> = None;
    let mut prev: Option<VertexId> = None;

    if path.fill_rule().is_inverse() {
        let quad = [
            point(clip_bounds.min.x, clip_bounds.max.y),
            point(clip_bounds.max.x, clip_bounds.max.y),
            point(clip_bounds.max.x, clip_bounds.min.y),
            point(clip_bounds.min.x, clip_bounds.min.y),
        ];
        for &p in &quad {
            prev = append_point_to_contour(arena, p, prev, &mut head);
        }
        close_contour(arena, &mut head, &mut prev, &mut contours);
    }

    for event in path.iter() {
        match event {
            PathEvent::Begin { at } => {
                prev = append_point_to_contour(arena, at, prev, &mut head);
            }
            PathEvent::Line { to, .. } => {
                prev = append_point_to_contour(arena, to, prev, &mut head);
            }
            PathEvent::Quadratic { from, ctrl, to } => {
                is_linear = false;
                let curve = QuadraticBezierSegment { from, ctrl, to };
                curve.for_each_flattened(tolerance, &mut |p| {
                    prev = append_point_to_contour(arena, p, prev, &mut head);
                });
            }
            PathEvent::Conic {
                from,
                ctrl,
                to,
                weight,
            } => {
                is_linear = false;
                let conic = ConicSegment {
                    from,
                    ctrl,
                    to,
                    weight,
                };
                conic.for_each_quadratic(tolerance * tolerance, &mut |curve| {
                    curve.for_each_flattened(tolerance, &mut |p| {
                        prev = append_point_to_contour(arena, p, prev, &mut head);
                    });
                });
            }
            PathEvent::Cubic {
                from,
                ctrl1,
                ctrl2,
                to,
            } => {
                is_linear = false;
                let curve = CubicBezierSegment {
                    from,
                    ctrl1,
                    ctrl2,
                    to,
                };
                curve.for_each_flattened(tolerance, &mut |p| {
                    prev = append_point_to_contour(arena, p, prev, &mut head);
                });
            }
            PathEvent::End { .. } => {
                close_contour(arena, &mut head, &mut prev, &mut contours);
            }
        }
    }
    close_contour(arena, &mut head, &mut prev, &mut contours);

    (contours, is_linear)
}

/// Upper bound on the number of vertices flattening this path can
/// produce, used to reject oversized paths before allocating anything.
pub(crate) fn worst_case_vertex_count(path: &Path, tolerance: f32) -> usize {
    let mut count: usize = 0;
    for event in path.iter() {
        match event {
            PathEvent::Begin { .. } | PathEvent::Line { .. } => {
                count += 1;
            }
            PathEvent::Quadratic { from, ctrl, to } => {
                let curve = QuadraticBezierSegment { from, ctrl, to };
                count += curve.flattened_point_budget(tolerance) as usize;
            }
            PathEvent::Conic {
                from,
                ctrl,
                to,
                weight,
            } => {
                let conic = ConicSegment {
                    from,
                    ctrl,
                    to,
                    weight,
                };
                conic.for_each_quadratic(tolerance * tolerance, &mut |curve| {
                    count += curve.flattened_point_budget(tolerance) as usize;
                });
            }
            PathEvent::Cubic {
                from,
                ctrl1,
                ctrl2,
                to,
            } => {
                let curve = CubicBezierSegment {
                    from,
                    ctrl1,
                    ctrl2,
                    to,
                };
                count += curve.flattened_point_budget(tolerance) as usize;
            }
            PathEvent::End { .. } => {}
        }
    }
    // The clip contour is flattened even when the path itself is empty:
    // an inverse fill of nothing is the whole clip rectangle.
    if path.fill_rule().is_inverse() {
        count += 4;
    }
    count
}
