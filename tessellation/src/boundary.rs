//! Stage 5-AA: extract filled-region boundaries and rebuild them as a
//! feathered quad mesh.
//!
//! The boundaries of the fill are walked out of the simplified mesh,
//! cleaned of "pointy" vertices (whose adjacent edges have nearly
//! opposite normals and would invert when offset), then displaced half a
//! pixel inward and outward along their normals. Consecutive displaced
//! lines are intersected to form an inner ring of fully covered vertices
//! and an outer ring of zero-coverage vertices, connected into quads.
//! The resulting mesh goes back through the sort / simplify / tessellate
//! stages to produce antialiased monotone polygons.

use crate::math::{vector, Vector};
use crate::mesh::{
    disconnect, insert_edge, new_edge, remove_edge, Arena, Comparator, EdgeId, EdgeList, EdgeType,
    VertexId, VertexList,
};
use crate::path::FillRule;
use crate::simplify::{connect, find_enclosing_edges, intersect_edges};
use crate::tess_log;

/// Walks the simplified mesh and disconnects every edge that does not
/// separate a filled region from an unfilled one. Surviving below-edges
/// accumulate the winding of their left neighbour, so that each carries
/// the winding number of the region to its right.
fn remove_non_boundary_edges(arena: &mut Arena, mesh: &VertexList, fill_rule: FillRule) {
    tess_log!("removing non-boundary edges");
    let mut active = EdgeList::default();
    let mut v_opt = mesh.head;
    while let Some(v) = v_opt {
        if arena[v].first_edge_above.is_none() && arena[v].first_edge_below.is_none() {
            v_opt = arena[v].next;
            continue;
        }
        let (left_enclosing, _) = find_enclosing_edges(arena, v, &active);
        let mut prev_filled =
            left_enclosing.map_or(false, |e| fill_rule.is_in(arena[e].winding));
        let mut e_opt = arena[v].first_edge_above;
        while let Some(e) = e_opt {
            let next = arena[e].next_edge_above;
            remove_edge(arena, e, &mut active);
            let filled = fill_rule.is_in(arena[e].winding);
            if filled == prev_filled {
                disconnect(arena, e);
            }
            prev_filled = filled;
            e_opt = next;
        }
        let mut prev = left_enclosing;
        let mut e_opt = arena[v].first_edge_below;
        while let Some(e) = e_opt {
            if let Some(p) = prev {
                let w = arena[p].winding;
                arena[e].winding += w;
            }
            insert_edge(arena, e, prev, &mut active);
            prev = Some(e);
            e_opt = arena[e].next_edge_below;
        }
        v_opt = arena[v].next;
    }
}

/// The normal to the edge, oriented outward from the filled side. Not
/// unit length.
fn get_edge_normal(arena: &Arena, e: EdgeId) -> Vector {
    let edge = &arena[e];
    vector(
        edge.line.a as f32 * edge.winding as f32,
        edge.line.b as f32 * edge.winding as f32,
    )
}

/// Removes "pointy" vertices: where adjacent boundary edges have nearly
/// opposite normals and the shared vertex is within a quarter pixel of
/// the next edge's line, offsetting would produce an inverted sliver, so
/// the pair is collapsed onto a single join edge.
fn simplify_boundary(arena: &mut Arena, boundary: &mut EdgeList, c: Comparator) {
    let mut prev_edge = boundary.tail.unwrap();
    let mut prev_normal = get_edge_normal(arena, prev_edge);
    let mut e_opt = boundary.head;
    while let Some(e) = e_opt {
        let prev_v = if arena[prev_edge].winding == 1 {
            arena[prev_edge].top
        } else {
            arena[prev_edge].bottom
        };
        let next_v = if arena[e].winding == 1 {
            arena[e].bottom
        } else {
            arena[e].top
        };
        let dist = arena.edge_dist(e, arena[prev_v].point);
        let normal = get_edge_normal(arena, e);
        // A quarter pixel, squared, scaled by the line's magnitude.
        let denom = 0.0625 * arena[e].line.mag_sq();
        if prev_normal.dot(normal) < 0.0 && dist * dist <= denom {
            tess_log!("collapsing pointy vertex at {:?}", arena[prev_v].point);
            let join = new_edge(arena, prev_v, next_v, EdgeType::Inner, c);
            insert_edge(arena, join, Some(e), boundary);
            remove_edge(arena, prev_edge, boundary);
            remove_edge(arena, e, boundary);
            if arena[join].left.is_some() && arena[join].right.is_some() {
                prev_edge = arena[join].left.unwrap();
                e_opt = Some(join);
            } else {
                prev_edge = boundary.tail.unwrap();
                e_opt = boundary.head;
            }
            prev_normal = get_edge_normal(arena, prev_edge);
        } else {
            prev_edge = e;
            prev_normal = normal;
            e_opt = arena[e].right;
        }
    }
}

/// When two consecutive offset vertices come out in the opposite sweep
/// order from the boundary edge between them (a too-tight concavity),
/// both are collapsed onto the intersection of their bisectors.
fn fix_inversions(
    arena: &mut Arena,
    prev: Option<VertexId>,
    next: Option<VertexId>,
    prev_bisector: Option<EdgeId>,
    next_bisector: Option<EdgeId>,
    prev_edge: EdgeId,
    c: Comparator,
) {
    let (Some(prev), Some(next)) = (prev, next) else {
        return;
    };
    let (Some(prev_bisector), Some(next_bisector)) = (prev_bisector, next_bisector) else {
        return;
    };
    let winding = if c.sweep_lt(arena[prev].point, arena[next].point) {
        1
    } else {
        -1
    };
    if winding != arena[prev_edge].winding {
        if let Some((p, alpha)) = intersect_edges(arena, prev_bisector, next_bisector) {
            arena[prev].point = p;
            arena[next].point = p;
            arena[prev].alpha = alpha;
            arena[next].alpha = alpha;
        }
    }
}

/// Displaces the boundary edges by half a pixel along their normals and
/// connects the intersections of consecutive offset lines into a quad
/// mesh: an inner ring with full alpha, an outer ring with zero alpha,
/// and connector edges between them.
fn boundary_to_aa_mesh(
    arena: &mut Arena,
    boundary: &mut EdgeList,
    mesh: &mut VertexList,
    c: Comparator,
) {
    // A boundary with fewer than three edges is degenerate.
    let Some(head) = boundary.head else { return };
    let Some(second) = arena[head].right else { return };
    if arena[second].right.is_none() {
        return;
    }

    let radius = 0.5f64;
    let mut prev_edge = boundary.tail.unwrap();
    let offset = radius * arena[prev_edge].line.mag_sq().sqrt() * arena[prev_edge].winding as f64;
    let mut prev_inner = arena[prev_edge].line;
    prev_inner.c -= offset;
    let mut prev_outer = arena[prev_edge].line;
    prev_outer.c += offset;
    let mut inner_vertices = VertexList::default();
    let mut outer_vertices = VertexList::default();
    let mut prev_bisector: Option<EdgeId> = None;

    let mut e_opt = boundary.head;
    while let Some(e) = e_opt {
        let offset = radius * arena[e].line.mag_sq().sqrt() * arena[e].winding as f64;
        let mut inner = arena[e].line;
        inner.c -= offset;
        let mut outer = arena[e].line;
        outer.c += offset;
        if let (Some(inner_point), Some(outer_point)) =
            (prev_inner.intersect(&inner), prev_outer.intersect(&outer))
        {
            let inner_vertex = arena.add_vertex(inner_point, 255);
            let outer_vertex = arena.add_vertex(outer_point, 0);
            let bisector = new_edge(arena, outer_vertex, inner_vertex, EdgeType::Connector, c);
            fix_inversions(
                arena,
                inner_vertices.tail,
                Some(inner_vertex),
                prev_bisector,
                Some(bisector),
                prev_edge,
                c,
            );
            fix_inversions(
                arena,
                outer_vertices.tail,
                Some(outer_vertex),
                prev_bisector,
                Some(bisector),
                prev_edge,
                c,
            );
            inner_vertices.append(arena, inner_vertex);
            outer_vertices.append(arena, outer_vertex);
            prev_bisector = Some(bisector);
        }
        prev_inner = inner;
        prev_outer = outer;
        prev_edge = e;
        e_opt = arena[e].right;
    }
    inner_vertices.close(arena);
    outer_vertices.close(arena);

    let (Some(inner_head), Some(outer_head)) = (inner_vertices.head, outer_vertices.head) else {
        return;
    };
    let bisector = new_edge(arena, outer_head, inner_head, EdgeType::Connector, c);
    fix_inversions(
        arena,
        inner_vertices.tail,
        Some(inner_head),
        prev_bisector,
        Some(bisector),
        prev_edge,
        c,
    );
    fix_inversions(
        arena,
        outer_vertices.tail,
        Some(outer_head),
        prev_bisector,
        Some(bisector),
        prev_edge,
        c,
    );

    let mut inner_vertex = inner_head;
    let mut outer_vertex = outer_head;
    loop {
        // Connect the rings into a quad mesh. Outer edges keep the
        // default +1 winding and inner edges get -2, so the interior
        // always satisfies the non-zero rule (-1 normally, -3 where a
        // thin feature inverts). Connector edges are structural only and
        // carry no winding.
        let outer_prev = arena[outer_vertex].prev.unwrap();
        connect(arena, outer_prev, outer_vertex, EdgeType::Outer, c, 1);
        let inner_prev = arena[inner_vertex].prev.unwrap();
        connect(arena, inner_prev, inner_vertex, EdgeType::Inner, c, -2);
        connect(arena, outer_vertex, inner_vertex, EdgeType::Connector, c, 0);
        let inner_next = arena[inner_vertex].next.unwrap();
        let outer_next = arena[outer_vertex].next.unwrap();
        mesh.append(arena, inner_vertex);
        mesh.append(arena, outer_vertex);
        inner_vertex = inner_next;
        outer_vertex = outer_next;
        if inner_vertex == inner_head || outer_vertex == outer_head {
            break;
        }
    }
}

/// Follows the next filled-boundary edge around a region, clockwise on
/// filled polygons, disconnecting edges as they are visited, and tags
/// each with +1 when walked downward and -1 upward.
fn extract_boundary(arena: &mut Arena, boundary: &mut EdgeList, first: EdgeId, fill_rule: FillRule) {
    let mut down = fill_rule.is_in(arena[first].winding);
    let mut e_opt = Some(first);
    while let Some(e) = e_opt {
        arena[e].winding = if down { 1 } else { -1 };
        boundary.append(arena, e);
        let next;
        if down {
            // Find the outgoing edge, in clockwise order.
            if let Some(n) = arena[e].next_edge_above {
                next = Some(n);
                down = false;
            } else if let Some(n) = arena[arena[e].bottom].last_edge_below {
                next = Some(n);
                down = true;
            } else if let Some(n) = arena[e].prev_edge_above {
                next = Some(n);
                down = false;
            } else {
                next = None;
            }
        } else {
            // Find the outgoing edge, in counter-clockwise order.
            if let Some(n) = arena[e].prev_edge_below {
                next = Some(n);
                down = true;
            } else if let Some(n) = arena[arena[e].top].first_edge_above {
                next = Some(n);
                down = false;
            } else if let Some(n) = arena[e].next_edge_below {
                next = Some(n);
                down = true;
            } else {
                next = None;
            }
        }
        disconnect(arena, e);
        e_opt = next;
    }
}

/// Extracts every boundary of the filled region and rebuilds each as an
/// antialiased quad mesh, appended to `out_mesh`.
pub(crate) fn extract_boundaries(
    arena: &mut Arena,
    in_mesh: &VertexList,
    out_mesh: &mut VertexList,
    fill_rule: FillRule,
    c: Comparator,
) {
    remove_non_boundary_edges(arena, in_mesh, fill_rule);
    let mut v_opt = in_mesh.head;
    while let Some(v) = v_opt {
        while let Some(e) = arena[v].first_edge_below {
            let mut boundary = EdgeList::default();
            extract_boundary(arena, &mut boundary, e, fill_rule);
            simplify_boundary(arena, &mut boundary, c);
            boundary_to_aa_mesh(arena, &mut boundary, out_mesh, c);
        }
        v_opt = arena[v].next;
    }
}
