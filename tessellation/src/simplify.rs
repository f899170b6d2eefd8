//! Stages 2–4: contour sanitizing, edge construction, coincident-vertex
//! merging, and the intersection-resolving sweep.
//!
//! The sweep is derived from the Bentley–Ottmann algorithm. Intersection
//! points are computed in floating point and may violate the mesh
//! topology or the active edge list ordering; the mesh is adjusted to
//! match the computed points in three ways:
//!
//! - a shortened edge that is no longer ordered with respect to its
//!   neighbours at the shared vertex is merged with them
//!   (`merge_collinear_edges`);
//! - an edge that violates the left-to-right ordering of the active edge
//!   list causes the offending neighbour to be split on the intersected
//!   vertex (`cleanup_active_edges`);
//! - shortening an edge may activate or deactivate it, which re-inserts
//!   or removes it from the active edge list (`fix_active_state`).

use crate::math::{point, Point};
use crate::mesh::{
    disconnect, insert_edge, insert_edge_above, insert_edge_below, new_edge, remove_edge,
    remove_edge_above, remove_edge_below, round_to_quarter_pixel, Arena, Comparator, EdgeId,
    EdgeList, EdgeType, VertexId, VertexList,
};
use crate::tess_log;

/// Creates an edge between two vertices and threads it into both
/// endpoints' edge lists, merging with collinear neighbours. The winding
/// scale lets AA mesh construction weight or neutralize an edge.
pub(crate) fn connect(
    arena: &mut Arena,
    prev: VertexId,
    next: VertexId,
    kind: EdgeType,
    c: Comparator,
    winding_scale: i32,
) -> EdgeId {
    let e = new_edge(arena, prev, next, kind, c);
    let top = arena[e].top;
    let bottom = arena[e].bottom;
    insert_edge_below(arena, e, top, c);
    insert_edge_above(arena, e, bottom, c);
    arena[e].winding *= winding_scale;
    merge_collinear_edges(arena, e, None, c);
    e
}

fn erase_edge(arena: &mut Arena, e: EdgeId, active: Option<&mut EdgeList>) {
    tess_log!("erasing edge {:?}", e);
    disconnect(arena, e);
    if let Some(active) = active {
        if active.contains(arena, e) {
            remove_edge(arena, e, active);
        }
    }
}

/// The two active edges immediately left and right of a vertex. When the
/// vertex has edges above, they are contiguous in the active list and
/// their outer neighbours are the answer; otherwise the list is scanned
/// from the right for the first edge left of the vertex.
pub(crate) fn find_enclosing_edges(
    arena: &Arena,
    v: VertexId,
    active: &EdgeList,
) -> (Option<EdgeId>, Option<EdgeId>) {
    if let (Some(first), Some(last)) = (arena[v].first_edge_above, arena[v].last_edge_above) {
        return (arena[first].left, arena[last].right);
    }
    let mut next: Option<EdgeId> = None;
    let mut prev = active.tail;
    while let Some(e) = prev {
        if arena.is_left_of(e, v) {
            break;
        }
        next = Some(e);
        prev = arena[e].left;
    }
    (prev, next)
}

/// Finds the insertion position of an edge in the active list, comparing
/// against each candidate at whichever endpoint both edges span.
fn find_enclosing_edges_for_edge(
    arena: &Arena,
    edge: EdgeId,
    active: &EdgeList,
    c: Comparator,
) -> (Option<EdgeId>, Option<EdgeId>) {
    let top = arena[edge].top;
    let bottom = arena[edge].bottom;
    let mut prev: Option<EdgeId> = None;
    let mut next = active.head;
    while let Some(n) = next {
        let n_top = arena[n].top;
        let n_bottom = arena[n].bottom;
        if (c.sweep_lt(arena[n_top].point, arena[top].point) && arena.is_right_of(n, top))
            || (c.sweep_lt(arena[top].point, arena[n_top].point)
                && arena.is_left_of(edge, n_top))
            || (c.sweep_lt(arena[bottom].point, arena[n_bottom].point)
                && arena.is_right_of(n, bottom))
            || (c.sweep_lt(arena[n_bottom].point, arena[bottom].point)
                && arena.is_left_of(edge, n_bottom))
        {
            break;
        }
        prev = next;
        next = arena[n].right;
    }
    (prev, next)
}

/// An edge belongs in the active list iff its top has been processed and
/// its bottom has not; restores that invariant after a topology change.
fn fix_active_state(arena: &mut Arena, edge: EdgeId, active: Option<&mut EdgeList>, c: Comparator) {
    let Some(active) = active else {
        return;
    };
    let top_processed = arena[arena[edge].top].processed;
    let bottom_processed = arena[arena[edge].bottom].processed;
    if active.contains(arena, edge) {
        if bottom_processed || !top_processed {
            remove_edge(arena, edge, active);
        }
    } else if top_processed && !bottom_processed {
        let (left, _right) = find_enclosing_edges_for_edge(arena, edge, active, c);
        insert_edge(arena, edge, left, active);
    }
}

fn set_top(
    arena: &mut Arena,
    edge: EdgeId,
    v: VertexId,
    mut active: Option<&mut EdgeList>,
    c: Comparator,
) {
    remove_edge_below(arena, edge);
    arena[edge].top = v;
    arena.recompute_line(edge);
    insert_edge_below(arena, edge, v, c);
    fix_active_state(arena, edge, active.as_deref_mut(), c);
    merge_collinear_edges(arena, edge, active, c);
}

fn set_bottom(
    arena: &mut Arena,
    edge: EdgeId,
    v: VertexId,
    mut active: Option<&mut EdgeList>,
    c: Comparator,
) {
    remove_edge_above(arena, edge);
    arena[edge].bottom = v;
    arena.recompute_line(edge);
    insert_edge_above(arena, edge, v, c);
    fix_active_state(arena, edge, active.as_deref_mut(), c);
    merge_collinear_edges(arena, edge, active, c);
}

fn merge_edges_above(
    arena: &mut Arena,
    edge: EdgeId,
    other: EdgeId,
    mut active: Option<&mut EdgeList>,
    c: Comparator,
) {
    let edge_top = arena[edge].top;
    let other_top = arena[other].top;
    if arena[edge_top].point == arena[other_top].point {
        tess_log!("merging coincident above edges {:?} and {:?}", edge, other);
        arena[other].winding += arena[edge].winding;
        erase_edge(arena, edge, active);
    } else if c.sweep_lt(arena[edge_top].point, arena[other_top].point) {
        arena[other].winding += arena[edge].winding;
        set_bottom(arena, edge, other_top, active.as_deref_mut(), c);
    } else {
        arena[edge].winding += arena[other].winding;
        set_bottom(arena, other, edge_top, active.as_deref_mut(), c);
    }
}

fn merge_edges_below(
    arena: &mut Arena,
    edge: EdgeId,
    other: EdgeId,
    mut active: Option<&mut EdgeList>,
    c: Comparator,
) {
    let edge_bottom = arena[edge].bottom;
    let other_bottom = arena[other].bottom;
    if arena[edge_bottom].point == arena[other_bottom].point {
        tess_log!("merging coincident below edges {:?} and {:?}", edge, other);
        arena[other].winding += arena[edge].winding;
        erase_edge(arena, edge, active);
    } else if c.sweep_lt(arena[edge_bottom].point, arena[other_bottom].point) {
        arena[edge].winding += arena[other].winding;
        set_top(arena, other, edge_bottom, active.as_deref_mut(), c);
    } else {
        arena[other].winding += arena[edge].winding;
        set_top(arena, edge, other_bottom, active.as_deref_mut(), c);
    }
}

/// Merges an edge with an above- or below-neighbour when they share an
/// endpoint or are no longer strictly ordered at the shared vertex.
fn merge_collinear_edges(
    arena: &mut Arena,
    edge: EdgeId,
    mut active: Option<&mut EdgeList>,
    c: Comparator,
) {
    if let Some(prev) = arena[edge].prev_edge_above {
        let top = arena[edge].top;
        if arena[prev].top == top || !arena.is_left_of(prev, top) {
            merge_edges_above(arena, edge, prev, active.as_deref_mut(), c);
        }
    } else if let Some(next) = arena[edge].next_edge_above {
        let top = arena[edge].top;
        if arena[next].top == top || !arena.is_left_of(edge, arena[next].top) {
            merge_edges_above(arena, edge, next, active.as_deref_mut(), c);
        }
    }
    if let Some(prev) = arena[edge].prev_edge_below {
        let bottom = arena[edge].bottom;
        if arena[prev].bottom == bottom || !arena.is_left_of(prev, bottom) {
            merge_edges_below(arena, edge, prev, active.as_deref_mut(), c);
        }
    } else if let Some(next) = arena[edge].next_edge_below {
        let bottom = arena[edge].bottom;
        if arena[next].bottom == bottom || !arena.is_left_of(edge, arena[next].bottom) {
            merge_edges_below(arena, edge, next, active, c);
        }
    }
}

/// Splits an edge at a vertex. When the vertex is beyond either endpoint
/// in sweep order the edge is re-anchored instead; otherwise a second
/// edge from the vertex to the old bottom is created, inheriting the
/// winding and type.
fn split_edge(
    arena: &mut Arena,
    edge: EdgeId,
    v: VertexId,
    mut active: Option<&mut EdgeList>,
    c: Comparator,
) {
    tess_log!(
        "splitting edge {:?} at vertex {:?} ({:?})",
        edge,
        v,
        arena[v].point
    );
    let top = arena[edge].top;
    let bottom = arena[edge].bottom;
    if c.sweep_lt(arena[v].point, arena[top].point) {
        set_top(arena, edge, v, active, c);
    } else if c.sweep_lt(arena[bottom].point, arena[v].point) {
        set_bottom(arena, edge, v, active, c);
    } else {
        let winding = arena[edge].winding;
        let kind = arena[edge].kind;
        let lower = arena.add_edge(v, bottom, winding, kind);
        insert_edge_below(arena, lower, v, c);
        insert_edge_above(arena, lower, bottom, c);
        set_bottom(arena, edge, v, active.as_deref_mut(), c);
        cleanup_active_edges(arena, edge, active.as_deref_mut(), c);
        fix_active_state(arena, lower, active.as_deref_mut(), c);
        merge_collinear_edges(arena, lower, active, c);
    }
}

/// After a split, a neighbour in the active list can end up on the wrong
/// side of the split vertex. Each violation is resolved by splitting the
/// offender at a vertex that lies on both edges, which closes the
/// fixpoint: repairs strictly shorten edges or replace crossing pairs
/// with pairs that share an endpoint.
fn cleanup_active_edges(
    arena: &mut Arena,
    edge: EdgeId,
    mut active: Option<&mut EdgeList>,
    c: Comparator,
) {
    let top = arena[edge].top;
    let bottom = arena[edge].bottom;
    if let Some(left) = arena[edge].left {
        let left_top = arena[left].top;
        let left_bottom = arena[left].bottom;
        if c.sweep_lt(arena[left_top].point, arena[top].point) && !arena.is_left_of(left, top) {
            split_edge(arena, left, top, active.as_deref_mut(), c);
        } else if c.sweep_lt(arena[top].point, arena[left_top].point)
            && !arena.is_right_of(edge, left_top)
        {
            split_edge(arena, edge, left_top, active.as_deref_mut(), c);
        } else if c.sweep_lt(arena[bottom].point, arena[left_bottom].point)
            && !arena.is_left_of(left, bottom)
        {
            split_edge(arena, left, bottom, active.as_deref_mut(), c);
        } else if c.sweep_lt(arena[left_bottom].point, arena[bottom].point)
            && !arena.is_right_of(edge, left_bottom)
        {
            split_edge(arena, edge, left_bottom, active.as_deref_mut(), c);
        }
    }
    if let Some(right) = arena[edge].right {
        let right_top = arena[right].top;
        let right_bottom = arena[right].bottom;
        if c.sweep_lt(arena[right_top].point, arena[top].point)
            && !arena.is_right_of(right, top)
        {
            split_edge(arena, right, top, active.as_deref_mut(), c);
        } else if c.sweep_lt(arena[top].point, arena[right_top].point)
            && !arena.is_left_of(edge, right_top)
        {
            split_edge(arena, edge, right_top, active.as_deref_mut(), c);
        } else if c.sweep_lt(arena[bottom].point, arena[right_bottom].point)
            && !arena.is_right_of(right, bottom)
        {
            split_edge(arena, right, bottom, active.as_deref_mut(), c);
        } else if c.sweep_lt(arena[right_bottom].point, arena[bottom].point)
            && !arena.is_left_of(edge, right_bottom)
        {
            split_edge(arena, edge, right_bottom, active, c);
        }
    }
}

/// Segment intersection in parametric form. The division is deferred
/// until both parameters are known to be in range, and the computation
/// stays in f64 until the final point is narrowed to f32.
pub(crate) fn intersect_edges(arena: &Arena, e: EdgeId, o: EdgeId) -> Option<(Point, u8)> {
    let edge = &arena[e];
    let other = &arena[o];
    if edge.top == other.top || edge.bottom == other.bottom {
        return None;
    }
    let denom = edge.line.a * other.line.b - edge.line.b * other.line.a;
    if denom == 0.0 {
        return None;
    }
    let e_top = arena[edge.top].point;
    let o_top = arena[other.top].point;
    let dx = o_top.x as f64 - e_top.x as f64;
    let dy = o_top.y as f64 - e_top.y as f64;
    let s_numer = dy * other.line.b + dx * other.line.a;
    let t_numer = dy * edge.line.b + dx * edge.line.a;
    // If s_numer / denom or t_numer / denom is outside [0, 1], exit before
    // doing the division.
    let out_of_range = if denom > 0.0 {
        s_numer < 0.0 || s_numer > denom || t_numer < 0.0 || t_numer > denom
    } else {
        s_numer > 0.0 || s_numer < denom || t_numer > 0.0 || t_numer < denom
    };
    if out_of_range {
        return None;
    }
    let s = s_numer / denom;
    debug_assert!((0.0..=1.0).contains(&s));
    let p = point(
        (e_top.x as f64 - s * edge.line.b) as f32,
        (e_top.y as f64 + s * edge.line.a) as f32,
    );
    let alpha = if edge.kind == EdgeType::Connector {
        let a0 = arena[edge.top].alpha as f64;
        let a1 = arena[edge.bottom].alpha as f64;
        ((1.0 - s) * a0 + s * a1) as u8
    } else if other.kind == EdgeType::Connector {
        let t = t_numer / denom;
        let a0 = arena[other.top].alpha as f64;
        let a1 = arena[other.bottom].alpha as f64;
        ((1.0 - t) * a0 + t * a1) as u8
    } else if edge.kind == EdgeType::Outer && other.kind == EdgeType::Outer {
        0
    } else {
        255
    };
    Some((p, alpha))
}

fn max_edge_alpha(arena: &Arena, a: EdgeId, b: EdgeId) -> u8 {
    let ea = &arena[a];
    let eb = &arena[b];
    if ea.kind == EdgeType::Inner || eb.kind == EdgeType::Inner {
        255
    } else if ea.kind == EdgeType::Outer && eb.kind == EdgeType::Outer {
        0
    } else {
        let a_alpha = arena[ea.top].alpha.max(arena[ea.bottom].alpha);
        let b_alpha = arena[eb.top].alpha.max(arena[eb.bottom].alpha);
        a_alpha.max(b_alpha)
    }
}

/// Tests a pair of edges for intersection, and on a hit splits both edges
/// at the intersection vertex, creating it if no coincident vertex exists
/// in the sorted mesh. Returns the intersection vertex.
pub(crate) fn check_for_intersection(
    arena: &mut Arena,
    edge: Option<EdgeId>,
    other: Option<EdgeId>,
    active: &mut EdgeList,
    c: Comparator,
) -> Option<VertexId> {
    let (edge, other) = match (edge, other) {
        (Some(e), Some(o)) => (e, o),
        _ => return None,
    };
    let (p, alpha) = intersect_edges(arena, edge, other)?;
    tess_log!("found intersection at {:?}", p);
    let edge_top = arena[edge].top;
    let edge_bottom = arena[edge].bottom;
    let other_top = arena[other].top;
    let other_bottom = arena[other].bottom;
    let v;
    if p == arena[edge_top].point || c.sweep_lt(p, arena[edge_top].point) {
        split_edge(arena, other, edge_top, Some(active), c);
        v = edge_top;
    } else if p == arena[edge_bottom].point || c.sweep_lt(arena[edge_bottom].point, p) {
        split_edge(arena, other, edge_bottom, Some(active), c);
        v = edge_bottom;
    } else if p == arena[other_top].point || c.sweep_lt(p, arena[other_top].point) {
        split_edge(arena, edge, other_top, Some(active), c);
        v = other_top;
    } else if p == arena[other_bottom].point || c.sweep_lt(arena[other_bottom].point, p) {
        split_edge(arena, edge, other_bottom, Some(active), c);
        v = other_bottom;
    } else {
        // Find the insertion position in the sorted mesh, walking from
        // the edge's top vertex.
        let mut next_v = edge_top;
        while c.sweep_lt(p, arena[next_v].point) {
            next_v = arena[next_v].prev.unwrap();
        }
        while c.sweep_lt(arena[next_v].point, p) {
            next_v = arena[next_v].next.unwrap();
        }
        let prev_v = arena[next_v].prev.unwrap();
        if arena[prev_v].point == p {
            v = prev_v;
        } else if arena[next_v].point == p {
            v = next_v;
        } else {
            v = arena.add_vertex(p, alpha);
            arena[v].prev = Some(prev_v);
            arena[v].next = Some(next_v);
            arena[prev_v].next = Some(v);
            arena[next_v].prev = Some(v);
        }
        split_edge(arena, edge, v, Some(active), c);
        split_edge(arena, other, v, Some(active), c);
    }
    let max = arena[v].alpha.max(alpha);
    arena[v].alpha = max;
    Some(v)
}

/// Snaps AA contours to the quarter-pixel grid and removes vertices
/// coincident with their ring predecessor, repeatedly, dropping contours
/// that empty out entirely.
pub(crate) fn sanitize_contours(
    arena: &mut Arena,
    contours: &mut [Option<VertexId>],
    approximate: bool,
) {
    for contour in contours.iter_mut() {
        let Some(head) = *contour else { continue };
        if approximate {
            let tail = arena[head].prev.unwrap();
            arena[tail].point = round_to_quarter_pixel(arena[tail].point);
        }
        let mut v = head;
        loop {
            if approximate {
                arena[v].point = round_to_quarter_pixel(arena[v].point);
            }
            let prev = arena[v].prev.unwrap();
            if arena[prev].point == arena[v].point {
                tess_log!("vertex {:?} coincident; removing", arena[v].point);
                if prev == v {
                    *contour = None;
                    break;
                }
                let next = arena[v].next.unwrap();
                arena[prev].next = Some(next);
                arena[next].prev = Some(prev);
                if *contour == Some(v) {
                    *contour = Some(prev);
                }
                v = prev;
            } else {
                v = arena[v].next.unwrap();
                if Some(v) == *contour {
                    break;
                }
            }
        }
    }
}

/// Transfers every edge of `src` onto `dst` and removes `src` from the
/// sorted mesh. Re-anchoring the edges recomputes their lines and
/// re-inserts them in order at the new endpoint.
fn merge_vertices(
    arena: &mut Arena,
    src: VertexId,
    dst: VertexId,
    mesh: &mut VertexList,
    c: Comparator,
) {
    tess_log!("merging coincident vertices at {:?}", arena[dst].point);
    let alpha = arena[src].alpha.max(arena[dst].alpha);
    arena[dst].alpha = alpha;
    let mut e = arena[src].first_edge_above;
    while let Some(edge) = e {
        let next = arena[edge].next_edge_above;
        set_bottom(arena, edge, dst, None, c);
        e = next;
    }
    let mut e = arena[src].first_edge_below;
    while let Some(edge) = e {
        let next = arena[edge].next_edge_below;
        set_top(arena, edge, dst, None, c);
        e = next;
    }
    mesh.remove(arena, src);
}

/// Walks the sorted list and coalesces vertices that share a position.
/// A vertex that sorts before its predecessor (possible after rounding)
/// is first snapped onto it.
pub(crate) fn merge_coincident_vertices(arena: &mut Arena, mesh: &mut VertexList, c: Comparator) {
    let Some(head) = mesh.head else { return };
    let mut v_opt = arena[head].next;
    while let Some(v) = v_opt {
        let prev = arena[v].prev.unwrap();
        if c.sweep_lt(arena[v].point, arena[prev].point) {
            let p = arena[prev].point;
            arena[v].point = p;
        }
        if arena[prev].point == arena[v].point {
            merge_vertices(arena, prev, v, mesh, c);
        }
        v_opt = arena[v].next;
    }
}

/// Stage 2: creates one inner edge per contour segment and re-threads
/// the contour rings into a single flat vertex list for sorting.
pub(crate) fn build_edges(
    arena: &mut Arena,
    contours: &[Option<VertexId>],
    mesh: &mut VertexList,
    c: Comparator,
) {
    let mut prev: Option<VertexId> = None;
    for &contour in contours {
        let Some(head) = contour else { continue };
        let mut v = head;
        loop {
            let ring_prev = arena[v].prev.unwrap();
            let ring_next = arena[v].next.unwrap();
            connect(arena, ring_prev, v, EdgeType::Inner, c, 1);
            match prev {
                Some(p) => {
                    arena[p].next = Some(v);
                    arena[v].prev = Some(p);
                }
                None => mesh.head = Some(v),
            }
            prev = Some(v);
            v = ring_next;
            if v == head {
                break;
            }
        }
    }
    if let Some(p) = prev {
        arena[p].next = None;
    }
    if let Some(h) = mesh.head {
        arena[h].prev = None;
    }
    mesh.tail = prev;
}

/// Stage 4: resolves every edge intersection, leaving a planar mesh.
pub(crate) fn simplify(arena: &mut Arena, vertices: &VertexList, c: Comparator) {
    tess_log!("simplifying complex polygons");
    let mut active = EdgeList::default();
    let mut v_opt = vertices.head;
    while let Some(mut v) = v_opt {
        if arena[v].first_edge_above.is_none() && arena[v].first_edge_below.is_none() {
            v_opt = arena[v].next;
            continue;
        }
        let mut left_enclosing;
        let mut right_enclosing;
        loop {
            let mut restart = false;
            let (l, r) = find_enclosing_edges(arena, v, &active);
            left_enclosing = l;
            right_enclosing = r;
            if arena[v].first_edge_below.is_some() {
                let mut e_opt = arena[v].first_edge_below;
                while let Some(e) = e_opt {
                    if check_for_intersection(arena, Some(e), l, &mut active, c).is_some() {
                        restart = true;
                        break;
                    }
                    if check_for_intersection(arena, Some(e), r, &mut active, c).is_some() {
                        restart = true;
                        break;
                    }
                    e_opt = arena[e].next_edge_below;
                }
            } else if let Some(pv) = check_for_intersection(arena, l, r, &mut active, c) {
                // The enclosing edges intersected above the current
                // vertex; rewind the sweep to the intersection.
                if c.sweep_lt(arena[pv].point, arena[v].point) {
                    v = pv;
                }
                restart = true;
            }
            if !restart {
                break;
            }
        }
        if arena[v].alpha == 0 {
            // A new vertex strictly inside the filled region gets full
            // coverage.
            if let (Some(l), Some(r)) = (left_enclosing, right_enclosing) {
                if arena[l].winding < 0 && arena[r].winding > 0 {
                    let alpha = max_edge_alpha(arena, l, r);
                    arena[v].alpha = alpha;
                }
            }
        }
        let mut e_opt = arena[v].first_edge_above;
        while let Some(e) = e_opt {
            remove_edge(arena, e, &mut active);
            e_opt = arena[e].next_edge_above;
        }
        let mut left_edge = left_enclosing;
        let mut e_opt = arena[v].first_edge_below;
        while let Some(e) = e_opt {
            insert_edge(arena, e, left_edge, &mut active);
            left_edge = Some(e);
            e_opt = arena[e].next_edge_below;
        }
        arena[v].processed = true;
        v_opt = arena[v].next;
    }
}
