//! Stage 5: partition the planar mesh into monotone polygons.
//!
//! A second sweep over the simplified mesh assigns to every edge the
//! polygon bordering each of its sides. Each polygon is a chain of
//! monotone pieces, split wherever the boundary switches sides; a "join"
//! edge is injected at each switch so that every piece stays monotone in
//! the sweep direction and triangulates in linear time.

use crate::mesh::{insert_edge, remove_edge, Arena, EdgeId, EdgeList, EdgeType, MonoId, PolyId, VertexId, VertexList};
use crate::simplify::find_enclosing_edges;
use crate::tess_log;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// One monotone piece of a polygon: a chain of edges all bordering the
/// polygon on the same side.
pub(crate) struct MonotonePoly {
    pub side: Side,
    pub first_edge: Option<EdgeId>,
    pub last_edge: Option<EdgeId>,
    pub prev: Option<MonoId>,
    pub next: Option<MonoId>,
}

/// A maximal region of consistent winding number, as a list of monotone
/// pieces.
pub(crate) struct Poly {
    pub first_vertex: VertexId,
    pub winding: i32,
    pub head: Option<MonoId>,
    pub tail: Option<MonoId>,
    /// Global polygon list.
    pub next: Option<PolyId>,
    /// The polygon on the other side of a merge vertex; the two will be
    /// joined by the next join edge reaching their common bottom.
    pub partner: Option<PolyId>,
    /// Number of vertices across all pieces.
    pub count: i32,
}

/// Appends an edge to a monotone piece's chain, on the piece's side.
fn mono_add_edge(arena: &mut Arena, m: MonoId, edge: EdgeId) {
    let side = arena[m].side;
    let prev = arena[m].last_edge;
    match side {
        Side::Right => {
            debug_assert!(!arena[edge].used_in_right_poly);
            arena[edge].right_poly_prev = prev;
            arena[edge].right_poly_next = None;
            match prev {
                Some(p) => arena[p].right_poly_next = Some(edge),
                None => arena[m].first_edge = Some(edge),
            }
            arena[m].last_edge = Some(edge);
            arena[edge].used_in_right_poly = true;
        }
        Side::Left => {
            debug_assert!(!arena[edge].used_in_left_poly);
            arena[edge].left_poly_prev = prev;
            arena[edge].left_poly_next = None;
            match prev {
                Some(p) => arena[p].left_poly_next = Some(edge),
                None => arena[m].first_edge = Some(edge),
            }
            arena[m].last_edge = Some(edge);
            arena[edge].used_in_left_poly = true;
        }
    }
}

fn make_mono(arena: &mut Arena, edge: EdgeId, side: Side) -> MonoId {
    let m = arena.add_mono(side);
    mono_add_edge(arena, m, edge);
    m
}

/// Bottom-most vertex reached by the polygon so far.
pub(crate) fn poly_last_vertex(arena: &Arena, poly: PolyId) -> VertexId {
    match arena[poly].tail {
        Some(tail) => arena[arena[tail].last_edge.unwrap()].bottom,
        None => arena[poly].first_vertex,
    }
}

/// Adds an edge to the polygon on the given side.
///
/// The edge is appended to the current monotone piece when the side
/// matches; otherwise a join edge from the piece's bottom vertex is
/// injected and a new piece is started (or, at a pending merge, the
/// partner polygon takes over). Returns the polygon further edges on
/// this side should go to.
pub(crate) fn poly_add_edge(arena: &mut Arena, poly: PolyId, e: EdgeId, side: Side) -> PolyId {
    tess_log!("add edge {:?} to poly {:?}, {:?} side", e, poly, side);
    let used = match side {
        Side::Right => arena[e].used_in_right_poly,
        Side::Left => arena[e].used_in_left_poly,
    };
    if used {
        return poly;
    }
    let partner = arena[poly].partner;
    if let Some(p) = partner {
        arena[poly].partner = None;
        arena[p].partner = None;
    }
    let tail = arena[poly].tail;
    match tail {
        None => {
            let m = make_mono(arena, e, side);
            arena[poly].head = Some(m);
            arena[poly].tail = Some(m);
            arena[poly].count += 2;
            poly
        }
        Some(tail) => {
            let tail_last_bottom = arena[arena[tail].last_edge.unwrap()].bottom;
            if arena[e].bottom == tail_last_bottom {
                poly
            } else if side == arena[tail].side {
                mono_add_edge(arena, tail, e);
                arena[poly].count += 1;
                poly
            } else {
                let bottom = arena[e].bottom;
                let join = arena.add_edge(tail_last_bottom, bottom, 1, EdgeType::Inner);
                mono_add_edge(arena, tail, join);
                arena[poly].count += 1;
                if let Some(p) = partner {
                    poly_add_edge(arena, p, join, side);
                    p
                } else {
                    let m = make_mono(arena, join, side);
                    arena[m].prev = Some(tail);
                    arena[tail].next = Some(m);
                    arena[poly].tail = Some(m);
                    poly
                }
            }
        }
    }
}

fn new_poly(arena: &mut Arena, head: &mut Option<PolyId>, v: VertexId, winding: i32) -> PolyId {
    let poly = arena.add_poly(v, winding);
    arena[poly].next = *head;
    *head = Some(poly);
    poly
}

/// The tessellation sweep. The mesh is planar at this point, so no
/// intersection handling: each vertex connects the polygons bordering
/// its above-edges to those its below-edges will border.
pub(crate) fn tessellate(arena: &mut Arena, vertices: &VertexList) -> Option<PolyId> {
    tess_log!("tessellating simple polygons");
    let mut active = EdgeList::default();
    let mut polys: Option<PolyId> = None;
    let mut v_opt = vertices.head;
    while let Some(v) = v_opt {
        if arena[v].first_edge_above.is_none() && arena[v].first_edge_below.is_none() {
            v_opt = arena[v].next;
            continue;
        }
        let (left_enclosing, right_enclosing) = find_enclosing_edges(arena, v, &active);
        let mut left_poly: Option<PolyId>;
        let mut right_poly: Option<PolyId>;
        if arena[v].first_edge_above.is_some() {
            left_poly = arena[arena[v].first_edge_above.unwrap()].left_poly;
            right_poly = arena[arena[v].last_edge_above.unwrap()].right_poly;
        } else {
            left_poly = left_enclosing.and_then(|e| arena[e].right_poly);
            right_poly = right_enclosing.and_then(|e| arena[e].left_poly);
        }

        if let (Some(first_above), Some(last_above)) =
            (arena[v].first_edge_above, arena[v].last_edge_above)
        {
            if let Some(lp) = left_poly {
                left_poly = Some(poly_add_edge(arena, lp, first_above, Side::Right));
            }
            if let Some(rp) = right_poly {
                right_poly = Some(poly_add_edge(arena, rp, last_above, Side::Left));
            }
            let mut e = first_above;
            while e != last_above {
                let right_edge = arena[e].next_edge_above.unwrap();
                debug_assert!(arena.is_right_of(right_edge, arena[e].top));
                remove_edge(arena, e, &mut active);
                if let Some(rp) = arena[e].right_poly {
                    poly_add_edge(arena, rp, e, Side::Left);
                }
                let right_left_poly = arena[right_edge].left_poly;
                if right_left_poly.is_some() && right_left_poly != arena[e].right_poly {
                    poly_add_edge(arena, right_left_poly.unwrap(), e, Side::Right);
                }
                e = right_edge;
            }
            remove_edge(arena, last_above, &mut active);
            if arena[v].first_edge_below.is_none() {
                // A merge vertex: the two flanking polygons will fuse
                // when a later join edge reaches their common bottom.
                if let (Some(lp), Some(rp)) = (left_poly, right_poly) {
                    if lp != rp {
                        debug_assert!(
                            arena[lp].partner.is_none() && arena[rp].partner.is_none()
                        );
                        arena[rp].partner = Some(lp);
                        arena[lp].partner = Some(rp);
                    }
                }
            }
        }

        if let Some(first_below) = arena[v].first_edge_below {
            if arena[v].first_edge_above.is_none() {
                // A split vertex inside a polygon: divide it in two with
                // a join edge down to the current vertex.
                if let (Some(lp0), Some(rp0)) = (left_poly, right_poly) {
                    let mut lp = lp0;
                    let mut rp = rp0;
                    if lp == rp {
                        let tail_side = arena[lp].tail.map(|t| arena[t].side);
                        if tail_side == Some(Side::Left) {
                            let last = poly_last_vertex(arena, lp);
                            let winding = arena[lp].winding;
                            lp = new_poly(arena, &mut polys, last, winding);
                            arena[left_enclosing.unwrap()].right_poly = Some(lp);
                        } else {
                            let last = poly_last_vertex(arena, rp);
                            let winding = arena[rp].winding;
                            rp = new_poly(arena, &mut polys, last, winding);
                            arena[right_enclosing.unwrap()].left_poly = Some(rp);
                        }
                    }
                    let last = poly_last_vertex(arena, lp);
                    let join = arena.add_edge(last, v, 1, EdgeType::Inner);
                    lp = poly_add_edge(arena, lp, join, Side::Right);
                    rp = poly_add_edge(arena, rp, join, Side::Left);
                    left_poly = Some(lp);
                    right_poly = Some(rp);
                }
            }
            arena[first_below].left_poly = left_poly;
            insert_edge(arena, first_below, left_enclosing, &mut active);
            let mut left_edge = first_below;
            let mut right_opt = arena[left_edge].next_edge_below;
            while let Some(right_edge) = right_opt {
                insert_edge(arena, right_edge, Some(left_edge), &mut active);
                let mut winding = arena[left_edge]
                    .left_poly
                    .map_or(0, |p| arena[p].winding);
                winding += arena[left_edge].winding;
                if winding != 0 {
                    let poly = new_poly(arena, &mut polys, v, winding);
                    arena[left_edge].right_poly = Some(poly);
                    arena[right_edge].left_poly = Some(poly);
                }
                left_edge = right_edge;
                right_opt = arena[left_edge].next_edge_below;
            }
            let last_below = arena[v].last_edge_below.unwrap();
            arena[last_below].right_poly = right_poly;
        }
        v_opt = arena[v].next;
    }
    polys
}
