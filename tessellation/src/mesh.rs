//! The vertex/edge mesh the sweeps operate on.
//!
//! Vertices and edges form a web of doubly-linked lists: the contour
//! rings (later re-used as the sweep-sorted vertex list), the per-vertex
//! lists of edges above and below, the active edge list, and the
//! monotone-polygon edge chains. All records live in append-only slabs
//! owned by an [`Arena`] and refer to each other through 32-bit index
//! handles, so the links never dangle and everything is freed at once
//! when the tessellation call returns.

use crate::math::{point, Box2D, Point};
use crate::tessellate::{MonotonePoly, Poly, Side};

use std::ops::{Index, IndexMut};

/// Slab growth granularity, in bytes per slab.
const ARENA_CHUNK_SIZE: usize = 16 * 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct VertexId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EdgeId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct PolyId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct MonoId(u32);

/// Whether the sweep advances along Y (vertical) or along X (horizontal).
///
/// Wide paths sweep horizontally with the secondary key *descending*, so
/// that "left" and "right" keep their meaning after the quarter turn:
/// edges on the left are increasing along the sweep, edges on the right
/// decreasing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Comparator {
    Vertical,
    Horizontal,
}

impl Comparator {
    pub fn of_bounds(bounds: &Box2D) -> Comparator {
        if bounds.width() > bounds.height() {
            Comparator::Horizontal
        } else {
            Comparator::Vertical
        }
    }

    #[inline]
    pub fn sweep_lt(self, a: Point, b: Point) -> bool {
        match self {
            Comparator::Horizontal => a.x < b.x || (a.x == b.x && a.y > b.y),
            Comparator::Vertical => a.y < b.y || (a.y == b.y && a.x < b.x),
        }
    }
}

/// Rounds to the nearest quarter pixel, the grid screen-space vertices
/// are snapped to so that coincidence checks terminate.
#[inline]
pub(crate) fn round_to_quarter_pixel(p: Point) -> Point {
    point(
        (p.x * 4.0 + 0.5).floor() * 0.25,
        (p.y * 4.0 + 0.5).floor() * 0.25,
    )
}

/// A line equation in implicit form: `a*x + b*y + c = 0` for all points
/// `(x, y)` on the line.
///
/// The coefficients are stored in double precision to avoid catastrophic
/// cancellation in the `dist` sign checks: as a polynomial of degree two
/// over f32 inputs, the result is then exact. Intersections are of higher
/// degree and remain inexact; the simplification sweep assumes their
/// output may be wrong and repairs the mesh topology to match.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Line {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Line {
    pub fn new(p: Point, q: Point) -> Line {
        Line {
            a: q.y as f64 - p.y as f64,
            b: p.x as f64 - q.x as f64,
            c: p.y as f64 * q.x as f64 - p.x as f64 * q.y as f64,
        }
    }

    #[inline]
    pub fn dist(&self, p: Point) -> f64 {
        self.a * p.x as f64 + self.b * p.y as f64 + self.c
    }

    #[inline]
    pub fn mag_sq(&self) -> f64 {
        self.a * self.a + self.b * self.b
    }

    /// Intersection of two infinite lines, snapped to the quarter-pixel
    /// grid. Returns `None` for parallel lines.
    pub fn intersect(&self, other: &Line) -> Option<Point> {
        let denom = self.a * other.b - self.b * other.a;
        if denom == 0.0 {
            return None;
        }
        let scale = 1.0 / denom;
        let p = point(
            ((self.b * other.c - other.b * self.c) * scale) as f32,
            ((other.a * self.c - self.a * other.c) * scale) as f32,
        );
        Some(round_to_quarter_pixel(p))
    }
}

/// Coverage class of an edge in the antialiased mesh.
///
/// Inner edges connect fully covered vertices, outer edges zero-coverage
/// ones, and connector edges join an outer vertex to an inner vertex,
/// interpolating coverage along their length. Non-AA meshes only contain
/// inner edges.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum EdgeType {
    Inner,
    Outer,
    Connector,
}

#[derive(Copy, Clone)]
pub(crate) struct Vertex {
    /// Position. Immutable except for coincidence snapping and AA
    /// inversion fixing.
    pub point: Point,
    pub alpha: u8,
    /// Contour ring link, then sweep-sorted list link, then monotone
    /// chain link during emission.
    pub prev: Option<VertexId>,
    pub next: Option<VertexId>,
    /// Edges whose bottom endpoint is this vertex, ordered left to right.
    pub first_edge_above: Option<EdgeId>,
    pub last_edge_above: Option<EdgeId>,
    /// Edges whose top endpoint is this vertex, ordered left to right.
    pub first_edge_below: Option<EdgeId>,
    pub last_edge_below: Option<EdgeId>,
    /// Whether the sweep has passed this vertex.
    pub processed: bool,
}

pub(crate) struct Edge {
    /// +1 when the contour ran top to bottom, -1 otherwise; accumulates
    /// when collinear edges merge.
    pub winding: i32,
    /// Endpoint that precedes the other in sweep order.
    pub top: VertexId,
    pub bottom: VertexId,
    pub kind: EdgeType,
    pub line: Line,
    /// Neighbours in the active edge list.
    pub left: Option<EdgeId>,
    pub right: Option<EdgeId>,
    /// Position in the bottom vertex's edges-above list.
    pub prev_edge_above: Option<EdgeId>,
    pub next_edge_above: Option<EdgeId>,
    /// Position in the top vertex's edges-below list.
    pub prev_edge_below: Option<EdgeId>,
    pub next_edge_below: Option<EdgeId>,
    /// Monotone polygons bordering each side, and this edge's position
    /// in their chains.
    pub left_poly: Option<PolyId>,
    pub right_poly: Option<PolyId>,
    pub left_poly_prev: Option<EdgeId>,
    pub left_poly_next: Option<EdgeId>,
    pub right_poly_prev: Option<EdgeId>,
    pub right_poly_next: Option<EdgeId>,
    pub used_in_left_poly: bool,
    pub used_in_right_poly: bool,
}

/// Owns every vertex, edge and polygon record of one tessellation call.
pub(crate) struct Arena {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    polys: Vec<Poly>,
    monos: Vec<MonotonePoly>,
}

impl Index<VertexId> for Arena {
    type Output = Vertex;
    #[inline]
    fn index(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0 as usize]
    }
}

impl IndexMut<VertexId> for Arena {
    #[inline]
    fn index_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.0 as usize]
    }
}

impl Index<EdgeId> for Arena {
    type Output = Edge;
    #[inline]
    fn index(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0 as usize]
    }
}

impl IndexMut<EdgeId> for Arena {
    #[inline]
    fn index_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.0 as usize]
    }
}

impl Index<PolyId> for Arena {
    type Output = Poly;
    #[inline]
    fn index(&self, id: PolyId) -> &Poly {
        &self.polys[id.0 as usize]
    }
}

impl IndexMut<PolyId> for Arena {
    #[inline]
    fn index_mut(&mut self, id: PolyId) -> &mut Poly {
        &mut self.polys[id.0 as usize]
    }
}

impl Index<MonoId> for Arena {
    type Output = MonotonePoly;
    #[inline]
    fn index(&self, id: MonoId) -> &MonotonePoly {
        &self.monos[id.0 as usize]
    }
}

impl IndexMut<MonoId> for Arena {
    #[inline]
    fn index_mut(&mut self, id: MonoId) -> &mut MonotonePoly {
        &mut self.monos[id.0 as usize]
    }
}

impl Arena {
    pub fn new() -> Arena {
        Arena {
            vertices: Vec::with_capacity(ARENA_CHUNK_SIZE / std::mem::size_of::<Vertex>()),
            edges: Vec::with_capacity(ARENA_CHUNK_SIZE / std::mem::size_of::<Edge>()),
            polys: Vec::new(),
            monos: Vec::new(),
        }
    }

    pub fn add_vertex(&mut self, point: Point, alpha: u8) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex {
            point,
            alpha,
            prev: None,
            next: None,
            first_edge_above: None,
            last_edge_above: None,
            first_edge_below: None,
            last_edge_below: None,
            processed: false,
        });
        id
    }

    pub fn add_edge(
        &mut self,
        top: VertexId,
        bottom: VertexId,
        winding: i32,
        kind: EdgeType,
    ) -> EdgeId {
        let line = Line::new(self[top].point, self[bottom].point);
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            winding,
            top,
            bottom,
            kind,
            line,
            left: None,
            right: None,
            prev_edge_above: None,
            next_edge_above: None,
            prev_edge_below: None,
            next_edge_below: None,
            left_poly: None,
            right_poly: None,
            left_poly_prev: None,
            left_poly_next: None,
            right_poly_prev: None,
            right_poly_next: None,
            used_in_left_poly: false,
            used_in_right_poly: false,
        });
        id
    }

    pub fn add_poly(&mut self, first_vertex: VertexId, winding: i32) -> PolyId {
        let id = PolyId(self.polys.len() as u32);
        self.polys.push(Poly {
            first_vertex,
            winding,
            head: None,
            tail: None,
            next: None,
            partner: None,
            count: 0,
        });
        id
    }

    pub fn add_mono(&mut self, side: Side) -> MonoId {
        let id = MonoId(self.monos.len() as u32);
        self.monos.push(MonotonePoly {
            side,
            first_edge: None,
            last_edge: None,
            prev: None,
            next: None,
        });
        id
    }

    #[inline]
    pub fn edge_dist(&self, e: EdgeId, p: Point) -> f64 {
        self[e].line.dist(p)
    }

    #[inline]
    pub fn is_left_of(&self, e: EdgeId, v: VertexId) -> bool {
        self.edge_dist(e, self[v].point) > 0.0
    }

    #[inline]
    pub fn is_right_of(&self, e: EdgeId, v: VertexId) -> bool {
        self.edge_dist(e, self[v].point) < 0.0
    }

    /// The line must be recomputed whenever an endpoint changes.
    pub fn recompute_line(&mut self, e: EdgeId) {
        let line = Line::new(self[self[e].top].point, self[self[e].bottom].point);
        self[e].line = line;
    }
}

/// A doubly-linked vertex list threaded through the vertices' `prev` and
/// `next` fields: contour rings, the sweep-sorted list, and the monotone
/// chains during emission.
#[derive(Copy, Clone, Default)]
pub(crate) struct VertexList {
    pub head: Option<VertexId>,
    pub tail: Option<VertexId>,
}

impl VertexList {
    pub fn insert(
        &mut self,
        arena: &mut Arena,
        v: VertexId,
        prev: Option<VertexId>,
        next: Option<VertexId>,
    ) {
        arena[v].prev = prev;
        arena[v].next = next;
        match prev {
            Some(p) => arena[p].next = Some(v),
            None => self.head = Some(v),
        }
        match next {
            Some(n) => arena[n].prev = Some(v),
            None => self.tail = Some(v),
        }
    }

    pub fn append(&mut self, arena: &mut Arena, v: VertexId) {
        let tail = self.tail;
        self.insert(arena, v, tail, None);
    }

    pub fn prepend(&mut self, arena: &mut Arena, v: VertexId) {
        let head = self.head;
        self.insert(arena, v, None, head);
    }

    pub fn remove(&mut self, arena: &mut Arena, v: VertexId) {
        let prev = arena[v].prev;
        let next = arena[v].next;
        match prev {
            Some(p) => arena[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => arena[n].prev = prev,
            None => self.tail = prev,
        }
        arena[v].prev = None;
        arena[v].next = None;
    }

    /// Links the tail back to the head, turning the list into a ring.
    pub fn close(&mut self, arena: &mut Arena) {
        if let (Some(head), Some(tail)) = (self.head, self.tail) {
            arena[tail].next = Some(head);
            arena[head].prev = Some(tail);
        }
    }
}

/// A doubly-linked edge list threaded through the edges' `left` and
/// `right` fields: the active edge list, and extracted boundaries.
#[derive(Copy, Clone, Default)]
pub(crate) struct EdgeList {
    pub head: Option<EdgeId>,
    pub tail: Option<EdgeId>,
}

impl EdgeList {
    pub fn insert(
        &mut self,
        arena: &mut Arena,
        e: EdgeId,
        prev: Option<EdgeId>,
        next: Option<EdgeId>,
    ) {
        arena[e].left = prev;
        arena[e].right = next;
        match prev {
            Some(p) => arena[p].right = Some(e),
            None => self.head = Some(e),
        }
        match next {
            Some(n) => arena[n].left = Some(e),
            None => self.tail = Some(e),
        }
    }

    pub fn append(&mut self, arena: &mut Arena, e: EdgeId) {
        let tail = self.tail;
        self.insert(arena, e, tail, None);
    }

    pub fn remove(&mut self, arena: &mut Arena, e: EdgeId) {
        let left = arena[e].left;
        let right = arena[e].right;
        match left {
            Some(l) => arena[l].right = right,
            None => self.head = right,
        }
        match right {
            Some(r) => arena[r].left = left,
            None => self.tail = left,
        }
        arena[e].left = None;
        arena[e].right = None;
    }

    pub fn contains(&self, arena: &Arena, e: EdgeId) -> bool {
        arena[e].left.is_some() || arena[e].right.is_some() || self.head == Some(e)
    }
}

/// Creates an edge between two contour-adjacent vertices, orienting it by
/// sweep order: winding is +1 when the traversal direction matches the
/// sweep, -1 otherwise.
pub(crate) fn new_edge(
    arena: &mut Arena,
    prev: VertexId,
    next: VertexId,
    kind: EdgeType,
    c: Comparator,
) -> EdgeId {
    let winding = if c.sweep_lt(arena[prev].point, arena[next].point) {
        1
    } else {
        -1
    };
    let (top, bottom) = if winding < 0 { (next, prev) } else { (prev, next) };
    arena.add_edge(top, bottom, winding, kind)
}

/// Inserts an edge into its bottom vertex's edges-above list, keeping the
/// list ordered left to right at the top endpoints. Degenerate edges
/// (backwards or zero-length in sweep order) are skipped.
pub(crate) fn insert_edge_above(arena: &mut Arena, e: EdgeId, v: VertexId, c: Comparator) {
    let top = arena[e].top;
    let bottom = arena[e].bottom;
    if arena[top].point == arena[bottom].point
        || c.sweep_lt(arena[bottom].point, arena[top].point)
    {
        return;
    }
    let mut prev: Option<EdgeId> = None;
    let mut next = arena[v].first_edge_above;
    while let Some(n) = next {
        if arena.is_right_of(n, top) {
            break;
        }
        prev = Some(n);
        next = arena[n].next_edge_above;
    }
    arena[e].prev_edge_above = prev;
    arena[e].next_edge_above = next;
    match prev {
        Some(p) => arena[p].next_edge_above = Some(e),
        None => arena[v].first_edge_above = Some(e),
    }
    match next {
        Some(n) => arena[n].prev_edge_above = Some(e),
        None => arena[v].last_edge_above = Some(e),
    }
}

/// Inserts an edge into its top vertex's edges-below list, ordered left to
/// right at the bottom endpoints.
pub(crate) fn insert_edge_below(arena: &mut Arena, e: EdgeId, v: VertexId, c: Comparator) {
    let top = arena[e].top;
    let bottom = arena[e].bottom;
    if arena[top].point == arena[bottom].point
        || c.sweep_lt(arena[bottom].point, arena[top].point)
    {
        return;
    }
    let mut prev: Option<EdgeId> = None;
    let mut next = arena[v].first_edge_below;
    while let Some(n) = next {
        if arena.is_right_of(n, bottom) {
            break;
        }
        prev = Some(n);
        next = arena[n].next_edge_below;
    }
    arena[e].prev_edge_below = prev;
    arena[e].next_edge_below = next;
    match prev {
        Some(p) => arena[p].next_edge_below = Some(e),
        None => arena[v].first_edge_below = Some(e),
    }
    match next {
        Some(n) => arena[n].prev_edge_below = Some(e),
        None => arena[v].last_edge_below = Some(e),
    }
}

pub(crate) fn remove_edge_above(arena: &mut Arena, e: EdgeId) {
    let v = arena[e].bottom;
    let prev = arena[e].prev_edge_above;
    let next = arena[e].next_edge_above;
    match prev {
        Some(p) => arena[p].next_edge_above = next,
        None => arena[v].first_edge_above = next,
    }
    match next {
        Some(n) => arena[n].prev_edge_above = prev,
        None => arena[v].last_edge_above = prev,
    }
    arena[e].prev_edge_above = None;
    arena[e].next_edge_above = None;
}

pub(crate) fn remove_edge_below(arena: &mut Arena, e: EdgeId) {
    let v = arena[e].top;
    let prev = arena[e].prev_edge_below;
    let next = arena[e].next_edge_below;
    match prev {
        Some(p) => arena[p].next_edge_below = next,
        None => arena[v].first_edge_below = next,
    }
    match next {
        Some(n) => arena[n].prev_edge_below = prev,
        None => arena[v].last_edge_below = prev,
    }
    arena[e].prev_edge_below = None;
    arena[e].next_edge_below = None;
}

/// Detaches an edge from both of its endpoints' edge lists.
pub(crate) fn disconnect(arena: &mut Arena, e: EdgeId) {
    remove_edge_above(arena, e);
    remove_edge_below(arena, e);
}

/// Removes an edge from the active edge list.
pub(crate) fn remove_edge(arena: &mut Arena, e: EdgeId, active: &mut EdgeList) {
    debug_assert!(active.contains(arena, e));
    active.remove(arena, e);
}

/// Inserts an edge into the active edge list, to the right of `prev`.
pub(crate) fn insert_edge(
    arena: &mut Arena,
    e: EdgeId,
    prev: Option<EdgeId>,
    active: &mut EdgeList,
) {
    debug_assert!(!active.contains(arena, e));
    let next = match prev {
        Some(p) => arena[p].right,
        None => active.head,
    };
    active.insert(arena, e, prev, next);
}

/// Bottom-up stable merge sort of the vertex list in sweep order.
///
/// Merge sort because it is O(n log n) on linked lists without an
/// auxiliary array, and stable so that coincident vertices stay adjacent
/// for the merge pass that follows.
pub(crate) fn merge_sort(arena: &mut Arena, vertices: &mut VertexList, c: Comparator) {
    let Some(mut slow) = vertices.head else {
        return;
    };
    if arena[slow].next.is_none() {
        return;
    }

    // Find the midpoint with the slow/fast iterator pair.
    let mut fast = arena[slow].next;
    while let Some(f) = fast {
        fast = arena[f].next;
        if let Some(f2) = fast {
            fast = arena[f2].next;
            slow = arena[slow].next.unwrap();
        }
    }

    let mut front = VertexList {
        head: vertices.head,
        tail: Some(slow),
    };
    let mut back = VertexList {
        head: arena[slow].next,
        tail: vertices.tail,
    };
    arena[slow].next = None;
    if let Some(bh) = back.head {
        arena[bh].prev = None;
    }

    merge_sort(arena, &mut front, c);
    merge_sort(arena, &mut back, c);

    *vertices = VertexList::default();
    let mut a = front.head;
    let mut b = back.head;
    loop {
        match (a, b) {
            (Some(av), Some(bv)) => {
                if c.sweep_lt(arena[av].point, arena[bv].point) {
                    let next = arena[av].next;
                    vertices.append(arena, av);
                    a = next;
                } else {
                    let next = arena[bv].next;
                    vertices.append(arena, bv);
                    b = next;
                }
            }
            _ => break,
        }
    }
    // Re-attach whichever run remains; its internal links are intact.
    if let Some(av) = a {
        let next = arena[av].next;
        let tail = vertices.tail;
        vertices.insert(arena, av, tail, next);
    }
    if let Some(bv) = b {
        let next = arena[bv].next;
        let tail = vertices.tail;
        vertices.insert(arena, bv, tail, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_order() {
        let c = Comparator::Vertical;
        assert!(c.sweep_lt(point(0.0, 0.0), point(0.0, 1.0)));
        assert!(c.sweep_lt(point(0.0, 0.0), point(1.0, 0.0)));
        assert!(!c.sweep_lt(point(1.0, 0.0), point(0.0, 0.0)));

        // The horizontal sweep breaks ties with Y *descending*.
        let c = Comparator::Horizontal;
        assert!(c.sweep_lt(point(0.0, 0.0), point(1.0, 0.0)));
        assert!(c.sweep_lt(point(0.0, 1.0), point(0.0, 0.0)));
    }

    #[test]
    fn quarter_pixel_rounding() {
        assert_eq!(round_to_quarter_pixel(point(0.1, 0.2)), point(0.0, 0.25));
        assert_eq!(round_to_quarter_pixel(point(1.0, -1.0)), point(1.0, -1.0));
        assert_eq!(round_to_quarter_pixel(point(0.3, 0.9)), point(0.25, 1.0));
    }

    #[test]
    fn line_sides() {
        // A vertical line through x = 1, oriented downward. A positive
        // distance means the line is left of the query point.
        let l = Line::new(point(1.0, 0.0), point(1.0, 10.0));
        assert!(l.dist(point(2.0, 5.0)) > 0.0);
        assert!(l.dist(point(0.0, 5.0)) < 0.0);
        assert_eq!(l.dist(point(1.0, 3.0)), 0.0);
    }

    #[test]
    fn line_intersection() {
        let a = Line::new(point(0.0, 0.0), point(10.0, 10.0));
        let b = Line::new(point(10.0, 0.0), point(0.0, 10.0));
        assert_eq!(a.intersect(&b), Some(point(5.0, 5.0)));
        let parallel = Line::new(point(0.0, 1.0), point(10.0, 11.0));
        assert_eq!(a.intersect(&parallel), None);
    }

    #[test]
    fn sort_vertices() {
        let mut arena = Arena::new();
        let mut list = VertexList::default();
        let pts = [
            point(3.0, 2.0),
            point(0.0, 0.0),
            point(1.0, 5.0),
            point(1.0, 2.0),
            point(0.5, 2.0),
        ];
        for &p in &pts {
            let v = arena.add_vertex(p, 255);
            list.append(&mut arena, v);
        }
        merge_sort(&mut arena, &mut list, Comparator::Vertical);

        let mut sorted = Vec::new();
        let mut v = list.head;
        while let Some(id) = v {
            sorted.push(arena[id].point);
            v = arena[id].next;
        }
        assert_eq!(
            sorted,
            vec![
                point(0.0, 0.0),
                point(0.5, 2.0),
                point(1.0, 2.0),
                point(3.0, 2.0),
                point(1.0, 5.0),
            ]
        );
    }
}
