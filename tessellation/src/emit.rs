//! Stage 6: triangulate the monotone polygons into the output buffer.
//!
//! Each monotone piece is triangulated with a linear ear-walk along its
//! active side: at every reflex-free vertex the triangle it forms with
//! its neighbours is emitted and the vertex removed from the chain.

use crate::math::Point;
use crate::mesh::{Arena, MonoId, PolyId, Vertex, VertexList};
use crate::path::FillRule;
use crate::tessellate::Side;
use crate::{AntialiasOptions, WindingVertex};

/// Destination of the emitted vertices: a GPU-mappable buffer handed out
/// by the caller.
///
/// `lock` is called once per tessellation, after the vertex count is
/// known; `unlock` reports how many vertices were actually written
/// (always at most the locked count).
pub trait VertexAllocator {
    /// Acquires a buffer with room for `count` vertices of `stride()`
    /// bytes each, or `None` when the allocation fails.
    fn lock(&mut self, count: usize) -> Option<&mut [u8]>;

    /// Commits the number of vertices actually written.
    fn unlock(&mut self, actual_count: usize);

    /// Bytes per vertex.
    fn stride(&self) -> usize;
}

/// Byte size of the vertex layout for a given mode: position, position
/// plus color, or position plus color plus coverage.
pub fn vertex_stride(antialias: Option<&AntialiasOptions>) -> usize {
    match antialias {
        None => 8,
        Some(aa) if aa.tweak_alpha => 12,
        Some(_) => 16,
    }
}

/// A heap-backed [`VertexAllocator`], convenient for tests and software
/// consumers.
pub struct BufferVertexAllocator {
    stride: usize,
    buffer: Vec<u8>,
    vertex_count: usize,
}

impl BufferVertexAllocator {
    pub fn new(stride: usize) -> BufferVertexAllocator {
        BufferVertexAllocator {
            stride,
            buffer: Vec::new(),
            vertex_count: 0,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Decodes the positions back out of the buffer.
    pub fn positions(&self) -> Vec<Point> {
        let mut positions = Vec::with_capacity(self.vertex_count);
        for i in 0..self.vertex_count {
            let at = i * self.stride;
            let x = f32::from_ne_bytes(self.buffer[at..at + 4].try_into().unwrap());
            let y = f32::from_ne_bytes(self.buffer[at + 4..at + 8].try_into().unwrap());
            positions.push(Point::new(x, y));
        }
        positions
    }

    /// Decodes the color attribute, when the layout has one.
    pub fn colors(&self) -> Vec<u32> {
        assert!(self.stride >= 12);
        (0..self.vertex_count)
            .map(|i| {
                let at = i * self.stride + 8;
                u32::from_ne_bytes(self.buffer[at..at + 4].try_into().unwrap())
            })
            .collect()
    }

    /// Decodes the coverage attribute, when the layout has one.
    pub fn coverages(&self) -> Vec<f32> {
        assert!(self.stride >= 16);
        (0..self.vertex_count)
            .map(|i| {
                let at = i * self.stride + 12;
                f32::from_ne_bytes(self.buffer[at..at + 4].try_into().unwrap())
            })
            .collect()
    }
}

impl VertexAllocator for BufferVertexAllocator {
    fn lock(&mut self, count: usize) -> Option<&mut [u8]> {
        self.buffer.resize(count * self.stride, 0);
        Some(&mut self.buffer[..])
    }

    fn unlock(&mut self, actual_count: usize) {
        self.vertex_count = actual_count;
        self.buffer.truncate(actual_count * self.stride);
    }

    fn stride(&self) -> usize {
        self.stride
    }
}

/// Where emitted triangles go.
pub(crate) trait VertexSink {
    fn begin_poly(&mut self, _winding: i32) {}
    fn triangle(&mut self, a: &Vertex, b: &Vertex, c: &Vertex);
}

fn put_f32(buffer: &mut [u8], at: usize, value: f32) {
    buffer[at..at + 4].copy_from_slice(&value.to_ne_bytes());
}

fn put_u32(buffer: &mut [u8], at: usize, value: u32) {
    buffer[at..at + 4].copy_from_slice(&value.to_ne_bytes());
}

/// Writes vertices into the locked buffer, in the layout selected by the
/// AA mode.
pub(crate) struct BufferSink<'l> {
    buffer: &'l mut [u8],
    cursor: usize,
    stride: usize,
    antialias: Option<AntialiasOptions>,
    pub vertex_count: usize,
}

impl<'l> BufferSink<'l> {
    pub fn new(
        buffer: &'l mut [u8],
        stride: usize,
        antialias: Option<AntialiasOptions>,
    ) -> BufferSink<'l> {
        BufferSink {
            buffer,
            cursor: 0,
            stride,
            antialias,
            vertex_count: 0,
        }
    }

    fn push_vertex(&mut self, v: &Vertex) {
        let at = self.cursor;
        if at + self.stride > self.buffer.len() {
            debug_assert!(false, "vertex buffer overflow");
            return;
        }
        put_f32(self.buffer, at, v.point.x);
        put_f32(self.buffer, at + 4, v.point.y);
        if let Some(aa) = self.antialias {
            if aa.tweak_alpha {
                put_u32(self.buffer, at + 8, aa.color.mul_alpha(v.alpha).0);
            } else {
                put_u32(self.buffer, at + 8, aa.color.0);
                put_f32(self.buffer, at + 12, v.alpha as f32 / 255.0);
            }
        }
        self.cursor += self.stride;
        self.vertex_count += 1;
    }
}

impl<'l> VertexSink for BufferSink<'l> {
    fn triangle(&mut self, a: &Vertex, b: &Vertex, c: &Vertex) {
        self.push_vertex(a);
        self.push_vertex(b);
        self.push_vertex(c);
    }
}

/// Collects `(position, winding)` vertices for [`crate::path_to_vertices`].
pub(crate) struct WindingSink {
    pub vertices: Vec<WindingVertex>,
    winding: i32,
}

impl WindingSink {
    pub fn new() -> WindingSink {
        WindingSink {
            vertices: Vec::new(),
            winding: 0,
        }
    }
}

impl VertexSink for WindingSink {
    fn begin_poly(&mut self, winding: i32) {
        self.winding = winding;
    }

    fn triangle(&mut self, a: &Vertex, b: &Vertex, c: &Vertex) {
        for v in [a, b, c] {
            self.vertices.push(WindingVertex {
                position: v.point,
                winding: self.winding,
            });
        }
    }
}

/// Triangulates one monotone piece.
///
/// The piece's vertices are first re-threaded into a chain running along
/// the active side, then ears are clipped in a single pass: whenever the
/// triangle (prev, curr, next) has non-negative signed area, it is
/// emitted and `curr` removed, backtracking one vertex to catch ears the
/// removal exposed.
fn emit_monotone(arena: &mut Arena, m: MonoId, sink: &mut dyn VertexSink) {
    let Some(first_edge) = arena[m].first_edge else {
        return;
    };
    let side = arena[m].side;
    let mut chain = VertexList::default();
    let top = arena[first_edge].top;
    chain.append(arena, top);
    let mut e_opt = Some(first_edge);
    while let Some(e) = e_opt {
        let bottom = arena[e].bottom;
        match side {
            Side::Right => {
                chain.append(arena, bottom);
                e_opt = arena[e].right_poly_next;
            }
            Side::Left => {
                chain.prepend(arena, bottom);
                e_opt = arena[e].left_poly_next;
            }
        }
    }

    let first = chain.head.unwrap();
    let mut v_opt = arena[first].next;
    while v_opt != chain.tail {
        let v = v_opt.unwrap();
        let prev = arena[v].prev.unwrap();
        let next = arena[v].next.unwrap();
        let a = arena[prev].point;
        let b = arena[v].point;
        let c = arena[next].point;
        let ax = b.x as f64 - a.x as f64;
        let ay = b.y as f64 - a.y as f64;
        let bx = c.x as f64 - b.x as f64;
        let by = c.y as f64 - b.y as f64;
        if ax * by - ay * bx >= 0.0 {
            let va = arena[prev];
            let vb = arena[v];
            let vc = arena[next];
            sink.triangle(&va, &vb, &vc);
            arena[prev].next = Some(next);
            arena[next].prev = Some(prev);
            v_opt = if prev == first { Some(next) } else { Some(prev) };
        } else {
            v_opt = Some(next);
        }
    }
}

fn emit_poly(arena: &mut Arena, poly: PolyId, sink: &mut dyn VertexSink) {
    if arena[poly].count < 3 {
        return;
    }
    let mut m_opt = arena[poly].head;
    while let Some(m) = m_opt {
        emit_monotone(arena, m, sink);
        m_opt = arena[m].next;
    }
}

/// Number of vertices `polys_to_triangles` will emit: three per triangle,
/// `count - 2` triangles per polygon passing the fill rule.
pub(crate) fn count_emitted_vertices(
    arena: &Arena,
    polys: Option<PolyId>,
    fill_rule: FillRule,
) -> usize {
    let mut count = 0;
    let mut p_opt = polys;
    while let Some(p) = p_opt {
        let poly = &arena[p];
        if fill_rule.is_in(poly.winding) && poly.count >= 3 {
            count += (poly.count as usize - 2) * 3;
        }
        p_opt = poly.next;
    }
    count
}

/// Emits every polygon that passes the fill rule.
pub(crate) fn polys_to_triangles(
    arena: &mut Arena,
    polys: Option<PolyId>,
    fill_rule: FillRule,
    sink: &mut dyn VertexSink,
) {
    let mut p_opt = polys;
    while let Some(p) = p_opt {
        let winding = arena[p].winding;
        if fill_rule.is_in(winding) {
            sink.begin_poly(winding);
            emit_poly(arena, p, sink);
        }
        p_opt = arena[p].next;
    }
}

/// Emits every polygon, unfiltered, tagged with its winding number.
pub(crate) fn polys_to_winding_vertices(
    arena: &mut Arena,
    polys: Option<PolyId>,
) -> Vec<WindingVertex> {
    let mut sink = WindingSink::new();
    let mut p_opt = polys;
    while let Some(p) = p_opt {
        let winding = arena[p].winding;
        sink.begin_poly(winding);
        emit_poly(arena, p, &mut sink);
        p_opt = arena[p].next;
    }
    sink.vertices
}
