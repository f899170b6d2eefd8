#![deny(bare_trait_objects)]
#![allow(clippy::float_cmp)]
#![allow(clippy::too_many_arguments)]

//! Tessellation of 2D path fills into triangles, for consumption by a GPU.
//!
//! There are six stages to the algorithm:
//!
//! 1. Linearize the path contours into piecewise linear segments.
//! 2. Build a mesh of edges connecting the vertices.
//! 3. Sort the vertices along the sweep direction (merge sort over the
//!    vertex list).
//! 4. Simplify the mesh by inserting new vertices at intersecting edges.
//! 5. Tessellate the simplified mesh into monotone polygons.
//! 6. Triangulate the monotone polygons directly into the caller's vertex
//!    buffer.
//!
//! For antialiasing, the algorithm is modified as follows: run stages 1–5
//! to produce polygons, apply the fill rule to extract boundary contours
//! from them, remove "pointy" vertices which would invert when offset,
//! then displace the boundary edges by half a pixel inward and outward
//! along their normals. The intersections of the displaced lines form a
//! new mesh whose exterior vertices carry zero alpha and whose interior
//! vertices carry full alpha; that mesh goes back through stages 3–6 and
//! the GPU interpolates coverage across the feathered rim.
//!
//! Stages 4 and 5 sweep an active edge list: the edges cut by the sweep
//! line, ordered left to right. The simplification stage is derived from
//! the Bentley–Ottmann line-sweep, but intersection points computed in
//! floating point are inexact and may violate the mesh topology or the
//! active edge list ordering. The topology is adjusted to match the
//! computed points instead: collinear edges are merged, neighbours are
//! split at the offending vertices, and edges are re-inserted until the
//! ordering holds. The orientation of the sweep is chosen from the aspect
//! ratio of the path bounds so that wide paths sweep along X.
//!
//! The two entry points are [`path_to_triangles`], which writes triangles
//! through a caller-supplied [`VertexAllocator`], and [`path_to_vertices`],
//! which returns `(position, winding)` triangles for the caller to filter.
//! Both are fail-soft: every recoverable error degrades to an empty
//! output.

pub use plume_path as path;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

pub use crate::path::geom;
pub use crate::path::math;
pub use crate::path::FillRule;

use crate::math::Point;

// A trace of the sweep, printed to stdout. Compiled out of release
// builds.
#[cfg(debug_assertions)]
macro_rules! tess_log {
    ($($arg:tt)*) => { std::println!($($arg)*) };
}
#[cfg(not(debug_assertions))]
macro_rules! tess_log {
    ($($arg:tt)*) => {};
}
pub(crate) use tess_log;

mod boundary;
mod emit;
mod flatten;
mod mesh;
mod simplify;
mod tessellate;
mod tessellator;

#[cfg(test)]
mod fill_tests;

pub use crate::emit::{vertex_stride, BufferVertexAllocator, VertexAllocator};
pub use crate::tessellator::{path_to_triangles, path_to_vertices};

/// The tessellator refuses paths whose worst-case flattened vertex count
/// exceeds this, so that emitted meshes stay indexable with 16 bits.
pub const MAX_VERTEX_COUNT: usize = 65536;

/// A 32-bit premultiplied RGBA color, 8 bits per channel, alpha in the
/// high byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Color(pub u32);

impl Color {
    /// Scales every channel by `(alpha + 1) / 256`.
    ///
    /// This is the byte-only approximation of multiplying by
    /// `alpha / 255`, applied pairwise to the interleaved channels.
    pub fn mul_alpha(self, alpha: u8) -> Color {
        let scale = alpha as u32 + 1;
        let rb = ((self.0 & 0x00ff_00ff) * scale) >> 8;
        let ag = ((self.0 >> 8) & 0x00ff_00ff) * scale;
        Color((rb & 0x00ff_00ff) | (ag & 0xff00_ff00))
    }
}

/// Parameters of the antialiased render mode.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct AntialiasOptions {
    /// Color written for every vertex.
    pub color: Color,

    /// When set, coverage is folded into the color's alpha instead of
    /// being emitted as a separate float attribute. Only valid when the
    /// color can absorb it (premultiplied blending).
    pub tweak_alpha: bool,
}

/// A triangle vertex produced by [`path_to_vertices`], tagged with the
/// winding number of the polygon it belongs to.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct WindingVertex {
    pub position: Point,
    pub winding: i32,
}

/// What [`path_to_triangles`] reports back.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TessellationOutput {
    /// Number of vertices written through the allocator (three per
    /// triangle).
    pub vertex_count: usize,

    /// True when the path contained no curve segments.
    pub is_linear: bool,
}

pub(crate) fn empty_output(is_linear: bool) -> TessellationOutput {
    TessellationOutput {
        vertex_count: 0,
        is_linear,
    }
}

#[cfg(test)]
mod color_tests {
    use super::Color;

    #[test]
    fn mul_alpha() {
        let c = Color(0xffff_ffff);
        assert_eq!(c.mul_alpha(255), c);
        assert_eq!(c.mul_alpha(0), Color(0));
        // Half alpha scales every channel by 128/256.
        assert_eq!(Color(0xff00_ff00).mul_alpha(127), Color(0x7f00_7f00));
    }
}
