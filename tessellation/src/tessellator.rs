//! Stage plumbing and the public entry points.

use crate::boundary::extract_boundaries;
use crate::emit::{
    count_emitted_vertices, polys_to_triangles, polys_to_winding_vertices, vertex_stride,
    BufferSink, VertexAllocator,
};
use crate::flatten::{path_to_contours, worst_case_vertex_count};
use crate::math::Box2D;
use crate::mesh::{merge_sort, Arena, Comparator, PolyId, VertexId, VertexList};
use crate::path::{FillRule, Path};
use crate::simplify::{build_edges, merge_coincident_vertices, sanitize_contours, simplify};
use crate::tessellate::tessellate;
use crate::{
    empty_output, AntialiasOptions, TessellationOutput, WindingVertex, MAX_VERTEX_COUNT,
};

/// Stages 3 and 4: sort the vertices in sweep order, coalesce coincident
/// ones, and resolve every intersection.
fn sort_and_simplify(arena: &mut Arena, vertices: &mut VertexList, c: Comparator) {
    if vertices.head.is_none() {
        return;
    }
    merge_sort(arena, vertices, c);
    merge_coincident_vertices(arena, vertices, c);
    simplify(arena, vertices, c);
}

/// Stages 2–5 (and 5-AA): turns flattened contours into the list of
/// monotone polygons.
fn contours_to_polys(
    arena: &mut Arena,
    contours: &mut [Option<VertexId>],
    fill_rule: FillRule,
    path_bounds: &Box2D,
    antialias: bool,
) -> Option<PolyId> {
    let c = Comparator::of_bounds(path_bounds);
    let mut mesh = VertexList::default();
    sanitize_contours(arena, contours, antialias);
    build_edges(arena, contours, &mut mesh, c);
    sort_and_simplify(arena, &mut mesh, c);
    if antialias {
        let mut aa_mesh = VertexList::default();
        extract_boundaries(arena, &mesh, &mut aa_mesh, fill_rule, c);
        sort_and_simplify(arena, &mut aa_mesh, c);
        tessellate(arena, &aa_mesh)
    } else {
        tessellate(arena, &mesh)
    }
}

fn path_to_polys(
    arena: &mut Arena,
    path: &Path,
    tolerance: f32,
    clip_bounds: &Box2D,
    antialias: bool,
) -> (Option<PolyId>, bool) {
    let (mut contours, is_linear) = path_to_contours(arena, path, tolerance, clip_bounds);
    let polys = contours_to_polys(
        arena,
        &mut contours,
        path.fill_rule(),
        &path.bounds(),
        antialias,
    );
    (polys, is_linear)
}

/// Tessellates a path fill into triangles, written through the caller's
/// allocator.
///
/// When `antialias` is set, the mesh is feathered by half a pixel and
/// each vertex carries the configured color, with coverage either folded
/// into the color's alpha (`tweak_alpha`) or appended as a float
/// attribute. The fill rule travels on the path; `clip_bounds` is only
/// used by the inverse fill rules.
///
/// This entry point is fail-soft: oversized paths, degenerate input and
/// allocation failures all produce an empty output rather than an error.
pub fn path_to_triangles(
    path: &Path,
    tolerance: f32,
    clip_bounds: &Box2D,
    allocator: &mut dyn VertexAllocator,
    antialias: Option<AntialiasOptions>,
) -> TessellationOutput {
    let worst_case = worst_case_vertex_count(path, tolerance);
    if worst_case == 0 {
        return empty_output(true);
    }
    if worst_case > MAX_VERTEX_COUNT {
        log::warn!("path not tessellated, too many verts ({worst_case})");
        return empty_output(true);
    }

    let mut arena = Arena::new();
    let (polys, is_linear) =
        path_to_polys(&mut arena, path, tolerance, clip_bounds, antialias.is_some());
    // In AA mode the path's fill rule was already applied during boundary
    // extraction, and the feathered mesh is wound for non-zero.
    let fill_rule = if antialias.is_some() {
        FillRule::NonZero
    } else {
        path.fill_rule()
    };
    let count = count_emitted_vertices(&arena, polys, fill_rule);
    if count == 0 {
        return empty_output(is_linear);
    }

    let stride = allocator.stride();
    debug_assert!(stride >= vertex_stride(antialias.as_ref()));
    let actual_count;
    {
        let Some(buffer) = allocator.lock(count) else {
            log::warn!("could not allocate vertices");
            return empty_output(is_linear);
        };
        let mut sink = BufferSink::new(buffer, stride, antialias);
        polys_to_triangles(&mut arena, polys, fill_rule, &mut sink);
        actual_count = sink.vertex_count;
    }
    debug_assert!(actual_count <= count);
    allocator.unlock(actual_count);

    TessellationOutput {
        vertex_count: actual_count,
        is_linear,
    }
}

/// Tessellates a path fill into `(position, winding)` triangles, without
/// applying the fill rule: every polygon is emitted with its winding
/// number and callers select the ones they want.
pub fn path_to_vertices(path: &Path, tolerance: f32, clip_bounds: &Box2D) -> Vec<WindingVertex> {
    let worst_case = worst_case_vertex_count(path, tolerance);
    if worst_case == 0 {
        return Vec::new();
    }
    if worst_case > MAX_VERTEX_COUNT {
        log::warn!("path not tessellated, too many verts ({worst_case})");
        return Vec::new();
    }

    let mut arena = Arena::new();
    let (polys, _) = path_to_polys(&mut arena, path, tolerance, clip_bounds, false);
    polys_to_winding_vertices(&mut arena, polys)
}
