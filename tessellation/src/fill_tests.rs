use crate::math::{point, Box2D, Point};
use crate::path::{FillRule, Path};
use crate::{
    path_to_triangles, path_to_vertices, vertex_stride, AntialiasOptions, BufferVertexAllocator,
    Color, TessellationOutput,
};

fn clip() -> Box2D {
    Box2D {
        min: point(0.0, 0.0),
        max: point(100.0, 100.0),
    }
}

fn tessellate(
    path: &Path,
    antialias: Option<AntialiasOptions>,
) -> (Vec<Point>, TessellationOutput, BufferVertexAllocator) {
    let mut allocator = BufferVertexAllocator::new(vertex_stride(antialias.as_ref()));
    let output = path_to_triangles(path, 0.25, &clip(), &mut allocator, antialias);
    assert_eq!(output.vertex_count, allocator.vertex_count());
    assert_eq!(output.vertex_count % 3, 0);
    (allocator.positions(), output, allocator)
}

fn polygon(points: &[Point]) -> Path {
    let mut builder = Path::builder();
    builder.begin(points[0]);
    for &p in &points[1..] {
        builder.line_to(p);
    }
    builder.close();
    builder.build()
}

fn signed_area(a: Point, b: Point, c: Point) -> f64 {
    let abx = b.x as f64 - a.x as f64;
    let aby = b.y as f64 - a.y as f64;
    let acx = c.x as f64 - a.x as f64;
    let acy = c.y as f64 - a.y as f64;
    (abx * acy - aby * acx) * 0.5
}

/// Sum of the unsigned triangle areas. With a non-overlapping
/// triangulation this is the area of the covered region.
fn area_sum(positions: &[Point]) -> f64 {
    positions
        .chunks(3)
        .map(|t| signed_area(t[0], t[1], t[2]).abs())
        .sum()
}

/// All emitted triangles must wind the same way (degenerate ones aside).
fn assert_consistent_winding(positions: &[Point]) {
    let mut positive = 0;
    let mut negative = 0;
    for t in positions.chunks(3) {
        let area = signed_area(t[0], t[1], t[2]);
        if area > 0.0 {
            positive += 1;
        } else if area < 0.0 {
            negative += 1;
        }
    }
    assert!(
        positive == 0 || negative == 0,
        "mixed triangle orientations ({positive} positive, {negative} negative)"
    );
}

fn triangle_contains(a: Point, b: Point, c: Point, p: Point) -> bool {
    let s1 = signed_area(a, b, p);
    let s2 = signed_area(b, c, p);
    let s3 = signed_area(c, a, p);
    (s1 >= 0.0 && s2 >= 0.0 && s3 >= 0.0) || (s1 <= 0.0 && s2 <= 0.0 && s3 <= 0.0)
}

fn covered(positions: &[Point], p: Point) -> bool {
    positions
        .chunks(3)
        .any(|t| triangle_contains(t[0], t[1], t[2], p))
}

#[test]
fn square() {
    let path = polygon(&[
        point(0.0, 0.0),
        point(10.0, 0.0),
        point(10.0, 10.0),
        point(0.0, 10.0),
    ]);
    let (positions, output, _) = tessellate(&path, None);

    assert_eq!(output.vertex_count, 6);
    assert!(output.is_linear);
    let corners = [
        point(0.0, 0.0),
        point(10.0, 0.0),
        point(10.0, 10.0),
        point(0.0, 10.0),
    ];
    for p in &positions {
        assert!(corners.contains(p), "unexpected vertex {p:?}");
    }
    assert_eq!(area_sum(&positions), 100.0);
    assert_consistent_winding(&positions);
}

#[test]
fn wide_rectangle_sweeps_horizontally() {
    // Wider than tall, so the sweep runs along X; the output must still
    // cover the same region.
    let path = polygon(&[
        point(0.0, 0.0),
        point(40.0, 0.0),
        point(40.0, 10.0),
        point(0.0, 10.0),
    ]);
    let (positions, output, _) = tessellate(&path, None);

    assert_eq!(output.vertex_count, 6);
    assert_eq!(area_sum(&positions), 400.0);
    assert_consistent_winding(&positions);
}

#[test]
fn bowtie_non_zero() {
    let path = polygon(&[
        point(0.0, 0.0),
        point(10.0, 10.0),
        point(10.0, 0.0),
        point(0.0, 10.0),
    ]);
    let (positions, output, _) = tessellate(&path, None);

    // Two lobes meeting at the computed crossing point.
    assert_eq!(output.vertex_count, 6);
    assert!(positions.contains(&point(5.0, 5.0)));
    let allowed = [
        point(0.0, 0.0),
        point(10.0, 10.0),
        point(10.0, 0.0),
        point(0.0, 10.0),
        point(5.0, 5.0),
    ];
    for p in &positions {
        assert!(allowed.contains(p), "unexpected vertex {p:?}");
    }
    assert_eq!(area_sum(&positions), 50.0);
    assert_consistent_winding(&positions);
}

#[test]
fn bowtie_even_odd() {
    let path = polygon(&[
        point(0.0, 0.0),
        point(10.0, 10.0),
        point(10.0, 0.0),
        point(0.0, 10.0),
    ])
    .with_fill_rule(FillRule::EvenOdd);
    let (positions, output, _) = tessellate(&path, None);

    assert_eq!(output.vertex_count, 6);
    // One triangle per lobe, both touching the crossing point.
    for t in positions.chunks(3) {
        assert!(t.contains(&point(5.0, 5.0)));
    }
    assert_eq!(area_sum(&positions), 50.0);
}

#[test]
fn l_shape() {
    let input = [
        point(0.0, 0.0),
        point(4.0, 0.0),
        point(4.0, 2.0),
        point(2.0, 2.0),
        point(2.0, 4.0),
        point(0.0, 4.0),
    ];
    let path = polygon(&input);
    let (positions, output, _) = tessellate(&path, None);

    assert_eq!(output.vertex_count, 12);
    // A concave but non-self-intersecting polygon introduces no vertices.
    for p in &positions {
        assert!(input.contains(p), "unexpected vertex {p:?}");
    }
    assert_eq!(area_sum(&positions), 12.0);
    assert_consistent_winding(&positions);
}

#[test]
fn merge_and_split_vertices() {
    // The dip at (1, 1) merges two spans, the peak at (1, 2) splits one.
    let path = polygon(&[
        point(0.0, 0.0),
        point(1.0, 1.0),
        point(2.0, 0.0),
        point(2.0, 3.0),
        point(1.0, 2.0),
        point(0.0, 3.0),
    ]);
    let (positions, output, _) = tessellate(&path, None);

    assert_eq!(output.vertex_count, 12);
    assert_eq!(area_sum(&positions), 4.0);
    assert!(covered(&positions, point(0.25, 2.0)));
    assert!(covered(&positions, point(1.75, 2.0)));
    assert!(!covered(&positions, point(1.0, 0.25)));
    assert!(!covered(&positions, point(1.0, 2.75)));
}

#[test]
fn overlapping_squares() {
    let mut builder = Path::builder();
    for origin in [point(0.0, 0.0), point(2.0, 2.0)] {
        builder.begin(origin);
        builder.line_to(point(origin.x + 4.0, origin.y));
        builder.line_to(point(origin.x + 4.0, origin.y + 4.0));
        builder.line_to(point(origin.x, origin.y + 4.0));
        builder.close();
    }
    let path = builder.build();

    let (positions, _, _) = tessellate(&path, None);
    assert_eq!(area_sum(&positions), 28.0);
    assert!(covered(&positions, point(3.0, 3.0)));

    let (positions, _, _) = tessellate(&path.clone().with_fill_rule(FillRule::EvenOdd), None);
    // The doubly-wound overlap drops out under even-odd.
    assert_eq!(area_sum(&positions), 24.0);
    assert!(!covered(&positions, point(3.0, 3.0)));
    assert!(covered(&positions, point(1.0, 1.0)));
    assert!(covered(&positions, point(5.0, 5.0)));
}

#[test]
fn square_with_hole() {
    let mut builder = Path::builder();
    builder.begin(point(0.0, 0.0));
    builder.line_to(point(4.0, 0.0));
    builder.line_to(point(4.0, 4.0));
    builder.line_to(point(0.0, 4.0));
    builder.close();
    // The hole is wound the opposite way.
    builder.begin(point(1.0, 1.0));
    builder.line_to(point(1.0, 3.0));
    builder.line_to(point(3.0, 3.0));
    builder.line_to(point(3.0, 1.0));
    builder.close();
    let path = builder.build();

    let (positions, _, _) = tessellate(&path, None);
    assert_eq!(area_sum(&positions), 12.0);
    assert!(!covered(&positions, point(2.0, 2.0)));
    assert!(covered(&positions, point(0.5, 2.0)));
}

#[test]
fn duplicate_points_are_sanitized() {
    let path = polygon(&[
        point(0.0, 0.0),
        point(0.0, 0.0),
        point(10.0, 0.0),
        point(10.0, 0.0),
        point(10.0, 0.0),
        point(0.0, 10.0),
        point(0.0, 10.0),
    ]);
    let (positions, output, _) = tessellate(&path, None);
    assert_eq!(output.vertex_count, 3);
    assert_eq!(area_sum(&positions), 50.0);
}

#[test]
fn degenerate_paths() {
    let (_, output, _) = tessellate(&Path::new(), None);
    assert_eq!(output.vertex_count, 0);
    assert!(output.is_linear);

    // A lone move.
    let mut builder = Path::builder();
    builder.begin(point(1.0, 1.0));
    builder.end(false);
    let (_, output, _) = tessellate(&builder.build(), None);
    assert_eq!(output.vertex_count, 0);

    // A single segment with no area.
    let mut builder = Path::builder();
    builder.begin(point(1.0, 1.0));
    builder.line_to(point(9.0, 5.0));
    builder.close();
    let (_, output, _) = tessellate(&builder.build(), None);
    assert_eq!(output.vertex_count, 0);
}

#[test]
fn oversized_path_is_rejected() {
    let mut builder = Path::builder();
    builder.begin(point(0.0, 0.0));
    for i in 0..70_000 {
        builder.line_to(point((i % 100) as f32, (i / 100) as f32));
    }
    builder.close();
    let (_, output, _) = tessellate(&builder.build(), None);
    assert_eq!(output.vertex_count, 0);
}

#[test]
fn inverse_fill_of_empty_path_covers_clip() {
    for fill_rule in [FillRule::InverseNonZero, FillRule::InverseEvenOdd] {
        let path = Path::new().with_fill_rule(fill_rule);
        let (positions, output, _) = tessellate(&path, None);
        assert_eq!(output.vertex_count, 6, "{fill_rule:?}");
        assert_eq!(area_sum(&positions), 100.0 * 100.0, "{fill_rule:?}");
        for p in &positions {
            assert!(p.x == 0.0 || p.x == 100.0);
            assert!(p.y == 0.0 || p.y == 100.0);
        }
    }
}

#[test]
fn inverse_fill_of_triangle_covers_complement() {
    let path = polygon(&[point(20.0, 20.0), point(40.0, 20.0), point(30.0, 40.0)])
        .with_fill_rule(FillRule::InverseNonZero);
    let (positions, _, _) = tessellate(&path, None);

    assert_eq!(area_sum(&positions), 100.0 * 100.0 - 200.0);
    assert!(!covered(&positions, point(30.0, 25.0)));
    assert!(covered(&positions, point(5.0, 5.0)));
    assert!(covered(&positions, point(95.0, 95.0)));
}

#[test]
fn quadratic_curve_fill() {
    let mut builder = Path::builder();
    builder.begin(point(0.0, 0.0));
    builder.quadratic_bezier_to(point(25.0, 50.0), point(50.0, 0.0));
    builder.close();
    let path = builder.build();

    let (positions, output, _) = tessellate(&path, None);
    assert!(!output.is_linear);
    assert!(output.vertex_count >= 3);
    // Area of the parabolic segment is 2/3 * base * height.
    let expected = 2.0 / 3.0 * 50.0 * 25.0;
    let area = area_sum(&positions);
    assert!((area - expected).abs() < 20.0, "area {area}");
    assert_consistent_winding(&positions);
}

#[test]
fn translation_does_not_change_topology() {
    let bowtie = [
        point(0.0, 0.0),
        point(10.0, 10.0),
        point(10.0, 0.0),
        point(0.0, 10.0),
    ];
    let (positions, output, _) = tessellate(&polygon(&bowtie), None);

    let offset = point(13.0, 7.0);
    let translated: Vec<Point> = bowtie
        .iter()
        .map(|p| point(p.x + offset.x, p.y + offset.y))
        .collect();
    let (translated_positions, translated_output, _) = tessellate(&polygon(&translated), None);

    assert_eq!(output.vertex_count, translated_output.vertex_count);
    assert_eq!(area_sum(&positions), area_sum(&translated_positions));
    assert!(translated_positions.contains(&point(18.0, 12.0)));
}

#[test]
fn path_to_vertices_reports_windings() {
    let bowtie = polygon(&[
        point(0.0, 0.0),
        point(10.0, 10.0),
        point(10.0, 0.0),
        point(0.0, 10.0),
    ]);
    let vertices = path_to_vertices(&bowtie, 0.25, &clip());
    assert_eq!(vertices.len(), 6);
    for v in &vertices {
        assert_eq!(v.winding.abs(), 1);
    }
    // The two lobes wind in opposite directions.
    assert_eq!(vertices.iter().map(|v| v.winding).sum::<i32>(), 0);

    // No fill-rule filter is applied: the doubly-wound overlap of two
    // stacked squares is still emitted, tagged with its winding.
    let mut builder = Path::builder();
    for _ in 0..2 {
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(4.0, 0.0));
        builder.line_to(point(4.0, 4.0));
        builder.line_to(point(0.0, 4.0));
        builder.close();
    }
    let vertices = path_to_vertices(&builder.build(), 0.25, &clip());
    assert!(!vertices.is_empty());
    assert!(vertices.iter().all(|v| v.winding.abs() == 2));
}

const WHITE: Color = Color(0xffff_ffff);

#[test]
fn aa_square() {
    let path = polygon(&[
        point(10.0, 10.0),
        point(20.0, 10.0),
        point(20.0, 20.0),
        point(10.0, 20.0),
    ]);
    let aa = AntialiasOptions {
        color: WHITE,
        tweak_alpha: false,
    };
    let (positions, output, allocator) = tessellate(&path, Some(aa));

    assert!(output.vertex_count >= 24);
    // The feathered mesh covers the outer square, offset half a pixel.
    let area = area_sum(&positions);
    assert!((area - 121.0).abs() < 1e-3, "area {area}");

    let coverages = allocator.coverages();
    for (p, coverage) in positions.iter().zip(&coverages) {
        assert!(*coverage == 0.0 || *coverage == 1.0);
        let on_outer_ring =
            p.x == 9.5 || p.x == 20.5 || p.y == 9.5 || p.y == 20.5;
        assert_eq!(*coverage == 0.0, on_outer_ring, "vertex {p:?}");
    }
    assert!(coverages.contains(&0.0));
    assert!(coverages.contains(&1.0));
    // The color attribute is constant; coverage travels separately.
    assert!(allocator.colors().iter().all(|&c| c == WHITE.0));
}

#[test]
fn aa_square_with_tweaked_alpha() {
    let path = polygon(&[
        point(10.0, 10.0),
        point(20.0, 10.0),
        point(20.0, 20.0),
        point(10.0, 20.0),
    ]);
    let aa = AntialiasOptions {
        color: WHITE,
        tweak_alpha: true,
    };
    let (_, output, allocator) = tessellate(&path, Some(aa));

    assert!(output.vertex_count >= 24);
    let colors = allocator.colors();
    // Zero-coverage vertices collapse to transparent black, covered ones
    // keep the color.
    assert!(colors.iter().all(|&c| c == WHITE.0 || c == 0));
    assert!(colors.contains(&WHITE.0));
    assert!(colors.contains(&0));
}

#[test]
fn aa_circle_ring() {
    let mut builder = Path::builder();
    let center = point(50.0, 50.0);
    let radius = 30.0f32;
    let n = 64;
    for i in 0..n {
        let angle = (i as f32) * std::f32::consts::TAU / n as f32;
        let p = point(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        );
        if i == 0 {
            builder.begin(p);
        } else {
            builder.line_to(p);
        }
    }
    builder.close();
    let path = builder.build();

    let aa = AntialiasOptions {
        color: WHITE,
        tweak_alpha: false,
    };
    let (positions, output, allocator) = tessellate(&path, Some(aa));

    let triangles = output.vertex_count / 3;
    assert!(
        (150..=230).contains(&triangles),
        "unexpected triangle count {triangles}"
    );

    let coverages = allocator.coverages();
    for (p, coverage) in positions.iter().zip(&coverages) {
        assert!(*coverage == 0.0 || *coverage == 1.0);
        let r = ((p.x - center.x).powi(2) + (p.y - center.y).powi(2)).sqrt();
        if *coverage == 0.0 {
            // Outer ring vertices sit outside the polygon...
            assert!(r > radius - 0.1, "outer vertex at r = {r}");
        } else {
            // ...and fully covered vertices inside it.
            assert!(r < radius + 0.1, "inner vertex at r = {r}");
        }
    }
    assert!(coverages.contains(&0.0));
    assert!(coverages.contains(&1.0));

    // The mesh covers roughly the circle plus the half-pixel feather.
    let area = area_sum(&positions);
    let expected = std::f32::consts::PI as f64 * (radius as f64 + 0.5).powi(2);
    assert!((area - expected).abs() < expected * 0.05, "area {area}");
}
