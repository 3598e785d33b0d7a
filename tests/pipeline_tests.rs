//! End-to-end scenarios (Testable Properties / End-to-end scenarios).

use fff_slicer::geom::{JoinType, Point2, Polygon, PolygonSet};
use fff_slicer::mesh::{Mesh, MeshSettings, Transform};
use fff_slicer::path_order::{order_polygons, SeamPolicy};
use fff_slicer::walls::{self, classic::ClassicWallSettings};
use fff_slicer::{slice, Settings};

fn cube_mesh(size_mm: f64) -> Mesh {
    let s = size_mm;
    let vertices = vec![
        0.0, 0.0, 0.0, s, 0.0, 0.0, s, s, 0.0, 0.0, s, 0.0, 0.0, 0.0, s, s, 0.0, s, s, s, s, 0.0, s, s,
    ];
    let indices = vec![
        0, 2, 1, 0, 3, 2, 4, 5, 6, 4, 6, 7, 0, 1, 5, 0, 5, 4, 2, 3, 7, 2, 7, 6, 0, 4, 7, 0, 7, 3, 1, 2, 6, 1, 6, 5,
    ];
    Mesh::from_buffers(&vertices, &indices, &Transform::identity(), MeshSettings::default())
}

fn square(side: i64) -> PolygonSet {
    PolygonSet::new(vec![Polygon::new(vec![
        Point2::new(0, 0),
        Point2::new(side, 0),
        Point2::new(side, side),
        Point2::new(0, side),
    ])])
}

/// Scenario 1: unit cube, 10 mm, layer 0.1 mm, wall_line_count=2, w=0.4mm
/// -> insets[0] is 9.6x9.6mm, insets[1] is 8.8x8.8mm.
#[test]
fn unit_cube_produces_expected_inset_sizes() {
    let region = square(10_000);
    let settings = ClassicWallSettings {
        wall_count: 2,
        line_width_um: 400,
        outer_line_width_um: 400,
        wall_0_inset_um: 0,
        spiralize: false,
        max_retries: 3,
    };
    let (walls, _interior) = walls::classic::generate_classic_walls(&region, &settings);
    assert_eq!(walls.len(), 2);

    let outer_bbox = walls[0].polygon().bounding_box();
    let outer_side = outer_bbox.max.x - outer_bbox.min.x;
    assert!((outer_side - 9_600).abs() <= 20, "outer wall side was {outer_side}um");

    let inner_bbox = walls[1].polygon().bounding_box();
    let inner_side = inner_bbox.max.x - inner_bbox.min.x;
    assert!((inner_side - 8_800).abs() <= 20, "inner wall side was {inner_side}um");
}

/// Scenario 1 continued: slicing the same cube through the full pipeline
/// at 0.1mm layers produces one outline per layer, each exactly 10x10mm.
#[test]
fn unit_cube_layers_preserve_footprint() {
    let mesh = cube_mesh(10.0);
    let mut settings = Settings::new();
    settings.global.set("layer_height", "0.1");
    settings.global.set("layer_height_0", "0.1");
    settings.global.set("wall_count", "2");
    settings.global.set("line_width", "0.4");
    settings.global.set("infill_density", "0.2");

    let output = slice(&mesh, &settings).expect("cube should slice cleanly");
    assert_eq!(output.layers.len(), 100);

    for layer in &output.layers {
        let bbox = layer.parts.as_polygon_set().bounding_box();
        let side_x = bbox.max.x - bbox.min.x;
        let side_y = bbox.max.y - bbox.min.y;
        assert!((side_x - 10_000).abs() <= 50, "layer {}: x side {side_x}", layer.index);
        assert!((side_y - 10_000).abs() <= 50, "layer {}: y side {side_y}", layer.index);
    }
}

/// Testable property #6: PathOrderOptimizer preserves the input multiset
/// of polygons (no duplicates, no drops).
#[test]
fn path_order_preserves_polygon_count() {
    let polygons = vec![
        Polygon::new(vec![Point2::new(0, 0), Point2::new(1_000, 0), Point2::new(1_000, 1_000), Point2::new(0, 1_000)]),
        Polygon::new(vec![
            Point2::new(5_000, 5_000),
            Point2::new(6_000, 5_000),
            Point2::new(6_000, 6_000),
            Point2::new(5_000, 6_000),
        ]),
        Polygon::new(vec![
            Point2::new(20_000, 0),
            Point2::new(21_000, 0),
            Point2::new(21_000, 1_000),
            Point2::new(20_000, 1_000),
        ]),
    ];
    let ordered = order_polygons(&polygons, Point2::origin(), SeamPolicy::Shortest);
    assert_eq!(ordered.len(), polygons.len());

    let mut original_areas: Vec<f64> = polygons.iter().map(|p| p.signed_area().abs()).collect();
    let mut ordered_areas: Vec<f64> = ordered.iter().map(|p| p.signed_area().abs()).collect();
    original_areas.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ordered_areas.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for (a, b) in original_areas.iter().zip(ordered_areas.iter()) {
        assert!((a - b).abs() < 1.0);
    }
}

/// Testable property #1: union with empty and difference with self are
/// identities, at the PolygonSet level the whole pipeline is built on.
#[test]
fn polygon_set_boolean_identities_hold() {
    let region = square(10_000);
    let with_empty = region.union(&PolygonSet::empty());
    assert!((with_empty.area() - region.area()).abs() < 1.0);

    let self_diff = region.difference(&region);
    assert!(self_diff.area() < 1.0);
}

/// Round-trip: offsetting a convex polygon outward then inward by the
/// same distance returns (approximately) the original.
#[test]
fn offset_then_unoffset_round_trips_on_a_convex_square() {
    let region = square(10_000);
    let grown = region.offset(1_000, JoinType::Miter);
    let back = grown.offset(-1_000, JoinType::Miter);
    assert!((back.area() - region.area()).abs() < region.area() * 0.02);
}
