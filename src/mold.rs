//! Mold transform (§6): turn a printed part into a cavity mold by
//! replacing the top layers' outlines with an outward-offset "shell"
//! accumulated from the part above, down to `mold_width` below the part's
//! top surface.
//!
//! `mold_outline_above` is seeded empty and, walking layers top-down,
//! accumulates `union(mold_outline_above, layer.outline)` offset outward
//! by the wall line width every step; once the angle between the moving
//! offset front and vertical exceeds 90 degrees the outline stops growing
//! and is reused unchanged for lower layers (the "collapse" case).

use crate::geom::{JoinType, Part, Point2, Polygon, PolygonSet};
use crate::parts::LayerParts;

/// Apply the mold transform to a layer stack in place.
///
/// `mold_width_um` is the total radial thickness of the mold wall;
/// `mold_angle_rad` is the draft angle past which the offset front stops
/// advancing per layer (angle >= 90 degrees collapses to a constant
/// offset). `open_polygon` models the gap left in the
/// mold wall so the part can be removed; pass an empty polygon to mold a
/// fully closed cavity.
pub fn apply(layers: &mut [LayerParts], mold_width_um: i64, mold_angle_rad: f64, open_polygon: &Polygon) {
    if layers.is_empty() || mold_width_um <= 0 {
        return;
    }

    let layer_thickness = estimate_layer_thickness(layers);
    if layer_thickness <= 0 {
        return;
    }

    // Offset applied per layer while angle < 90 degrees; beyond that the
    // front no longer advances outward per layer (original: "angle_mold
    // >= 90 -> collapse" case) and the accumulated outline is reused.
    let per_layer_offset = if mold_angle_rad < std::f64::consts::FRAC_PI_2 {
        (layer_thickness as f64 * mold_angle_rad.tan()).round() as i64
    } else {
        0
    };

    let mut mold_outline_above = PolygonSet::empty();
    let mut layers_grown = 0;
    let max_layers_to_grow = (mold_width_um / layer_thickness.max(1)).max(1) as usize;

    for layer in layers.iter_mut().rev() {
        let layer_set = layer.as_polygon_set();
        if layer_set.is_empty() && mold_outline_above.is_empty() {
            continue;
        }

        let combined = mold_outline_above.union(&layer_set);
        let grown = if layers_grown < max_layers_to_grow && per_layer_offset > 0 {
            combined.offset(per_layer_offset, JoinType::Round)
        } else {
            combined
        };

        let shell = grown.difference(&layer_set);
        let shell = subtract_open_polygon(&shell, open_polygon);

        layer.parts = shell.union(&layer_set).split_into_parts();

        mold_outline_above = grown;
        layers_grown += 1;
    }
}

fn subtract_open_polygon(set: &PolygonSet, open_polygon: &Polygon) -> PolygonSet {
    if open_polygon.points.len() < 3 {
        return set.clone();
    }
    set.difference(&PolygonSet::new(vec![open_polygon.clone()]))
}

fn estimate_layer_thickness(layers: &[LayerParts]) -> i64 {
    if layers.len() < 2 {
        return 0;
    }
    layers[1].z - layers[0].z
}

/// Collect the 2D footprint of a part's outer contour, ignoring holes;
/// used by callers that want the mold's outer silhouette without its
/// interior cavities (e.g. preview rendering).
pub fn outer_footprint(parts: &[Part]) -> Vec<Point2> {
    parts.iter().flat_map(|p| p.outer.points.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point2;

    fn square(x0: i64, y0: i64, x1: i64, y1: i64) -> Polygon {
        Polygon::new(vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ])
    }

    fn single_part_layer(z: i64, index: usize, outer: Polygon) -> LayerParts {
        LayerParts {
            z,
            index,
            parts: vec![Part { outer, holes: vec![] }],
        }
    }

    #[test]
    fn mold_grows_outline_outward_below_the_top_layer() {
        let mut layers = vec![
            single_part_layer(0, 0, square(0, 0, 10_000, 10_000)),
            single_part_layer(200, 1, square(0, 0, 10_000, 10_000)),
            single_part_layer(400, 2, square(0, 0, 10_000, 10_000)),
        ];
        let before_area = layers[0].as_polygon_set().area();
        apply(&mut layers, 2_000, 45.0_f64.to_radians(), &Polygon::new(vec![]));
        let after_area = layers[0].as_polygon_set().area();
        assert!(after_area > before_area, "mold shell should enlarge the bottom layer's outline");
    }

    #[test]
    fn zero_width_mold_is_a_no_op() {
        let mut layers = vec![single_part_layer(0, 0, square(0, 0, 10_000, 10_000))];
        let before_area = layers[0].as_polygon_set().area();
        apply(&mut layers, 0, 45.0_f64.to_radians(), &Polygon::new(vec![]));
        assert_eq!(layers[0].as_polygon_set().area(), before_area);
    }
}
