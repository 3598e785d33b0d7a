//! Part splitting (component C, §4.C): union a layer's closed polygons
//! and split the result into disjoint parts, each an outer contour plus
//! its holes.
//!
//! Builds on the CCW-outer/CW-hole convention and point-in-polygon hole
//! association already implemented by the fixed-point
//! `PolygonSet::split_into_parts` from component A, rather than
//! re-deriving contour classification here.

use crate::geom::{Part, Point2, Polygon, PolygonSet};
use crate::mold;
use crate::settings::Settings;
use crate::slice::SliceLayer;

/// The result of part-splitting one layer.
#[derive(Debug, Clone, Default)]
pub struct LayerParts {
    /// Z height, micrometers.
    pub z: i64,
    /// Layer index.
    pub index: usize,
    /// Disjoint parts, each with one outer contour and zero or more holes.
    pub parts: Vec<Part>,
}

impl LayerParts {
    /// All outer-plus-hole contours flattened into one polygon set, the
    /// shape handed to wall generation (§4.D).
    pub fn as_polygon_set(&self) -> PolygonSet {
        let mut polygons = Vec::new();
        for part in &self.parts {
            polygons.push(part.outer.clone());
            polygons.extend(part.holes.iter().cloned());
        }
        PolygonSet::new(polygons)
    }
}

/// Union a layer's closed polygons and split into parts. Open polylines
/// (§4.B failure mode) are dropped here; they have no interior to wall or
/// fill and exist only for diagnostics.
pub fn split_layer(layer: &SliceLayer) -> LayerParts {
    let raw = PolygonSet::new(layer.closed_polygons.clone());
    let repaired = raw.repair();
    LayerParts {
        z: layer.z,
        index: layer.index,
        parts: repaired.split_into_parts(),
    }
}

/// Apply the mold transform (§6) to a stack of already-split layers, for
/// meshes with `MeshRoles::mold` set. `mold_width`/`mold_angle_rad` come
/// from the settings registry via [`mold_settings_from`].
pub fn apply_mold(layers: &mut [LayerParts], mold_width_um: i64, mold_angle_rad: f64, open_polygon: &Polygon) {
    mold::apply(layers, mold_width_um, mold_angle_rad, open_polygon);
}

/// Read the mold-related settings (`mold_width`, `mold_angle`) out of the
/// registry, applying the §6 defaults when absent.
pub fn mold_settings_from(settings: &Settings) -> (i64, f64) {
    let width = settings.get_length_um("mold_width").unwrap_or(5_000);
    let angle = settings.get_angle_radians("mold_angle").unwrap_or(40.0_f64.to_radians());
    (width, angle)
}

/// Point-in-part test used by skin/support classification (§4.E/G) to ask
/// whether a 2D point falls inside a given layer's filled region.
pub fn point_in_parts(point: Point2, parts: &[Part]) -> bool {
    parts.iter().any(|part| part.as_set().contains_point(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Polygon;

    fn square(x0: i64, y0: i64, x1: i64, y1: i64) -> Polygon {
        Polygon::new(vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ])
    }

    #[test]
    fn nested_squares_become_one_part_with_a_hole() {
        let outer = square(0, 0, 10_000, 10_000);
        let mut hole = square(2_000, 2_000, 8_000, 8_000);
        hole.reverse();
        let layer = SliceLayer {
            z: 200,
            index: 0,
            closed_polygons: vec![outer, hole],
            open_polylines: vec![],
        };
        let parts = split_layer(&layer);
        assert_eq!(parts.parts.len(), 1);
        assert_eq!(parts.parts[0].holes.len(), 1);
    }

    #[test]
    fn disjoint_squares_become_two_parts() {
        let a = square(0, 0, 1_000, 1_000);
        let b = square(5_000, 5_000, 6_000, 6_000);
        let layer = SliceLayer {
            z: 200,
            index: 0,
            closed_polygons: vec![a, b],
            open_polylines: vec![],
        };
        let parts = split_layer(&layer);
        assert_eq!(parts.parts.len(), 2);
    }

    #[test]
    fn point_in_parts_respects_holes() {
        let outer = square(0, 0, 10_000, 10_000);
        let mut hole = square(2_000, 2_000, 8_000, 8_000);
        hole.reverse();
        let layer = SliceLayer {
            z: 200,
            index: 0,
            closed_polygons: vec![outer, hole],
            open_polylines: vec![],
        };
        let parts = split_layer(&layer);
        assert!(point_in_parts(Point2::new(500, 500), &parts.parts));
        assert!(!point_in_parts(Point2::new(5_000, 5_000), &parts.parts));
    }
}
