//! Support generation (component G, §4.G).
//!
//! Detects overhanging triangles, projects them to each layer they
//! overhang, and grows a support volume downward to the build plate (or
//! to the model itself), honoring Z/XY clearance and a join distance that
//! merges nearby support islands into fewer, sturdier towers.
//!
//! Overhang detection and projection work in fixed-point, and support
//! towers are built from the part stack (`crate::parts::LayerParts`)
//! instead of re-deriving contours from scratch.

use crate::geom::{JoinType, Point3, Polygon, PolygonSet};
use crate::mesh::Mesh;
use crate::parts::LayerParts;

/// Tuning for support generation.
#[derive(Debug, Clone, Copy)]
pub struct SupportSettings {
    /// Overhang angle from vertical, in radians; a face steeper than this
    /// (smaller angle from horizontal) is supported.
    pub overhang_angle_rad: f64,
    /// Vertical clearance between support and the model above it, in
    /// layers.
    pub z_distance_layers: usize,
    /// Horizontal clearance between support and the model, micrometers.
    pub xy_distance_um: i64,
    /// Support islands within this distance of each other are merged into
    /// one, micrometers.
    pub join_distance_um: i64,
}

impl Default for SupportSettings {
    fn default() -> Self {
        Self {
            overhang_angle_rad: 50.0_f64.to_radians(),
            z_distance_layers: 1,
            xy_distance_um: 700,
            join_distance_um: 2_000,
        }
    }
}

/// The support area for one layer.
#[derive(Debug, Clone, Default)]
pub struct LayerSupport {
    /// Support material region for this layer.
    pub area: PolygonSet,
    /// True if this layer is a dense interface layer (top of a support
    /// column, directly below the overhang it holds up).
    pub is_interface: bool,
}

/// Detect overhanging triangles and project each onto the XY plane at
/// every layer Z it overhangs, producing one unioned "needs support"
/// region per layer.
pub fn detect_overhangs(mesh: &Mesh, layer_heights: &[i64], settings: &SupportSettings) -> Vec<PolygonSet> {
    let mut per_layer = vec![PolygonSet::empty(); layer_heights.len()];
    let cos_threshold = -settings.overhang_angle_rad.cos();

    for tri in &mesh.triangles {
        let normal_z = triangle_normal_z(tri.v0, tri.v1, tri.v2);
        if normal_z >= cos_threshold {
            continue;
        }
        let (z_min, z_max) = (tri.z_min(), tri.z_max());
        let footprint = project_triangle_to_xy(tri.v0, tri.v1, tri.v2);
        for (i, &z) in layer_heights.iter().enumerate() {
            if z >= z_min && z <= z_max {
                per_layer[i].polygons.push(footprint.clone());
            }
        }
    }

    per_layer.into_iter().map(|set| set.repair()).collect()
}

/// Cosine of the angle between the triangle's normal and +Z, i.e.
/// `normal.z` for a unit normal; triangles facing downward (overhanging)
/// have a negative value approaching -1.
fn triangle_normal_z(v0: Point3, v1: Point3, v2: Point3) -> f64 {
    let e1 = (v1.x - v0.x, v1.y - v0.y, v1.z - v0.z);
    let e2 = (v2.x - v0.x, v2.y - v0.y, v2.z - v0.z);
    let nx = (e1.1 * e2.2 - e1.2 * e2.1) as f64;
    let ny = (e1.2 * e2.0 - e1.0 * e2.2) as f64;
    let nz = (e1.0 * e2.1 - e1.1 * e2.0) as f64;
    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    if len < 1e-6 {
        1.0
    } else {
        nz / len
    }
}

fn project_triangle_to_xy(v0: Point3, v1: Point3, v2: Point3) -> Polygon {
    let mut poly = Polygon::new(vec![v0.xy(), v1.xy(), v2.xy()]);
    poly.ensure_ccw();
    poly
}

/// Build the per-layer support volume from the detected overhang areas:
/// clear `xy_distance_um` around the model, drop `z_distance_layers`
/// layers of vertical gap below the overhang, and extend support
/// downward through every lower layer, merging islands within
/// `join_distance_um`.
pub fn generate_support_volume(overhangs: &[PolygonSet], model_layers: &[LayerParts], settings: &SupportSettings) -> Vec<LayerSupport> {
    let n = overhangs.len();
    let mut result = vec![LayerSupport::default(); n];
    let mut accumulated = PolygonSet::empty();

    for i in (0..n).rev() {
        let model_here = model_layers.get(i).map(LayerParts::as_polygon_set).unwrap_or_default();
        let model_cleared = model_here.offset(settings.xy_distance_um, JoinType::Round);

        let needs_support_at = i.checked_sub(settings.z_distance_layers).unwrap_or(0).min(i);
        let overhang_here = if i >= settings.z_distance_layers {
            overhangs[needs_support_at].clone()
        } else {
            PolygonSet::empty()
        };

        let is_interface = !overhang_here.is_empty();
        accumulated = accumulated.union(&overhang_here).difference(&model_cleared);
        accumulated = join_nearby_islands(&accumulated, settings.join_distance_um);

        result[i] = LayerSupport {
            area: accumulated.clone(),
            is_interface,
        };
    }

    result
}

/// Merge support islands within `join_distance_um` of each other by
/// dilating then eroding back by the same amount (a morphological
/// "close"), avoiding the need to re-derive adjacency explicitly.
fn join_nearby_islands(area: &PolygonSet, join_distance_um: i64) -> PolygonSet {
    if join_distance_um <= 0 || area.is_empty() {
        return area.clone();
    }
    area.offset(join_distance_um, JoinType::Round).offset(-join_distance_um, JoinType::Round)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshSettings, Transform};

    fn overhanging_wedge() -> Mesh {
        // A single downward-facing triangle spanning z=[0,0] at y-tilt,
        // guaranteed to read as a steep overhang (normal points mostly -Z).
        let vertices = vec![0.0, 0.0, 5.0, 10.0, 0.0, 5.0, 5.0, 10.0, 0.0];
        let indices = vec![0, 1, 2];
        Mesh::from_buffers(&vertices, &indices, &Transform::identity(), MeshSettings::default())
    }

    #[test]
    fn overhanging_triangle_is_detected() {
        let mesh = overhanging_wedge();
        let heights = vec![2_500];
        let settings = SupportSettings::default();
        let overhangs = detect_overhangs(&mesh, &heights, &settings);
        assert!(!overhangs[0].is_empty());
    }

    #[test]
    fn flat_top_facing_triangle_is_not_an_overhang() {
        let vertices = vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 10.0, 0.0];
        let indices = vec![0, 1, 2];
        let mesh = Mesh::from_buffers(&vertices, &indices, &Transform::identity(), MeshSettings::default());
        let heights = vec![0];
        let settings = SupportSettings::default();
        let overhangs = detect_overhangs(&mesh, &heights, &settings);
        assert!(overhangs[0].is_empty());
    }

    #[test]
    fn join_distance_merges_nearby_islands() {
        use crate::geom::Point2;
        let a = Polygon::new(vec![Point2::new(0, 0), Point2::new(1_000, 0), Point2::new(1_000, 1_000), Point2::new(0, 1_000)]);
        let b = Polygon::new(vec![
            Point2::new(1_500, 0),
            Point2::new(2_500, 0),
            Point2::new(2_500, 1_000),
            Point2::new(1_500, 1_000),
        ]);
        let set = PolygonSet::new(vec![a, b]);
        let joined = join_nearby_islands(&set, 600);
        assert_eq!(joined.split_into_parts().len(), 1);
    }
}
