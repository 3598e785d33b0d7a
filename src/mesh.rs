//! Mesh input type (§3 "Mesh"): triangles plus a per-mesh affine transform
//! and role flags. Mesh *loading* (STL/OBJ/3MF) is an external collaborator
//! (§1 out-of-scope); this module only models what the pipeline consumes.

use crate::geom::Point3;

/// A 4x4 affine transform applied to every vertex of a mesh before
/// slicing. Stored as row-major `f64` since transforms come from the CAD
/// side of the boundary in model-space floats; the slicer immediately
/// rounds transformed vertices into the fixed-point micrometer space it
/// operates in from then on (§3: fixed-point is the sole *internal*
/// representation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Row-major 4x4 matrix.
    pub m: [[f64; 4]; 4],
}

impl Transform {
    /// The identity transform.
    pub fn identity() -> Self {
        let mut m = [[0.0; 4]; 4];
        for i in 0..4 {
            m[i][i] = 1.0;
        }
        Self { m }
    }

    /// Apply this transform to a model-space point given in millimeters,
    /// returning a fixed-point point in micrometers.
    pub fn apply_mm_to_um(&self, x: f64, y: f64, z: f64) -> Point3 {
        let m = &self.m;
        let tx = m[0][0] * x + m[0][1] * y + m[0][2] * z + m[0][3];
        let ty = m[1][0] * x + m[1][1] * y + m[1][2] * z + m[1][3];
        let tz = m[2][0] * x + m[2][1] * y + m[2][2] * z + m[2][3];
        Point3::new((tx * 1000.0).round() as i64, (ty * 1000.0).round() as i64, (tz * 1000.0).round() as i64)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Role flags for a mesh within a multi-mesh print (§3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshRoles {
    /// This mesh only contributes infill, not walls/skin, to the meshes it overlaps.
    pub infill_mesh: bool,
    /// This mesh's overhangs are excluded from support generation.
    pub anti_overhang_mesh: bool,
    /// This mesh is itself a support structure, sliced like a part but
    /// printed with support settings.
    pub support_mesh: bool,
    /// This mesh cuts away material from other meshes it overlaps.
    pub cutting_mesh: bool,
    /// This mesh is a mold: the final layer outlines are replaced by the
    /// mold cavity (§6).
    pub mold: bool,
}

/// Per-mesh settings relevant to the core pipeline (extruder assignment
/// plus role flags; the bulk of per-mesh tuning lives in the settings
/// registry, see `crate::settings`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshSettings {
    /// Which extruder/toolhead prints this mesh.
    pub extruder_id: u32,
    /// Role flags.
    pub roles: MeshRoles,
}

/// A single triangle in model space, already transformed into micrometers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    /// First vertex.
    pub v0: Point3,
    /// Second vertex.
    pub v1: Point3,
    /// Third vertex.
    pub v2: Point3,
}

impl Triangle {
    /// Minimum Z across the three vertices.
    pub fn z_min(&self) -> i64 {
        self.v0.z.min(self.v1.z).min(self.v2.z)
    }

    /// Maximum Z across the three vertices.
    pub fn z_max(&self) -> i64 {
        self.v0.z.max(self.v1.z).max(self.v2.z)
    }
}

/// A triangular-mesh solid: triangles already transformed into the
/// pipeline's fixed-point micrometer space, plus the settings that decide
/// how it participates in the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Triangles in model space (post-transform), micrometers.
    pub triangles: Vec<Triangle>,
    /// Per-mesh settings.
    pub settings: MeshSettings,
}

impl Mesh {
    /// Build a mesh from a flat vertex buffer (mm, `[x,y,z, x,y,z, ...]`)
    /// and index buffer, applying `transform` during import. This is the
    /// seam the external mesh-file loader (§1 out-of-scope) hands off to.
    pub fn from_buffers(vertices_mm: &[f64], indices: &[u32], transform: &Transform, settings: MeshSettings) -> Self {
        let mut triangles = Vec::with_capacity(indices.len() / 3);
        for tri in indices.chunks_exact(3) {
            let get = |i: u32| {
                let base = i as usize * 3;
                transform.apply_mm_to_um(vertices_mm[base], vertices_mm[base + 1], vertices_mm[base + 2])
            };
            triangles.push(Triangle {
                v0: get(tri[0]),
                v1: get(tri[1]),
                v2: get(tri[2]),
            });
        }
        Self { triangles, settings }
    }

    /// Bounding box in micrometers, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        if self.triangles.is_empty() {
            return None;
        }
        let mut min = Point3::new(i64::MAX, i64::MAX, i64::MAX);
        let mut max = Point3::new(i64::MIN, i64::MIN, i64::MIN);
        for tri in &self.triangles {
            for v in [tri.v0, tri.v1, tri.v2] {
                min.x = min.x.min(v.x);
                min.y = min.y.min(v.y);
                min.z = min.z.min(v.z);
                max.x = max.x.max(v.x);
                max.y = max.y.max(v.y);
                max.z = max.z.max(v.z);
            }
        }
        Some((min, max))
    }
}
