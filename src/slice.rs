//! Mesh slicing (component B, §4.B): intersect a mesh with horizontal
//! planes, producing closed polygons plus residual open polylines per
//! layer.
//!
//! Works entirely in fixed-point micrometers. Fragments that fail to close
//! are *retained* as open polylines (§4.B "Failure mode") rather than
//! silently dropped, and triangle-plane intersection keeps a directed
//! segment winding (material to the left) rather than an unordered pair.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::error::{Result, SlicerError};
use crate::geom::{Point2, Polygon, Polyline};
use crate::mesh::{Mesh, Triangle};

/// Quantization for the endpoint-snapping spatial hash (§4.B: "within a
/// small tolerance (≤10 µm)").
const STITCH_TOLERANCE_UM: i64 = 10;

/// A directed 2D segment: `start -> end`, with filled material to the left.
#[derive(Debug, Clone, Copy)]
struct DirectedSegment {
    start: Point2,
    end: Point2,
}

/// The result of slicing one mesh at one Z height.
#[derive(Debug, Clone, Default)]
pub struct SliceLayer {
    /// Z height of this layer, micrometers.
    pub z: i64,
    /// Layer index (0 = first printed layer).
    pub index: usize,
    /// Closed polygons stitched from plane/triangle intersections.
    pub closed_polygons: Vec<Polygon>,
    /// Fragments that could not be closed into a loop (§4.B failure mode).
    pub open_polylines: Vec<Polyline>,
}

/// Generate the Z heights to slice at (§4.B contract): `z_0 =
/// initial_layer_thickness`, then `z_0 + k*layer_thickness`.
pub fn generate_layer_heights(z_min: i64, z_max: i64, initial_layer_thickness: i64, layer_thickness: i64) -> Vec<i64> {
    let mut heights = Vec::new();
    if layer_thickness <= 0 || z_max <= z_min {
        return heights;
    }
    let mut z = z_min + initial_layer_thickness;
    if z > z_max {
        return heights;
    }
    heights.push(z);
    loop {
        z += layer_thickness;
        if z > z_max {
            break;
        }
        heights.push(z);
    }
    heights
}

/// Bounding box of a mesh in micrometers, `(min, max)`.
pub fn mesh_bounds(mesh: &Mesh) -> Option<([i64; 3], [i64; 3])> {
    mesh.bounds().map(|(min, max)| ([min.x, min.y, min.z], [max.x, max.y, max.z]))
}

/// Slice a mesh at the given Z heights, one layer per height, in parallel.
pub fn slice_mesh(mesh: &Mesh, layer_heights: &[i64]) -> Result<Vec<SliceLayer>> {
    if mesh.triangles.is_empty() {
        return Err(SlicerError::EmptyMesh);
    }
    let layers: Vec<SliceLayer> = layer_heights
        .par_iter()
        .enumerate()
        .map(|(idx, &z)| slice_at_z(&mesh.triangles, z, idx))
        .collect();
    Ok(layers)
}

fn slice_at_z(triangles: &[Triangle], z: i64, index: usize) -> SliceLayer {
    let mut segments = Vec::new();
    for tri in triangles {
        if tri.z_max() < z || tri.z_min() > z {
            continue;
        }
        if let Some(seg) = triangle_plane_intersection(tri, z) {
            segments.push(seg);
        }
    }
    let (closed_polygons, open_polylines) = chain_segments(segments);
    SliceLayer {
        z,
        index,
        closed_polygons,
        open_polylines,
    }
}

/// Intersect a triangle with the plane `Z = z`, returning a directed
/// segment (material to the left of the winding direction) if the plane
/// crosses the triangle's interior.
fn triangle_plane_intersection(tri: &Triangle, z: i64) -> Option<DirectedSegment> {
    let verts = [tri.v0, tri.v1, tri.v2];
    let d: Vec<i64> = verts.iter().map(|v| v.z - z).collect();

    let above: Vec<bool> = d.iter().map(|&x| x > 0).collect();
    let below: Vec<bool> = d.iter().map(|&x| x < 0).collect();
    if above.iter().all(|&b| b) || below.iter().all(|&b| b) {
        return None;
    }

    // Walk edges in winding order v0->v1->v2->v0; an edge crossing from
    // "above" to "below" produces the segment's start, "below" to "above"
    // its end — this keeps filled material (above the plane as we look
    // down +Z, i.e. "below" the cutting plane is the removed material) to
    // the left of the directed segment, matching §4.B.
    let mut start = None;
    let mut end = None;
    for i in 0..3 {
        let j = (i + 1) % 3;
        let (da, db) = (d[i], d[j]);
        if da == 0 && db == 0 {
            continue;
        }
        if (da >= 0) != (db >= 0) || da == 0 || db == 0 {
            let t = if da == db { 0.0 } else { da as f64 / (da - db) as f64 };
            let p = lerp(verts[i].xy(), verts[j].xy(), t);
            if da > 0 && db <= 0 {
                start = Some(p);
            } else if da <= 0 && db > 0 {
                end = Some(p);
            }
        }
    }

    match (start, end) {
        (Some(s), Some(e)) if s != e => Some(DirectedSegment { start: s, end: e }),
        _ => None,
    }
}

fn lerp(a: Point2, b: Point2, t: f64) -> Point2 {
    Point2::from_f64(a.x as f64 + t * (b.x - a.x) as f64, a.y as f64 + t * (b.y - a.y) as f64)
}

/// Quantize a point for the stitching spatial hash (§4.B).
fn quantize(p: Point2) -> (i64, i64) {
    (p.x.div_euclid(STITCH_TOLERANCE_UM), p.y.div_euclid(STITCH_TOLERANCE_UM))
}

/// Neighbor cell offsets so endpoints on either side of a quantization
/// boundary still find each other.
const NEIGHBOR_OFFSETS: [(i64, i64); 9] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 0),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Chain directed segments into closed loops by endpoint snapping, using a
/// spatial hash keyed by quantized vertex for O(1) average lookups
/// (§4.B). Fragments that never close are returned as open polylines.
fn chain_segments(segments: Vec<DirectedSegment>) -> (Vec<Polygon>, Vec<Polyline>) {
    if segments.is_empty() {
        return (Vec::new(), Vec::new());
    }

    // Index: quantized start point -> segment indices starting there.
    let mut by_start: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        by_start.entry(quantize(seg.start)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut closed = Vec::new();
    let mut open = Vec::new();

    let find_next = |end: Point2, used: &[bool]| -> Option<usize> {
        let cell = quantize(end);
        for (dx, dy) in NEIGHBOR_OFFSETS {
            if let Some(candidates) = by_start.get(&(cell.0 + dx, cell.1 + dy)) {
                for &idx in candidates {
                    if !used[idx] {
                        return Some(idx);
                    }
                }
            }
        }
        None
    };

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let first = segments[start_idx].start;
        let mut chain = vec![first, segments[start_idx].end];

        loop {
            let tail = *chain.last().unwrap();
            if (tail - first).magnitude_sq() <= (STITCH_TOLERANCE_UM as i128).pow(2) && chain.len() > 2 {
                break;
            }
            match find_next(tail, &used) {
                Some(next_idx) => {
                    used[next_idx] = true;
                    chain.push(segments[next_idx].end);
                }
                None => break,
            }
        }

        let closed_loop = chain.len() >= 3 && (*chain.last().unwrap() - first).magnitude_sq() <= (STITCH_TOLERANCE_UM as i128).pow(2);
        if closed_loop {
            chain.pop();
            closed.push(Polygon::new(chain));
        } else if chain.len() >= 2 {
            open.push(Polyline::new(chain));
        }
    }

    // Outer contours (larger |area|) first, consistent with
    // ordering convention; holes are identified later by the part
    // splitter's point-in-polygon association, not by sort order, but a
    // stable deterministic order keeps layer output reproducible.
    closed.sort_by(|a, b| b.signed_area().abs().partial_cmp(&a.signed_area().abs()).unwrap_or(std::cmp::Ordering::Equal));

    (closed, open)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshSettings, Transform};

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

    #[test]
    fn layer_heights_start_at_initial_thickness() {
        let heights = generate_layer_heights(0, 10_000, 250, 200);
        assert_eq!(heights[0], 250);
        assert_eq!(heights[1], 450);
        assert!(*heights.last().unwrap() <= 10_000);
    }

    #[test]
    fn cube_layer_is_one_closed_square() {
        let mesh = cube_mesh(10.0);
        let layer = slice_at_z(&mesh.triangles, 5_000, 0);
        assert_eq!(layer.closed_polygons.len(), 1);
        assert!(layer.open_polylines.is_empty());
        let area = layer.closed_polygons[0].signed_area().abs();
        assert!((area - 100_000_000.0).abs() < 1_000.0, "area was {area}");
    }

    #[test]
    fn empty_mesh_is_an_error() {
        let mesh = Mesh::default();
        let heights = generate_layer_heights(0, 10_000, 250, 200);
        assert!(slice_mesh(&mesh, &heights).is_err());
    }
}
