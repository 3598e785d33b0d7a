//! Path ordering (component H, §4.H).
//!
//! Orders closed wall/skin polygons and junction-based wall lines via a
//! greedy nearest-polygon walk with a choice of seam placement policy,
//! and orders open infill/support lines via a spatial bucket grid. Flow
//! compensation across an ordered plan lives in [`crate::gcode_path`],
//! since it's a whole-plan property rather than a per-path one.
//!
//! Uses a dot-product "binnenbocht" (inward corner) preference for seam
//! placement and a spatial bucket grid for nearest-line lookups, all in
//! fixed-point, across the full set of seam policies.

use std::collections::HashMap;

use rand::Rng;

use crate::geom::{Point2, Polygon, Polyline};
use crate::walls::ExtrusionLine;

/// How to choose each polygon's seam (start/end point), §4.H.
#[derive(Debug, Clone, Copy)]
pub enum SeamPolicy {
    /// Closest point to the previous path's end.
    Shortest,
    /// Point with the largest Y coordinate ("back" of the print).
    Back,
    /// Uniformly random vertex.
    Random,
    /// Point at the sharpest interior corner (the "binnenbocht" the
    /// original prefers, since a seam there is least visible).
    SharpestCorner,
    /// A fixed, caller-specified point; the nearest vertex to it is used.
    UserSpecified(Point2),
}

/// Score used to rank corners for `SharpestCorner`/`Shortest`/`Back`: a
/// dot-product-based turn score, scaled so results are comparable across
/// differently-sized polygons.
const DOT_SCORE_SCALE: i64 = 20_000;

/// Choose the seam vertex index for one polygon under `policy`, given the
/// previous path's endpoint (used by `Shortest`).
fn choose_seam_index(poly: &Polygon, policy: SeamPolicy, previous_end: Point2, rng: &mut impl Rng) -> usize {
    let n = poly.points.len();
    if n == 0 {
        return 0;
    }
    match policy {
        SeamPolicy::Shortest => closest_vertex(poly, previous_end),
        SeamPolicy::UserSpecified(target) => closest_vertex(poly, target),
        SeamPolicy::Back => (0..n).max_by_key(|&i| poly.points[i].y).unwrap_or(0),
        SeamPolicy::Random => rng.gen_range(0..n),
        SeamPolicy::SharpestCorner => sharpest_corner(poly),
    }
}

fn closest_vertex(poly: &Polygon, target: Point2) -> usize {
    (0..poly.points.len())
        .min_by_key(|&i| (poly.points[i] - target).magnitude_sq())
        .unwrap_or(0)
}

/// Corner score: `dot(n0, n1) - dot(turn90ccw(n0), n1)`, negated for CCW
/// contours so inward ("binnenbocht") corners score highest, matching
/// `getClosestPointInPolygon`'s scoring.
fn sharpest_corner(poly: &Polygon) -> usize {
    let n = poly.points.len();
    if n < 3 {
        return 0;
    }
    let ccw = poly.is_ccw();
    let mut best_index = 0;
    let mut best_score = i128::MIN;
    for i in 0..n {
        let prev = poly.points[(i + n - 1) % n];
        let cur = poly.points[i];
        let next = poly.points[(i + 1) % n];
        let n0 = (cur - prev).normal(DOT_SCORE_SCALE);
        let n1 = (next - cur).normal(DOT_SCORE_SCALE);
        let score = n0.dot(n1) - n0.turn_90_ccw().dot(n1);
        let score = if ccw { -score } else { score };
        if score > best_score {
            best_score = score;
            best_index = i;
        }
    }
    best_index
}

/// Rotate `poly`'s points so index `seam` becomes the first point.
fn rotate_to_seam(poly: &Polygon, seam: usize) -> Polygon {
    if poly.points.is_empty() {
        return poly.clone();
    }
    let n = poly.points.len();
    let mut rotated = Vec::with_capacity(n);
    for i in 0..n {
        rotated.push(poly.points[(seam + i) % n]);
    }
    Polygon::new(rotated)
}

/// Order a set of closed polygons by greedy nearest-unvisited-polygon
/// walk starting from `start_point`, choosing each polygon's seam under
/// `policy` and rotating it so the seam is the first point.
pub fn order_polygons(polygons: &[Polygon], start_point: Point2, policy: SeamPolicy) -> Vec<Polygon> {
    let mut rng = rand::thread_rng();
    let mut remaining: Vec<usize> = (0..polygons.len()).collect();
    let mut ordered = Vec::with_capacity(polygons.len());
    let mut current = start_point;

    while !remaining.is_empty() {
        let (pos_in_remaining, &poly_idx) = remaining
            .iter()
            .enumerate()
            .min_by_key(|&(_, &idx)| {
                let seam = choose_seam_index(&polygons[idx], policy, current, &mut rng);
                (polygons[idx].points[seam] - current).magnitude_sq()
            })
            .expect("remaining is non-empty");

        let seam = choose_seam_index(&polygons[poly_idx], policy, current, &mut rng);
        let rotated = rotate_to_seam(&polygons[poly_idx], seam);
        current = *rotated.points.first().unwrap_or(&current);
        ordered.push(rotated);
        remaining.remove(pos_in_remaining);
    }

    ordered
}

/// Order a set of junction-based wall lines the same way [`order_polygons`]
/// orders plain polygons, rotating each closed line's junctions (rather
/// than a bare point list) so per-point width stays attached to the
/// right point after the seam moves.
pub fn order_extrusion_lines(lines: &[ExtrusionLine], start_point: Point2, policy: SeamPolicy) -> Vec<ExtrusionLine> {
    let mut rng = rand::thread_rng();
    let mut remaining: Vec<usize> = (0..lines.len()).collect();
    let mut ordered = Vec::with_capacity(lines.len());
    let mut current = start_point;

    while !remaining.is_empty() {
        let (pos_in_remaining, &line_idx) = remaining
            .iter()
            .enumerate()
            .min_by_key(|&(_, &idx)| {
                let poly = lines[idx].polygon();
                let seam = choose_seam_index(&poly, policy, current, &mut rng);
                let point = poly.points.get(seam).copied().unwrap_or(current);
                (point - current).magnitude_sq()
            })
            .expect("remaining is non-empty");

        let line = &lines[line_idx];
        let rotated = if line.is_closed && !line.junctions.is_empty() {
            let poly = line.polygon();
            let seam = choose_seam_index(&poly, policy, current, &mut rng);
            line.rotated(seam)
        } else {
            line.clone()
        };
        current = rotated.junctions.first().map(|j| j.point).unwrap_or(current);
        ordered.push(rotated);
        remaining.remove(pos_in_remaining);
    }

    ordered
}

const BUCKET_SIZE_UM: i64 = 5_000;

/// A uniform spatial hash over line endpoints (cell size 5000 um), used
/// to find the nearest unvisited line without an O(n^2) scan.
struct BucketGrid {
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl BucketGrid {
    fn build(points: &[Point2]) -> Self {
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, &p) in points.iter().enumerate() {
            cells.entry(cell_of(p)).or_default().push(i);
        }
        Self { cells }
    }

    fn remove(&mut self, point: Point2, index: usize) {
        if let Some(bucket) = self.cells.get_mut(&cell_of(point)) {
            bucket.retain(|&i| i != index);
        }
    }

    fn nearest(&self, from: Point2, points: &[Point2]) -> Option<usize> {
        let center = cell_of(from);
        for radius in 0i64..64 {
            let mut best: Option<(usize, i128)> = None;
            for dx in -radius..=radius {
                for dy in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    if let Some(bucket) = self.cells.get(&(center.0 + dx, center.1 + dy)) {
                        for &idx in bucket {
                            let d = (points[idx] - from).magnitude_sq();
                            if best.map(|(_, bd)| d < bd).unwrap_or(true) {
                                best = Some((idx, d));
                            }
                        }
                    }
                }
            }
            if best.is_some() {
                return best.map(|(idx, _)| idx);
            }
            if self.cells.values().all(Vec::is_empty) {
                return None;
            }
        }
        None
    }
}

fn cell_of(p: Point2) -> (i64, i64) {
    (p.x.div_euclid(BUCKET_SIZE_UM), p.y.div_euclid(BUCKET_SIZE_UM))
}

/// Order a set of open polylines (infill/support lines) by greedy
/// nearest-endpoint walk, flipping each line's direction when its far end
/// is closer to the current position than its near end.
pub fn order_polylines(lines: &[Polyline], start_point: Point2) -> Vec<Polyline> {
    if lines.is_empty() {
        return Vec::new();
    }
    let starts: Vec<Point2> = lines.iter().map(|l| l.start().unwrap_or(start_point)).collect();
    let ends: Vec<Point2> = lines.iter().map(|l| l.end().unwrap_or(start_point)).collect();

    let mut start_grid = BucketGrid::build(&starts);
    let mut end_grid = BucketGrid::build(&ends);

    let mut visited = vec![false; lines.len()];
    let mut ordered = Vec::with_capacity(lines.len());
    let mut current = start_point;

    for _ in 0..lines.len() {
        let nearest_start = start_grid.nearest(current, &starts);
        let nearest_end = end_grid.nearest(current, &ends);

        let pick_forward = match (nearest_start, nearest_end) {
            (Some(s), Some(e)) => (starts[s] - current).magnitude_sq() <= (ends[e] - current).magnitude_sq(),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        let idx = if pick_forward { nearest_start.unwrap() } else { nearest_end.unwrap() };
        if visited[idx] {
            break;
        }
        visited[idx] = true;
        start_grid.remove(starts[idx], idx);
        end_grid.remove(ends[idx], idx);

        let mut line = lines[idx].clone();
        if !pick_forward {
            line.points.reverse();
        }
        current = line.end().unwrap_or(current);
        ordered.push(line);
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i64) -> Polygon {
        Polygon::new(vec![
            Point2::new(0, 0),
            Point2::new(side, 0),
            Point2::new(side, side),
            Point2::new(0, side),
        ])
    }

    #[test]
    fn shortest_seam_starts_closest_to_previous_end() {
        let poly = square(10_000);
        let ordered = order_polygons(&[poly], Point2::new(9_500, 9_500), SeamPolicy::Shortest);
        assert_eq!(ordered[0].points[0], Point2::new(10_000, 10_000));
    }

    #[test]
    fn back_policy_picks_max_y_vertex() {
        let poly = square(10_000);
        let ordered = order_polygons(&[poly], Point2::origin(), SeamPolicy::Back);
        assert_eq!(ordered[0].points[0].y, 10_000);
    }

    #[test]
    fn order_extrusion_lines_rotates_junctions_not_just_points() {
        use crate::walls::ExtrusionType;
        let line = ExtrusionLine::constant_width(square(10_000).points, 400, ExtrusionType::OuterWall, true, 0);
        let ordered = order_extrusion_lines(&[line], Point2::new(9_500, 9_500), SeamPolicy::Shortest);
        assert_eq!(ordered[0].junctions[0].point, Point2::new(10_000, 10_000));
        assert_eq!(ordered[0].junctions.len(), 4);
    }

    #[test]
    fn order_polylines_visits_every_line_once() {
        let lines = vec![
            Polyline::new(vec![Point2::new(0, 0), Point2::new(1_000, 0)]),
            Polyline::new(vec![Point2::new(5_000, 5_000), Point2::new(6_000, 5_000)]),
        ];
        let ordered = order_polylines(&lines, Point2::origin());
        assert_eq!(ordered.len(), 2);
    }
}
