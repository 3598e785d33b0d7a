//! An unordered collection of polygon contours interpreted under the
//! non-zero fill rule: counter-clockwise contours are solid, clockwise
//! contours are holes (§3). Boolean operations and offsetting are the
//! workhorse of every downstream component (D-G).
//!
//! A fixed-point multi-contour set backed by the `geo` crate's
//! exact-predicate `BooleanOps` for the parts that must never produce a
//! self-intersecting result (see DESIGN.md, Open Question 1).

use geo::BooleanOps;

use super::aabb::Aabb;
use super::point::Point2;
use super::polygon::Polygon;

/// How to join corners when offsetting a contour outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Sharp corner, clamped by a miter limit to avoid runaway spikes.
    Miter,
    /// Corner replaced by a polyline approximation of an arc.
    Round,
    /// Corner squared off.
    Square,
}

/// A collection of polygon contours under the non-zero fill rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonSet {
    /// All contours, CCW = solid, CW = hole, in no particular order.
    pub polygons: Vec<Polygon>,
}

/// One outer contour plus the holes it directly contains (§4.C).
#[derive(Debug, Clone)]
pub struct Part {
    /// The outer (CCW) contour.
    pub outer: Polygon,
    /// Holes (CW) contained directly within `outer`.
    pub holes: Vec<Polygon>,
}

impl Part {
    /// This part's outline as a `PolygonSet` (outer + holes).
    pub fn as_set(&self) -> PolygonSet {
        let mut polygons = vec![self.outer.clone()];
        polygons.extend(self.holes.iter().cloned());
        PolygonSet { polygons }
    }

    /// Bounding box of the outer contour.
    pub fn bounding_box(&self) -> Aabb {
        self.outer.bounding_box()
    }
}

impl PolygonSet {
    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a flat list of contours.
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    /// True if there are no contours (or all are degenerate).
    pub fn is_empty(&self) -> bool {
        self.polygons.iter().all(|p| p.is_degenerate())
    }

    /// Total unsigned area in µm².
    pub fn area(&self) -> f64 {
        self.polygons.iter().map(|p| p.signed_area()).sum::<f64>().abs()
    }

    /// Bounding box across all contours.
    pub fn bounding_box(&self) -> Aabb {
        let mut bbox = Aabb::empty();
        for poly in &self.polygons {
            for &p in &poly.points {
                bbox.include(p);
            }
        }
        bbox
    }

    /// Point-in-set test: inside a solid contour and not inside any hole
    /// that contour doesn't itself cancel (non-zero rule approximated as
    /// "inside the union of positives, outside the union of negatives",
    /// which coincides with non-zero for the simple, non-self-overlapping
    /// sets this pipeline produces after each boolean/offset step).
    pub fn contains_point(&self, p: Point2) -> bool {
        let mut inside_positive = false;
        for poly in &self.polygons {
            if !point_in_polygon(p, poly) {
                continue;
            }
            if poly.is_ccw() {
                inside_positive = true;
            } else {
                return false;
            }
        }
        inside_positive
    }

    /// Remove contours with unsigned area below `min_area` µm².
    pub fn remove_small_areas(&self, min_area: f64) -> PolygonSet {
        PolygonSet::new(
            self.polygons
                .iter()
                .filter(|p| !p.is_small(min_area) && !p.is_degenerate())
                .cloned()
                .collect(),
        )
    }

    /// Simplify every contour by `tolerance` µm and drop any that
    /// collapsed below 3 vertices.
    pub fn simplify(&self, tolerance: i64) -> PolygonSet {
        PolygonSet::new(
            self.polygons
                .iter()
                .map(|p| p.simplify(tolerance))
                .filter(|p| !p.is_degenerate())
                .collect(),
        )
    }

    /// Normalize a possibly self-intersecting set into simple contours by
    /// unioning it with the empty set. `geo`'s boolean sweep normalizes
    /// non-simple input the same way a Vatti-style clipper would.
    pub fn repair(&self) -> PolygonSet {
        self.union(&PolygonSet::empty())
    }

    fn to_geo(&self) -> geo::MultiPolygon<f64> {
        let positives: Vec<geo::Polygon<f64>> = self
            .polygons
            .iter()
            .filter(|p| p.is_ccw() && !p.is_degenerate())
            .map(contour_to_geo)
            .collect();
        let negatives: Vec<geo::Polygon<f64>> = self
            .polygons
            .iter()
            .filter(|p| !p.is_ccw() && !p.is_degenerate())
            .map(contour_to_geo)
            .collect();
        let pos = geo::MultiPolygon::new(positives);
        if negatives.is_empty() {
            pos
        } else {
            pos.difference(&geo::MultiPolygon::new(negatives))
        }
    }

    fn from_geo(mp: geo::MultiPolygon<f64>) -> PolygonSet {
        let mut polygons = Vec::new();
        for poly in mp.0 {
            let (exterior, interiors) = poly.into_inner();
            let mut outer = geo_to_contour(&exterior);
            outer.ensure_ccw();
            if !outer.is_degenerate() {
                polygons.push(outer);
            }
            for interior in &interiors {
                let mut hole = geo_to_contour(interior);
                if hole.is_ccw() {
                    hole.reverse();
                }
                if !hole.is_degenerate() {
                    polygons.push(hole);
                }
            }
        }
        PolygonSet::new(polygons)
    }

    /// Union of two sets.
    pub fn union(&self, other: &PolygonSet) -> PolygonSet {
        PolygonSet::from_geo(self.to_geo().union(&other.to_geo()))
    }

    /// Intersection of two sets.
    pub fn intersection(&self, other: &PolygonSet) -> PolygonSet {
        PolygonSet::from_geo(self.to_geo().intersection(&other.to_geo()))
    }

    /// `self` minus `other`.
    pub fn difference(&self, other: &PolygonSet) -> PolygonSet {
        PolygonSet::from_geo(self.to_geo().difference(&other.to_geo()))
    }

    /// Symmetric difference.
    pub fn xor(&self, other: &PolygonSet) -> PolygonSet {
        PolygonSet::from_geo(self.to_geo().xor(&other.to_geo()))
    }

    /// Union of many sets (fold; avoids repeated empty-set conversions).
    pub fn union_all<'a>(sets: impl IntoIterator<Item = &'a PolygonSet>) -> PolygonSet {
        let mut acc = PolygonSet::empty();
        for s in sets {
            acc = acc.union(s);
        }
        acc
    }

    /// Minkowski offset by `distance` µm (positive = outward/dilate,
    /// negative = inward/erode), per §4 "Inset / offset" in the glossary.
    /// Each contour is offset independently using its own winding to
    /// determine the outward direction, then the whole result is repaired
    /// via boolean self-union to restore simplicity (§3 invariant).
    pub fn offset(&self, distance: i64, join: JoinType) -> PolygonSet {
        if distance == 0 {
            return self.clone();
        }
        let raw: Vec<Polygon> = self
            .polygons
            .iter()
            .filter(|p| !p.is_degenerate())
            .filter_map(|p| offset_contour(p, distance, join))
            .collect();
        PolygonSet::new(raw).repair()
    }

    /// Split the union of this set's contours into connected parts, each
    /// an outer contour with the holes it directly contains (§4.C). The
    /// set is unioned first so overlapping input contours merge.
    pub fn split_into_parts(&self) -> Vec<Part> {
        let unioned = self.repair();
        let outers: Vec<&Polygon> = unioned.polygons.iter().filter(|p| p.is_ccw()).collect();
        let holes: Vec<&Polygon> = unioned.polygons.iter().filter(|p| !p.is_ccw()).collect();

        let mut parts: Vec<Part> = outers
            .iter()
            .map(|o| Part {
                outer: (*o).clone(),
                holes: Vec::new(),
            })
            .collect();

        for hole in holes {
            if let Some(sample) = hole.points.first() {
                if let Some(idx) = outers.iter().position(|o| point_in_polygon(*sample, o)) {
                    parts[idx].holes.push(hole.clone());
                }
            }
        }
        parts
    }
}

/// Ray-casting point-in-polygon test (even-odd over a single contour),
/// using 128-bit integer comparisons throughout to avoid float division.
pub fn point_in_polygon(point: Point2, polygon: &Polygon) -> bool {
    let n = polygon.points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon.points[i];
        let pj = polygon.points[j];
        if (pi.y > point.y) != (pj.y > point.y) {
            // x_intersect = pi.x + (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y)
            let num = (pj.x - pi.x) as i128 * (point.y - pi.y) as i128;
            let den = (pj.y - pi.y) as i128;
            let x_intersect = pi.x as i128 + num / den;
            if (point.x as i128) < x_intersect {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn offset_contour(poly: &Polygon, distance: i64, join: JoinType) -> Option<Polygon> {
    let n = poly.points.len();
    if n < 3 {
        return None;
    }
    let sign = if poly.is_ccw() { 1 } else { -1 };
    let d = (distance * sign) as f64;
    let miter_limit = 3.0;

    let mut out = Vec::with_capacity(n * 2);
    for i in 0..n {
        let prev = poly.points[(i + n - 1) % n];
        let cur = poly.points[i];
        let next = poly.points[(i + 1) % n];

        let e1 = unit(cur - prev);
        let e2 = unit(next - cur);
        // Outward normals (left of travel direction for a CCW contour).
        let n1 = (-e1.1, e1.0);
        let n2 = (-e2.1, e2.0);

        let bisector = (n1.0 + n2.0, n1.1 + n2.1);
        let blen = (bisector.0 * bisector.0 + bisector.1 * bisector.1).sqrt();

        let convex_corner = cross(e1, e2) >= 0.0;

        if blen < 1e-9 {
            // 180 degree fold; offset straight along either normal.
            out.push(Point2::from_f64(cur.x as f64 + n1.0 * d, cur.y as f64 + n1.1 * d));
            continue;
        }
        let bisector = (bisector.0 / blen, bisector.1 / blen);
        let cos_half = dot(n1, bisector).max(1e-3);
        let miter_len = 1.0 / cos_half;

        match join {
            JoinType::Miter if miter_len <= miter_limit || !convex_corner => {
                let off = d * miter_len;
                out.push(Point2::from_f64(cur.x as f64 + bisector.0 * off, cur.y as f64 + bisector.1 * off));
            }
            JoinType::Round if convex_corner && d > 0.0 => {
                push_arc(&mut out, cur, n1, n2, d);
            }
            _ => {
                // Square join, or a miter past its limit: bevel with two points.
                out.push(Point2::from_f64(cur.x as f64 + n1.0 * d, cur.y as f64 + n1.1 * d));
                out.push(Point2::from_f64(cur.x as f64 + n2.0 * d, cur.y as f64 + n2.1 * d));
            }
        }
    }

    let result = Polygon::new(out);
    if result.is_degenerate() || result.signed_area().abs() < 1.0 {
        return None;
    }
    Some(result)
}

/// Append a polyline arc approximation from normal `n1` to `n2` around
/// `center`, radius `|d|`, used for `JoinType::Round` at convex corners.
fn push_arc(out: &mut Vec<Point2>, center: Point2, n1: (f64, f64), n2: (f64, f64), d: f64) {
    let a0 = n1.1.atan2(n1.0);
    let mut a1 = n2.1.atan2(n2.0);
    if a1 < a0 {
        a1 += std::f64::consts::TAU;
    }
    let steps = (((a1 - a0) / 0.3).ceil() as usize).max(1);
    for s in 0..=steps {
        let t = a0 + (a1 - a0) * (s as f64 / steps as f64);
        out.push(Point2::from_f64(center.x as f64 + t.cos() * d, center.y as f64 + t.sin() * d));
    }
}

fn unit(p: Point2) -> (f64, f64) {
    let len = p.length();
    if len < 1e-9 {
        (0.0, 0.0)
    } else {
        (p.x as f64 / len, p.y as f64 / len)
    }
}

fn cross(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.1 - a.1 * b.0
}

fn dot(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.0 + a.1 * b.1
}

fn contour_to_geo(poly: &Polygon) -> geo::Polygon<f64> {
    let coords: Vec<geo::Coord<f64>> = poly
        .points
        .iter()
        .map(|p| geo::Coord { x: p.x as f64, y: p.y as f64 })
        .collect();
    geo::Polygon::new(geo::LineString::new(coords), vec![])
}

fn geo_to_contour(ls: &geo::LineString<f64>) -> Polygon {
    let mut points: Vec<Point2> = ls.coords().map(|c| Point2::from_f64(c.x, c.y)).collect();
    // geo closes rings by repeating the first point; drop the duplicate.
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Polygon::new(points)
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
    fn union_with_empty_is_identity_in_area() {
        let set = PolygonSet::new(vec![square(10_000)]);
        let result = set.union(&PolygonSet::empty());
        assert!((result.area() - set.area()).abs() < 1.0);
    }

    #[test]
    fn difference_with_self_is_empty() {
        let set = PolygonSet::new(vec![square(10_000)]);
        let result = set.difference(&set);
        assert!(result.area() < 1.0);
    }

    #[test]
    fn offset_inward_shrinks_square() {
        let set = PolygonSet::new(vec![square(10_000)]);
        let shrunk = set.offset(-1_000, JoinType::Miter);
        // 10mm square offset inward 1mm -> 8mm square, area 64mm^2 = 64e6 um^2
        assert!((shrunk.area() - 64_000_000.0).abs() < 2_000_000.0);
    }

    #[test]
    fn split_into_parts_attaches_hole_to_its_outer() {
        let outer = square(10_000);
        let mut hole = Polygon::new(vec![
            Point2::new(2_000, 2_000),
            Point2::new(2_000, 8_000),
            Point2::new(8_000, 8_000),
            Point2::new(8_000, 2_000),
        ]);
        assert!(!hole.is_ccw());
        let set = PolygonSet::new(vec![outer, { hole.reverse(); hole.reverse(); hole }]);
        let parts = set.split_into_parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].holes.len(), 1);
    }
}
