//! A single closed polygon contour, fixed-point.
//!
//! Works on µm-integer `Point2` coordinates throughout, with `offset`
//! delegated to the `geo` backend (see `polygon_set.rs`) rather than a
//! per-vertex bisector approximation, to meet the "simple result after
//! every offset" invariant (§3).

use super::aabb::Aabb;
use super::point::Point2;

/// An ordered sequence of vertices, implicitly closed (last connects to
/// first). Positive signed area is counter-clockwise (outer contour);
/// negative is a hole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    /// Vertices in order.
    pub points: Vec<Point2>,
}

impl Polygon {
    /// Build a polygon from vertices.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// True if fewer than 3 vertices.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }

    /// Signed area in µm², computed with the shoelace formula widened to
    /// 128 bits (the running sum can exceed `i64` for large contours).
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut area: i128 = 0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x as i128 * self.points[j].y as i128;
            area -= self.points[j].x as i128 * self.points[i].y as i128;
        }
        area as f64 / 2.0
    }

    /// True if the winding is counter-clockwise (outer contour).
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Reverse winding order in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Flip winding so the polygon is CCW.
    pub fn ensure_ccw(&mut self) {
        if !self.is_ccw() {
            self.reverse();
        }
    }

    /// Perimeter length in µm (float, since length is inherently irrational).
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let j = (i + 1) % n;
                (self.points[j] - self.points[i]).length()
            })
            .sum()
    }

    /// Bounding box of this contour.
    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.points.iter().copied())
    }

    /// Remove consecutive duplicate / collinear-degenerate vertices within
    /// `tolerance` µm (Douglas-Peucker-lite: only drops points whose
    /// perpendicular deviation from the chord between their neighbors is
    /// under tolerance). Matches §3's "degenerate vertices are removed"
    /// invariant.
    pub fn simplify(&self, tolerance: i64) -> Polygon {
        let n = self.points.len();
        if n < 4 || tolerance <= 0 {
            return self.clone();
        }
        let tol_sq = (tolerance as i128) * (tolerance as i128);
        let mut out: Vec<Point2> = Vec::with_capacity(n);
        for i in 0..n {
            let prev = self.points[(i + n - 1) % n];
            let cur = self.points[i];
            let next = self.points[(i + 1) % n];
            if point_segment_distance_sq(cur, prev, next) < tol_sq {
                continue;
            }
            out.push(cur);
        }
        if out.len() < 3 {
            return self.clone();
        }
        Polygon::new(out)
    }

    /// Remove this polygon entirely if its unsigned area is below
    /// `min_area` µm².
    pub fn is_small(&self, min_area: f64) -> bool {
        self.signed_area().abs() < min_area
    }
}

/// Squared perpendicular distance from `p` to the line through `a`-`b`,
/// degrading to point-distance when `a == b`.
fn point_segment_distance_sq(p: Point2, a: Point2, b: Point2) -> i128 {
    let ab = b - a;
    let ap = p - a;
    let ab_len_sq = ab.magnitude_sq();
    if ab_len_sq == 0 {
        return ap.magnitude_sq();
    }
    let cross = ab.cross(ap);
    (cross * cross) / ab_len_sq
}

/// An open, non-closed sequence of points (a residual slicing fragment or
/// a generated toolpath segment).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    /// Points along the path, in order.
    pub points: Vec<Point2>,
}

impl Polyline {
    /// Build a polyline from points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total length in µm.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).length()).sum()
    }

    /// First point, if any.
    pub fn start(&self) -> Option<Point2> {
        self.points.first().copied()
    }

    /// Last point, if any.
    pub fn end(&self) -> Option<Point2> {
        self.points.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_is_ccw_with_area_one() {
        let sq = Polygon::new(vec![
            Point2::new(0, 0),
            Point2::new(1000, 0),
            Point2::new(1000, 1000),
            Point2::new(0, 1000),
        ]);
        assert!(sq.is_ccw());
        assert!((sq.signed_area() - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn simplify_drops_near_collinear_point() {
        let poly = Polygon::new(vec![
            Point2::new(0, 0),
            Point2::new(500, 1), // nearly collinear with (0,0)-(1000,0)
            Point2::new(1000, 0),
            Point2::new(1000, 1000),
            Point2::new(0, 1000),
        ]);
        let simplified = poly.simplify(5);
        assert_eq!(simplified.points.len(), 4);
    }
}
