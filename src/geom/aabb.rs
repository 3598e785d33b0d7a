//! Axis-aligned bounding boxes in fixed-point.
//!
//! A prior revision of `AABB3D::hit` compared `max.x < other.min.y` (a
//! cross-axis typo); this implementation uses the corrected per-axis
//! overlap test (see DESIGN.md, Open Question 3).

use super::point::{Point2, Point3};

/// An axis-aligned rectangle in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point2,
    /// Maximum corner.
    pub max: Point2,
}

impl Aabb {
    /// An AABB containing nothing — any `include` replaces it entirely.
    pub fn empty() -> Self {
        Self {
            min: Point2::new(i64::MAX, i64::MAX),
            max: Point2::new(i64::MIN, i64::MIN),
        }
    }

    /// True if this box has never had a point included.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Grow the box to include `p`.
    pub fn include(&mut self, p: Point2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Build an AABB from a point iterator.
    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include(p);
        }
        aabb
    }

    /// True iff the two boxes overlap, inclusive of touching edges.
    pub fn hit(&self, other: &Aabb) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Expand the box outward by `d` micrometers on every side.
    pub fn expanded(&self, d: i64) -> Self {
        Self {
            min: Point2::new(self.min.x - d, self.min.y - d),
            max: Point2::new(self.max.x + d, self.max.y + d),
        }
    }
}

/// An axis-aligned box in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aabb3D {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3D {
    /// An AABB3D containing nothing.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(i64::MAX, i64::MAX, i64::MAX),
            max: Point3::new(i64::MIN, i64::MIN, i64::MIN),
        }
    }

    /// True if this box has never had a point included.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to include `p`.
    pub fn include(&mut self, p: Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Per-axis overlap test (corrected; see module docs).
    pub fn hit(&self, other: &Aabb3D) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Translate the box.
    pub fn offset(&mut self, d: Point3) {
        self.min = self.min + d;
        self.max = self.max + d;
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for Aabb3D {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_detects_overlap_on_every_axis() {
        let a = Aabb3D {
            min: Point3::new(0, 0, 0),
            max: Point3::new(10, 10, 10),
        };
        // Disjoint only in Y — the legacy bug compared X against Y and
        // would have missed this.
        let b = Aabb3D {
            min: Point3::new(5, 20, 5),
            max: Point3::new(15, 30, 15),
        };
        assert!(!a.hit(&b));
    }

    #[test]
    fn hit_true_when_touching_inclusive() {
        let a = Aabb::from_points([Point2::new(0, 0), Point2::new(10, 10)]);
        let b = Aabb::from_points([Point2::new(10, 0), Point2::new(20, 10)]);
        assert!(a.hit(&b));
    }
}
