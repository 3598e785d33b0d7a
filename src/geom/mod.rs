//! Fixed-point 2D/3D geometry primitives (component A).
//!
//! Everything the rest of the pipeline builds on: micrometer-integer
//! points, polygons, polygon sets with boolean/offset operations, and
//! bounding boxes. See DESIGN.md, Open Question 1, for how `PolygonSet`
//! balances the integer-only API contract (§3) against reusing an
//! audited exact-predicate clipping backend.

pub mod aabb;
pub mod point;
pub mod polygon;
pub mod polygon_set;

pub use aabb::{Aabb, Aabb3D};
pub use point::{Point2, Point3};
pub use polygon::{Polygon, Polyline};
pub use polygon_set::{JoinType, Part, PolygonSet};
