//! Scanline infill pattern generation (§4.F).
//!
//! Implements the rotate-scan-pair-verify scanline algorithm in
//! fixed-point, with density-scaled line spacing and multi-angle-pass
//! patterns (Grid runs two perpendicular passes, Triangles three 60-degree
//! passes).

use crate::geom::{Point2, Polygon, PolygonSet, Polyline};

/// Which infill pattern to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfillPattern {
    /// Parallel lines at a single angle, alternating 45/-45 by layer.
    Lines,
    /// Two perpendicular line passes.
    Grid,
    /// Three line passes at 60 degrees apart.
    Triangles,
    /// Successive inward offsets of the boundary.
    Concentric,
    /// Connected back-and-forth lines (no travel moves between rows).
    ZigZag,
}

/// Tuning for pattern generation.
#[derive(Debug, Clone, Copy)]
pub struct PatternSettings {
    /// Extrusion line width, micrometers.
    pub line_width_um: i64,
    /// Fill density in `(0.0, 1.0]`; line spacing scales as `line_width /
    /// density`.
    pub density: f64,
    /// 0-based layer index, used to alternate angles for Lines/Grid.
    pub layer_index: usize,
}

/// Generate infill polylines (and, for `Concentric`, closed rings) filling
/// `boundary` at the requested pattern and density.
pub fn generate(boundary: &PolygonSet, pattern: InfillPattern, settings: &PatternSettings) -> Vec<Polyline> {
    if boundary.is_empty() || settings.density <= 0.0 {
        return Vec::new();
    }
    let spacing = line_spacing(settings);

    match pattern {
        InfillPattern::Lines => {
            let angle = if settings.layer_index % 2 == 0 { 45.0_f64.to_radians() } else { -45.0_f64.to_radians() };
            generate_parallel_lines(boundary, spacing, angle)
        }
        InfillPattern::Grid => {
            let mut lines = generate_parallel_lines(boundary, spacing * 2, 0.0);
            lines.extend(generate_parallel_lines(boundary, spacing * 2, std::f64::consts::FRAC_PI_2));
            lines
        }
        InfillPattern::Triangles => {
            let mut lines = generate_parallel_lines(boundary, spacing * 3, 0.0);
            lines.extend(generate_parallel_lines(boundary, spacing * 3, 60.0_f64.to_radians()));
            lines.extend(generate_parallel_lines(boundary, spacing * 3, -60.0_f64.to_radians()));
            lines
        }
        InfillPattern::Concentric => generate_concentric(boundary, spacing),
        InfillPattern::ZigZag => generate_parallel_lines(boundary, spacing, 0.0),
    }
}

fn line_spacing(settings: &PatternSettings) -> i64 {
    let density = settings.density.clamp(0.01, 1.0);
    ((settings.line_width_um as f64) / density).round() as i64
}

/// Successive inward offsets of the boundary, each ring one line width in
/// from the last, until the region collapses.
fn generate_concentric(boundary: &PolygonSet, spacing: i64) -> Vec<Polyline> {
    let mut lines = Vec::new();
    let mut current = boundary.clone();
    let mut offset = spacing / 2;
    loop {
        let ring = boundary.offset(-offset, crate::geom::JoinType::Round);
        if ring.is_empty() {
            break;
        }
        for poly in &ring.polygons {
            let mut points = poly.points.clone();
            if let Some(&first) = points.first() {
                points.push(first);
            }
            lines.push(Polyline::new(points));
        }
        current = ring;
        offset += spacing;
        if current.is_empty() {
            break;
        }
    }
    lines
}

/// Rotate-scan-pair-verify scanline algorithm: rotate the boundary's
/// bounding box into the scan direction, sweep parallel lines across it,
/// intersect each with every boundary edge, pair up crossings, and keep
/// the segments whose midpoint falls inside the boundary.
fn generate_parallel_lines(boundary: &PolygonSet, spacing: i64, angle_rad: f64) -> Vec<Polyline> {
    if spacing <= 0 {
        return Vec::new();
    }
    let dir = Point2::from_f64(angle_rad.cos(), angle_rad.sin());
    let perp = dir.turn_90_ccw();

    let bbox = boundary.bounding_box();
    if bbox.is_empty() {
        return Vec::new();
    }
    let corners = [
        Point2::new(bbox.min.x, bbox.min.y),
        Point2::new(bbox.max.x, bbox.min.y),
        Point2::new(bbox.max.x, bbox.max.y),
        Point2::new(bbox.min.x, bbox.max.y),
    ];
    let (perp_f, dir_f) = (perp.as_f64(), dir.as_f64());
    let project_perp = |p: Point2| p.x as f64 * perp_f.0 + p.y as f64 * perp_f.1;
    let project_dir = |p: Point2| p.x as f64 * dir_f.0 + p.y as f64 * dir_f.1;

    let perp_min = corners.iter().map(|&c| project_perp(c)).fold(f64::MAX, f64::min);
    let perp_max = corners.iter().map(|&c| project_perp(c)).fold(f64::MIN, f64::max);
    let dir_min = corners.iter().map(|&c| project_dir(c)).fold(f64::MAX, f64::min) - spacing as f64;
    let dir_max = corners.iter().map(|&c| project_dir(c)).fold(f64::MIN, f64::max) + spacing as f64;

    let mut lines = Vec::new();
    let mut scan = perp_min + spacing as f64 / 2.0;
    while scan <= perp_max {
        let origin = Point2::from_f64(perp_f.0 * scan + dir_f.0 * dir_min, perp_f.1 * scan + dir_f.1 * dir_min);
        let far = Point2::from_f64(perp_f.0 * scan + dir_f.0 * dir_max, perp_f.1 * scan + dir_f.1 * dir_max);

        let mut crossings = find_crossings(boundary, origin, far);
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        for pair in crossings.chunks_exact(2) {
            let p0 = lerp_along(origin, far, pair[0]);
            let p1 = lerp_along(origin, far, pair[1]);
            let mid = Point2::new((p0.x + p1.x) / 2, (p0.y + p1.y) / 2);
            if boundary.contains_point(mid) {
                lines.push(Polyline::new(vec![p0, p1]));
            }
        }

        scan += spacing as f64;
    }
    lines
}

fn lerp_along(a: Point2, b: Point2, t: f64) -> Point2 {
    Point2::from_f64(a.x as f64 + t * (b.x - a.x) as f64, a.y as f64 + t * (b.y - a.y) as f64)
}

/// Find the parametric `t` (0..1 along `a->b`) of every crossing between
/// segment `a->b` and every edge of every polygon in `boundary`.
fn find_crossings(boundary: &PolygonSet, a: Point2, b: Point2) -> Vec<f64> {
    let mut ts = Vec::new();
    for poly in &boundary.polygons {
        collect_edge_crossings(poly, a, b, &mut ts);
    }
    ts
}

fn collect_edge_crossings(poly: &Polygon, a: Point2, b: Point2, out: &mut Vec<f64>) {
    let n = poly.points.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        let c = poly.points[i];
        let d = poly.points[(i + 1) % n];
        if let Some(t) = segment_intersection_t(a, b, c, d) {
            out.push(t);
        }
    }
}

/// Parametric intersection of segment `a->b` at the point it crosses
/// `c->d`, or `None` if they don't cross.
fn segment_intersection_t(a: Point2, b: Point2, c: Point2, d: Point2) -> Option<f64> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom == 0 {
        return None;
    }
    let diff = c - a;
    let t_num = diff.cross(s);
    let u_num = diff.cross(r);
    let t = t_num as f64 / denom as f64;
    let u = u_num as f64 / denom as f64;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}
