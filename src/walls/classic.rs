//! Constant-width inset generation (§4.D "Constant-width path"):
//! successively offset a region's outline inward by one line width per
//! wall, same width throughout.
//!
//! Handles the `wall_count == 0`/`1` edge cases and a part-count-explosion
//! retry: offsetting a thin or branching region can split one contour into
//! many; if that happens beyond a sane bound, the whole inset is retried
//! one line width narrower before giving up on that wall.

use crate::geom::{JoinType, Polygon, PolygonSet};

use super::{ExtrusionLine, ExtrusionType};

/// Settings for the constant-width path.
#[derive(Debug, Clone, Copy)]
pub struct ClassicWallSettings {
    /// Number of wall lines to generate.
    pub wall_count: usize,
    /// Nominal line width, micrometers.
    pub line_width_um: i64,
    /// First wall's line width, if different (first-layer width multiplier
    /// effects land here), micrometers.
    pub outer_line_width_um: i64,
    /// Extra inward offset applied to the outer wall's centerline only
    /// (e.g. to compensate for die-swell on the visible surface),
    /// micrometers.
    pub wall_0_inset_um: i64,
    /// If true, only the single outermost wall is generated and its Z
    /// height ramps continuously across the layer (spiralize / "vase
    /// mode"); `wall_count` is ignored and treated as 1.
    pub spiralize: bool,
    /// Safety bound on how many times a part-count explosion triggers a
    /// narrower retry before giving up on remaining insets for a region.
    pub max_retries: u32,
}

impl Default for ClassicWallSettings {
    fn default() -> Self {
        Self {
            wall_count: 3,
            line_width_um: 400,
            outer_line_width_um: 400,
            wall_0_inset_um: 0,
            spiralize: false,
            max_retries: 3,
        }
    }
}

/// Generate constant-width walls for one region (one part's outline, i.e.
/// outer contour plus its holes, already combined into a `PolygonSet`).
/// Returns the walls plus the remaining interior, the shape skin/infill
/// generation (§4.E/F) consumes.
pub fn generate_classic_walls(region: &PolygonSet, settings: &ClassicWallSettings) -> (Vec<ExtrusionLine>, PolygonSet) {
    if region.is_empty() {
        return (Vec::new(), PolygonSet::empty());
    }

    let wall_count = if settings.spiralize { 1 } else { settings.wall_count };
    if wall_count == 0 {
        return (Vec::new(), region.clone());
    }

    let mut walls = Vec::new();
    let mut current = region.clone();
    let mut centerline = region.clone();

    for i in 0..wall_count {
        let width = if i == 0 { settings.outer_line_width_um } else { settings.line_width_um };
        centerline = centerline.offset(centerline_step(settings, i), JoinType::Miter);

        let extrusion_type = if i == 0 { ExtrusionType::OuterWall } else { ExtrusionType::InnerWall };
        for poly in &centerline.polygons {
            walls.push(ExtrusionLine::constant_width(poly.points.iter().copied(), width, extrusion_type, true, i));
        }

        let inset = offset_with_retry(&current, -width, settings.max_retries);
        current = inset;
        if current.is_empty() {
            return (walls, PolygonSet::empty());
        }
    }

    (walls, current)
}

/// The offset from wall `i - 1`'s centerline to wall `i`'s, chaining the
/// literal per-wall formula: `insets[0] = outline.offset(-w0/2 -
/// wall_0_inset)`, `insets[1] = insets[0].offset(-w0/2 + wall_0_inset -
/// wx/2)`, `insets[i>=2] = insets[i-1].offset(-wx)`.
fn centerline_step(settings: &ClassicWallSettings, i: usize) -> i64 {
    let half_outer = settings.outer_line_width_um / 2;
    let half_inner = settings.line_width_um / 2;
    match i {
        0 => -half_outer - settings.wall_0_inset_um,
        1 => -half_outer + settings.wall_0_inset_um - half_inner,
        _ => -settings.line_width_um,
    }
}

/// Offset `region` inward by `-distance`, retrying with a narrower
/// distance if the result's contour count explodes past what the input
/// had (a thin bridge splitting into many slivers), per §4.D's retry
/// clause. Gives up (keeps the exploded result) after `max_retries`.
fn offset_with_retry(region: &PolygonSet, distance: i64, max_retries: u32) -> PolygonSet {
    let input_count = region.polygons.len().max(1);
    let mut d = distance;
    for attempt in 0..=max_retries {
        let result = region.offset(d, JoinType::Miter);
        let exploded = result.polygons.len() > input_count * 4;
        if !exploded || attempt == max_retries {
            return result;
        }
        // Retry one tenth narrower; narrower offsets merge slivers back
        // together before they become separate contours.
        d = (d * 9) / 10;
        log::debug!(target: "fff_slicer::walls", "inset exploded into {} contours, retrying at {d}um", result.polygons.len());
    }
    region.offset(distance, JoinType::Miter)
}

/// Close a polyline into a spiralized single-wall path by duplicating its
/// start point at a slightly raised Z, giving the continuous ramp
/// "vase mode" printers expect. The Z ramp itself is applied by the
/// caller (component I) once wall order within the layer is fixed; this
/// just marks which walls participate.
pub fn is_spiralized_wall(line: &ExtrusionLine) -> bool {
    line.inset_index == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point2;

    fn square(side: i64) -> PolygonSet {
        PolygonSet::new(vec![Polygon::new(vec![
            Point2::new(0, 0),
            Point2::new(side, 0),
            Point2::new(side, side),
            Point2::new(0, side),
        ])])
    }

    #[test]
    fn wall_count_zero_returns_whole_region_as_interior() {
        let region = square(10_000);
        let settings = ClassicWallSettings {
            wall_count: 0,
            ..Default::default()
        };
        let (walls, interior) = generate_classic_walls(&region, &settings);
        assert!(walls.is_empty());
        assert!((interior.area() - region.area()).abs() < 1.0);
    }

    #[test]
    fn three_walls_nest_and_shrink_interior() {
        let region = square(10_000);
        let settings = ClassicWallSettings {
            wall_count: 3,
            line_width_um: 400,
            outer_line_width_um: 400,
            ..Default::default()
        };
        let (walls, interior) = generate_classic_walls(&region, &settings);
        assert_eq!(walls.len(), 3);
        assert!(interior.area() < region.area());
    }

    #[test]
    fn spiralize_generates_single_wall() {
        let region = square(10_000);
        let settings = ClassicWallSettings {
            wall_count: 5,
            spiralize: true,
            ..Default::default()
        };
        let (walls, _) = generate_classic_walls(&region, &settings);
        assert_eq!(walls.len(), 1);
        assert!(is_spiralized_wall(&walls[0]));
    }
}
