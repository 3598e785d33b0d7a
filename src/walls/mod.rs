//! Wall (inset) generation (component D, §4.D).
//!
//! Dispatches between the constant-width classical path
//! ([`classic::generate_classic_walls`]) and the variable-width beading
//! path ([`skeletal::generate_skeletal_walls`]) per the `wall_distribution`
//! setting.

pub mod beading;
pub mod classic;
pub mod skeletal;

use crate::geom::{Point2, Polygon, PolygonSet};
use crate::settings::Settings;

pub use beading::{BeadingStrategyKind, BeadingParams};
pub use classic::ClassicWallSettings;
pub use skeletal::SkeletalWallSettings;

/// Which kind of wall a junction belongs to, carried through so later
/// stages (path ordering, G-code assembly) can tell the outermost
/// perimeter apart from the inner ones without re-deriving it from
/// `inset_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtrusionType {
    OuterWall,
    InnerWall,
}

/// One point along an extrusion line: its position, the width the
/// extruder should be laying down there, and which wall kind it belongs
/// to. Width is per-junction rather than per-line so a bead can narrow
/// or widen along its length through a transition.
#[derive(Debug, Clone, Copy)]
pub struct Junction {
    pub point: Point2,
    pub width_um: i64,
    pub extrusion_type: ExtrusionType,
}

/// One generated wall line: an ordered sequence of junctions. A closed
/// line's last junction implicitly connects back to its first.
#[derive(Debug, Clone)]
pub struct ExtrusionLine {
    /// The junction sequence.
    pub junctions: Vec<Junction>,
    /// True if this line is a closed loop rather than an open polyline.
    pub is_closed: bool,
    /// 0 = outermost wall, increasing inward.
    pub inset_index: usize,
}

impl ExtrusionLine {
    /// Build a line whose width is the same at every junction, for paths
    /// that don't vary along their length.
    pub fn constant_width(points: impl IntoIterator<Item = Point2>, width_um: i64, extrusion_type: ExtrusionType, is_closed: bool, inset_index: usize) -> Self {
        let junctions = points
            .into_iter()
            .map(|point| Junction {
                point,
                width_um,
                extrusion_type,
            })
            .collect();
        Self {
            junctions,
            is_closed,
            inset_index,
        }
    }

    /// The line's point sequence alone, for callers that only need the
    /// path geometry (gap detection, seam rotation).
    pub fn polygon(&self) -> Polygon {
        Polygon::new(self.junctions.iter().map(|j| j.point).collect())
    }

    /// The widest junction width on this line, used where a single
    /// representative width is needed.
    pub fn max_width_um(&self) -> i64 {
        self.junctions.iter().map(|j| j.width_um).max().unwrap_or(0)
    }

    /// Cyclically rotate a closed line's junctions so the one at `start`
    /// comes first, mirroring `path_order`'s point rotation so seam
    /// choice stays in sync with per-point width.
    pub fn rotated(&self, start: usize) -> Self {
        let n = self.junctions.len();
        if n == 0 {
            return self.clone();
        }
        let start = start % n;
        let mut junctions = Vec::with_capacity(n);
        junctions.extend_from_slice(&self.junctions[start..]);
        junctions.extend_from_slice(&self.junctions[..start]);
        Self {
            junctions,
            is_closed: self.is_closed,
            inset_index: self.inset_index,
        }
    }
}

/// The output of wall generation for one region: the wall lines plus the
/// interior left over for skin/infill (§4.E/F).
#[derive(Debug, Clone, Default)]
pub struct WallToolpaths {
    /// Generated wall lines, outermost first.
    pub walls: Vec<ExtrusionLine>,
    /// What's left after removing the walls' footprint from the region.
    pub interior: PolygonSet,
}

/// Which wall generation path to use and its tuning.
#[derive(Debug, Clone, Copy)]
pub enum WallStrategy {
    /// §4.D constant-width path.
    Classic(ClassicWallSettings),
    /// §4.D variable-width path.
    Skeletal {
        kind: BeadingStrategyKind,
        settings: SkeletalWallSettings,
    },
}

/// Read wall settings from the registry (§6), defaulting to the
/// constant-width path when `wall_distribution` is unset or `"naive"`.
pub fn strategy_from_settings(settings: &Settings) -> WallStrategy {
    let wall_count = settings.get_int("wall_count").unwrap_or(3).max(0) as usize;
    let line_width_um = settings.get_length_um("line_width").unwrap_or(400);
    let outer_line_width_um = settings.get_length_um("outer_wall_line_width").unwrap_or(line_width_um);
    let distribution = settings.get_str("wall_distribution");

    match distribution.as_str() {
        "center_deviation" | "distributed" | "inward_distributed" => {
            let kind = match distribution.as_str() {
                "center_deviation" => BeadingStrategyKind::CenterDeviation,
                "inward_distributed" => BeadingStrategyKind::InwardDistributed,
                _ => BeadingStrategyKind::Distributed,
            };
            WallStrategy::Skeletal {
                kind,
                settings: SkeletalWallSettings {
                    max_bead_count: wall_count.max(1),
                    params: BeadingParams {
                        optimal_width_um: line_width_um,
                        minimum_width_um: (line_width_um * 2) / 5,
                    },
                    thickness_precision_um: 10,
                },
            }
        }
        _ => WallStrategy::Classic(ClassicWallSettings {
            wall_count,
            line_width_um,
            outer_line_width_um,
            wall_0_inset_um: settings.get_length_um("wall_0_inset").unwrap_or(0),
            spiralize: settings.get_bool("magic_spiralize").unwrap_or(false),
            max_retries: 3,
        }),
    }
}

/// Generate walls for one region under the chosen strategy.
pub fn generate_walls(region: &PolygonSet, strategy: &WallStrategy) -> WallToolpaths {
    match strategy {
        WallStrategy::Classic(settings) => {
            let (walls, interior) = classic::generate_classic_walls(region, settings);
            WallToolpaths { walls, interior }
        }
        WallStrategy::Skeletal { kind, settings } => {
            let beading = beading::build_strategy(*kind, settings.params);
            let (walls, interior) = skeletal::generate_skeletal_walls(region, beading.as_ref(), settings);
            WallToolpaths { walls, interior }
        }
    }
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
    fn default_settings_resolve_to_classic_strategy() {
        let settings = Settings::new();
        let strategy = strategy_from_settings(&settings);
        assert!(matches!(strategy, WallStrategy::Classic(_)));
    }

    #[test]
    fn generate_walls_produces_nonempty_output_for_classic() {
        let region = square(10_000);
        let strategy = WallStrategy::Classic(ClassicWallSettings::default());
        let result = generate_walls(&region, &strategy);
        assert!(!result.walls.is_empty());
    }
}
