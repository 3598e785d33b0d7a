//! Skin and sparse-infill classification (component E, §4.E).
//!
//! Decides, for each layer's wall interior, which area is top/bottom skin
//! (solid fill, because the model doesn't continue for `top_layers`/
//! `bottom_layers` layers in that direction), which is a perimeter gap
//! (too narrow for a full infill line but wide enough to matter), and
//! which is sparse infill — then reduces how often sparse infill actually
//! needs to be drawn via "combine layers" (several thin layers' infill
//! merged into one thicker pass).
//!
//! Implemented as cross-layer boolean differencing over `PolygonSet`s,
//! matching the `skin.cpp`/`SkinInfillAreaComputation` semantics
//! described in §4.E.

use crate::geom::PolygonSet;
use crate::walls::WallToolpaths;

/// Tuning for skin/infill classification.
#[derive(Debug, Clone, Copy)]
pub struct SkinSettings {
    /// How many layers of "no ceiling above" makes an area top skin.
    pub top_layers: usize,
    /// How many layers of "no floor below" makes an area bottom skin.
    pub bottom_layers: usize,
    /// Sparse infill is only evaluated once every this many layers; the
    /// result is reused (thicker, less frequent passes) for the rest.
    pub infill_combine_layers: usize,
    /// Minimum perimeter-gap width worth filling, micrometers; narrower
    /// slivers are dropped as noise.
    pub min_gap_width_um: i64,
}

impl Default for SkinSettings {
    fn default() -> Self {
        Self {
            top_layers: 4,
            bottom_layers: 4,
            infill_combine_layers: 1,
            min_gap_width_um: 50,
        }
    }
}

/// The classified regions for one layer.
#[derive(Debug, Clone, Default)]
pub struct LayerSkin {
    /// Solid top-surface fill area.
    pub top: PolygonSet,
    /// Solid bottom-surface fill area.
    pub bottom: PolygonSet,
    /// Thin leftover area between walls and the fill boundary.
    pub perimeter_gaps: PolygonSet,
    /// Area to fill with sparse infill (possibly empty if this layer was
    /// skipped by layer-combining).
    pub sparse_infill: PolygonSet,
}

/// Classify skin for every layer given each layer's post-wall interior
/// region (index-aligned, bottom layer first).
pub fn classify_all(interiors: &[PolygonSet], wall_toolpaths: &[WallToolpaths], regions: &[PolygonSet], settings: &SkinSettings) -> Vec<LayerSkin> {
    let combine_groups = combine_layer_groups(interiors.len(), settings.infill_combine_layers);

    (0..interiors.len())
        .map(|i| {
            let (top, bottom) = classify_top_bottom(interiors, i, settings.top_layers, settings.bottom_layers);
            let skin = top.union(&bottom);
            let perimeter_gaps = perimeter_gap_area(&regions[i], &wall_toolpaths[i], &interiors[i], settings.min_gap_width_um);
            let sparse_infill = sparse_infill_for_layer(interiors, i, &skin, &perimeter_gaps, &combine_groups);
            LayerSkin {
                top,
                bottom,
                perimeter_gaps,
                sparse_infill,
            }
        })
        .collect()
}

fn classify_top_bottom(interiors: &[PolygonSet], index: usize, top_layers: usize, bottom_layers: usize) -> (PolygonSet, PolygonSet) {
    let current = interiors[index].clone();

    let top = if top_layers == 0 {
        PolygonSet::empty()
    } else {
        let above_available = interiors.len().saturating_sub(index + 1);
        if above_available < top_layers {
            current.clone()
        } else {
            let ceiling = intersect_range(interiors, index + 1, top_layers);
            current.difference(&ceiling)
        }
    };

    let bottom = if bottom_layers == 0 {
        PolygonSet::empty()
    } else if index < bottom_layers {
        current.clone()
    } else {
        let floor = intersect_range(interiors, index - bottom_layers, bottom_layers);
        current.difference(&floor)
    };

    (top, bottom)
}

fn intersect_range(interiors: &[PolygonSet], start: usize, count: usize) -> PolygonSet {
    if count == 0 || start >= interiors.len() {
        return PolygonSet::empty();
    }
    let end = (start + count).min(interiors.len());
    let mut acc = interiors[start].clone();
    for layer in &interiors[start + 1..end] {
        acc = acc.intersection(layer);
    }
    acc
}

/// Area between the walls' footprint and the declared interior boundary
/// that's too narrow to have received a full wall line, but still
/// non-trivial — a "perimeter gap" (§4.E).
fn perimeter_gap_area(region_before_walls: &PolygonSet, walls: &WallToolpaths, interior_after_walls: &PolygonSet, min_gap_width_um: i64) -> PolygonSet {
    if walls.walls.is_empty() {
        return PolygonSet::empty();
    }
    let dilated_footprint: PolygonSet = PolygonSet::union_all(
        walls
            .walls
            .iter()
            .map(|w| PolygonSet::new(vec![w.polygon()]).offset(w.max_width_um() / 2, crate::geom::JoinType::Round))
            .collect::<Vec<_>>()
            .iter(),
    );
    let covered = dilated_footprint.union(interior_after_walls);
    let gaps = region_before_walls.difference(&covered);
    gaps.remove_small_areas((min_gap_width_um as f64) * (min_gap_width_um as f64))
}

/// For layer `index`, decide what sparse-infill area (if any) it should
/// draw, after applying layer combining: only the first layer of each
/// combine group draws infill, using the intersection of every interior
/// in that group so the combined pass doesn't protrude past any member
/// layer's boundary.
fn sparse_infill_for_layer(interiors: &[PolygonSet], index: usize, skin: &PolygonSet, perimeter_gaps: &PolygonSet, groups: &[(usize, usize)]) -> PolygonSet {
    let Some(&(start, len)) = groups.iter().find(|(start, len)| index >= *start && index < start + len) else {
        return PolygonSet::empty();
    };
    if index != start {
        return PolygonSet::empty();
    }
    let combined_interior = intersect_range(interiors, start, len);
    combined_interior.difference(skin).difference(perimeter_gaps)
}

/// Partition `layer_count` layers into consecutive groups of at most
/// `combine_layers` layers each, returning `(start_index, group_len)`.
fn combine_layer_groups(layer_count: usize, combine_layers: usize) -> Vec<(usize, usize)> {
    let step = combine_layers.max(1);
    let mut groups = Vec::new();
    let mut i = 0;
    while i < layer_count {
        let len = step.min(layer_count - i);
        groups.push((i, len));
        i += step;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point2, Polygon};

    fn square(side: i64) -> PolygonSet {
        PolygonSet::new(vec![Polygon::new(vec![
            Point2::new(0, 0),
            Point2::new(side, 0),
            Point2::new(side, side),
            Point2::new(0, side),
        ])])
    }

    #[test]
    fn top_layer_of_stack_is_entirely_top_skin() {
        let interiors = vec![square(10_000), square(10_000), square(10_000)];
        let (top, _bottom) = classify_top_bottom(&interiors, 2, 4, 4);
        assert!((top.area() - interiors[2].area()).abs() < 1.0);
    }

    #[test]
    fn middle_layer_with_enough_ceiling_has_no_top_skin() {
        let interiors: Vec<PolygonSet> = (0..10).map(|_| square(10_000)).collect();
        let (top, _bottom) = classify_top_bottom(&interiors, 2, 4, 4);
        assert!(top.area() < 1.0);
    }

    #[test]
    fn combine_layer_groups_partition_cleanly() {
        let groups = combine_layer_groups(10, 3);
        assert_eq!(groups, vec![(0, 3), (3, 3), (6, 3), (9, 1)]);
    }

    #[test]
    fn only_first_layer_of_combine_group_gets_sparse_infill() {
        let interiors: Vec<PolygonSet> = (0..6).map(|_| square(10_000)).collect();
        let groups = combine_layer_groups(6, 3);
        let empty = PolygonSet::empty();
        let infill_0 = sparse_infill_for_layer(&interiors, 0, &empty, &empty, &groups);
        let infill_1 = sparse_infill_for_layer(&interiors, 1, &empty, &empty, &groups);
        assert!(infill_0.area() > 0.0);
        assert!(infill_1.area() < 1.0);
    }
}
