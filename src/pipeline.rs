//! Pipeline driver (component I, §4.I, §5).
//!
//! Runs the components in the strict phase order the System Overview
//! demands — B (slice) must finish across every layer before C (parts)
//! starts, then D (walls), E (skin), F (infill), G (support), H (path
//! order) — while parallelizing *within* each phase across layers with
//! `rayon`, with explicit phase barriers between stages instead of one
//! flat per-layer loop.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::error::{Result, SlicerError};
use crate::gcode_path::{ExtruderPlan, FeatureType, GCodePath};
use crate::infill::{self, LightningTree};
use crate::mesh::Mesh;
use crate::mold;
use crate::parts::{self, LayerParts};
use crate::path_order::{self, SeamPolicy};
use crate::settings::Settings;
use crate::skin::{self, LayerSkin, SkinSettings};
use crate::slice::{self, SliceLayer};
use crate::support::{self, LayerSupport, SupportSettings};
use crate::walls::{self, ExtrusionType, Junction, WallToolpaths};

/// Cooperative cancellation flag a caller can flip from another thread to
/// stop a long-running slice between phase barriers.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything the pipeline produced for one mesh, one layer.
#[derive(Debug, Clone, Default)]
pub struct LayerResult {
    pub z: i64,
    pub index: usize,
    pub parts: LayerParts,
    pub walls: WallToolpaths,
    pub skin: LayerSkin,
    pub infill: Vec<crate::geom::Polyline>,
    pub support: LayerSupport,
    /// Support material toolpaths derived from `support.area`, ordered
    /// the same way infill lines are (§4.H/§4.I). Skin surfaces
    /// (`skin.top`/`skin.bottom`/`skin.perimeter_gaps`) remain boundary
    /// regions rather than already-ordered lines; a dense crosshatch
    /// pass over them is future work, not yet reflected in `extruder_plan`.
    pub support_lines: Vec<crate::geom::Polyline>,
    /// The ordered, flow/speed/fan-annotated paths this layer's extruder
    /// will print (§3 Data Model, §6 Outputs), assembled from `walls`,
    /// `infill`, and `support_lines`.
    pub extruder_plan: ExtruderPlan,
}

/// Full pipeline output for one mesh.
#[derive(Debug, Clone, Default)]
pub struct SliceOutput {
    pub layers: Vec<LayerResult>,
}

fn check_cancelled(cancel: &CancelFlag) -> Result<()> {
    if cancel.is_cancelled() {
        Err(SlicerError::SliceFailed("cancelled".to_string()))
    } else {
        Ok(())
    }
}

/// Run the full pipeline for one mesh against one settings registry.
pub fn run(mesh: &Mesh, settings: &Settings, cancel: &CancelFlag) -> Result<SliceOutput> {
    let (min, max) = mesh.bounds().ok_or(SlicerError::EmptyMesh)?;
    let initial_layer_thickness = settings.get_length_um("layer_height_0").unwrap_or(300);
    let layer_thickness = settings.get_length_um("layer_height").unwrap_or(200);

    // Phase B: slice.
    let heights = slice::generate_layer_heights(min.z, max.z, initial_layer_thickness, layer_thickness);
    if heights.is_empty() {
        return Err(SlicerError::SliceFailed("mesh has no printable layers".to_string()));
    }
    let layers = slice::slice_mesh(mesh, &heights)?;
    check_cancelled(cancel)?;

    // Phase C: part splitting (parallel across layers; no cross-layer
    // dependency yet).
    let mut layer_parts: Vec<LayerParts> = layers.par_iter().map(parts::split_layer).collect();
    check_cancelled(cancel)?;

    if mesh.settings.roles.mold {
        let (mold_width, mold_angle) = parts::mold_settings_from(settings);
        mold::apply(&mut layer_parts, mold_width, mold_angle, &crate::geom::Polygon::new(vec![]));
    }
    check_cancelled(cancel)?;

    // Phase D: walls (parallel across layers).
    let wall_strategy = walls::strategy_from_settings(settings);
    let wall_results: Vec<(WallToolpaths, crate::geom::PolygonSet)> = layer_parts
        .par_iter()
        .map(|lp| {
            let region = lp.as_polygon_set();
            let toolpaths = walls::generate_walls(&region, &wall_strategy);
            (toolpaths, region)
        })
        .collect();
    check_cancelled(cancel)?;

    let interiors: Vec<crate::geom::PolygonSet> = wall_results.iter().map(|(t, _)| t.interior.clone()).collect();
    let regions: Vec<crate::geom::PolygonSet> = wall_results.iter().map(|(_, r)| r.clone()).collect();
    let wall_toolpaths: Vec<WallToolpaths> = wall_results.into_iter().map(|(t, _)| t).collect();

    // Phase E: skin classification (needs the full interior stack; not
    // parallel at the top level since each layer reads its neighbors, but
    // `PolygonSet` booleans are themselves not the bottleneck here).
    let skin_settings = SkinSettings {
        top_layers: settings.get_int("top_layers").unwrap_or(4).max(0) as usize,
        bottom_layers: settings.get_int("bottom_layers").unwrap_or(4).max(0) as usize,
        infill_combine_layers: settings.get_int("infill_combine_layers").unwrap_or(1).max(1) as usize,
        min_gap_width_um: 50,
    };
    let skins = skin::classify_all(&interiors, &wall_toolpaths, &regions, &skin_settings);
    check_cancelled(cancel)?;

    // Phase F: infill (parallel across layers; lightning mode is
    // sequential since it threads a tree state across layers bottom-up).
    let support_settings = SupportSettings::default();
    let overhangs = support::detect_overhangs(mesh, &heights, &support_settings);
    let mut lightning_tree = LightningTree::new();
    let mut infill_lines = Vec::with_capacity(layers.len());
    for (i, skin_layer) in skins.iter().enumerate() {
        let lines = infill::generate_for_layer(&skin_layer.sparse_infill, i, settings, &mut lightning_tree, &overhangs[i]);
        infill_lines.push(lines);
    }
    check_cancelled(cancel)?;

    // Phase G: support.
    let support_layers = support::generate_support_volume(&overhangs, &layer_parts, &support_settings);
    check_cancelled(cancel)?;

    // Phase H: path ordering, applied per layer to the walls, infill, and
    // support lines just built — closed wall loops through
    // `order_extrusion_lines`, open infill/support segments through
    // `order_polylines` (§4.H).
    let seam_policy = seam_policy_from_settings(settings);
    let origin = crate::geom::Point2::origin();
    let ordered_walls: Vec<WallToolpaths> = wall_toolpaths
        .into_iter()
        .map(|mut toolpaths| {
            toolpaths.walls = path_order::order_extrusion_lines(&toolpaths.walls, origin, seam_policy);
            toolpaths
        })
        .collect();

    let ordered_infill: Vec<Vec<crate::geom::Polyline>> = infill_lines
        .into_iter()
        .map(|lines| path_order::order_polylines(&lines, origin))
        .collect();

    let support_line_width_um = settings.get_length_um("support_line_width").unwrap_or(400);
    let support_density = settings.get_ratio("support_infill_rate").unwrap_or(0.15);
    let ordered_support_lines: Vec<Vec<crate::geom::Polyline>> = support_layers
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            let pattern_settings = infill::PatternSettings {
                line_width_um: support_line_width_um,
                density: support_density,
                layer_index: i,
            };
            let lines = infill::pattern::generate(&layer.area, infill::InfillPattern::Lines, &pattern_settings);
            path_order::order_polylines(&lines, origin)
        })
        .collect();

    // Phase I: assemble this layer's GCodePaths into one ExtruderPlan and
    // apply back-pressure compensation across it (§4.H, §6).
    let infill_width_um = settings.get_length_um("infill_line_width").unwrap_or(400);
    let back_pressure_f = settings.get_ratio("back_pressure_compensation").unwrap_or(0.0);
    let extruder_id = mesh.settings.extruder_id;

    let result_layers = layers
        .into_iter()
        .zip(layer_parts)
        .zip(ordered_walls)
        .zip(skins)
        .zip(ordered_infill)
        .zip(support_layers)
        .zip(ordered_support_lines)
        .map(|((((((layer, parts), walls), skin), infill), support), support_lines)| {
            let extruder_plan = build_extruder_plan(
                extruder_id,
                &walls,
                &infill,
                &support_lines,
                infill_width_um,
                support_line_width_um,
                layer.index,
                settings,
                back_pressure_f,
            );
            LayerResult {
                z: layer.z,
                index: layer.index,
                parts,
                walls,
                skin,
                infill,
                support,
                support_lines,
                extruder_plan,
            }
        })
        .collect();

    log::debug!(target: "fff_slicer::pipeline", "sliced {} layers for extruder {}", heights.len(), mesh.settings.extruder_id);

    Ok(SliceOutput { layers: result_layers })
}

fn seam_policy_from_settings(settings: &Settings) -> SeamPolicy {
    match settings.get_str("z_seam_type").as_str() {
        "back" => SeamPolicy::Back,
        "random" => SeamPolicy::Random,
        "sharpest_corner" => SeamPolicy::SharpestCorner,
        _ => SeamPolicy::Shortest,
    }
}

/// Average junction width along a wall line, used as a `GCodePath`'s
/// nominal width when its junctions don't all agree.
fn average_width(junctions: &[Junction]) -> i64 {
    if junctions.is_empty() {
        return 0;
    }
    let sum: i64 = junctions.iter().map(|j| j.width_um).sum();
    sum / junctions.len() as i64
}

/// Per-feature speed multiplier, keyed by the ratio settings a profile
/// would expose for each printed feature.
fn speed_factor_for(settings: &Settings, feature_type: FeatureType) -> f64 {
    let key = match feature_type {
        FeatureType::OuterWall => "outer_wall_speed_ratio",
        FeatureType::InnerWall => "inner_wall_speed_ratio",
        FeatureType::Skin => "skin_speed_ratio",
        FeatureType::SparseInfill => "infill_speed_ratio",
        FeatureType::Support => "support_speed_ratio",
    };
    settings.get_ratio(key).unwrap_or(1.0)
}

/// Cooling fan speed for layer `index`: ramps linearly from 0 up to
/// `cool_fan_speed` over the first `fan_speed_ramp_layers` layers, then
/// holds steady — the simplest ramp a profile's `cool_fan_speed` setting
/// supports without per-layer overrides.
fn fan_speed_for_layer(settings: &Settings, index: usize) -> f64 {
    let target = settings.get_ratio("cool_fan_speed").unwrap_or(1.0);
    let ramp_layers = settings.get_int("fan_speed_ramp_layers").unwrap_or(4).max(0) as usize;
    if ramp_layers == 0 || index >= ramp_layers {
        target
    } else {
        target * (index + 1) as f64 / ramp_layers as f64
    }
}

/// Assemble one layer's `GCodePath`s from its ordered walls, infill, and
/// support lines into a single `ExtruderPlan`, then apply back-pressure
/// compensation across the whole plan (§4.H).
#[allow(clippy::too_many_arguments)]
fn build_extruder_plan(
    extruder_id: u32,
    walls: &WallToolpaths,
    infill: &[crate::geom::Polyline],
    support_lines: &[crate::geom::Polyline],
    infill_width_um: i64,
    support_width_um: i64,
    layer_index: usize,
    settings: &Settings,
    back_pressure_f: f64,
) -> ExtruderPlan {
    let fan_speed = fan_speed_for_layer(settings, layer_index);
    let mut paths = Vec::with_capacity(walls.walls.len() + infill.len() + support_lines.len());

    for line in &walls.walls {
        let feature_type = match line.junctions.first().map(|j| j.extrusion_type) {
            Some(ExtrusionType::OuterWall) => FeatureType::OuterWall,
            _ => FeatureType::InnerWall,
        };
        let mut points: Vec<crate::geom::Point2> = line.junctions.iter().map(|j| j.point).collect();
        if line.is_closed {
            if let Some(&first) = points.first() {
                points.push(first);
            }
        }
        let mut path = GCodePath::new(points, average_width(&line.junctions), feature_type);
        path.speed_factor = speed_factor_for(settings, feature_type);
        path.fan_speed = fan_speed;
        paths.push(path);
    }

    for polyline in infill {
        let mut path = GCodePath::new(polyline.points.clone(), infill_width_um, FeatureType::SparseInfill);
        path.speed_factor = speed_factor_for(settings, FeatureType::SparseInfill);
        path.fan_speed = fan_speed;
        paths.push(path);
    }

    for polyline in support_lines {
        let mut path = GCodePath::new(polyline.points.clone(), support_width_um, FeatureType::Support);
        path.speed_factor = speed_factor_for(settings, FeatureType::Support);
        path.fan_speed = fan_speed;
        paths.push(path);
    }

    let mut plan = ExtruderPlan::new(extruder_id, paths);
    plan.apply_back_pressure_compensation(back_pressure_f);
    plan
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

    fn default_settings() -> Settings {
        let mut s = Settings::new();
        s.global.set("layer_height", "0.2");
        s.global.set("layer_height_0", "0.3");
        s.global.set("wall_count", "2");
        s.global.set("line_width", "0.4");
        s.global.set("infill_density", "0.2");
        s
    }

    #[test]
    fn cube_slices_into_expected_layer_count() {
        let mesh = cube_mesh(10.0);
        let settings = default_settings();
        let output = run(&mesh, &settings, &CancelFlag::new()).unwrap();
        assert!(!output.layers.is_empty());
        assert!(output.layers[0].z < output.layers.last().unwrap().z || output.layers.len() == 1);
    }

    #[test]
    fn cancellation_is_observed_between_phases() {
        let mesh = cube_mesh(10.0);
        let settings = default_settings();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = run(&mesh, &settings, &cancel);
        assert!(result.is_err());
    }
}
