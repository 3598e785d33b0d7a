//! G-code path assembly (§3 Data Model, §6 Outputs) and back-pressure
//! compensation (component H, §4.H).
//!
//! The pipeline's per-component stages (walls, skin, infill, support)
//! each produce their own geometry; this module is where that geometry
//! finally becomes the thing a G-code writer can walk: an ordered
//! sequence of [`GCodePath`]s per extruder per layer, each carrying the
//! flow/speed/fan tuning that differs by feature.

use crate::geom::Point2;

/// Which printed feature a path belongs to, driving feature-specific
/// speed and fan lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    OuterWall,
    InnerWall,
    Skin,
    SparseInfill,
    Support,
}

/// One ordered move sequence to extrude (§3 Data Model).
#[derive(Debug, Clone)]
pub struct GCodePath {
    /// The path geometry, in travel order.
    pub points: Vec<Point2>,
    /// Nominal extrusion width, micrometers.
    pub width_um: i64,
    /// What this path prints.
    pub feature_type: FeatureType,
    /// Extrusion flow multiplier (1.0 = nominal).
    pub flow: f64,
    /// Feed-rate multiplier (1.0 = the feature's configured speed).
    pub speed_factor: f64,
    /// Back-pressure compensation applied to `flow`, from
    /// [`ExtruderPlan::apply_back_pressure_compensation`].
    pub back_pressure_factor: f64,
    /// True if Z should ramp continuously across this path (vase mode).
    pub spiralize: bool,
    /// Cooling fan speed while printing this path, `0.0..=1.0`.
    pub fan_speed: f64,
}

impl GCodePath {
    /// A path with neutral flow/speed/back-pressure/fan, for callers that
    /// fill in feature-specific tuning afterward.
    pub fn new(points: Vec<Point2>, width_um: i64, feature_type: FeatureType) -> Self {
        Self {
            points,
            width_um,
            feature_type,
            flow: 1.0,
            speed_factor: 1.0,
            back_pressure_factor: 1.0,
            spiralize: false,
            fan_speed: 0.0,
        }
    }
}

/// Every `GCodePath` one extruder prints on one layer — the unit
/// back-pressure compensation (§4.H) operates over, since it's a
/// whole-plan property rather than a per-path one.
#[derive(Debug, Clone, Default)]
pub struct ExtruderPlan {
    pub extruder_id: u32,
    pub paths: Vec<GCodePath>,
}

impl ExtruderPlan {
    pub fn new(extruder_id: u32, paths: Vec<GCodePath>) -> Self {
        Self { extruder_id, paths }
    }

    /// Back-pressure compensation (§4.H): `q_i = flow_i * speed_i` for
    /// every extruding path, `q̄` their geometric mean over the whole
    /// plan, and `back_pressure_factor_i = (q̄ / q_i)^f` for `f ∈ [0,
    /// 1]`. `f = 0` is a no-op (every factor is 1); `f = 1` fully
    /// equalizes `flow * speed * back_pressure_factor` across the plan.
    pub fn apply_back_pressure_compensation(&mut self, f: f64) {
        let f = f.clamp(0.0, 1.0);
        let log_sum: f64 = self
            .paths
            .iter()
            .map(|p| p.flow * p.speed_factor)
            .filter(|&q| q > 0.0)
            .map(f64::ln)
            .sum();
        let live_count = self.paths.iter().filter(|p| p.flow * p.speed_factor > 0.0).count();
        if live_count == 0 {
            return;
        }
        let q_bar = (log_sum / live_count as f64).exp();

        for path in &mut self.paths {
            let q = path.flow * path.speed_factor;
            path.back_pressure_factor = if q > 0.0 { (q_bar / q).powf(f) } else { 1.0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_with_flow(flow: f64) -> GCodePath {
        let mut p = GCodePath::new(vec![Point2::origin()], 400, FeatureType::InnerWall);
        p.flow = flow;
        p
    }

    #[test]
    fn f_zero_is_a_no_op() {
        let mut plan = ExtruderPlan::new(0, vec![path_with_flow(1.0), path_with_flow(0.5), path_with_flow(2.0)]);
        plan.apply_back_pressure_compensation(0.0);
        for path in &plan.paths {
            assert!((path.back_pressure_factor - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn f_one_equalizes_flow_times_speed() {
        let mut plan = ExtruderPlan::new(0, vec![path_with_flow(1.0), path_with_flow(0.5), path_with_flow(2.0)]);
        plan.apply_back_pressure_compensation(1.0);
        let compensated: Vec<f64> = plan.paths.iter().map(|p| p.flow * p.speed_factor * p.back_pressure_factor).collect();
        for w in compensated.windows(2) {
            assert!((w[0] - w[1]).abs() < 1e-6, "{compensated:?}");
        }
    }

    #[test]
    fn equal_flows_get_unit_factor_regardless_of_f() {
        let mut plan = ExtruderPlan::new(0, vec![path_with_flow(1.0), path_with_flow(1.0)]);
        plan.apply_back_pressure_compensation(0.7);
        for path in &plan.paths {
            assert!((path.back_pressure_factor - 1.0).abs() < 1e-9);
        }
    }
}
