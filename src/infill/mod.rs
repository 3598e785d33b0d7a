//! Infill generation (component F, §4.F).

pub mod lightning;
pub mod pattern;

pub use lightning::{LightningSettings, LightningTree};
pub use pattern::{InfillPattern, PatternSettings};

use std::str::FromStr;

use crate::geom::PolygonSet;
use crate::settings::Settings;

impl FromStr for InfillPattern {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lines" => Ok(InfillPattern::Lines),
            "grid" => Ok(InfillPattern::Grid),
            "triangles" => Ok(InfillPattern::Triangles),
            "concentric" => Ok(InfillPattern::Concentric),
            "zigzag" => Ok(InfillPattern::ZigZag),
            _ => Err(()),
        }
    }
}

/// Read the infill pattern and density from the settings registry (§6),
/// defaulting to grid infill at 20% when absent.
pub fn settings_from_registry(settings: &Settings, layer_index: usize) -> (InfillPattern, PatternSettings) {
    let pattern = settings.get_enum::<InfillPattern>("infill_pattern").unwrap_or(InfillPattern::Grid);
    let density = settings.get_ratio("infill_density").unwrap_or(0.2);
    let line_width_um = settings.get_length_um("infill_line_width").unwrap_or(400);
    (
        pattern,
        PatternSettings {
            line_width_um,
            density,
            layer_index,
        },
    )
}

/// Whether lightning infill is requested instead of a scanline pattern
/// (a separate, density-independent mode per §4.F).
pub fn use_lightning(settings: &Settings) -> bool {
    settings.get_str("infill_pattern") == "lightning"
}

/// Generate infill for one layer's sparse-infill region, dispatching to
/// lightning-tree generation when requested, otherwise a scanline
/// pattern.
pub fn generate_for_layer(
    boundary: &PolygonSet,
    layer_index: usize,
    settings: &Settings,
    tree: &mut LightningTree,
    unsupported_area: &PolygonSet,
) -> Vec<crate::geom::Polyline> {
    if use_lightning(settings) {
        let lightning_settings = LightningSettings::default();
        tree.grow_layer(layer_index, unsupported_area, &lightning_settings)
    } else {
        let (pattern, pattern_settings) = settings_from_registry(settings, layer_index);
        pattern::generate(boundary, pattern, &pattern_settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pattern_setting_falls_back_to_grid() {
        let s = Settings::new();
        let (pattern, _) = settings_from_registry(&s, 0);
        assert_eq!(pattern, InfillPattern::Grid);
    }

    #[test]
    fn lightning_flag_detected_from_string() {
        let mut s = Settings::new();
        s.global.set("infill_pattern", "lightning");
        assert!(use_lightning(&s));
    }
}
