//! Hierarchical settings registry (§6 Inputs).
//!
//! A name-keyed string map resolved global → per-extruder-train →
//! per-mesh-group → per-mesh, with typed accessors. Settings are stored
//! as a string map with typed getters, split into explicit layers so the
//! per-mesh override semantics described in §6 are a type, not an
//! implicit lookup chain threaded through global state (§9 "Global
//! singletons").

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlicerError};

/// One layer of settings: a flat name -> value string map. Deserializes
/// directly from a JSON object of string values, the format print
/// profiles (`*.slicer.json`-style configs) are exchanged in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsLayer(HashMap<String, String>);

impl SettingsLayer {
    /// An empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw string value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw lookup within this single layer.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// The four-level settings hierarchy described in §6: global, then
/// per-extruder-train, per-mesh-group, per-mesh, each optionally
/// overriding the one before it. Lookup takes the first layer (searched
/// mesh -> mesh-group -> extruder-train -> global) that defines the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Global (whole-print) defaults.
    pub global: SettingsLayer,
    /// Per-extruder-train overrides.
    pub extruder_train: SettingsLayer,
    /// Per-mesh-group overrides.
    pub mesh_group: SettingsLayer,
    /// Per-mesh overrides.
    pub mesh: SettingsLayer,
}

impl Settings {
    /// An empty registry (every lookup falls through to "unknown").
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve_raw(&self, key: &str) -> Option<&str> {
        self.mesh
            .get_raw(key)
            .or_else(|| self.mesh_group.get_raw(key))
            .or_else(|| self.extruder_train.get_raw(key))
            .or_else(|| self.global.get_raw(key))
    }

    /// Raw string lookup. Unknown names log a warning and return `""`
    /// per §7's "Configuration" error-handling policy.
    pub fn get_str(&self, key: &str) -> String {
        match self.resolve_raw(key) {
            Some(v) => v.to_string(),
            None => {
                log::warn!(target: "fff_slicer::settings", "unknown setting '{key}', substituting empty string");
                String::new()
            }
        }
    }

    fn parse<T: FromStr>(&self, key: &str) -> Result<T> {
        let raw = self.get_str(key);
        raw.parse::<T>().map_err(|_| SlicerError::InvalidSetting {
            name: key.to_string(),
            value: raw,
        })
    }

    /// Fetch an integer-valued setting.
    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.parse(key)
    }

    /// Fetch a float-valued setting.
    pub fn get_float(&self, key: &str) -> Result<f64> {
        self.parse(key)
    }

    /// Fetch a boolean setting ("true"/"false").
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.parse(key)
    }

    /// Fetch a ratio setting, clamped to `[0.0, 1.0]`. Values outside the
    /// range are out-of-range enum-like input and fail fast per §7.
    pub fn get_ratio(&self, key: &str) -> Result<f64> {
        let v: f64 = self.parse(key)?;
        if !(0.0..=1.0).contains(&v) {
            return Err(SlicerError::InvalidSetting {
                name: key.to_string(),
                value: self.get_str(key),
            });
        }
        Ok(v)
    }

    /// Fetch an angle setting stored in degrees, returned in radians.
    pub fn get_angle_radians(&self, key: &str) -> Result<f64> {
        let degrees: f64 = self.parse(key)?;
        Ok(degrees.to_radians())
    }

    /// Fetch a length setting stored in millimeters, returned in
    /// micrometers.
    pub fn get_length_um(&self, key: &str) -> Result<i64> {
        let mm: f64 = self.parse(key)?;
        Ok((mm * 1000.0).round() as i64)
    }

    /// Fetch an extruder index (non-negative small integer).
    pub fn get_extruder_index(&self, key: &str) -> Result<u32> {
        let v: i64 = self.parse(key)?;
        u32::try_from(v).map_err(|_| SlicerError::InvalidSetting {
            name: key.to_string(),
            value: self.get_str(key),
        })
    }

    /// Fetch an enum setting by parsing its string value through `E`,
    /// failing fast if it isn't one of the recognized variants (§7).
    pub fn get_enum<E: FromStr>(&self, key: &str) -> Result<E> {
        let raw = self.get_str(key);
        E::from_str(&raw).map_err(|_| SlicerError::InvalidSetting {
            name: key.to_string(),
            value: raw,
        })
    }

    /// Load a settings registry from a JSON print profile (the four
    /// layers as a `{"global": {...}, "extruder_train": {...}, ...}`
    /// object; missing layers default to empty).
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SlicerError::InvalidSettings(e.to_string()))
    }

    /// Serialize this registry back to a JSON print profile.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SlicerError::InvalidSettings(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_layer_overrides_global() {
        let mut settings = Settings::new();
        settings.global.set("wall_count", "3");
        settings.mesh.set("wall_count", "1");
        assert_eq!(settings.get_int("wall_count").unwrap(), 1);
    }

    #[test]
    fn unknown_setting_is_empty_string_not_error() {
        let settings = Settings::new();
        assert_eq!(settings.get_str("does_not_exist"), "");
    }

    #[test]
    fn ratio_out_of_range_fails_fast() {
        let mut settings = Settings::new();
        settings.global.set("infill_density", "1.5");
        assert!(settings.get_ratio("infill_density").is_err());
    }

    #[test]
    fn json_round_trip_preserves_values() {
        let mut settings = Settings::new();
        settings.global.set("wall_count", "3");
        settings.mesh.set("infill_density", "0.2");
        let json = settings.to_json_string().unwrap();
        let restored = Settings::from_json_str(&json).unwrap();
        assert_eq!(restored.get_int("wall_count").unwrap(), 3);
        assert_eq!(restored.get_ratio("infill_density").unwrap(), 0.2);
    }

    #[test]
    fn length_converts_mm_to_um() {
        let mut settings = Settings::new();
        settings.global.set("layer_height", "0.2");
        assert_eq!(settings.get_length_um("layer_height").unwrap(), 200);
    }
}
