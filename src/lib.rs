//! Geometric slicing and toolpath-generation pipeline for FFF 3D
//! printing: mesh in, per-layer walls/skin/infill/support toolpaths out.
//!
//! The top-level entry point is [`slice`], which hands a [`mesh::Mesh`]
//! and a [`settings::Settings`] registry to [`pipeline::run`]. Everything
//! below that is organized the way the System Overview lays out the
//! pipeline: component A ([`geom`]) underlies every later stage; B
//! ([`slice`] the module) through H ([`path_order`]) run in that order,
//! orchestrated by component I ([`pipeline`]).

pub mod error;
pub mod gcode_path;
pub mod geom;
pub mod infill;
pub mod mesh;
pub mod mold;
pub mod parts;
pub mod path_order;
pub mod pipeline;
pub mod settings;
pub mod skin;
pub mod slice;
pub mod support;
pub mod walls;

pub use error::{Result, SlicerError};
pub use mesh::Mesh;
pub use pipeline::{CancelFlag, LayerResult, SliceOutput};
pub use settings::Settings;

/// Slice `mesh` under `settings`, running the full pipeline through every
/// component. Equivalent to `pipeline::run` with a fresh, never-cancelled
/// [`CancelFlag`]; use [`pipeline::run`] directly to share a flag across
/// a multi-mesh print so one caller can cancel them all together.
pub fn slice(mesh: &Mesh, settings: &Settings) -> Result<SliceOutput> {
    pipeline::run(mesh, settings, &CancelFlag::new())
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

    #[test]
    fn slice_cube_produces_walls_on_every_layer() {
        let mesh = cube_mesh(20.0);
        let mut settings = Settings::new();
        settings.global.set("layer_height", "0.2");
        settings.global.set("layer_height_0", "0.2");
        settings.global.set("wall_count", "3");
        settings.global.set("line_width", "0.4");
        settings.global.set("infill_density", "0.15");

        let output = slice(&mesh, &settings).expect("cube should slice cleanly");
        assert!(!output.layers.is_empty());
        for layer in &output.layers {
            assert!(!layer.walls.walls.is_empty(), "layer {} has no walls", layer.index);
        }
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let mesh = Mesh::default();
        let settings = Settings::new();
        assert!(slice(&mesh, &settings).is_err());
    }
}
