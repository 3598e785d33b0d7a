//! Error types for the slicing pipeline.
//!
//! Covers mesh/geometry failures plus the settings-registry variants
//! the configuration layer needs.

use thiserror::Error;

/// Errors that can occur during slicing.
#[derive(Error, Debug)]
pub enum SlicerError {
    /// Mesh has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Mesh has degenerate geometry.
    #[error("mesh has degenerate geometry: {0}")]
    DegenerateMesh(String),

    /// Invalid slice settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Slicing operation failed.
    #[error("slicing failed: {0}")]
    SliceFailed(String),

    /// Contour tracing failed at a given layer Z.
    #[error("contour tracing failed at z={0}um: {1}")]
    ContourFailed(i64, String),

    /// A setting name was requested that isn't registered. Per §7 this is
    /// non-fatal: the caller logs a warning and substitutes an empty
    /// string, so this variant exists for callers that want to surface it
    /// explicitly rather than silently substituting.
    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    /// A setting's value could not be parsed as its requested type, or an
    /// enum setting held a value outside its declared range. Per §7 this
    /// is fatal.
    #[error("invalid value for setting {name}: {value}")]
    InvalidSetting {
        /// The setting's name.
        name: String,
        /// The raw string value that failed to parse.
        value: String,
    },
}

/// Result type for slicer operations.
pub type Result<T> = std::result::Result<T, SlicerError>;
