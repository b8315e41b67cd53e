//! Error types for brushsmith.
//!
//! Numerical degeneracy is never an error in this crate: the solver and the
//! builder recover locally (see [`crate::texture::Projection`]). The errors here
//! cover malformed input, I/O, and option combinations that cannot be exported.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MapError`].
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors that can occur while loading meshes or writing maps.
#[derive(Error, Debug)]
pub enum MapError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has fewer than three corners or repeats a vertex.
    #[error("face {face} is degenerate (fewer than 3 corners or repeated vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A face supplies a different number of UVs than corners.
    #[error("face {face} has {uvs} UVs for {corners} corners")]
    UvCountMismatch {
        /// The face index.
        face: usize,
        /// Number of UVs supplied.
        uvs: usize,
        /// Number of corners in the face.
        corners: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a scene from file.
    #[error("failed to load scene from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving a map to file.
    #[error("failed to save map to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value or unsupported option combination.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MapError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MapError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
