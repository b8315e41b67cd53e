//! Scene file loading.
//!
//! # Supported Formats
//!
//! | Format | Extension | Notes |
//! |--------|-----------|-------|
//! | Wavefront OBJ | `.obj` | Objects, UVs, `usemtl`, MTL `map_Kd` sizes |
//! | glTF | `.gltf`, `.glb` | Node hierarchy, TEXCOORD_0, base color texture sizes |
//!
//! Both formats are Y-up while map editors are Z-up, so [`load_scene`]
//! rotates loaded scenes into Z-up unless told otherwise.
//!
//! # Usage
//!
//! ```no_run
//! use brushsmith::io::{load_scene, LoadOptions};
//!
//! let scene = load_scene("level.obj", &LoadOptions::default()).unwrap();
//! println!("{} objects", scene.objects.len());
//! ```

pub mod gltf;
pub mod obj;

use std::path::Path;

use nalgebra::Matrix4;

use crate::error::{MapError, Result};
use crate::scene::Scene;

/// Supported scene file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// glTF format.
    Gltf,
    /// glTF binary format.
    Glb,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "gltf" => Some(Format::Gltf),
            "glb" => Some(Format::Glb),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

/// Which axis points up in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpAxis {
    /// Y up; the scene is rotated so that +Y becomes +Z.
    #[default]
    Y,
    /// Z up; the scene is used as is.
    Z,
}

impl UpAxis {
    /// The rotation that brings this convention to Z-up.
    pub fn to_z_up(self) -> Matrix4<f64> {
        match self {
            #[rustfmt::skip]
            UpAxis::Y => Matrix4::new(
                1.0, 0.0, 0.0, 0.0,
                0.0, 0.0, -1.0, 0.0,
                0.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
            UpAxis::Z => Matrix4::identity(),
        }
    }
}

/// Options for [`load_scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Up axis of the source file.
    pub up: UpAxis,
}

impl LoadOptions {
    /// Set the up axis.
    pub fn with_up(mut self, up: UpAxis) -> Self {
        self.up = up;
        self
    }
}

/// Load a scene with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load_scene<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Scene> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| MapError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;

    let mut scene = match format {
        Format::Obj => obj::load(path)?,
        Format::Gltf | Format::Glb => gltf::load(path)?,
    };
    if options.up != UpAxis::Z {
        scene.apply_world_transform(&options.up.to_z_up());
    }
    log::info!(
        "loaded {}: {} objects, {} faces",
        path.display(),
        scene.objects.len(),
        scene.num_faces()
    );
    Ok(scene)
}
