//! # Brushsmith
//!
//! Convert polygon meshes into convex brushes for idTech-style `.map` files.
//!
//! Level editors for Quake-family engines only accept convex solids bounded
//! by planes. Brushsmith turns arbitrary textured meshes into such brushes,
//! carries the mesh's texture mapping over to each brush face, and writes the
//! result in one of four map dialects.
//!
//! ## Features
//!
//! - **Six brush strategies**: convex hull, per-face pyramids and prisms,
//!   terrain soup, shared-apex blob, and mitered shells
//! - **Three texture projections**: Standard (Quake), Valve 220, and brush
//!   primitives (Quake 3, Doom 3)
//! - **Grid snapping** with local recovery from degenerate geometry
//! - **Patch surfaces** written as `patchDef2` blocks
//! - **Scene loading** from OBJ (with MTL libraries) and glTF
//!
//! ## Quick Start
//!
//! ```no_run
//! use brushsmith::prelude::*;
//!
//! let scene = brushsmith::io::load_scene("level.obj", &LoadOptions::default()).unwrap();
//!
//! let options = ExportOptions::default()
//!     .with_strategy(Strategy::Prisms { depth: 16.0 })
//!     .with_texture_format(TextureFormat::Valve);
//! let writer = MapWriter::new(options).unwrap();
//!
//! let report = writer.save(&scene, "level.map").unwrap();
//! println!("{}", report);
//! ```
//!
//! ## Building Brushes Directly
//!
//! ```
//! use brushsmith::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(32.0, 0.0, 0.0),
//!     Point3::new(0.0, 32.0, 0.0),
//! ];
//! let mesh = build_from_polygons(&vertices, &[vec![0, 1, 2]]).unwrap();
//!
//! let brushes = build(mesh, &Strategy::Prisms { depth: 8.0 }, &BuildParams::default());
//! assert_eq!(brushes.len(), 1);
//! // Cap, bottom and three sides.
//! assert_eq!(brushes[0].len(), 5);
//! assert!(brushes[0].is_convex(1e-6));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod brush;
pub mod error;
pub mod io;
pub mod map;
pub mod mesh;
pub mod numeric;
pub mod patch;
pub mod plane;
pub mod progress;
pub mod scene;
pub mod texture;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use brushsmith::prelude::*;
/// ```
pub mod prelude {
    pub use crate::brush::{build, try_build, Brush, BrushFace, BuildParams, Strategy};
    pub use crate::error::{MapError, Result};
    pub use crate::io::{load_scene, LoadOptions, UpAxis};
    pub use crate::map::{ExportOptions, ExportReport, MapWriter};
    pub use crate::mesh::{build_from_polygons, build_mesh, FaceId, PolyMesh, PolygonInput, VertexId};
    pub use crate::numeric::Precision;
    pub use crate::patch::PatchSurface;
    pub use crate::plane::PlaneFormat;
    pub use crate::progress::Progress;
    pub use crate::scene::{Material, Scene, SceneObject, SceneSurface};
    pub use crate::texture::{TexelSize, TextureFormat};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    /// A closed 64-unit cube, one quad per side, all outward.
    fn cube_object() -> SceneObject {
        let s = 64.0;
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(s, 0.0, 0.0),
            Point3::new(s, s, 0.0),
            Point3::new(0.0, s, 0.0),
            Point3::new(0.0, 0.0, s),
            Point3::new(s, 0.0, s),
            Point3::new(s, s, s),
            Point3::new(0.0, s, s),
        ];
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ];
        let polygons: Vec<PolygonInput> = faces
            .into_iter()
            .map(|f| PolygonInput::new(f).with_material(0))
            .collect();
        let mesh = build_mesh(&vertices, &polygons).unwrap();
        SceneObject::new("crate", mesh).with_materials(vec![Material::new("wood")])
    }

    #[test]
    fn test_cube_every_strategy() {
        let strategies = [
            (Strategy::Brush, 1),
            (Strategy::Faces { depth: 8.0 }, 6),
            (Strategy::Prisms { depth: 8.0 }, 6),
            (Strategy::Blob, 6),
            (Strategy::Miter { depth: 8.0 }, 6),
        ];
        for (strategy, expected) in strategies {
            let mut scene = Scene::new();
            scene.objects.push(cube_object());
            let options = ExportOptions::default()
                .with_strategy(strategy)
                .with_apex(Point3::new(32.0, 32.0, 32.0));
            let writer = MapWriter::new(options).unwrap();
            let (text, report) = writer.write_string(&scene);
            assert_eq!(report.brushes, expected, "{}", strategy.name());
            assert!(report.warnings.is_empty(), "{}", strategy.name());
            assert!(text.ends_with("}\n"));
        }
    }

    #[test]
    fn test_every_dialect_opens_worldspawn() {
        let dialects = [
            (TextureFormat::Standard, PlaneFormat::ThreePoint),
            (TextureFormat::Valve, PlaneFormat::ThreePoint),
            (TextureFormat::BrushPrimitives, PlaneFormat::ThreePoint),
            (TextureFormat::BrushPrimitives, PlaneFormat::NormalDistance),
        ];
        for (texture, planes) in dialects {
            let mut scene = Scene::new();
            scene.objects.push(cube_object());
            let writer = MapWriter::new(
                ExportOptions::default()
                    .with_texture_format(texture)
                    .with_plane_format(planes),
            )
            .unwrap();
            let (text, report) = writer.write_string(&scene);
            assert!(text.contains("\"classname\" \"worldspawn\""));
            assert_eq!(report.brushes, 6);
            // Only the caps carry the mesh material; pyramid sides use the fallback.
            assert_eq!(text.lines().filter(|l| l.contains("wood")).count(), 6);
        }
    }
}
