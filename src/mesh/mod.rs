//! Core mesh data structures.
//!
//! This module provides the working mesh the brush builder operates on.
//!
//! # Overview
//!
//! The primary type is [`PolyMesh`]: a vertex list plus polygon faces. Each
//! face stores its vertex loop, one UV per corner, a unit normal and an
//! optional material index. This is the "mesh access layer" the builder and
//! the texture solver consume: oriented faces with loops, per-loop UVs, face
//! normals and material lookups.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`FaceId`] - Identifies a face
//!
//! # Construction
//!
//! ```
//! use brushsmith::mesh::{build_from_polygons, PolyMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![vec![0, 1, 2]];
//!
//! let mesh: PolyMesh = build_from_polygons(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_faces(), 1);
//! ```

mod builder;
pub mod geometry;
mod index;
mod poly;

pub use builder::{build_from_polygons, build_mesh, to_face_vertex, PolygonInput};
pub use index::{FaceId, VertexId};
pub use poly::{Face, PolyMesh, Vertex};
