//! Mesh construction utilities.
//!
//! This module provides functions for building polygon meshes from
//! face-vertex lists as commonly found in mesh file formats.

use nalgebra::{Point2, Point3};

use super::index::VertexId;
use super::poly::{Face, PolyMesh};
use crate::error::{MapError, Result};

/// A face-vertex polygon with optional per-corner UVs and material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolygonInput {
    /// Vertex indices, counter-clockwise when seen from the front.
    pub indices: Vec<usize>,
    /// Per-corner UVs. Empty means "no UV channel" and is filled with zeros.
    pub uvs: Vec<Point2<f64>>,
    /// Material index into the object's material table.
    pub material: Option<usize>,
}

impl PolygonInput {
    /// Create a polygon without UVs or material.
    pub fn new(indices: Vec<usize>) -> Self {
        Self {
            indices,
            uvs: Vec::new(),
            material: None,
        }
    }

    /// Set the per-corner UVs.
    pub fn with_uvs(mut self, uvs: Vec<Point2<f64>>) -> Self {
        self.uvs = uvs;
        self
    }

    /// Set the material index.
    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }
}

/// Build a polygon mesh from vertices and polygon index lists.
///
/// # Example
/// ```
/// use brushsmith::mesh::build_from_polygons;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
/// assert_eq!(mesh.num_faces(), 1);
/// assert!(!mesh.has_uvs());
/// ```
pub fn build_from_polygons(vertices: &[Point3<f64>], faces: &[Vec<usize>]) -> Result<PolyMesh> {
    let polygons: Vec<PolygonInput> = faces.iter().cloned().map(PolygonInput::new).collect();
    build_mesh(vertices, &polygons)
}

/// Build a polygon mesh from vertices and fully described polygons.
///
/// A UV channel is considered present if any polygon supplies UVs; polygons
/// without UVs then get all-zero UVs, like a freshly created UV layer.
///
/// # Errors
///
/// - [`MapError::EmptyMesh`] if there are no faces
/// - [`MapError::InvalidVertexIndex`] for out-of-range indices
/// - [`MapError::DegenerateFace`] for faces with fewer than 3 corners or a
///   repeated vertex
/// - [`MapError::UvCountMismatch`] if UVs are supplied but their count differs
///   from the corner count
pub fn build_mesh(vertices: &[Point3<f64>], faces: &[PolygonInput]) -> Result<PolyMesh> {
    if faces.is_empty() {
        return Err(MapError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in &face.indices {
            if vi >= vertices.len() {
                return Err(MapError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        if face.indices.len() < 3 {
            return Err(MapError::DegenerateFace { face: fi });
        }
        let mut sorted = face.indices.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(MapError::DegenerateFace { face: fi });
        }
        if !face.uvs.is_empty() && face.uvs.len() != face.indices.len() {
            return Err(MapError::UvCountMismatch {
                face: fi,
                uvs: face.uvs.len(),
                corners: face.indices.len(),
            });
        }
    }

    let mut mesh = PolyMesh::with_capacity(vertices.len(), faces.len());
    mesh.has_uvs = faces.iter().any(|f| !f.uvs.is_empty());

    for &pos in vertices {
        mesh.add_vertex(pos);
    }

    for face in faces {
        let loop_ids: Vec<VertexId> = face.indices.iter().map(|&i| VertexId::new(i)).collect();
        let new_face = if face.uvs.is_empty() {
            Face::without_uvs(loop_ids, face.material)
        } else {
            Face::new(loop_ids, face.uvs.clone(), face.material)
        };
        mesh.add_face(new_face);
    }

    Ok(mesh)
}

/// Convert a polygon mesh back to a face-vertex representation.
///
/// Returns (vertices, faces) tuple.
pub fn to_face_vertex(mesh: &PolyMesh) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices = mesh.positions();
    let faces = mesh
        .faces()
        .map(|(_, f)| f.vertices.iter().map(|v| v.index()).collect())
        .collect();
    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_vertices() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_build_quad() {
        let mesh = build_from_polygons(&quad_vertices(), &[vec![0, 1, 2, 3]]).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 1);
        assert!(mesh.is_valid());
        let face = mesh.face(crate::mesh::FaceId::new(0));
        assert_eq!(face.uvs, vec![Point2::origin(); 4]);
        assert_eq!(face.material, None);
    }

    #[test]
    fn test_empty_mesh_error() {
        let result = build_from_polygons(&quad_vertices(), &[]);
        assert!(matches!(result, Err(MapError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_index_error() {
        let result = build_from_polygons(&quad_vertices(), &[vec![0, 1, 9]]);
        assert!(matches!(
            result,
            Err(MapError::InvalidVertexIndex { face: 0, vertex: 9 })
        ));
    }

    #[test]
    fn test_degenerate_face_error() {
        let repeated = build_from_polygons(&quad_vertices(), &[vec![0, 1, 1, 2]]);
        assert!(matches!(repeated, Err(MapError::DegenerateFace { face: 0 })));

        let too_short = build_from_polygons(&quad_vertices(), &[vec![0, 1]]);
        assert!(matches!(too_short, Err(MapError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_uvs_and_materials() {
        let polygon = PolygonInput::new(vec![0, 1, 2])
            .with_uvs(vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
            ])
            .with_material(2);
        let mesh = build_mesh(&quad_vertices(), &[polygon, PolygonInput::new(vec![0, 2, 3])])
            .unwrap();
        assert!(mesh.has_uvs());
        let first = mesh.face(crate::mesh::FaceId::new(0));
        assert_eq!(first.material, Some(2));
        assert_eq!(first.uvs[2], Point2::new(1.0, 1.0));
        let second = mesh.face(crate::mesh::FaceId::new(1));
        assert_eq!(second.uvs, vec![Point2::origin(); 3]);
    }

    #[test]
    fn test_uv_count_mismatch() {
        let polygon = PolygonInput::new(vec![0, 1, 2]).with_uvs(vec![Point2::origin()]);
        let result = build_mesh(&quad_vertices(), &[polygon]);
        assert!(matches!(result, Err(MapError::UvCountMismatch { .. })));
    }

    #[test]
    fn test_round_trip_face_vertex() {
        let mesh = build_from_polygons(&quad_vertices(), &[vec![0, 1, 2, 3]]).unwrap();
        let (vertices, faces) = to_face_vertex(&mesh);
        assert_eq!(vertices, quad_vertices());
        assert_eq!(faces, vec![vec![0, 1, 2, 3]]);
    }
}
