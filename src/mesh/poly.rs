//! Polygon mesh data structure.
//!
//! [`PolyMesh`] is the working geometry of the exporter: a vertex list plus
//! polygon faces, each face carrying one UV per loop corner, a unit normal and
//! an optional material index. Unlike a half-edge structure it stores no
//! adjacency; the mesh primitives in [`crate::algo`] rebuild whatever
//! connectivity they need from the face loops, which keeps topology edits
//! (splitting, merging, deleting faces) trivial.
//!
//! # Ownership
//!
//! One working mesh exists per source object. The builder takes it by value,
//! mutates it through a unique handle and drops it once the brushes are built,
//! so no two strategies ever see the same mesh.

use nalgebra::{Matrix4, Point2, Point3, Vector3};

use super::geometry::{
    corner_angle, polygon_area, polygon_centroid, polygon_normal, LENGTH_EPSILON_SQ,
};
use super::index::{FaceId, VertexId};
use crate::numeric::snap_point;

/// A vertex in the polygon mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a new vertex from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// A polygon face.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Vertex loop, counter-clockwise when seen from the front.
    pub vertices: Vec<VertexId>,

    /// One UV per loop corner, in the same order as `vertices`.
    pub uvs: Vec<Point2<f64>>,

    /// Unit normal (zero for degenerate faces).
    pub normal: Vector3<f64>,

    /// Index into the owning object's material table, `None` when unassigned.
    pub material: Option<usize>,
}

impl Face {
    /// Create a face. The normal is filled in when the face is added to a mesh.
    pub fn new(vertices: Vec<VertexId>, uvs: Vec<Point2<f64>>, material: Option<usize>) -> Self {
        debug_assert_eq!(vertices.len(), uvs.len());
        Self {
            vertices,
            uvs,
            normal: Vector3::zeros(),
            material,
        }
    }

    /// Create a face with all-zero UVs.
    pub fn without_uvs(vertices: Vec<VertexId>, material: Option<usize>) -> Self {
        let uvs = vec![Point2::origin(); vertices.len()];
        Self::new(vertices, uvs, material)
    }

    /// Number of corners.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the face has no corners.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Build a new face from a subset of this face's corners (loop positions).
    pub fn sub_face(&self, corners: &[usize]) -> Face {
        Face {
            vertices: corners.iter().map(|&c| self.vertices[c]).collect(),
            uvs: corners.iter().map(|&c| self.uvs[c]).collect(),
            normal: self.normal,
            material: self.material,
        }
    }

    /// Reverse the winding of the face, keeping each UV on its corner.
    pub fn reverse(&mut self) {
        self.vertices.reverse();
        self.uvs.reverse();
        self.normal = -self.normal;
    }
}

/// A polygon mesh with per-corner UVs.
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    /// All vertices in the mesh.
    pub(crate) vertices: Vec<Vertex>,

    /// All faces in the mesh.
    pub(crate) faces: Vec<Face>,

    /// Whether the source supplied a UV channel.
    pub(crate) has_uvs: bool,
}

impl PolyMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_vertices),
            faces: Vec::with_capacity(num_faces),
            has_uvs: false,
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh came with a UV channel. Meshes without one carry
    /// all-zero UVs, which the texture solver maps to its default basis.
    #[inline]
    pub fn has_uvs(&self) -> bool {
        self.has_uvs
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    /// Get a mutable face by ID.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId) -> &mut Face {
        &mut self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, pos: Point3<f64>) {
        self.vertices[v.index()].position = pos;
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over all faces with their IDs.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, f)| (FaceId::new(i), f))
    }

    /// All vertex positions, indexed by vertex ID.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Faces that use vertex `v`.
    pub fn vertex_faces(&self, v: VertexId) -> impl Iterator<Item = FaceId> + '_ {
        self.faces()
            .filter(move |(_, f)| f.vertices.contains(&v))
            .map(|(id, _)| id)
    }

    // ==================== Geometry ====================

    /// Positions of a face's corners, in loop order.
    pub fn face_positions(&self, f: FaceId) -> Vec<Point3<f64>> {
        self.loop_positions(&self.face(f).vertices)
    }

    /// Positions of an arbitrary vertex loop.
    pub fn loop_positions(&self, vertices: &[VertexId]) -> Vec<Point3<f64>> {
        vertices.iter().map(|&v| *self.position(v)).collect()
    }

    /// The stored unit normal of a face.
    #[inline]
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        self.face(f).normal
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        polygon_area(&self.face_positions(f))
    }

    /// Compute the centroid (vertex average) of a face.
    pub fn face_centroid(&self, f: FaceId) -> Point3<f64> {
        polygon_centroid(&self.face_positions(f))
    }

    /// Interior corner angles of a face, in loop order.
    pub fn corner_angles(&self, f: FaceId) -> Vec<f64> {
        let points = self.face_positions(f);
        (0..points.len()).map(|i| corner_angle(&points, i)).collect()
    }

    /// Angle-weighted vertex normal.
    ///
    /// Each adjacent face contributes its normal weighted by the corner angle at
    /// `v`, which keeps the result independent of how faces are triangulated.
    pub fn vertex_normal(&self, v: VertexId) -> Vector3<f64> {
        let faces: Vec<FaceId> = self.vertex_faces(v).collect();
        self.vertex_normal_among(v, &faces)
    }

    /// Shell thickness factor of a vertex.
    ///
    /// Offsetting a vertex along its normal by `depth * shell_factor` keeps
    /// every adjacent face (approximately) `depth` away from its original plane.
    /// The factor is the angle-weighted mean of `1 / cos` of the angle between
    /// the vertex normal and each adjacent face normal; 1 for isolated vertices.
    pub fn shell_factor(&self, v: VertexId) -> f64 {
        let faces: Vec<FaceId> = self.vertex_faces(v).collect();
        let normal = self.vertex_normal_among(v, &faces);
        self.shell_factor_among(v, &normal, &faces)
    }

    /// Faces around every vertex, indexed by vertex ID.
    pub fn vertex_face_map(&self) -> Vec<Vec<FaceId>> {
        let mut map = vec![Vec::new(); self.vertices.len()];
        for (f, face) in self.faces() {
            for &v in &face.vertices {
                let around: &mut Vec<FaceId> = &mut map[v.index()];
                if around.last() != Some(&f) {
                    around.push(f);
                }
            }
        }
        map
    }

    /// `vertex_normal * shell_factor` for every vertex, indexed by vertex ID.
    pub fn shell_offsets(&self) -> Vec<Vector3<f64>> {
        let map = self.vertex_face_map();
        self.vertex_ids()
            .map(|v| {
                let faces = &map[v.index()];
                let normal = self.vertex_normal_among(v, faces);
                normal * self.shell_factor_among(v, &normal, faces)
            })
            .collect()
    }

    /// Corner angles at `v` in each of `faces`, paired with the face normal.
    fn corners_at<'a>(
        &'a self,
        v: VertexId,
        faces: &'a [FaceId],
    ) -> impl Iterator<Item = (Vector3<f64>, f64)> + 'a {
        faces.iter().flat_map(move |&f| {
            let face = self.face(f);
            let points = self.face_positions(f);
            face.vertices
                .iter()
                .enumerate()
                .filter(move |(_, &fv)| fv == v)
                .map(move |(i, _)| (face.normal, corner_angle(&points, i)))
                .collect::<Vec<_>>()
        })
    }

    fn vertex_normal_among(&self, v: VertexId, faces: &[FaceId]) -> Vector3<f64> {
        let normal: Vector3<f64> = self
            .corners_at(v, faces)
            .map(|(n, angle)| n * angle)
            .sum();
        if normal.norm_squared() <= LENGTH_EPSILON_SQ {
            Vector3::zeros()
        } else {
            normal.normalize()
        }
    }

    fn shell_factor_among(&self, v: VertexId, vertex_normal: &Vector3<f64>, faces: &[FaceId]) -> f64 {
        let mut accum_shell = 0.0;
        let mut accum_angle = 0.0;
        for (normal, angle) in self.corners_at(v, faces) {
            let cos = vertex_normal.dot(&normal).abs();
            let shell = if cos < 1e-8 { 1.0 } else { 1.0 / cos };
            accum_shell += shell * angle;
            accum_angle += angle;
        }
        if accum_angle > 0.0 {
            accum_shell / accum_angle
        } else {
            1.0
        }
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut min = self.vertices[0].position;
        let mut max = self.vertices[0].position;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        id
    }

    /// Add a face and return its ID. The face normal is computed here.
    pub fn add_face(&mut self, mut face: Face) -> FaceId {
        face.normal = polygon_normal(&self.loop_positions(&face.vertices));
        let id = FaceId::new(self.faces.len());
        self.faces.push(face);
        id
    }

    /// Replace every face by the faces `f` returns for it.
    ///
    /// New faces get fresh normals; face IDs are not stable across this call.
    pub(crate) fn rebuild_faces<F>(&mut self, mut f: F)
    where
        F: FnMut(&PolyMesh, Face) -> Vec<Face>,
    {
        let old = std::mem::take(&mut self.faces);
        let mut rebuilt = Vec::with_capacity(old.len());
        for face in old {
            rebuilt.extend(f(self, face));
        }
        for face in &mut rebuilt {
            face.normal = polygon_normal(&self.loop_positions(&face.vertices));
        }
        self.faces = rebuilt;
    }

    // ==================== Transforms ====================

    /// Recompute every face normal from its current vertex positions.
    pub fn recalc_normals(&mut self) {
        for i in 0..self.faces.len() {
            let normal = polygon_normal(&self.loop_positions(&self.faces[i].vertices));
            self.faces[i].normal = normal;
        }
    }

    /// Apply an affine transform to every vertex.
    ///
    /// A mirroring transform (negative determinant) would turn every face
    /// inside out, so face loops are reversed to keep normals pointing outward.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for v in &mut self.vertices {
            v.position = matrix.transform_point(&v.position);
        }
        if matrix.fixed_view::<3, 3>(0, 0).determinant() < 0.0 {
            for face in &mut self.faces {
                face.vertices.reverse();
                face.uvs.reverse();
            }
        }
        self.recalc_normals();
    }

    /// Snap every vertex to the grid. No-op for a zero grid.
    pub fn snap_to_grid(&mut self, grid: f64) {
        if grid == 0.0 {
            return;
        }
        for v in &mut self.vertices {
            v.position = snap_point(&v.position, grid);
        }
        self.recalc_normals();
    }

    // ==================== Validation ====================

    /// Check that every face references existing vertices and has one UV per corner.
    pub fn is_valid(&self) -> bool {
        self.faces.iter().all(|f| {
            f.vertices.len() >= 3
                && f.uvs.len() == f.vertices.len()
                && f.vertices
                    .iter()
                    .all(|v| v.is_valid() && v.index() < self.vertices.len())
        })
    }
}
