//! Mesh-to-brush geometry builder.
//!
//! A brush is a convex solid bounded by planes. Arbitrary meshes are turned
//! into brushes by one of six [`Strategy`] variants, each of which guarantees
//! convexity by construction: either the whole mesh is reduced to its convex
//! hull, or every face becomes its own small solid (a pyramid or a prism).
//!
//! # Pipeline
//!
//! Every strategy runs the same outer steps on its working mesh:
//!
//! 1. apply the object transform and the uniform scale
//! 2. snap all vertices to the grid
//! 3. run the strategy's structural operations
//! 4. snap the vertices those operations created
//!
//! Degenerate pieces (zero-area faces, coincident corners, an apex on the cap
//! plane) are skipped with a debug log. Brush faces smaller than
//! [`AREA_EPSILON`](crate::mesh::geometry::AREA_EPSILON) are dropped, and
//! brushes left with fewer than four faces are dropped.
//!
//! # Example
//!
//! ```
//! use brushsmith::brush::{build, BuildParams, Strategy};
//! use brushsmith::mesh::build_from_polygons;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(64.0, 0.0, 0.0),
//!     Point3::new(64.0, 64.0, 0.0),
//!     Point3::new(0.0, 64.0, 0.0),
//! ];
//! let mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
//!
//! let brushes = build(mesh, &Strategy::Faces { depth: 8.0 }, &BuildParams::default());
//! assert_eq!(brushes.len(), 1);
//! assert_eq!(brushes[0].faces.len(), 5);
//! ```

mod hull_brush;
mod prism;
mod pyramid;

use nalgebra::{Matrix4, Point2, Point3, Vector3};
use thiserror::Error;

use crate::algo::{split_concave, split_nonplanar, triangulate_straight_corners};
use crate::error::{MapError, Result};
use crate::mesh::geometry::{
    corner_angle, has_coincident_corners, polygon_area, polygon_normal, triangle_area,
    AREA_EPSILON,
};
use crate::mesh::{FaceId, PolyMesh};
use crate::plane::{self, PlaneEncoding, PlaneFormat};
use crate::texture::{self, Projection, TexelSize, TextureFormat};

/// Corners within this many radians of a straight angle are T-junction
/// candidates.
pub const STRAIGHT_ANGLE_TOLERANCE: f64 = 1e-4;

/// Corners sharper than this make a face degenerate.
const MIN_CORNER_ANGLE: f64 = 1e-4;

/// How a mesh is turned into brushes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// The convex hull of the whole mesh, reduced to a minimal set of planes.
    /// Exactly one brush per mesh.
    Brush,
    /// One pyramid per face, apex `depth` behind the face centroid.
    Faces {
        /// Distance of the apex behind the face.
        depth: f64,
    },
    /// One prism per face, extruded `depth` along the inverse normal.
    Prisms {
        /// Extrusion distance.
        depth: f64,
    },
    /// One prism per upward-facing face, extruded down to a common floor
    /// `depth` below the lowest vertex of the mesh.
    Soup {
        /// Distance of the floor below the lowest vertex.
        depth: f64,
    },
    /// One pyramid per face, all sharing the object origin as apex.
    Blob,
    /// One prism per face, extruded along vertex normals so that adjacent
    /// prisms meet in mitered joints. Side faces may come out non-planar.
    Miter {
        /// Shell thickness.
        depth: f64,
    },
}

impl Strategy {
    /// Short lowercase name, as used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Brush => "brush",
            Strategy::Faces { .. } => "faces",
            Strategy::Prisms { .. } => "prisms",
            Strategy::Soup { .. } => "soup",
            Strategy::Blob => "blob",
            Strategy::Miter { .. } => "miter",
        }
    }

    /// The strategy's depth parameter, if it has one.
    pub fn depth(&self) -> Option<f64> {
        match *self {
            Strategy::Faces { depth }
            | Strategy::Prisms { depth }
            | Strategy::Soup { depth }
            | Strategy::Miter { depth } => Some(depth),
            Strategy::Brush | Strategy::Blob => None,
        }
    }

    /// Check the strategy's parameters.
    pub fn validate(&self) -> Result<()> {
        if let Some(depth) = self.depth() {
            if !depth.is_finite() || depth < 0.0 {
                return Err(MapError::invalid_param(
                    "depth",
                    depth,
                    "must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Faces { depth: 8.0 }
    }
}

/// Parameters shared by all strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildParams {
    /// Grid size for vertex snapping; 0 disables snapping.
    pub grid: f64,
    /// Uniform scale applied after the object transform.
    pub scale: f64,
    /// Object origin in world space, the shared apex of [`Strategy::Blob`].
    pub origin: Point3<f64>,
    /// Object-to-world transform.
    pub transform: Option<Matrix4<f64>>,
    /// Triangulate faces with straight corners before splitting them into
    /// independent brushes.
    pub triangulate_tjunctions: bool,
    /// Maximum angle between normals of hull faces that get merged.
    pub face_angle: f64,
    /// Maximum deviation of a merged hull face from its parts.
    pub shape_angle: f64,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            grid: 0.0,
            scale: 1.0,
            origin: Point3::origin(),
            transform: None,
            triangulate_tjunctions: true,
            face_angle: crate::algo::merge::DEFAULT_FACE_ANGLE,
            shape_angle: crate::algo::merge::DEFAULT_SHAPE_ANGLE,
        }
    }
}

impl BuildParams {
    /// Set the snapping grid.
    pub fn with_grid(mut self, grid: f64) -> Self {
        self.grid = grid;
        self
    }

    /// Set the uniform scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the object origin.
    pub fn with_origin(mut self, origin: Point3<f64>) -> Self {
        self.origin = origin;
        self
    }

    /// Set the object-to-world transform.
    pub fn with_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Enable or disable T-junction triangulation.
    pub fn with_triangulate_tjunctions(mut self, enabled: bool) -> Self {
        self.triangulate_tjunctions = enabled;
        self
    }

    /// Check the parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.grid.is_finite() || self.grid < 0.0 {
            return Err(MapError::invalid_param(
                "grid",
                self.grid,
                "must be finite and non-negative",
            ));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(MapError::invalid_param(
                "scale",
                self.scale,
                "must be finite and positive",
            ));
        }
        Ok(())
    }

    /// Combined transform: object transform followed by the uniform scale.
    fn matrix(&self) -> Matrix4<f64> {
        let scale = Matrix4::new_scaling(self.scale);
        match self.transform {
            Some(transform) => scale * transform,
            None => scale,
        }
    }
}

/// Reasons a mesh produced no brushes at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The convex hull needs four points that are not coplanar.
    #[error("convex hull needs 4 non-coplanar points ({points} points given)")]
    DegenerateHull {
        /// Number of points in the mesh.
        points: usize,
    },
}

/// One face of a brush.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushFace {
    /// Corner positions, counter-clockwise seen from outside the brush.
    pub points: Vec<Point3<f64>>,
    /// One UV per corner.
    pub uvs: Vec<Point2<f64>>,
    /// Outward unit normal.
    pub normal: Vector3<f64>,
    /// Material index into the object's table; `None` uses the fallback.
    pub material: Option<usize>,
}

impl BrushFace {
    /// Create a face; the normal is computed from the corners.
    pub fn new(points: Vec<Point3<f64>>, uvs: Vec<Point2<f64>>, material: Option<usize>) -> Self {
        debug_assert_eq!(points.len(), uvs.len());
        let normal = polygon_normal(&points);
        Self {
            points,
            uvs,
            normal,
            material,
        }
    }

    /// Area of the face.
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    /// Flip the face so it points the other way.
    pub fn reverse(&mut self) {
        self.points.reverse();
        self.uvs.reverse();
        self.normal = -self.normal;
    }

    /// Encode the face's plane.
    pub fn plane(&self, format: PlaneFormat) -> PlaneEncoding {
        plane::emit(&self.points, &self.normal, format)
    }

    /// Solve the face's texture basis.
    pub fn texture(&self, texel: TexelSize, format: TextureFormat) -> Projection {
        texture::project(&self.points, &self.uvs, &self.normal, texel, format)
    }

    /// Rotate the loop so that its first three corners span a well-shaped
    /// triangle. Those three corners define the plane and the texture basis.
    fn rotate_to_stable_corner(&mut self) {
        let n = self.points.len();
        if n <= 3 || corner_sine(&self.points, 0) > 1e-3 {
            return;
        }
        let best = (0..n)
            .max_by(|&a, &b| {
                let ta = triangle_area(&self.points[a], &self.points[(a + 1) % n], &self.points[(a + 2) % n]);
                let tb = triangle_area(&self.points[b], &self.points[(b + 1) % n], &self.points[(b + 2) % n]);
                ta.total_cmp(&tb)
            })
            .unwrap_or(0);
        self.points.rotate_left(best);
        self.uvs.rotate_left(best);
    }
}

/// Sine of the angle at the second corner of the triangle starting at `i`.
fn corner_sine(points: &[Point3<f64>], i: usize) -> f64 {
    let n = points.len();
    let a = points[i] - points[(i + 1) % n];
    let b = points[(i + 2) % n] - points[(i + 1) % n];
    let scale = a.norm() * b.norm();
    if scale == 0.0 {
        0.0
    } else {
        a.cross(&b).norm() / scale
    }
}

/// A convex solid.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    /// Bounding faces, each wound counter-clockwise seen from outside.
    pub faces: Vec<BrushFace>,
}

impl Brush {
    /// Drop tiny faces, stabilise loop starts, and reject brushes that cannot
    /// enclose a volume.
    pub(crate) fn finish(faces: Vec<BrushFace>) -> Option<Brush> {
        let mut faces: Vec<BrushFace> = faces
            .into_iter()
            .filter(|f| f.points.len() >= 3 && f.area() >= AREA_EPSILON)
            .collect();
        if faces.len() < 4 {
            log::debug!("dropping brush with {} usable faces", faces.len());
            return None;
        }
        for face in &mut faces {
            face.rotate_to_stable_corner();
        }
        Some(Brush { faces })
    }

    /// Number of faces.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Whether the brush has no faces.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// All corner positions of all faces.
    pub fn vertices(&self) -> impl Iterator<Item = &Point3<f64>> + '_ {
        self.faces.iter().flat_map(|f| f.points.iter())
    }

    /// Whether every corner lies on or behind every face plane, within
    /// `tolerance` world units.
    pub fn is_convex(&self, tolerance: f64) -> bool {
        self.faces.iter().all(|face| {
            let anchor = face.points[0];
            self.vertices()
                .all(|v| face.normal.dot(&(v - anchor)) <= tolerance)
        })
    }
}

/// Build brushes from a working mesh.
///
/// Meshes that cannot produce a brush (see [`BuildError`]) are logged and
/// yield no brushes; use [`try_build`] to handle that case.
pub fn build(mesh: PolyMesh, strategy: &Strategy, params: &BuildParams) -> Vec<Brush> {
    match try_build(mesh, strategy, params) {
        Ok(brushes) => brushes,
        Err(e) => {
            log::warn!("{}", e);
            Vec::new()
        }
    }
}

/// Build brushes from a working mesh, reporting why nothing could be built.
pub fn try_build(
    mut mesh: PolyMesh,
    strategy: &Strategy,
    params: &BuildParams,
) -> std::result::Result<Vec<Brush>, BuildError> {
    let matrix = params.matrix();
    if matrix != Matrix4::identity() {
        mesh.transform(&matrix);
    }

    if let Strategy::Brush = strategy {
        mesh.snap_to_grid(params.grid);
        return hull_brush::build(&mesh, params);
    }

    if params.triangulate_tjunctions {
        let count = triangulate_straight_corners(&mut mesh, STRAIGHT_ANGLE_TOLERANCE);
        log::debug!("triangulated {} faces with straight corners", count);
    }
    mesh.snap_to_grid(params.grid);
    let concave = split_concave(&mut mesh);
    let folded = split_nonplanar(&mut mesh, 0.0);
    log::debug!("split {} concave and {} non-planar faces", concave, folded);

    let faces: Vec<FaceId> = mesh.face_ids().filter(|&f| usable_face(&mesh, f)).collect();

    let brushes = match *strategy {
        Strategy::Brush => Vec::new(),
        Strategy::Faces { depth } => pyramid::build_offset(&mesh, &faces, depth, params.grid),
        Strategy::Blob => {
            let apex = crate::numeric::snap_point(&(params.origin * params.scale), params.grid);
            pyramid::build_shared(&mesh, &faces, &apex)
        }
        Strategy::Prisms { depth } => {
            prism::build(&mesh, &faces, prism::Extrusion::Normal(depth), params.grid)
        }
        Strategy::Soup { depth } => {
            let floor = soup_floor(&mesh, depth, params.grid);
            prism::build(&mesh, &faces, prism::Extrusion::Floor(floor), params.grid)
        }
        Strategy::Miter { depth } => {
            prism::build(&mesh, &faces, prism::Extrusion::Shell(depth), params.grid)
        }
    };
    Ok(brushes)
}

/// Height of the common floor of [`Strategy::Soup`].
fn soup_floor(mesh: &PolyMesh, depth: f64, grid: f64) -> f64 {
    let lowest = mesh
        .bounding_box()
        .map(|(min, _)| min.z)
        .unwrap_or(0.0);
    crate::numeric::snap(lowest - depth, grid)
}

/// Whether a face can become the cap of a brush.
fn usable_face(mesh: &PolyMesh, f: FaceId) -> bool {
    let points = mesh.face_positions(f);
    if points.len() < 3 || has_coincident_corners(&points) {
        log::debug!("skipping face {:?}: coincident corners", f);
        return false;
    }
    if polygon_area(&points) <= AREA_EPSILON {
        log::debug!("skipping face {:?}: zero area", f);
        return false;
    }
    if (0..points.len()).any(|i| corner_angle(&points, i) < MIN_CORNER_ANGLE) {
        log::debug!("skipping face {:?}: degenerate corner", f);
        return false;
    }
    true
}

/// The cap face of a working-mesh face.
fn cap_face(mesh: &PolyMesh, f: FaceId) -> BrushFace {
    let face = mesh.face(f);
    BrushFace {
        points: mesh.face_positions(f),
        uvs: face.uvs.clone(),
        normal: face.normal,
        material: face.material,
    }
}
