//! Single-brush strategy: the convex hull of the whole mesh.

use nalgebra::{Matrix2, Point2, Point3, Vector2, Vector3};

use parry3d_f64::transformation::try_convex_hull;

use super::{Brush, BrushFace, BuildError, BuildParams};
use crate::algo::{merge_coplanar, split_nonplanar};
use crate::mesh::geometry::{polygon_centroid, polygon_normal, project_to_plane, triangle_area};
use crate::mesh::{Face, FaceId, PolyMesh, VertexId};

/// Hull triangles farther than this from a source plane get no source face.
const PLANE_TOLERANCE: f64 = 1e-4;

/// Point sets flatter than this, relative to their extent, have no hull.
const FLATNESS_EPSILON: f64 = 1e-9;

pub(super) fn build(mesh: &PolyMesh, params: &BuildParams) -> Result<Vec<Brush>, BuildError> {
    let points = mesh.positions();
    let triangles = hull_triangles(&points).ok_or(BuildError::DegenerateHull {
        points: points.len(),
    })?;

    let mut hull = PolyMesh::with_capacity(points.len(), triangles.len());
    for p in &points {
        hull.add_vertex(*p);
    }
    for tri in &triangles {
        let corners: Vec<Point3<f64>> = tri.iter().map(|&i| points[i]).collect();
        let face = match source_face(mesh, &corners) {
            Some(source) => {
                let uvs = corners.iter().map(|p| extend_uv(mesh, source, p)).collect();
                Face::new(
                    tri.iter().map(|&i| VertexId::new(i)).collect(),
                    uvs,
                    mesh.face(source).material,
                )
            }
            None => Face::without_uvs(tri.iter().map(|&i| VertexId::new(i)).collect(), None),
        };
        hull.add_face(face);
    }

    let merges = merge_coplanar(&mut hull, params.face_angle, params.shape_angle);
    split_nonplanar(&mut hull, 0.0);
    log::debug!(
        "hull of {} points: {} triangles, {} merges, {} faces",
        points.len(),
        triangles.len(),
        merges,
        hull.num_faces()
    );

    let faces = hull
        .face_ids()
        .map(|f| {
            let face = hull.face(f);
            BrushFace {
                points: hull.face_positions(f),
                uvs: face.uvs.clone(),
                normal: face.normal,
                material: face.material,
            }
        })
        .collect();
    Ok(Brush::finish(faces).into_iter().collect())
}

/// Outward-wound hull triangles as indices into `points`, or `None` when the
/// points do not span a volume.
fn hull_triangles(points: &[Point3<f64>]) -> Option<Vec<[usize; 3]>> {
    if !spans_volume(points) {
        return None;
    }
    let (vertices, triangles) = match try_convex_hull(points) {
        Ok(hull) => hull,
        Err(e) => {
            log::debug!("convex hull failed: {:?}", e);
            return None;
        }
    };

    // Hull vertices are copies of input points; recover their indices so the
    // snapped input positions are used verbatim.
    let source: Vec<usize> = vertices
        .iter()
        .map(|v| {
            (0..points.len())
                .min_by(|&a, &b| {
                    (points[a] - v)
                        .norm_squared()
                        .total_cmp(&(points[b] - v).norm_squared())
                })
                .unwrap_or(0)
        })
        .collect();
    let center = source
        .iter()
        .fold(Vector3::zeros(), |sum, &i| sum + points[i].coords)
        / source.len().max(1) as f64;

    let triangles = triangles
        .iter()
        .map(|&tri| {
            let [a, b, c] = tri.map(|i| source[i as usize]);
            let normal = (points[b] - points[a]).cross(&(points[c] - points[a]));
            if normal.dot(&(points[a].coords - center)) < 0.0 {
                [a, c, b]
            } else {
                [a, b, c]
            }
        })
        .filter(|&[a, b, c]| a != b && b != c && a != c)
        .collect::<Vec<_>>();
    (triangles.len() >= 4).then_some(triangles)
}

/// Whether at least four of the points are not coplanar.
fn spans_volume(points: &[Point3<f64>]) -> bool {
    let Some(&p0) = points.first() else {
        return false;
    };
    let farthest = |score: &dyn Fn(&Point3<f64>) -> f64| {
        points
            .iter()
            .map(|p| (score(p), *p))
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((0.0, p0))
    };
    let (extent, p1) = farthest(&|p| (p - p0).norm());
    if points.len() < 4 || extent == 0.0 {
        return false;
    }
    let axis = (p1 - p0) / extent;
    let (_, p2) = farthest(&|p| (p - p0).cross(&axis).norm());
    let normal = (p1 - p0).cross(&(p2 - p0));
    let Some(normal) = normal.try_normalize(0.0) else {
        return false;
    };
    let (height, _) = farthest(&|p| normal.dot(&(p - p0)).abs());
    height > FLATNESS_EPSILON * extent
}

/// The source face a hull triangle was cut from.
///
/// Candidates are coplanar with the triangle. One containing the triangle's
/// centroid wins; otherwise the largest candidate.
fn source_face(mesh: &PolyMesh, corners: &[Point3<f64>]) -> Option<FaceId> {
    let normal = polygon_normal(corners);
    let centroid = polygon_centroid(corners);
    let candidates: Vec<FaceId> = mesh
        .face_ids()
        .filter(|&f| {
            let face = mesh.face(f);
            if face.normal.norm_squared() == 0.0 || face.normal.angle(&normal) >= 0.01 {
                return false;
            }
            let anchor = mesh.position(face.vertices[0]);
            corners
                .iter()
                .all(|p| face.normal.dot(&(p - anchor)).abs() <= PLANE_TOLERANCE)
        })
        .collect();

    candidates
        .iter()
        .copied()
        .find(|&f| contains(&mesh.face_positions(f), &mesh.face_normal(f), &centroid))
        .or_else(|| {
            candidates
                .iter()
                .copied()
                .max_by(|&a, &b| mesh.face_area(a).total_cmp(&mesh.face_area(b)))
        })
}

/// Even-odd test of `point` against a planar polygon.
fn contains(polygon: &[Point3<f64>], normal: &Vector3<f64>, point: &Point3<f64>) -> bool {
    let mut all = polygon.to_vec();
    all.push(*point);
    let flat = project_to_plane(&all, normal);
    let (poly, p) = flat.split_at(polygon.len());
    let p = p[0];
    let mut inside = false;
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Extend the UV mapping of `source` affinely to `point`.
fn extend_uv(mesh: &PolyMesh, source: FaceId, point: &Point3<f64>) -> Point2<f64> {
    let face = mesh.face(source);
    let positions = mesh.face_positions(source);
    let n = positions.len();
    let best = (0..n)
        .max_by(|&a, &b| {
            let ta = triangle_area(&positions[a], &positions[(a + 1) % n], &positions[(a + 2) % n]);
            let tb = triangle_area(&positions[b], &positions[(b + 1) % n], &positions[(b + 2) % n]);
            ta.total_cmp(&tb)
        })
        .unwrap_or(0);
    let (i0, i1, i2) = (best, (best + 1) % n, (best + 2) % n);
    let e1 = positions[i1] - positions[i0];
    let e2 = positions[i2] - positions[i0];
    let d = point - positions[i0];

    let gram = Matrix2::new(e1.dot(&e1), e1.dot(&e2), e1.dot(&e2), e2.dot(&e2));
    let Some(inverse) = gram.try_inverse() else {
        return face.uvs[i0];
    };
    let w = inverse * Vector2::new(d.dot(&e1), d.dot(&e2));
    let (t0, t1, t2) = (face.uvs[i0], face.uvs[i1], face.uvs[i2]);
    t0 + (t1 - t0) * w.x + (t2 - t0) * w.y
}
