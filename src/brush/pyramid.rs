//! Pyramid strategies: one brush per face, closed by a single apex.

use nalgebra::{Point2, Point3};

use super::{cap_face, Brush, BrushFace};
use crate::mesh::{FaceId, PolyMesh};
use crate::numeric::snap_point;

/// An apex closer than this to the cap plane gives a flat pyramid.
const MIN_HEIGHT: f64 = 1e-6;

/// Apex `depth` behind each face's centroid.
pub(super) fn build_offset(mesh: &PolyMesh, faces: &[FaceId], depth: f64, grid: f64) -> Vec<Brush> {
    faces
        .iter()
        .filter_map(|&f| {
            let apex = mesh.face_centroid(f) - mesh.face_normal(f) * depth;
            pyramid(mesh, f, &snap_point(&apex, grid))
        })
        .collect()
}

/// One apex shared by every face.
pub(super) fn build_shared(mesh: &PolyMesh, faces: &[FaceId], apex: &Point3<f64>) -> Vec<Brush> {
    faces.iter().filter_map(|&f| pyramid(mesh, f, apex)).collect()
}

fn pyramid(mesh: &PolyMesh, f: FaceId, apex: &Point3<f64>) -> Option<Brush> {
    let mut cap = cap_face(mesh, f);
    let height = cap.normal.dot(&(apex - mesh.face_centroid(f)));
    if height.abs() <= MIN_HEIGHT {
        log::debug!("skipping face {:?}: apex lies on its plane", f);
        return None;
    }
    if height > 0.0 {
        cap.reverse();
    }

    let apex_uv = mean_uv(&cap.uvs);
    let n = cap.points.len();
    let mut faces = Vec::with_capacity(n + 1);
    for i in 0..n {
        let j = (i + 1) % n;
        faces.push(BrushFace::new(
            vec![cap.points[j], cap.points[i], *apex],
            vec![cap.uvs[j], cap.uvs[i], apex_uv],
            None,
        ));
    }
    faces.insert(0, cap);
    Brush::finish(faces)
}

fn mean_uv(uvs: &[Point2<f64>]) -> Point2<f64> {
    let sum = uvs.iter().fold(Point2::origin(), |acc, uv| acc + uv.coords);
    sum / uvs.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_polygons;

    fn triangle() -> PolyMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ];
        build_from_polygons(&vertices, &[vec![0, 1, 2]]).unwrap()
    }

    #[test]
    fn test_tetrahedron() {
        let mesh = triangle();
        let brushes = build_offset(&mesh, &[FaceId::new(0)], 2.0, 0.0);
        assert_eq!(brushes.len(), 1);
        assert_eq!(brushes[0].len(), 4);
        assert!(brushes[0].is_convex(1e-9));
        assert!(brushes[0].faces[1..].iter().all(|f| f.material.is_none()));
    }

    #[test]
    fn test_apex_on_plane_is_skipped() {
        let mesh = triangle();
        let apex = Point3::new(10.0, 10.0, 0.0);
        assert!(build_shared(&mesh, &[FaceId::new(0)], &apex).is_empty());
    }

    #[test]
    fn test_apex_snapped() {
        let mesh = triangle();
        let brushes = build_offset(&mesh, &[FaceId::new(0)], 3.0, 2.0);
        let apex = brushes[0]
            .vertices()
            .find(|p| p.z != 0.0)
            .copied()
            .unwrap();
        // centroid (4/3, 4/3, 0) - 3z, snapped to 2
        assert_eq!(apex, Point3::new(2.0, 2.0, -4.0));
    }

    #[test]
    fn test_mean_uv() {
        let uvs = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0)];
        assert_eq!(mean_uv(&uvs), Point2::new(0.5, 0.5));
    }
}
