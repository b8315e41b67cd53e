//! Plane emitter.
//!
//! A brush face is written either as three points on its plane or as the
//! plane equation itself.

use nalgebra::{Point3, Vector3};

use crate::mesh::geometry::polygon_centroid;

/// How a face's plane is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaneFormat {
    /// Three points, clockwise when seen from outside the brush.
    #[default]
    ThreePoint,
    /// Unit normal and distance, `( nx ny nz d )`.
    NormalDistance,
}

/// A face plane in one of the two encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneEncoding {
    /// Three points on the plane.
    Points([Point3<f64>; 3]),
    /// Plane `n . p + d = 0`.
    Equation {
        /// Unit normal, pointing out of the brush.
        normal: Vector3<f64>,
        /// Signed offset; `-d` is the distance of the plane from the origin
        /// along `normal`.
        distance: f64,
    },
}

/// The first three corners of an outward-wound face, reversed.
///
/// Map compilers derive the plane normal as `(p0 - p1) x (p2 - p1)`, which
/// points out of the brush for clockwise points.
///
/// # Panics
///
/// Panics if `points` has fewer than three corners.
pub fn three_points(points: &[Point3<f64>]) -> [Point3<f64>; 3] {
    [points[2], points[1], points[0]]
}

/// Plane equation of a face with unit `normal`.
///
/// The origin is projected onto the plane through the face centroid; the
/// distance is read off that projection rather than from a single corner, so
/// slightly non-planar faces get their average plane.
pub fn normal_distance(points: &[Point3<f64>], normal: &Vector3<f64>) -> (Vector3<f64>, f64) {
    let centroid = polygon_centroid(points);
    let foot = Point3::origin() + normal * normal.dot(&centroid.coords);
    (*normal, -normal.dot(&foot.coords))
}

/// Encode a face plane.
pub fn emit(points: &[Point3<f64>], normal: &Vector3<f64>, format: PlaneFormat) -> PlaneEncoding {
    match format {
        PlaneFormat::ThreePoint => PlaneEncoding::Points(three_points(points)),
        PlaneFormat::NormalDistance => {
            let (normal, distance) = normal_distance(points, normal);
            PlaneEncoding::Equation { normal, distance }
        }
    }
}
