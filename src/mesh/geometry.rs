//! Planar polygon geometry helpers.
//!
//! These operate on plain position slices so they can be shared by the mesh,
//! the mesh primitives in [`crate::algo`], and the brush builder.

use nalgebra::{Point2, Point3, Vector3};

/// Faces with an area at or below this are treated as degenerate.
pub const AREA_EPSILON: f64 = 1e-4;

/// Squared length below which a vector is treated as zero.
pub const LENGTH_EPSILON_SQ: f64 = 1e-18;

/// Newell normal of a polygon, not normalized.
///
/// The length is twice the area of the polygon's projection onto the plane
/// perpendicular to the result, so it doubles as a robust area measure for
/// non-planar loops.
pub fn newell_vector(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut n = Vector3::zeros();
    let count = points.len();
    for i in 0..count {
        let a = &points[i];
        let b = &points[(i + 1) % count];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

/// Unit normal of a polygon, or the zero vector if the polygon is degenerate.
pub fn polygon_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = newell_vector(points);
    if n.norm_squared() <= LENGTH_EPSILON_SQ {
        Vector3::zeros()
    } else {
        n.normalize()
    }
}

/// Area of a polygon.
pub fn polygon_area(points: &[Point3<f64>]) -> f64 {
    0.5 * newell_vector(points).norm()
}

/// Vertex average of a polygon.
pub fn polygon_centroid(points: &[Point3<f64>]) -> Point3<f64> {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

/// Area of the triangle `a`, `b`, `c`.
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Interior angle at corner `i` of a polygon, in radians.
///
/// Returns 0 for corners adjacent to a zero-length edge.
pub fn corner_angle(points: &[Point3<f64>], i: usize) -> f64 {
    let count = points.len();
    let prev = &points[(i + count - 1) % count];
    let cur = &points[i];
    let next = &points[(i + 1) % count];
    let a = prev - cur;
    let b = next - cur;
    if a.norm_squared() <= LENGTH_EPSILON_SQ || b.norm_squared() <= LENGTH_EPSILON_SQ {
        return 0.0;
    }
    a.angle(&b)
}

/// Signed turn at corner `i` measured against `normal`.
///
/// Positive for convex corners of a loop wound counter-clockwise around
/// `normal`, negative for reflex corners, near zero for straight corners.
pub fn corner_turn(points: &[Point3<f64>], i: usize, normal: &Vector3<f64>) -> f64 {
    let count = points.len();
    let prev = &points[(i + count - 1) % count];
    let cur = &points[i];
    let next = &points[(i + 1) % count];
    (cur - prev).cross(&(next - cur)).dot(normal)
}

/// Whether the polygon is convex around `normal`.
///
/// Straight corners are accepted; `tolerance` is an area-like bound on how
/// reflex a corner may be before it counts as concave.
pub fn is_convex(points: &[Point3<f64>], normal: &Vector3<f64>, tolerance: f64) -> bool {
    (0..points.len()).all(|i| corner_turn(points, i, normal) >= -tolerance)
}

/// Whether any two consecutive corners of the loop coincide.
pub fn has_coincident_corners(points: &[Point3<f64>]) -> bool {
    let count = points.len();
    (0..count).any(|i| (points[(i + 1) % count] - points[i]).norm_squared() <= LENGTH_EPSILON_SQ)
}

/// Largest angle between `normal` and the normal of any corner triangle.
///
/// Corners whose edges are (nearly) collinear carry no orientation and are
/// ignored. A planar convex loop returns 0; a folded loop returns the fold.
pub fn planarity_error(points: &[Point3<f64>], normal: &Vector3<f64>) -> f64 {
    if points.len() <= 3 || normal.norm_squared() <= LENGTH_EPSILON_SQ {
        return 0.0;
    }
    let count = points.len();
    let mut worst = 0.0_f64;
    for i in 0..count {
        let prev = &points[(i + count - 1) % count];
        let cur = &points[i];
        let next = &points[(i + 1) % count];
        let cross = (cur - prev).cross(&(next - cur));
        let len = cross.norm();
        let scale = (cur - prev).norm() * (next - cur).norm();
        if len <= 1e-9 * scale.max(1e-300) {
            continue;
        }
        let cos = (cross.dot(normal) / len).abs().clamp(-1.0, 1.0);
        worst = worst.max(cos.acos());
    }
    worst
}

/// Drop the coordinate axis most aligned with `normal` and return the 2D
/// projection of every point, wound counter-clockwise when seen from `normal`.
pub fn project_to_plane(points: &[Point3<f64>], normal: &Vector3<f64>) -> Vec<Point2<f64>> {
    let ax = normal.x.abs();
    let ay = normal.y.abs();
    let az = normal.z.abs();
    let (u, v, flip) = if az >= ax && az >= ay {
        (0, 1, normal.z < 0.0)
    } else if ax >= ay {
        (1, 2, normal.x < 0.0)
    } else {
        (2, 0, normal.y < 0.0)
    };
    points
        .iter()
        .map(|p| {
            if flip {
                Point2::new(p[v], p[u])
            } else {
                Point2::new(p[u], p[v])
            }
        })
        .collect()
}
