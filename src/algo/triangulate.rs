//! Polygon triangulation.
//!
//! Faces are triangulated by ear clipping in the plane that best fits the
//! polygon, so slightly non-planar loops are handled the same way as planar
//! ones.

use nalgebra::{Point2, Point3};

use crate::mesh::geometry::{corner_angle, polygon_normal, project_to_plane};
use crate::mesh::{Face, PolyMesh};

/// Ear-clip a polygon.
///
/// Returns triangles as corner positions (indices into `points`), wound like
/// the input loop. Straight corners never become ears, so no zero-area
/// triangles are produced for loops with collinear runs.
///
/// # Example
/// ```
/// use brushsmith::algo::triangulate::ear_clip;
/// use nalgebra::Point3;
///
/// let square = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// assert_eq!(ear_clip(&square).len(), 2);
/// ```
pub fn ear_clip(points: &[Point3<f64>]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    if n == 3 {
        return vec![[0, 1, 2]];
    }

    let normal = polygon_normal(points);
    if normal.norm_squared() == 0.0 {
        return (1..n - 1).map(|i| [0, i, i + 1]).collect();
    }
    let projected = project_to_plane(points, &normal);
    let eps = area_tolerance(&projected);

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let corner = |k: usize| {
            (
                remaining[(k + m - 1) % m],
                remaining[k],
                remaining[(k + 1) % m],
            )
        };

        let ear = (0..m).find(|&k| {
            let (a, b, c) = corner(k);
            is_ear(&projected, &remaining, a, b, c, eps)
        });

        // No clean ear means the loop is numerically degenerate; clip the most
        // convex corner to guarantee progress.
        let k = ear.unwrap_or_else(|| {
            (0..m)
                .max_by(|&x, &y| {
                    let (a, b, c) = corner(x);
                    let (d, e, f) = corner(y);
                    cross(&projected[a], &projected[b], &projected[c])
                        .total_cmp(&cross(&projected[d], &projected[e], &projected[f]))
                })
                .unwrap_or(0)
        });

        let (a, b, c) = corner(k);
        triangles.push([a, b, c]);
        remaining.remove(k);
    }

    triangles.push([remaining[0], remaining[1], remaining[2]]);
    triangles
}

/// Triangulate every face selected by `predicate`.
///
/// Returns the number of faces that were triangulated.
pub fn triangulate_faces<P>(mesh: &mut PolyMesh, mut predicate: P) -> usize
where
    P: FnMut(&PolyMesh, &Face) -> bool,
{
    let mut count = 0;
    mesh.rebuild_faces(|mesh, face| {
        if face.len() <= 3 || !predicate(mesh, &face) {
            return vec![face];
        }
        count += 1;
        let points = mesh.loop_positions(&face.vertices);
        ear_clip(&points)
            .iter()
            .map(|tri| face.sub_face(tri))
            .collect()
    });
    count
}

/// Triangulate every face that has a corner within `tolerance` radians of a
/// straight angle.
///
/// Such corners are mid-edge vertices shared with a neighbouring face. Once
/// faces are exported as independent brushes, the neighbour's edge no longer
/// passes through that vertex and the seam cracks open (a T-junction).
/// Triangulating removes the straight corner from every resulting polygon.
pub fn triangulate_straight_corners(mesh: &mut PolyMesh, tolerance: f64) -> usize {
    triangulate_faces(mesh, |mesh, face| {
        let points = mesh.loop_positions(&face.vertices);
        (0..points.len())
            .any(|i| (corner_angle(&points, i) - std::f64::consts::PI).abs() <= tolerance)
    })
}

fn cross(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn area_tolerance(points: &[Point2<f64>]) -> f64 {
    let mut min = points[0];
    let mut max = points[0];
    for p in points {
        min = min.inf(p);
        max = max.sup(p);
    }
    (max - min).norm_squared() * 1e-12
}

fn is_ear(points: &[Point2<f64>], remaining: &[usize], a: usize, b: usize, c: usize, eps: f64) -> bool {
    let (pa, pb, pc) = (&points[a], &points[b], &points[c]);
    if cross(pa, pb, pc) <= eps {
        return false;
    }
    remaining.iter().all(|&i| {
        if i == a || i == b || i == c {
            return true;
        }
        let p = &points[i];
        if p == pa || p == pb || p == pc {
            return true;
        }
        !(cross(pa, pb, p) >= -eps && cross(pb, pc, p) >= -eps && cross(pc, pa, p) >= -eps)
    })
}
