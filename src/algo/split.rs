//! Splitting faces into convex, planar pieces.
//!
//! Brush faces must be convex and planar. These operations cut offending
//! faces along diagonals between existing corners; they never add vertices.

use nalgebra::{Point3, Vector3};

use super::triangulate::ear_clip;
use crate::mesh::geometry::{is_convex, planarity_error, polygon_area, polygon_normal};
use crate::mesh::PolyMesh;

/// Fold angles at or below this are considered planar.
pub const PLANAR_EPSILON: f64 = 1e-6;

/// Split every concave face into convex pieces.
///
/// The face is ear clipped and the triangles are then greedily merged back
/// across their shared diagonals while the union stays convex. Returns the
/// number of faces that were split.
pub fn split_concave(mesh: &mut PolyMesh) -> usize {
    let mut count = 0;
    mesh.rebuild_faces(|mesh, face| {
        let points = mesh.loop_positions(&face.vertices);
        let normal = polygon_normal(&points);
        if face.len() <= 3 || normal.norm_squared() == 0.0 {
            return vec![face];
        }
        let tolerance = convexity_tolerance(&points);
        if is_convex(&points, &normal, tolerance) {
            return vec![face];
        }
        count += 1;
        let mut pieces: Vec<Vec<usize>> = ear_clip(&points).iter().map(|t| t.to_vec()).collect();
        merge_convex_pieces(&points, &normal, tolerance, &mut pieces);
        pieces.iter().map(|p| face.sub_face(p)).collect()
    });
    count
}

/// Split every face whose fold angle exceeds `angle_limit` (radians).
///
/// Faces are cut recursively along the diagonal that leaves the flattest
/// pieces, preferring cuts that keep both halves convex. Returns the number
/// of faces that were split.
pub fn split_nonplanar(mesh: &mut PolyMesh, angle_limit: f64) -> usize {
    let limit = angle_limit.max(PLANAR_EPSILON);
    let mut count = 0;
    mesh.rebuild_faces(|mesh, face| {
        let points = mesh.loop_positions(&face.vertices);
        let normal = polygon_normal(&points);
        if face.len() <= 3 || planarity_error(&points, &normal) <= limit {
            return vec![face];
        }
        count += 1;
        let corners: Vec<usize> = (0..face.len()).collect();
        let mut pieces = Vec::new();
        split_recursive(&points, corners, limit, &mut pieces);
        pieces.iter().map(|p| face.sub_face(p)).collect()
    });
    count
}

fn convexity_tolerance(points: &[Point3<f64>]) -> f64 {
    let longest = (0..points.len())
        .map(|i| (points[(i + 1) % points.len()] - points[i]).norm_squared())
        .fold(0.0, f64::max);
    longest * 1e-9
}

/// Merge pieces of one polygon across shared diagonals while the result
/// stays convex around `normal`.
fn merge_convex_pieces(
    points: &[Point3<f64>],
    normal: &Vector3<f64>,
    tolerance: f64,
    pieces: &mut Vec<Vec<usize>>,
) {
    'outer: loop {
        for i in 0..pieces.len() {
            for j in (i + 1)..pieces.len() {
                if let Some(merged) = join_loops(&pieces[i], &pieces[j], |&c| c) {
                    let merged_points: Vec<Point3<f64>> =
                        merged.iter().map(|&c| points[c]).collect();
                    if is_convex(&merged_points, normal, tolerance) {
                        pieces[i] = merged;
                        pieces.remove(j);
                        continue 'outer;
                    }
                }
            }
        }
        break;
    }
}

/// Join two loops that share exactly one edge (traversed in opposite
/// directions), comparing corners by `key`. Returns `None` if they share no
/// edge or more than one.
pub(crate) fn join_loops<T, K, F>(a: &[T], b: &[T], key: F) -> Option<Vec<T>>
where
    T: Clone,
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let n = a.len();
    let m = b.len();
    let mut shared = None;
    for i in 0..n {
        let (x, y) = (key(&a[i]), key(&a[(i + 1) % n]));
        for k in 0..m {
            if key(&b[k]) == y && key(&b[(k + 1) % m]) == x {
                if shared.is_some() {
                    return None;
                }
                shared = Some((i, k));
            }
        }
    }
    let (i, k) = shared?;

    // a rotated to run from the end of the shared edge back to its start,
    // followed by b's corners strictly between the shared pair.
    let mut merged = Vec::with_capacity(n + m - 2);
    for step in 0..n {
        merged.push(a[(i + 1 + step) % n].clone());
    }
    for step in 2..m {
        merged.push(b[(k + step) % m].clone());
    }
    Some(merged)
}

fn split_recursive(
    points: &[Point3<f64>],
    corners: Vec<usize>,
    limit: f64,
    out: &mut Vec<Vec<usize>>,
) {
    let loop_points: Vec<Point3<f64>> = corners.iter().map(|&c| points[c]).collect();
    let normal = polygon_normal(&loop_points);
    if corners.len() <= 3 || planarity_error(&loop_points, &normal) <= limit {
        out.push(corners);
        return;
    }

    let n = corners.len();
    let mut best: Option<(bool, f64, f64, usize, usize)> = None;
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (first, second) = cut(&corners, i, j);
            let p1: Vec<Point3<f64>> = first.iter().map(|&c| points[c]).collect();
            let p2: Vec<Point3<f64>> = second.iter().map(|&c| points[c]).collect();
            let n1 = polygon_normal(&p1);
            let n2 = polygon_normal(&p2);
            // Both halves must face the same way as the whole.
            if n1.dot(&normal) <= 0.0 || n2.dot(&normal) <= 0.0 {
                continue;
            }
            if polygon_area(&p1) <= 0.0 || polygon_area(&p2) <= 0.0 {
                continue;
            }
            let convex = is_convex(&p1, &n1, convexity_tolerance(&p1))
                && is_convex(&p2, &n2, convexity_tolerance(&p2));
            let error = planarity_error(&p1, &n1).max(planarity_error(&p2, &n2));
            let length = (points[corners[i]] - points[corners[j]]).norm();
            let better = match best {
                None => true,
                Some((best_convex, best_error, best_length, _, _)) => {
                    if convex != best_convex {
                        convex
                    } else if (error - best_error).abs() > 1e-12 {
                        error < best_error
                    } else {
                        length < best_length
                    }
                }
            };
            if better {
                best = Some((convex, error, length, i, j));
            }
        }
    }

    match best {
        Some((_, _, _, i, j)) => {
            let (first, second) = cut(&corners, i, j);
            split_recursive(points, first, limit, out);
            split_recursive(points, second, limit, out);
        }
        None => {
            for tri in ear_clip(&loop_points) {
                out.push(tri.iter().map(|&t| corners[t]).collect());
            }
        }
    }
}

/// Cut a loop along the diagonal between loop positions `i < j`.
fn cut(corners: &[usize], i: usize, j: usize) -> (Vec<usize>, Vec<usize>) {
    let first = corners[i..=j].to_vec();
    let mut second = corners[j..].to_vec();
    second.extend_from_slice(&corners[..=i]);
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_polygons;
    use crate::mesh::geometry::is_convex;

    #[test]
    fn test_join_loops() {
        let a = [0, 1, 2];
        let b = [2, 1, 3];
        assert_eq!(join_loops(&a, &b, |&c| c), Some(vec![2, 0, 1, 3]));
        assert_eq!(join_loops(&a, &[4, 5, 6], |&c| c), None);
    }

    #[test]
    fn test_cut() {
        let corners = vec![0, 1, 2, 3, 4];
        let (a, b) = cut(&corners, 1, 3);
        assert_eq!(a, vec![1, 2, 3]);
        assert_eq!(b, vec![3, 4, 0, 1]);
    }

    #[test]
    fn test_split_concave_l_shape() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let mut mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3, 4, 5]]).unwrap();
        assert_eq!(split_concave(&mut mesh), 1);

        // An L needs exactly two convex pieces.
        assert_eq!(mesh.num_faces(), 2);
        assert!((mesh.surface_area() - 3.0).abs() < 1e-12);
        for f in mesh.face_ids() {
            let points = mesh.face_positions(f);
            assert!(is_convex(&points, &Vector3::z(), 1e-12));
            assert!(mesh.face_normal(f).z > 0.99);
        }
    }

    #[test]
    fn test_convex_face_untouched() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
        assert_eq!(split_concave(&mut mesh), 0);
        assert_eq!(split_nonplanar(&mut mesh, 0.0), 0);
        assert_eq!(mesh.num_faces(), 1);
    }

    #[test]
    fn test_split_nonplanar_quad() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.5),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
        assert_eq!(split_nonplanar(&mut mesh, 0.0), 1);
        assert_eq!(mesh.num_faces(), 2);
        for f in mesh.face_ids() {
            assert_eq!(mesh.face(f).len(), 3);
            assert!(mesh.face_normal(f).z > 0.0);
        }
    }

    #[test]
    fn test_split_nonplanar_keeps_planar_parts_large() {
        // A planar square with one corner of an attached flap lifted: the best
        // cut leaves the square intact.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.3),
            Point3::new(2.0, 1.0, 0.3),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3, 4, 5]]).unwrap();
        split_nonplanar(&mut mesh, 0.0);
        assert_eq!(mesh.num_faces(), 2);
        let sizes: Vec<usize> = mesh.face_ids().map(|f| mesh.face(f).len()).collect();
        assert_eq!(sizes, vec![4, 4]);
    }
}
