//! Coplanar face merging.

use std::collections::HashMap;

use nalgebra::{Point2, Vector3};

use super::split::join_loops;
use crate::mesh::geometry::{is_convex, polygon_normal};
use crate::mesh::{Face, PolyMesh, VertexId};

/// Face angle tolerance used when reducing a hull to a minimal set of planes.
pub const DEFAULT_FACE_ANGLE: f64 = 0.01;

/// Shape deviation tolerance used when reducing a hull to a minimal set of planes.
pub const DEFAULT_SHAPE_ANGLE: f64 = 0.7;

struct Group {
    face: Face,
    /// Normals of the original faces merged into this one.
    normals: Vec<Vector3<f64>>,
}

/// Merge adjacent faces that lie in (nearly) the same plane.
///
/// Two faces merge when they share exactly one edge, use the same material,
/// their normals differ by less than `face_angle`, the union is convex, and
/// no original face's normal deviates from the union's normal by
/// `shape_angle` or more. Candidate pairs are taken flattest first, and the
/// process repeats until nothing more can merge.
///
/// Returns the number of merges performed.
pub fn merge_coplanar(mesh: &mut PolyMesh, face_angle: f64, shape_angle: f64) -> usize {
    let mut groups: Vec<Option<Group>> = std::mem::take(&mut mesh.faces)
        .into_iter()
        .map(|face| {
            let normals = vec![face.normal];
            Some(Group { face, normals })
        })
        .collect();

    let mut merges = 0;
    loop {
        let candidates = candidate_pairs(&groups, face_angle);
        let mut used = vec![false; groups.len()];
        let mut merged_this_pass = 0;

        for (_, i, j) in candidates {
            if used[i] || used[j] {
                continue;
            }
            let (Some(a), Some(b)) = (&groups[i], &groups[j]) else {
                continue;
            };
            let Some(joined) = try_join(mesh, a, b, shape_angle) else {
                continue;
            };
            groups[i] = Some(joined);
            groups[j] = None;
            used[i] = true;
            used[j] = true;
            merged_this_pass += 1;
        }

        if merged_this_pass == 0 {
            break;
        }
        merges += merged_this_pass;
    }

    mesh.faces = groups.into_iter().flatten().map(|g| g.face).collect();
    mesh.recalc_normals();
    merges
}

/// Pairs of faces sharing an edge, sorted by the angle between their normals.
fn candidate_pairs(groups: &[Option<Group>], face_angle: f64) -> Vec<(f64, usize, usize)> {
    let mut edges: HashMap<(VertexId, VertexId), Vec<usize>> = HashMap::new();
    for (gi, group) in groups.iter().enumerate() {
        let Some(group) = group else { continue };
        let verts = &group.face.vertices;
        for k in 0..verts.len() {
            let (a, b) = (verts[k], verts[(k + 1) % verts.len()]);
            let key = if a < b { (a, b) } else { (b, a) };
            edges.entry(key).or_default().push(gi);
        }
    }

    let mut pairs: Vec<(f64, usize, usize)> = edges
        .values()
        .filter(|faces| faces.len() == 2 && faces[0] != faces[1])
        .filter_map(|faces| {
            let (i, j) = (faces[0].min(faces[1]), faces[0].max(faces[1]));
            let a = groups[i].as_ref()?;
            let b = groups[j].as_ref()?;
            if a.face.material != b.face.material {
                return None;
            }
            let angle = a.face.normal.angle(&b.face.normal);
            (angle < face_angle).then_some((angle, i, j))
        })
        .collect();
    pairs.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));
    pairs.dedup_by(|x, y| x.1 == y.1 && x.2 == y.2);
    pairs
}

fn try_join(mesh: &PolyMesh, a: &Group, b: &Group, shape_angle: f64) -> Option<Group> {
    let corners_a: Vec<(VertexId, Point2<f64>)> =
        a.face.vertices.iter().copied().zip(a.face.uvs.iter().copied()).collect();
    let corners_b: Vec<(VertexId, Point2<f64>)> =
        b.face.vertices.iter().copied().zip(b.face.uvs.iter().copied()).collect();
    let joined = join_loops(&corners_a, &corners_b, |c| c.0)?;

    let vertices: Vec<VertexId> = joined.iter().map(|c| c.0).collect();
    let points = mesh.loop_positions(&vertices);
    let normal = polygon_normal(&points);
    if normal.norm_squared() == 0.0 {
        return None;
    }

    let longest = (0..points.len())
        .map(|i| (points[(i + 1) % points.len()] - points[i]).norm_squared())
        .fold(0.0, f64::max);
    if !is_convex(&points, &normal, longest * 1e-9) {
        return None;
    }

    let normals: Vec<Vector3<f64>> = a.normals.iter().chain(&b.normals).copied().collect();
    if normals.iter().any(|n| n.angle(&normal) >= shape_angle) {
        return None;
    }

    let face = Face {
        vertices,
        uvs: joined.iter().map(|c| c.1).collect(),
        normal,
        material: a.face.material,
    };
    Some(Group { face, normals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_polygons;
    use nalgebra::Point3;

    /// Split every quad into two triangles along its first diagonal.
    fn triangulated(points: &[Point3<f64>], quads: &[[usize; 4]]) -> PolyMesh {
        let tris: Vec<Vec<usize>> = quads
            .iter()
            .flat_map(|&[a, b, c, d]| [vec![a, b, c], vec![a, c, d]])
            .collect();
        build_from_polygons(points, &tris).unwrap()
    }

    #[test]
    fn test_cube_hull_merges_to_six_quads() {
        let mut points = Vec::new();
        for &x in &[0.0, 2.0] {
            for &y in &[0.0, 3.0] {
                for &z in &[0.0, 1.0] {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        // Index is 4x + 2y + z over the corner bits.
        let quads = [
            [0, 1, 3, 2],
            [4, 6, 7, 5],
            [0, 4, 5, 1],
            [2, 3, 7, 6],
            [0, 2, 6, 4],
            [1, 5, 7, 3],
        ];
        let mut mesh = triangulated(&points, &quads);
        assert_eq!(mesh.num_faces(), 12);

        let merges = merge_coplanar(&mut mesh, DEFAULT_FACE_ANGLE, DEFAULT_SHAPE_ANGLE);
        assert_eq!(merges, 6);
        assert_eq!(mesh.num_faces(), 6);
        for f in mesh.face_ids() {
            assert_eq!(mesh.face(f).len(), 4);
        }
        assert!((mesh.surface_area() - 2.0 * (6.0 + 2.0 + 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_no_merge_across_edges() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let tris = vec![vec![0, 2, 1], vec![0, 1, 3], vec![1, 2, 3], vec![2, 0, 3]];
        let mut mesh = build_from_polygons(&points, &tris).unwrap();
        assert_eq!(merge_coplanar(&mut mesh, DEFAULT_FACE_ANGLE, DEFAULT_SHAPE_ANGLE), 0);
        assert_eq!(mesh.num_faces(), 4);
    }

    #[test]
    fn test_materials_block_merge() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = build_from_polygons(&vertices, &[vec![0, 1, 2], vec![0, 2, 3]]).unwrap();
        mesh.face_mut(crate::mesh::FaceId::new(1)).material = Some(1);
        assert_eq!(merge_coplanar(&mut mesh, DEFAULT_FACE_ANGLE, DEFAULT_SHAPE_ANGLE), 0);

        mesh.face_mut(crate::mesh::FaceId::new(1)).material = None;
        assert_eq!(merge_coplanar(&mut mesh, DEFAULT_FACE_ANGLE, DEFAULT_SHAPE_ANGLE), 1);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.face(crate::mesh::FaceId::new(0)).len(), 4);
    }
}
