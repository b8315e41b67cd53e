//! Prism strategies: one brush per face, closed by an extruded copy.

use nalgebra::{Point3, Vector3};

use super::{cap_face, Brush, BrushFace};
use crate::mesh::{FaceId, PolyMesh};
use crate::numeric::snap_point;

/// Faces whose normal has a smaller upward component have no floor below them.
const MIN_UPWARD: f64 = 1e-6;

/// How the bottom copy of a face is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Extrusion {
    /// Every corner moves `depth` along the inverse face normal.
    Normal(f64),
    /// Every corner drops straight down to this height.
    Floor(f64),
    /// Every corner moves along its inverse vertex normal, scaled so that
    /// adjacent faces stay `depth` thick.
    Shell(f64),
}

pub(super) fn build(mesh: &PolyMesh, faces: &[FaceId], extrusion: Extrusion, grid: f64) -> Vec<Brush> {
    let offsets = match extrusion {
        Extrusion::Shell(_) => mesh.shell_offsets(),
        Extrusion::Normal(_) | Extrusion::Floor(_) => Vec::new(),
    };
    faces
        .iter()
        .filter_map(|&f| prism(mesh, f, extrusion, &offsets, grid))
        .collect()
}

fn prism(
    mesh: &PolyMesh,
    f: FaceId,
    extrusion: Extrusion,
    offsets: &[Vector3<f64>],
    grid: f64,
) -> Option<Brush> {
    let cap = cap_face(mesh, f);
    let face = mesh.face(f);

    let bottom: Vec<Point3<f64>> = match extrusion {
        Extrusion::Normal(depth) => cap.points.iter().map(|p| p - cap.normal * depth).collect(),
        Extrusion::Floor(height) => {
            if cap.normal.z <= MIN_UPWARD {
                log::debug!("skipping face {:?}: not facing up", f);
                return None;
            }
            cap.points
                .iter()
                .map(|p| Point3::new(p.x, p.y, height))
                .collect()
        }
        Extrusion::Shell(depth) => face
            .vertices
            .iter()
            .zip(&cap.points)
            .map(|(&v, p)| p - offsets[v.index()] * depth)
            .collect(),
    };
    let bottom: Vec<Point3<f64>> = bottom.iter().map(|p| snap_point(p, grid)).collect();

    let n = cap.points.len();
    let mut faces = Vec::with_capacity(n + 2);
    for i in 0..n {
        let j = (i + 1) % n;
        faces.push(BrushFace::new(
            vec![cap.points[j], cap.points[i], bottom[i], bottom[j]],
            vec![cap.uvs[j], cap.uvs[i], cap.uvs[i], cap.uvs[j]],
            None,
        ));
    }
    faces.push(BrushFace::new(
        bottom.iter().rev().copied().collect(),
        cap.uvs.iter().rev().copied().collect(),
        None,
    ));
    faces.insert(0, cap);
    Brush::finish(faces)
}
