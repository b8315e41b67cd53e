//! Brush primitives (plane-bound) texture projection.
//!
//! Every plane has a canonical 2D frame derived from its normal alone. The
//! texture matrix maps frame coordinates `(x, y, 1)` to texture coordinates,
//! measured in whole textures rather than texels.

use nalgebra::{Matrix2, Matrix2x3, Matrix6, Point2, Point3, Vector3, Vector6};

use super::TextureBasis;

/// Diagonal of the default matrix: one texture repeat per 64 units.
pub(super) const DEFAULT_SCALE: f64 = 1.0 / 64.0;

/// Normals this close to vertical get a fixed azimuth.
const VERTICAL_EPSILON: f64 = 1e-7;

/// Canonical texture frame of a plane, built from the azimuth and elevation
/// of its normal. Both axes are unit length and lie in the plane.
pub(super) fn axis_base(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let (nx, ny, nz) = (normal.x, normal.y, normal.z);
    let rot_y = -nz.atan2((nx * nx + ny * ny).sqrt());
    let rot_z = if nx.abs() < VERTICAL_EPSILON && ny.abs() < VERTICAL_EPSILON {
        0.0
    } else {
        ny.atan2(nx)
    };
    let (sin_y, cos_y) = rot_y.sin_cos();
    let (sin_z, cos_z) = rot_z.sin_cos();
    let tex_s = Vector3::new(-sin_z, cos_z, 0.0);
    let tex_t = Vector3::new(-sin_y * cos_z, -sin_y * sin_z, -cos_y);
    (tex_s, tex_t)
}

pub(super) fn solve(
    v: &[Point3<f64>; 3],
    t: &[Point2<f64>; 3],
    normal: &Vector3<f64>,
) -> Option<TextureBasis> {
    let (tex_s, tex_t) = axis_base(normal);

    // Solve relative to the first corner so that identical UVs give an exactly
    // zero linear part.
    let mut system = Matrix6::zeros();
    let mut rhs = Vector6::zeros();
    for i in 0..3 {
        let d = v[i] - v[0];
        let (x, y) = (d.dot(&tex_s), d.dot(&tex_t));
        system[(2 * i, 0)] = x;
        system[(2 * i, 1)] = y;
        system[(2 * i, 2)] = 1.0;
        system[(2 * i + 1, 3)] = x;
        system[(2 * i + 1, 4)] = y;
        system[(2 * i + 1, 5)] = 1.0;
        rhs[2 * i] = t[i].x - t[0].x;
        // Texture rows run downward.
        rhs[2 * i + 1] = -(t[i].y - t[0].y);
    }
    let c = system.lu().solve(&rhs)?;
    if !c.iter().all(|x| x.is_finite()) {
        return None;
    }
    Matrix2::new(c[0], c[1], c[3], c[4]).try_inverse()?;

    let x0 = v[0].coords.dot(&tex_s);
    let y0 = v[0].coords.dot(&tex_t);
    let a3 = c[2] + t[0].x - c[0] * x0 - c[1] * y0;
    let a6 = c[5] - t[0].y - c[3] * x0 - c[4] * y0;

    Some(TextureBasis::Primitives {
        matrix: Matrix2x3::new(c[0], c[1], a3, c[3], c[4], a6),
    })
}

pub(super) fn uv_at(
    matrix: &Matrix2x3<f64>,
    point: &Point3<f64>,
    normal: &Vector3<f64>,
) -> Point2<f64> {
    let (tex_s, tex_t) = axis_base(normal);
    let x = point.coords.dot(&tex_s);
    let y = point.coords.dot(&tex_t);
    let s = matrix[(0, 0)] * x + matrix[(0, 1)] * y + matrix[(0, 2)];
    let t = matrix[(1, 0)] * x + matrix[(1, 1)] * y + matrix[(1, 2)];
    Point2::new(s, -t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_base_is_orthonormal_and_in_plane() {
        let normals = [
            Vector3::z(),
            -Vector3::z(),
            Vector3::x(),
            Vector3::new(1.0, 2.0, 3.0).normalize(),
            Vector3::new(-0.3, 0.1, -0.9).normalize(),
        ];
        for n in &normals {
            let (s, t) = axis_base(n);
            assert!((s.norm() - 1.0).abs() < 1e-12);
            assert!((t.norm() - 1.0).abs() < 1e-12);
            assert!(s.dot(&t).abs() < 1e-12);
            assert!(s.dot(n).abs() < 1e-12, "{:?}", n);
            assert!(t.dot(n).abs() < 1e-12, "{:?}", n);
        }
    }

    #[test]
    fn test_floor_frame() {
        let (s, t) = axis_base(&Vector3::z());
        assert!((s - Vector3::y()).norm() < 1e-12);
        assert!((t - Vector3::x()).norm() < 1e-12);
    }
}
