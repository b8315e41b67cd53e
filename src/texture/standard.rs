//! Axis-aligned (Quake) texture projection.
//!
//! The editor projects the face onto the coordinate plane of its dominant
//! normal axis and applies rotation, scale and offset in that plane:
//!
//! ```text
//! s = p . ( cos r,  sin r) / scaleU + offU
//! t = p . ( sin r, -cos r) / scaleV + offV
//! ```
//!
//! where `p` holds the two coordinates kept by the projection.

use nalgebra::{Point2, Point3, Vector2, Vector3};

use super::{solve_edge_system, TexelSize, TextureBasis};

/// Components within this of the largest one count as tied.
const AXIS_TOLERANCE: f64 = 1e-5;

/// The dropped axis: 0 = X, 1 = Y, 2 = Z.
///
/// Ties (45 degree faces) go to Z first, then X, then Y.
pub(super) fn dominant_axis(normal: &Vector3<f64>) -> usize {
    let abs = normal.abs();
    let max = abs.max();
    [2, 0, 1]
        .into_iter()
        .find(|&i| abs[i] >= max - AXIS_TOLERANCE)
        .unwrap_or(2)
}

/// The two coordinates kept when dropping `axis`.
fn drop_axis(v: &Vector3<f64>, axis: usize) -> Vector2<f64> {
    match axis {
        0 => Vector2::new(v.y, v.z),
        1 => Vector2::new(v.x, v.z),
        _ => Vector2::new(v.x, v.y),
    }
}

pub(super) fn solve(
    v: &[Point3<f64>; 3],
    t: &[Point2<f64>; 3],
    normal: &Vector3<f64>,
    texel: TexelSize,
) -> Option<TextureBasis> {
    let axis = dominant_axis(normal);
    let (w, h) = (texel.width, texel.height);

    let edge1 = drop_axis(&(v[1] - v[0]), axis);
    let edge2 = drop_axis(&(v[2] - v[0]), axis);
    let tex1 = Vector2::new((t[1].x - t[0].x) * w, (t[1].y - t[0].y) * h);
    let tex2 = Vector2::new((t[2].x - t[0].x) * w, (t[2].y - t[0].y) * h);

    let m = solve_edge_system(&edge1, &edge2, &tex1, &tex2)?;
    let row0 = Vector2::new(m[(0, 0)], m[(0, 1)]);
    let row1 = Vector2::new(m[(1, 0)], m[(1, 1)]);

    // A mirrored mapping flips the sign of the U scale; the rotation is then
    // read from the V row, which keeps its orientation.
    let (rotation, scale_u, scale_v) = if m.determinant() >= 0.0 {
        (row0.y.atan2(row0.x), 1.0 / row0.norm(), 1.0 / row1.norm())
    } else {
        ((-row1.x).atan2(row1.y), -1.0 / row0.norm(), 1.0 / row1.norm())
    };

    let (sin, cos) = rotation.sin_cos();
    let p0 = drop_axis(&v[0].coords, axis);
    let offset_u = t[0].x * w - p0.dot(&Vector2::new(cos, sin)) / scale_u;
    let offset_v = p0.dot(&Vector2::new(-sin, cos)) / scale_v - t[0].y * h;

    let values = [offset_u, offset_v, rotation, scale_u, scale_v];
    if !values.iter().all(|x| x.is_finite()) {
        return None;
    }

    Some(TextureBasis::Standard {
        offset: [offset_u, offset_v],
        rotation: rotation.to_degrees(),
        scale: [scale_u, scale_v],
    })
}

pub(super) fn uv_at(
    basis: &TextureBasis,
    point: &Point3<f64>,
    normal: &Vector3<f64>,
    texel: TexelSize,
) -> Point2<f64> {
    let TextureBasis::Standard {
        offset,
        rotation,
        scale,
    } = basis
    else {
        return Point2::origin();
    };
    let p = drop_axis(&point.coords, dominant_axis(normal));
    let (sin, cos) = rotation.to_radians().sin_cos();
    let s = p.dot(&Vector2::new(cos, sin)) / scale[0] + offset[0];
    let t = p.dot(&Vector2::new(sin, -cos)) / scale[1] + offset[1];
    Point2::new(s / texel.width, -t / texel.height)
}
