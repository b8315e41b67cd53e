//! Valve 220 (edge-bound) texture projection.
//!
//! The texture axes are free vectors in the face plane, so no axis projection
//! is involved. The solve works in a 2D frame spanned by the first edge of the
//! face, then rotates that edge about the normal to obtain the 3D axes.

use nalgebra::{Point2, Point3, Rotation3, Unit, Vector2, Vector3};

use super::{solve_edge_system, TexelSize, TextureBasis};

/// Smallest axis length accepted before the scale is clamped.
const MIN_AXIS_LENGTH: f64 = 1e-5;

pub(super) fn solve(
    v: &[Point3<f64>; 3],
    t: &[Point2<f64>; 3],
    normal: &Vector3<f64>,
    texel: TexelSize,
) -> Option<TextureBasis> {
    let axis = Unit::try_new(*normal, 1e-12)?;
    let width = texel.width;
    // Editors count texture rows downward.
    let height = -texel.height;

    let world01 = v[1] - v[0];
    let world02 = v[2] - v[0];
    let mut angle = world01.angle(&world02);
    if normal.dot(&world01.cross(&world02)) < 0.0 {
        angle = -angle;
    }
    let edge1 = Vector2::new(world01.norm(), 0.0);
    let edge2 = Vector2::new(angle.cos(), angle.sin()) * world02.norm();

    let tex1 = Vector2::new((t[1].x - t[0].x) * width, (t[1].y - t[0].y) * height);
    let tex2 = Vector2::new((t[2].x - t[0].x) * width, (t[2].y - t[0].y) * height);

    let m = solve_edge_system(&edge1, &edge2, &tex1, &tex2)?;
    let right = Vector2::new(m[(0, 0)], m[(0, 1)]);
    let up = Vector2::new(m[(1, 0)], m[(1, 1)]);

    let scale = [
        1.0 / right.norm().max(MIN_AXIS_LENGTH),
        1.0 / up.norm().max(MIN_AXIS_LENGTH),
    ];

    let first_edge = world01.try_normalize(0.0)?;
    let u_axis = Rotation3::from_axis_angle(&axis, right.y.atan2(right.x)) * first_edge;
    let v_axis = Rotation3::from_axis_angle(&axis, up.y.atan2(up.x)) * first_edge;

    let u_offset = t[0].x * width - v[0].coords.dot(&u_axis) / scale[0];
    let v_offset = t[0].y * height - v[0].coords.dot(&v_axis) / scale[1];

    if !(u_offset.is_finite() && v_offset.is_finite()) {
        return None;
    }

    Some(TextureBasis::Valve {
        u_axis,
        u_offset,
        v_axis,
        v_offset,
        scale,
    })
}

pub(super) fn uv_at(basis: &TextureBasis, point: &Point3<f64>, texel: TexelSize) -> Point2<f64> {
    let TextureBasis::Valve {
        u_axis,
        u_offset,
        v_axis,
        v_offset,
        scale,
    } = basis
    else {
        return Point2::origin();
    };
    let s = point.coords.dot(u_axis) / scale[0] + u_offset;
    let t = point.coords.dot(v_axis) / scale[1] + v_offset;
    Point2::new(s / texel.width, -t / texel.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_axes_lie_in_plane() {
        // A wall facing -Y, one texture repeat per 128 units.
        let v = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(128.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 128.0),
        ];
        let t = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        let normal = -Vector3::y();
        let basis = solve(&v, &t, &normal, TexelSize::default()).unwrap();
        let TextureBasis::Valve {
            u_axis,
            v_axis,
            scale,
            ..
        } = basis
        else {
            panic!("wrong format");
        };
        assert!((u_axis - Vector3::x()).norm() < 1e-9, "{:?}", u_axis);
        assert!((v_axis + Vector3::z()).norm() < 1e-9, "{:?}", v_axis);
        assert!((scale[0] - 2.0).abs() < 1e-9 && (scale[1] - 2.0).abs() < 1e-9);
        assert!(u_axis.dot(&normal).abs() < 1e-12 && v_axis.dot(&normal).abs() < 1e-12);
    }
}
