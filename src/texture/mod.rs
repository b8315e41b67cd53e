//! Texture projection solver.
//!
//! Level editors do not store per-vertex UVs. Each brush face instead carries
//! a small texture basis from which the editor derives texture coordinates for
//! any point on the face. This module recovers that basis from the first three
//! corners of a face and their UVs, in one of three encodings:
//!
//! | Format | Editors | Encoding |
//! |--------|---------|----------|
//! | [`TextureFormat::Standard`] | Quake, Quake 2 | axis-aligned: offset, rotation, scale |
//! | [`TextureFormat::Valve`] | Half-Life (Valve 220) | edge-bound: two free texture axes |
//! | [`TextureFormat::BrushPrimitives`] | Quake 3, Doom 3 | plane-bound: 2x3 matrix |
//!
//! UVs follow the usual mesh convention (v up, one unit per texture). The
//! solver flips v where the editors count rows downward.
//!
//! A solve can fail when the corners or their UVs are degenerate; that case is
//! an ordinary [`Projection::Degenerate`] result and callers substitute
//! [`TextureBasis::identity`].

mod primitives;
mod standard;
mod valve;

use nalgebra::{Matrix2, Matrix2x3, Matrix4, Point2, Point3, Vector2, Vector3, Vector4};

/// Texture-axis encoding of a map file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFormat {
    /// Axis-aligned projection (`offU offV rot scaleU scaleV`).
    Standard,
    /// Valve 220 projection (`[ U offU ] [ V offV ] rot scaleU scaleV`).
    #[default]
    Valve,
    /// Brush primitives (`( ( a b c ) ( d e f ) )`).
    BrushPrimitives,
}

/// Size of a texture in texels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexelSize {
    /// Width in texels.
    pub width: f64,
    /// Height in texels.
    pub height: f64,
}

impl TexelSize {
    /// Create a texel size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both sides are finite and positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for TexelSize {
    fn default() -> Self {
        Self::new(64.0, 64.0)
    }
}

/// Per-face texture basis, one variant per [`TextureFormat`].
#[derive(Debug, Clone, PartialEq)]
pub enum TextureBasis {
    /// Axis-aligned projection onto the plane of the dominant normal axis.
    Standard {
        /// Texture offset in texels.
        offset: [f64; 2],
        /// Rotation in degrees.
        rotation: f64,
        /// World units per texel along each texture axis.
        scale: [f64; 2],
    },
    /// Free texture axes lying in the face plane.
    Valve {
        /// Texture U axis (unit length).
        u_axis: Vector3<f64>,
        /// U offset in texels.
        u_offset: f64,
        /// Texture V axis (unit length).
        v_axis: Vector3<f64>,
        /// V offset in texels.
        v_offset: f64,
        /// World units per texel along each axis.
        scale: [f64; 2],
    },
    /// Affine map from the plane's canonical 2D frame to texture space.
    Primitives {
        /// Rows `( a1 a2 a3 )` and `( a4 a5 a6 )`.
        matrix: Matrix2x3<f64>,
    },
}

impl TextureBasis {
    /// The documented default basis of a format, used for degenerate faces.
    pub fn identity(format: TextureFormat) -> Self {
        match format {
            TextureFormat::Standard => TextureBasis::Standard {
                offset: [0.0, 0.0],
                rotation: 0.0,
                scale: [1.0, 1.0],
            },
            TextureFormat::Valve => TextureBasis::Valve {
                u_axis: Vector3::x(),
                u_offset: 0.0,
                v_axis: -Vector3::y(),
                v_offset: 0.0,
                scale: [1.0, 1.0],
            },
            TextureFormat::BrushPrimitives => TextureBasis::Primitives {
                matrix: Matrix2x3::new(
                    primitives::DEFAULT_SCALE,
                    0.0,
                    0.0,
                    0.0,
                    primitives::DEFAULT_SCALE,
                    0.0,
                ),
            },
        }
    }

    /// The format this basis is encoded in.
    pub fn format(&self) -> TextureFormat {
        match self {
            TextureBasis::Standard { .. } => TextureFormat::Standard,
            TextureBasis::Valve { .. } => TextureFormat::Valve,
            TextureBasis::Primitives { .. } => TextureFormat::BrushPrimitives,
        }
    }

    /// The UV an editor assigns to `point` on a face with unit `normal`.
    ///
    /// This inverts [`project`]: evaluating the solved basis at the three
    /// reference corners gives back their UVs, up to whole texture repeats.
    pub fn uv_at(
        &self,
        point: &Point3<f64>,
        normal: &Vector3<f64>,
        texel: TexelSize,
    ) -> Point2<f64> {
        match self {
            TextureBasis::Standard { .. } => standard::uv_at(self, point, normal, texel),
            TextureBasis::Valve { .. } => valve::uv_at(self, point, texel),
            TextureBasis::Primitives { matrix } => primitives::uv_at(matrix, point, normal),
        }
    }
}

/// Outcome of a texture solve.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// The face and its UVs determine a basis.
    Solved(TextureBasis),
    /// The linear system was singular or produced non-finite values.
    Degenerate,
}

impl Projection {
    /// The solved basis, or the format's identity basis when degenerate.
    pub fn or_identity(self, format: TextureFormat) -> TextureBasis {
        match self {
            Projection::Solved(basis) => basis,
            Projection::Degenerate => TextureBasis::identity(format),
        }
    }

    /// Whether the solve failed.
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Projection::Degenerate)
    }
}

/// Solve the texture basis of a face.
///
/// `points` and `uvs` are the face corners in loop order; only the first three
/// are used. `normal` is the face's unit normal and `texel` the texture size.
///
/// # Example
/// ```
/// use brushsmith::texture::{project, Projection, TexelSize, TextureFormat};
/// use nalgebra::{Point2, Point3, Vector3};
///
/// let points = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(64.0, 0.0, 0.0),
///     Point3::new(0.0, 64.0, 0.0),
/// ];
/// // All corners share one UV: nothing to recover.
/// let uvs = [Point2::new(0.5, 0.5); 3];
/// let result = project(&points, &uvs, &Vector3::z(), TexelSize::default(), TextureFormat::Valve);
/// assert_eq!(result, Projection::Degenerate);
/// ```
pub fn project(
    points: &[Point3<f64>],
    uvs: &[Point2<f64>],
    normal: &Vector3<f64>,
    texel: TexelSize,
    format: TextureFormat,
) -> Projection {
    if points.len() < 3 || uvs.len() < 3 || !texel.is_usable() {
        return Projection::Degenerate;
    }
    let v = [points[0], points[1], points[2]];
    let t = [uvs[0], uvs[1], uvs[2]];
    let solved = match format {
        TextureFormat::Standard => standard::solve(&v, &t, normal, texel),
        TextureFormat::Valve => valve::solve(&v, &t, normal, texel),
        TextureFormat::BrushPrimitives => primitives::solve(&v, &t, normal),
    };
    match solved {
        Some(basis) => Projection::Solved(basis),
        None => Projection::Degenerate,
    }
}

/// Find the 2x2 matrix `M` with `M * a = p` and `M * b = q`.
///
/// Written as the 4x4 system over the entries of `M`. Returns `None` when the
/// system is singular, when `M` itself has no inverse (the UV triangle is
/// degenerate), or when the result is not finite.
fn solve_edge_system(
    a: &Vector2<f64>,
    b: &Vector2<f64>,
    p: &Vector2<f64>,
    q: &Vector2<f64>,
) -> Option<Matrix2<f64>> {
    #[rustfmt::skip]
    let system = Matrix4::new(
        a.x, a.y, 0.0, 0.0,
        0.0, 0.0, a.x, a.y,
        b.x, b.y, 0.0, 0.0,
        0.0, 0.0, b.x, b.y,
    );
    let rhs = Vector4::new(p.x, p.y, q.x, q.y);
    let c = system.lu().solve(&rhs)?;
    let m = Matrix2::new(c[0], c[1], c[2], c[3]);
    if !m.iter().all(|x| x.is_finite()) {
        return None;
    }
    m.try_inverse()?;
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tilted_triangle() -> ([Point3<f64>; 3], Vector3<f64>) {
        let points = [
            Point3::new(16.0, -8.0, 4.0),
            Point3::new(80.0, 8.0, 36.0),
            Point3::new(24.0, 56.0, 12.0),
        ];
        let normal = (points[1] - points[0])
            .cross(&(points[2] - points[0]))
            .normalize();
        (points, normal)
    }

    fn assert_round_trip(
        basis: &TextureBasis,
        points: &[Point3<f64>; 3],
        uvs: &[Point2<f64>; 3],
        normal: &Vector3<f64>,
        texel: TexelSize,
    ) {
        for (p, uv) in points.iter().zip(uvs) {
            let back = basis.uv_at(p, normal, texel);
            // Editors wrap texture coordinates; compare modulo whole repeats.
            let du = back.x - uv.x;
            let dv = back.y - uv.y;
            assert!((du - du.round()).abs() < 1e-9, "u {} vs {}", back.x, uv.x);
            assert!((dv - dv.round()).abs() < 1e-9, "v {} vs {}", back.y, uv.y);
        }
    }

    #[test]
    fn test_valve_round_trip() {
        let (points, normal) = tilted_triangle();
        let uvs = [
            Point2::new(0.1, 0.2),
            Point2::new(0.9, 0.35),
            Point2::new(0.3, 1.4),
        ];
        let texel = TexelSize::new(128.0, 64.0);
        let basis = match project(&points, &uvs, &normal, texel, TextureFormat::Valve) {
            Projection::Solved(basis) => basis,
            Projection::Degenerate => panic!("expected a solution"),
        };
        assert_eq!(basis.format(), TextureFormat::Valve);
        assert_round_trip(&basis, &points, &uvs, &normal, texel);
    }

    #[test]
    fn test_primitives_round_trip() {
        let (points, normal) = tilted_triangle();
        let uvs = [
            Point2::new(-0.5, 0.25),
            Point2::new(1.5, 0.5),
            Point2::new(0.25, 2.0),
        ];
        let texel = TexelSize::default();
        let basis = project(&points, &uvs, &normal, texel, TextureFormat::BrushPrimitives)
            .or_identity(TextureFormat::BrushPrimitives);
        assert_ne!(basis, TextureBasis::identity(TextureFormat::BrushPrimitives));
        assert_round_trip(&basis, &points, &uvs, &normal, texel);
    }

    #[test]
    fn test_primitives_vertical_normal() {
        let points = [
            Point3::new(0.0, 0.0, 32.0),
            Point3::new(64.0, 0.0, 32.0),
            Point3::new(0.0, 64.0, 32.0),
        ];
        let uvs = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        let normal = Vector3::z();
        let texel = TexelSize::default();
        let basis = project(&points, &uvs, &normal, texel, TextureFormat::BrushPrimitives)
            .or_identity(TextureFormat::BrushPrimitives);
        assert_round_trip(&basis, &points, &uvs, &normal, texel);
    }

    #[test]
    fn test_standard_round_trip() {
        let (points, normal) = tilted_triangle();
        let texel = TexelSize::new(64.0, 32.0);
        for &(rotation, scale) in &[
            (30.0, [2.0, 0.5]),
            (-120.0, [0.25, 1.0]),
            (45.0, [-1.5, 0.75]),
            (0.0, [1.0, 1.0]),
        ] {
            let reference = TextureBasis::Standard {
                offset: [12.0, -7.0],
                rotation,
                scale,
            };
            let uvs = [
                reference.uv_at(&points[0], &normal, texel),
                reference.uv_at(&points[1], &normal, texel),
                reference.uv_at(&points[2], &normal, texel),
            ];
            let basis = match project(&points, &uvs, &normal, texel, TextureFormat::Standard) {
                Projection::Solved(basis) => basis,
                Projection::Degenerate => panic!("expected a solution"),
            };
            assert_round_trip(&basis, &points, &uvs, &normal, texel);

            let TextureBasis::Standard { scale: solved, .. } = basis else {
                panic!("wrong format");
            };
            assert!((solved[0] - scale[0]).abs() < 1e-9, "{:?} vs {:?}", solved, scale);
            assert!((solved[1] - scale[1]).abs() < 1e-9, "{:?} vs {:?}", solved, scale);
        }
    }

    #[test]
    fn test_identical_uvs_give_identity() {
        let (points, normal) = tilted_triangle();
        let uvs = [Point2::new(0.3, 0.7); 3];
        for format in [
            TextureFormat::Standard,
            TextureFormat::Valve,
            TextureFormat::BrushPrimitives,
        ] {
            let result = project(&points, &uvs, &normal, TexelSize::default(), format);
            assert!(result.is_degenerate(), "{:?}", format);
            assert_eq!(result.or_identity(format), TextureBasis::identity(format));
        }
    }

    #[test]
    fn test_collinear_uvs_are_degenerate() {
        let (points, normal) = tilted_triangle();
        let uvs = [Point2::new(0.0, 0.0), Point2::new(0.5, 0.5), Point2::new(1.0, 1.0)];
        for format in [TextureFormat::Standard, TextureFormat::Valve] {
            let result = project(&points, &uvs, &normal, TexelSize::default(), format);
            assert!(result.is_degenerate(), "{:?}", format);
        }
    }

    #[test]
    fn test_too_few_corners() {
        let points = [Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        let uvs = [Point2::origin(); 2];
        let result = project(&points, &uvs, &Vector3::z(), TexelSize::default(), TextureFormat::Valve);
        assert!(result.is_degenerate());
    }
}
