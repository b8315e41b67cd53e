//! Patch sampler.
//!
//! Curved surfaces are exported as `patchDef2` control grids. The sampler
//! reads a surface's control points into a rectangular raster, closing wrapped
//! axes by repeating their first row or column, and assigns each raster
//! position a synthetic UV.

use nalgebra::{Matrix4, Point2, Point3};
use thiserror::Error;

use crate::numeric::Precision;

/// A control-point surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSurface {
    /// Material index into the owning object's table.
    pub material: Option<usize>,
    /// Control points along U.
    pub points_u: usize,
    /// Control points along V.
    pub points_v: usize,
    /// Whether the surface is closed along U.
    pub wrap_u: bool,
    /// Whether the surface is closed along V.
    pub wrap_v: bool,
    /// Control points, row by row (`points_u` per row, `points_v` rows).
    pub points: Vec<Point3<f64>>,
}

/// Why a surface cannot be sampled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    /// Patch rows and columns must have an odd length of at least 3.
    #[error("patch {axis} axis has {count} points (wrap: {wrap}); need an odd grid of at least 3")]
    InvalidDimension {
        /// `"u"` or `"v"`.
        axis: &'static str,
        /// Control points along the axis.
        count: usize,
        /// Whether the axis wraps.
        wrap: bool,
    },
    /// The point list does not match the declared counts.
    #[error("patch declares {expected} points but has {actual}")]
    PointCount {
        /// `points_u * points_v`.
        expected: usize,
        /// Length of the point list.
        actual: usize,
    },
}

/// One raster position of a sampled patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchPoint {
    /// Position in world space.
    pub position: Point3<f64>,
    /// Synthetic UV.
    pub uv: Point2<f64>,
}

/// A sampled patch ready to write.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchGrid {
    /// Raster columns.
    pub cols: usize,
    /// Raster rows.
    pub rows: usize,
    /// Raster points, row by row.
    pub points: Vec<PatchPoint>,
}

impl PatchGrid {
    /// The point at column `i`, row `j`.
    pub fn at(&self, i: usize, j: usize) -> &PatchPoint {
        &self.points[j * self.cols + i]
    }

    /// Render the `patchDef2` block body, without the enclosing braces.
    pub fn to_patch_def(&self, material: &str, precision: Precision) -> String {
        let mut out = String::new();
        out.push_str("patchDef2\n{\n");
        out.push_str(material);
        out.push('\n');
        out.push_str(&format!("( {} {} 0 0 0 )\n(\n", self.cols, self.rows));
        for i in 0..self.cols {
            out.push('(');
            for j in 0..self.rows {
                let p = self.at(i, j);
                out.push_str(" ( ");
                out.push_str(&precision.format_all(&[
                    p.position.x,
                    p.position.y,
                    p.position.z,
                    p.uv.x,
                    p.uv.y,
                ]));
                out.push_str(" )");
            }
            out.push_str(" )\n");
        }
        out.push_str(")\n}\n");
        out
    }
}

fn grid_dimension(axis: &'static str, count: usize, wrap: bool) -> Result<usize, PatchError> {
    let dim = count + usize::from(wrap);
    if count <= 1 || dim < 3 || dim % 2 == 0 {
        return Err(PatchError::InvalidDimension { axis, count, wrap });
    }
    Ok(dim)
}

/// Sample a surface into a raster.
///
/// Each control point is transformed by `transform` (if any) and then scaled
/// uniformly by `scale`. UVs run from 0 to 1 across the raster, with V
/// flipped so the first row sits at the top of the texture.
pub fn sample(
    surface: &PatchSurface,
    transform: Option<&Matrix4<f64>>,
    scale: f64,
) -> Result<PatchGrid, PatchError> {
    let cols = grid_dimension("u", surface.points_u, surface.wrap_u)?;
    let rows = grid_dimension("v", surface.points_v, surface.wrap_v)?;
    let expected = surface.points_u * surface.points_v;
    if surface.points.len() != expected {
        return Err(PatchError::PointCount {
            expected,
            actual: surface.points.len(),
        });
    }

    let mut points = Vec::with_capacity(cols * rows);
    for j in 0..rows {
        for i in 0..cols {
            let index = (j % surface.points_v) * surface.points_u + (i % surface.points_u);
            let mut position = surface.points[index];
            if let Some(m) = transform {
                position = m.transform_point(&position);
            }
            let uv = Point2::new(
                i as f64 / (cols - 1) as f64,
                1.0 - j as f64 / (rows - 1) as f64,
            );
            points.push(PatchPoint {
                position: position * scale,
                uv,
            });
        }
    }
    Ok(PatchGrid { cols, rows, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn flat(points_u: usize, points_v: usize, wrap_u: bool, wrap_v: bool) -> PatchSurface {
        let mut points = Vec::new();
        for j in 0..points_v {
            for i in 0..points_u {
                points.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        PatchSurface {
            material: None,
            points_u,
            points_v,
            wrap_u,
            wrap_v,
            points,
        }
    }

    #[test]
    fn test_sample_3x3() {
        let grid = sample(&flat(3, 3, false, false), None, 1.0).unwrap();
        assert_eq!((grid.cols, grid.rows), (3, 3));
        assert_eq!(grid.at(0, 0).uv, Point2::new(0.0, 1.0));
        assert_eq!(grid.at(2, 2).uv, Point2::new(1.0, 0.0));
        assert_eq!(grid.at(1, 2).position, Point3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_even_unwrapped_rejected() {
        let err = sample(&flat(4, 3, false, false), None, 1.0).unwrap_err();
        assert_eq!(
            err,
            PatchError::InvalidDimension {
                axis: "u",
                count: 4,
                wrap: false
            }
        );
        assert!(sample(&flat(3, 2, false, false), None, 1.0).is_err());
    }

    #[test]
    fn test_single_point_axis_rejected() {
        assert!(sample(&flat(1, 3, true, false), None, 1.0).is_err());
    }

    #[test]
    fn test_wrap_repeats_first_column() {
        let grid = sample(&flat(4, 3, true, false), None, 1.0).unwrap();
        assert_eq!(grid.cols, 5);
        for j in 0..grid.rows {
            assert_eq!(grid.at(4, j).position, grid.at(0, j).position);
        }
        // Odd wrapped count gives an even raster.
        assert!(sample(&flat(3, 3, true, false), None, 1.0).is_err());
    }

    #[test]
    fn test_transform_then_scale() {
        let m = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        let grid = sample(&flat(3, 3, false, false), Some(&m), 2.0).unwrap();
        assert_eq!(grid.at(0, 0).position, Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_point_count_mismatch() {
        let mut surface = flat(3, 3, false, false);
        surface.points.pop();
        assert_eq!(
            sample(&surface, None, 1.0),
            Err(PatchError::PointCount {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn test_patch_def_text() {
        let grid = sample(&flat(3, 3, false, false), None, 1.0).unwrap();
        let text = grid.to_patch_def("common/caulk", Precision::default());
        assert!(text.starts_with("patchDef2\n{\ncommon/caulk\n( 3 3 0 0 0 )\n(\n"));
        assert!(text.contains("( ( 0 0 0 0 1 ) ( 0 1 0 0 0.5 ) ( 0 2 0 0 0 ) )"));
        assert!(text.ends_with(")\n}\n"));
    }
}
